//! Course-scoped file repository over an S3-compatible object store.
//!
//! This crate turns human-entered course codes into canonical storage paths
//! and implements list, upload, rename, delete, and bulk-upload on top of a
//! store that only offers keyed put/get/copy/delete and prefix listing.
//!
//! # Architecture
//!
//! ```text
//! course code ──> path::resolve ──> ResourcePath
//!                                       |
//!                                       v
//!          ResourceService (list / upload / rename / delete / bulk)
//!            |            |                         |
//!            v            v                         v
//!   sanitize::sanitize  aggregate::aggregate   dyn ObjectStore
//!                                              (S3 | in-memory)
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod path;
pub mod sanitize;
pub mod service;
pub mod store;

pub use aggregate::{BulkReport, BulkResult};
pub use config::{CourseShelfConfig, StoreBackend};
pub use error::{ResourceError, ResourceResult, StoreError, StoreResult};
pub use path::{CategoryTag, ResourcePath, resolve};
pub use service::{Page, ResourceService, StoredObject, WrittenObject};
pub use store::{InMemoryObjectStore, ObjectStore, S3ObjectStore};
