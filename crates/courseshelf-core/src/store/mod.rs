//! Object store abstraction.
//!
//! [`ObjectStore`] is the capability boundary between resource operations
//! and the storage backend. It exposes only what S3-compatible stores offer
//! natively: keyed put/get/head/copy/delete and prefix listing. There is no
//! rename and no directory concept; callers compose those.
//!
//! # Implementations
//!
//! - [`S3ObjectStore`](s3::S3ObjectStore): any S3-compatible endpoint through
//!   `aws-sdk-s3`.
//! - [`InMemoryObjectStore`](memory::InMemoryObjectStore): a `DashMap`
//!   backed store for local development and tests.
//!
//! # Object safety
//!
//! The trait uses `#[async_trait]` so it can be held as `Arc<dyn ObjectStore>`.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

use crate::error::StoreResult;

pub mod memory;
pub mod s3;

pub use memory::{InMemoryObjectStore, StoreOperation};
pub use s3::S3ObjectStore;

/// Characters left unescaped when a key is embedded in a URL: RFC 3986
/// unreserved plus `/`.
pub(crate) const KEY_ESCAPE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// Metadata of one object as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    /// Full key, including the file name.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// Entity tag, if the store reports one.
    pub etag: Option<String>,
    /// Stored content type, if the store reports one.
    pub content_type: Option<String>,
}

/// Key-addressed blob storage.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// List objects whose key is `prefix` followed by a name without `/`.
    ///
    /// `prefix` is either empty (the store root) or ends with `/`. Keys in
    /// deeper sub-prefixes are not returned. The order is unspecified.
    async fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectEntry>>;

    /// Store `body` under `key`, replacing any existing object.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StoreResult<ObjectEntry>;

    /// Fetch the full content of `key`.
    async fn get(&self, key: &str) -> StoreResult<Bytes>;

    /// Fetch the metadata of `key`, or `None` if it does not exist.
    async fn head(&self, key: &str) -> StoreResult<Option<ObjectEntry>>;

    /// Copy `source` to `destination`, replacing any existing destination.
    async fn copy(&self, source: &str, destination: &str) -> StoreResult<()>;

    /// Delete `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Whether `key` is a direct child of `prefix` (as accepted by [`ObjectStore::list`]).
#[must_use]
pub fn is_direct_child(prefix: &str, key: &str) -> bool {
    key.strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}
