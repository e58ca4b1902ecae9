//! HTTP routing, request parsing, JSON responses, and hyper service for CourseShelf.
//!
//! - **Routing** ([`router`]): maps method and path under `/resources` (or
//!   `/recursos`) to a [`ResourceOperation`](router::ResourceOperation).
//! - **Requests** ([`request`], [`multipart`]): JSON bodies, list paging
//!   parameters, and `multipart/form-data` uploads.
//! - **Dispatch** ([`dispatch`]): runs the operation against the
//!   [`ResourceService`](courseshelf_core::service::ResourceService).
//! - **Responses** ([`response`], [`body`]): JSON success and error bodies.
//! - **Service** ([`service`]): the hyper `Service` tying it together.
//! - **Server** ([`server`]): the accept loop with graceful shutdown.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> ResourceHttpService (hyper Service)
//!     -> Health check / CORS interception
//!     -> ResourceRouter (operation identification)
//!     -> Body collection (size-limited)
//!     -> dispatch_operation (ResourceService)
//!     -> Common response headers (x-request-id, Server, CORS)
//!   <- JSON Response
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use courseshelf_core::service::ResourceService;
//! use courseshelf_core::store::InMemoryObjectStore;
//! use courseshelf_http::service::{ResourceHttpConfig, ResourceHttpService};
//!
//! let resources = ResourceService::new(Arc::new(InMemoryObjectStore::new()));
//! let service = ResourceHttpService::new(resources, ResourceHttpConfig::default());
//! // Hand `service` to `courseshelf_http::server::serve`.
//! ```

// ApiError wraps ResourceError, whose rename variants carry two keys and a
// store description; the size is inherent.
#![allow(clippy::result_large_err)]

pub mod body;
pub mod dispatch;
pub mod error;
pub mod multipart;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod service;

pub use body::ResponseBody;
pub use error::ApiError;
pub use router::{ResourceOperation, ResourceRouter, RoutingContext};
pub use service::{ResourceHttpConfig, ResourceHttpService};
