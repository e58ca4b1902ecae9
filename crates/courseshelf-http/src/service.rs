//! The hyper `Service` serving the resource API.
//!
//! [`ResourceHttpService`] runs every request through:
//!
//! 1. Health check interception (`GET /health`, `GET /_health`)
//! 2. CORS preflight (`OPTIONS`)
//! 3. Routing via [`ResourceRouter`]
//! 4. Body collection, bounded by [`ResourceHttpConfig::max_body_bytes`]
//! 5. Dispatch to the [`ResourceService`]
//! 6. Common response headers (`x-request-id`, `Server`, CORS)

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use courseshelf_core::service::ResourceService;
use http::header::HeaderValue;
use http_body_util::{BodyExt, Limited};
use hyper::service::Service;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::body::ResponseBody;
use crate::dispatch::dispatch_operation;
use crate::error::ApiError;
use crate::response::{CONTENT_TYPE, error_to_response};
use crate::router::ResourceRouter;

/// Default request body limit (50 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Value of the `Server` response header.
pub const SERVER_NAME: &str = "CourseShelf";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const HEALTH_BODY: &str = r#"{"status":"running","service":"courseshelf"}"#;

/// Configuration of the HTTP service.
#[derive(Debug, Clone)]
pub struct ResourceHttpConfig {
    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ResourceHttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Hyper service exposing the resource API.
#[derive(Debug, Clone)]
pub struct ResourceHttpService {
    resources: Arc<ResourceService>,
    router: ResourceRouter,
    config: Arc<ResourceHttpConfig>,
}

impl ResourceHttpService {
    /// Create a service over `resources`.
    #[must_use]
    pub fn new(resources: ResourceService, config: ResourceHttpConfig) -> Self {
        Self::from_shared(Arc::new(resources), config)
    }

    /// Create a service over a shared [`ResourceService`].
    #[must_use]
    pub fn from_shared(resources: Arc<ResourceService>, config: ResourceHttpConfig) -> Self {
        Self {
            resources,
            router: ResourceRouter::new(),
            config: Arc::new(config),
        }
    }

    /// Handle one request. Never fails: errors become JSON error responses.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<ResponseBody>
    where
        B: http_body::Body,
        B::Error: Into<BoxError>,
    {
        let request_id = Uuid::new_v4().to_string();
        let response = process_request(
            req,
            &self.resources,
            self.router,
            &self.config,
            &request_id,
        )
        .await;
        add_common_headers(response, &request_id)
    }
}

impl<B> Service<http::Request<B>> for ResourceHttpService
where
    B: http_body::Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

async fn process_request<B>(
    req: http::Request<B>,
    resources: &ResourceService,
    router: ResourceRouter,
    config: &ResourceHttpConfig,
    request_id: &str,
) -> http::Response<ResponseBody>
where
    B: http_body::Body,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let uri = req.uri().clone();
    debug!(%method, %uri, request_id, "processing request");

    if is_health_check(&method, uri.path()) {
        return health_check_response();
    }

    if method == http::Method::OPTIONS {
        return cors_preflight_response();
    }

    let ctx = match router.resolve(&req) {
        Ok(ctx) => ctx,
        Err(err) => {
            warn!(%method, %uri, error = %err, request_id, "failed to route request");
            return error_to_response(&err, request_id);
        }
    };

    info!(
        operation = %ctx.operation,
        path = %ctx.path,
        request_id,
        "routed request"
    );

    let (parts, incoming) = req.into_parts();
    let body = match collect_body(incoming, config.max_body_bytes).await {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, request_id, "failed to read request body");
            return error_to_response(&err, request_id);
        }
    };

    let operation = ctx.operation;
    match dispatch_operation(resources, &parts, body, ctx).await {
        Ok(response) => response,
        Err(err) => {
            if err.status_code().is_server_error() {
                warn!(%operation, error = %err, request_id, "operation failed");
            } else {
                debug!(%operation, error = %err, request_id, "operation rejected");
            }
            error_to_response(&err, request_id)
        }
    }
}

/// Collect the full body, failing once it grows past `limit` bytes.
async fn collect_body<B>(body: B, limit: usize) -> Result<Bytes, ApiError>
where
    B: http_body::Body,
    B::Error: Into<BoxError>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if err.is::<http_body_util::LengthLimitError>() => {
            Err(ApiError::PayloadTooLarge { limit })
        }
        Err(err) => Err(ApiError::MalformedBody(err.to_string())),
    }
}

fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/health" || path == "/_health")
}

fn health_check_response() -> http::Response<ResponseBody> {
    let mut response = http::Response::new(ResponseBody::from_bytes(HEALTH_BODY));
    response
        .headers_mut()
        .insert(http::header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));
    response
}

fn cors_preflight_response() -> http::Response<ResponseBody> {
    let mut response = http::Response::new(ResponseBody::empty());
    *response.status_mut() = http::StatusCode::NO_CONTENT;
    let headers = response.headers_mut();
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, PATCH, DELETE, OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    headers.insert("Access-Control-Max-Age", HeaderValue::from_static("86400"));
    response
}

/// Add the headers every response carries.
fn add_common_headers(
    mut response: http::Response<ResponseBody>,
    request_id: &str,
) -> http::Response<ResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert("x-request-id", hv);
    }
    headers.insert("Server", HeaderValue::from_static(SERVER_NAME));
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Expose-Headers",
        HeaderValue::from_static("x-request-id"),
    );

    response
}
