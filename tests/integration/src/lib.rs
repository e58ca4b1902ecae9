//! Integration tests for the CourseShelf server.
//!
//! Most tests start the server in-process on an ephemeral port, backed by an
//! [`InMemoryObjectStore`], and talk to it over HTTP.
//!
//! The tests in `test_s3` run against a real S3-compatible endpoint (MinIO,
//! LocalStack, ...) at `STORE_ENDPOINT`. They are marked `#[ignore]` so they
//! don't run during normal `cargo test`. Run them with:
//!
//! ```text
//! STORE_ENDPOINT=http://localhost:9000 cargo test -p courseshelf-integration -- --ignored
//! ```

use std::sync::{Arc, Once};

use courseshelf_core::config::CourseShelfConfig;
use courseshelf_core::service::ResourceService;
use courseshelf_core::store::{InMemoryObjectStore, ObjectStore};
use courseshelf_http::server::serve;
use courseshelf_http::service::{ResourceHttpConfig, ResourceHttpService};
use tokio::net::TcpListener;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A server running in the background of the current test runtime.
#[derive(Debug)]
pub struct TestServer {
    /// Base URL, e.g. `http://127.0.0.1:41234`.
    pub base_url: String,
    /// HTTP client for requests against the server.
    pub client: reqwest::Client,
}

impl TestServer {
    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Start a server over `store`.
pub async fn start_server(
    store: Arc<dyn ObjectStore>,
    public_url_base: Option<&str>,
) -> TestServer {
    init_tracing();

    let resources =
        ResourceService::new(store).with_public_url_base(public_url_base.map(ToOwned::to_owned));
    let service = ResourceHttpService::new(resources, ResourceHttpConfig::default());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(serve(listener, service, std::future::pending()));

    TestServer {
        base_url: format!("http://{addr}"),
        client: reqwest::Client::new(),
    }
}

/// Start a server over a fresh in-memory store, returning the store too.
pub async fn start_memory_server() -> (TestServer, Arc<InMemoryObjectStore>) {
    let store = Arc::new(InMemoryObjectStore::new());
    let server = start_server(store.clone(), None).await;
    (server, store)
}

/// Boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "courseshelf-test-boundary";

/// Build a `multipart/form-data` body with one `archivo` file part.
#[must_use]
pub fn multipart_body(filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"archivo\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Upload `data` as `filename` under `path` through the HTTP API.
pub async fn upload(
    server: &TestServer,
    path: &str,
    filename: &str,
    data: &[u8],
) -> reqwest::Response {
    server
        .client
        .post(server.url(&format!("/resources/{path}")))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart_body(filename, "application/pdf", data))
        .send()
        .await
        .expect("upload request")
}

/// Configuration for the S3-backed tests, from the environment.
#[must_use]
pub fn s3_test_config() -> CourseShelfConfig {
    let mut config = CourseShelfConfig::from_env();
    if config.store_endpoint.is_none() {
        config.store_endpoint = Some("http://localhost:9000".to_owned());
    }
    if !config.has_static_credentials() {
        config.store_access_key_id = Some("test".to_owned());
        config.store_secret_access_key = Some("test".to_owned());
    }
    config.store_bucket = format!("courseshelf-{}", &uuid::Uuid::new_v4().to_string()[..8]);
    config
}

mod test_bulk;
mod test_delete;
mod test_list;
mod test_rename;
mod test_upload;
