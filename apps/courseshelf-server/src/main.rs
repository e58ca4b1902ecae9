//! CourseShelf Server - course resource repository over an S3-compatible store.
//!
//! Serves the JSON resource API from `courseshelf-http` and exposes a health
//! endpoint for orchestration systems.
//!
//! # Usage
//!
//! ```text
//! STORE_ENDPOINT=http://localhost:9000 STORE_BUCKET=recursos courseshelf-server
//! ```
//!
//! Variables are read from the process environment, after loading a `.env`
//! file from the working directory if one exists. See
//! [`CourseShelfConfig::from_env`] for the full list.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:3001` | Bind address |
//! | `PORT` | *(unset)* | Overrides the port of `GATEWAY_LISTEN` |
//! | `STORE_BACKEND` | `s3` | `s3` or `memory` |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use courseshelf_core::config::{CourseShelfConfig, StoreBackend};
use courseshelf_core::service::ResourceService;
use courseshelf_core::store::{InMemoryObjectStore, ObjectStore, S3ObjectStore};
use courseshelf_http::server::serve;
use courseshelf_http::service::{ResourceHttpConfig, ResourceHttpService};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Build the object store selected by `config.store_backend`.
async fn build_store(config: &CourseShelfConfig) -> Arc<dyn ObjectStore> {
    match config.store_backend {
        StoreBackend::S3 => {
            if !config.has_static_credentials() {
                info!("no static store credentials, using the default credential chain");
            }
            Arc::new(S3ObjectStore::from_config(config).await)
        }
        StoreBackend::Memory => {
            warn!("using the in-memory store, resources are lost on exit");
            Arc::new(InMemoryObjectStore::new())
        }
    }
}

/// Address the health check connects to.
fn health_check_addr(gateway_listen: &str) -> String {
    gateway_listen.replace("0.0.0.0", "127.0.0.1")
}

/// Perform a health check by connecting to the gateway and requesting the health endpoint.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let config = CourseShelfConfig::from_env();
        let healthy = run_health_check(&health_check_addr(&config.gateway_listen))
            .await
            .is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let config = CourseShelfConfig::from_env();

    init_tracing(&config.log_level)?;

    info!(
        gateway_listen = %config.gateway_listen,
        store_backend = %config.store_backend,
        store_bucket = %config.store_bucket,
        store_endpoint = config.store_endpoint.as_deref().unwrap_or("<default>"),
        public_url_base = config.public_url_base.as_deref().unwrap_or("<unset>"),
        version = VERSION,
        "starting CourseShelf Server",
    );

    let store = build_store(&config).await;
    let resources = ResourceService::from_config(store, &config);
    let service = ResourceHttpService::new(resources, ResourceHttpConfig::default());

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    serve(listener, service, async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    })
    .await;

    info!("exiting");
    Ok(())
}
