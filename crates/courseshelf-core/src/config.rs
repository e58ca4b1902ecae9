//! CourseShelf configuration.
//!
//! Provides [`CourseShelfConfig`], resolved once at startup and shared
//! read-only afterwards. Values are loaded from environment variables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Which object store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// An S3-compatible endpoint.
    S3,
    /// The in-process store; contents are lost on exit.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "memory" | "mem" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::S3 => "s3",
            Self::Memory => "memory",
        })
    }
}

/// Service configuration.
///
/// # Examples
///
/// ```
/// use courseshelf_core::config::CourseShelfConfig;
///
/// let config = CourseShelfConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:3001");
/// assert_eq!(config.store_bucket, "recursos");
/// assert!(config.public_url_base.is_none());
/// ```
#[derive(Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct CourseShelfConfig {
    /// Bind address for the HTTP gateway.
    #[builder(default = String::from("0.0.0.0:3001"))]
    pub gateway_listen: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,

    /// Object store backend.
    #[builder(default = StoreBackend::S3)]
    pub store_backend: StoreBackend,

    /// Custom S3 endpoint URL (MinIO, R2, Supabase storage, ...).
    #[builder(default)]
    pub store_endpoint: Option<String>,

    /// Region used to sign store requests.
    #[builder(default = String::from("us-east-1"))]
    pub store_region: String,

    /// Static access key; the default credential chain is used when unset.
    #[builder(default)]
    pub store_access_key_id: Option<String>,

    /// Static secret key paired with `store_access_key_id`.
    #[serde(skip_serializing)]
    #[builder(default)]
    pub store_secret_access_key: Option<String>,

    /// Bucket holding every resource.
    #[builder(default = String::from("recursos"))]
    pub store_bucket: String,

    /// Whether to address the bucket path-style (required by most self-hosted stores).
    #[builder(default = true)]
    pub store_force_path_style: bool,

    /// Base URL under which stored keys are publicly browsable.
    #[builder(default)]
    pub public_url_base: Option<String>,

    /// Maximum number of concurrent uploads in a bulk upload.
    #[builder(default = 4)]
    pub bulk_upload_concurrency: usize,
}

impl fmt::Debug for CourseShelfConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CourseShelfConfig")
            .field("gateway_listen", &self.gateway_listen)
            .field("log_level", &self.log_level)
            .field("store_backend", &self.store_backend)
            .field("store_endpoint", &self.store_endpoint)
            .field("store_region", &self.store_region)
            .field("store_access_key_id", &self.store_access_key_id)
            .field(
                "store_secret_access_key",
                &self.store_secret_access_key.as_ref().map(|_| "..."),
            )
            .field("store_bucket", &self.store_bucket)
            .field("store_force_path_style", &self.store_force_path_style)
            .field("public_url_base", &self.public_url_base)
            .field("bulk_upload_concurrency", &self.bulk_upload_concurrency)
            .finish()
    }
}

impl Default for CourseShelfConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CourseShelfConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:3001` |
    /// | `PORT` | *(unset; replaces the port of `GATEWAY_LISTEN`)* |
    /// | `LOG_LEVEL` | `info` |
    /// | `STORE_BACKEND` | `s3` |
    /// | `STORE_ENDPOINT` | *(unset)* |
    /// | `STORE_REGION` | `us-east-1` |
    /// | `STORE_ACCESS_KEY_ID` / `AWS_ACCESS_KEY_ID` | *(unset)* |
    /// | `STORE_SECRET_ACCESS_KEY` / `AWS_SECRET_ACCESS_KEY` | *(unset)* |
    /// | `STORE_BUCKET` | `recursos` |
    /// | `STORE_FORCE_PATH_STYLE` | `true` |
    /// | `PUBLIC_URL_BASE` | *(unset)* |
    /// | `BULK_UPLOAD_CONCURRENCY` | `4` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable values are ignored and the default is kept.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(port) = non_empty("PORT").and_then(|v| v.trim().parse::<u16>().ok()) {
            config.gateway_listen = with_port(&config.gateway_listen, port);
        }
        if let Some(v) = non_empty("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Some(backend) = non_empty("STORE_BACKEND").and_then(|v| v.parse().ok()) {
            config.store_backend = backend;
        }
        config.store_endpoint = non_empty("STORE_ENDPOINT");
        if let Some(v) = non_empty("STORE_REGION").or_else(|| non_empty("AWS_REGION")) {
            config.store_region = v;
        }
        config.store_access_key_id =
            non_empty("STORE_ACCESS_KEY_ID").or_else(|| non_empty("AWS_ACCESS_KEY_ID"));
        config.store_secret_access_key =
            non_empty("STORE_SECRET_ACCESS_KEY").or_else(|| non_empty("AWS_SECRET_ACCESS_KEY"));
        if let Some(v) = non_empty("STORE_BUCKET") {
            config.store_bucket = v;
        }
        if let Some(v) = non_empty("STORE_FORCE_PATH_STYLE") {
            config.store_force_path_style = parse_bool(&v);
        }
        config.public_url_base = non_empty("PUBLIC_URL_BASE");
        if let Some(n) = non_empty("BULK_UPLOAD_CONCURRENCY")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
        {
            config.bulk_upload_concurrency = n;
        }

        config
    }

    /// Whether static credentials are configured.
    #[must_use]
    pub fn has_static_credentials(&self) -> bool {
        self.store_access_key_id.is_some() && self.store_secret_access_key.is_some()
    }
}

/// Replace the port of a `host:port` bind address.
fn with_port(listen: &str, port: u16) -> String {
    let host = listen.rsplit_once(':').map_or(listen, |(host, _)| host);
    format!("{host}:{port}")
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
