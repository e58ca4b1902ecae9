//! S3-compatible object store backed by `aws-sdk-s3`.
//!
//! Works against AWS S3 and any compatible endpoint (MinIO, R2, Supabase
//! storage's S3 gateway, ...). Listing uses `ListObjectsV2` with a `/`
//! delimiter so sub-prefixes are never descended into, and follows
//! continuation tokens until the listing is exhausted.

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream, DateTime as SmithyDateTime};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use percent_encoding::utf8_percent_encode;
use tracing::{debug, trace};

use super::{KEY_ESCAPE_SET, ObjectEntry, ObjectStore};
use crate::config::CourseShelfConfig;
use crate::error::{StoreError, StoreResult};

/// Object store talking to one bucket of an S3-compatible service.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the service configuration.
    ///
    /// Static credentials are used when both keys are configured; otherwise
    /// the default AWS credential chain applies.
    pub async fn from_config(config: &CourseShelfConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.store_region.clone()));

        if let (Some(access_key), Some(secret_key)) = (
            &config.store_access_key_id,
            &config.store_secret_access_key,
        ) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "courseshelf-static",
            ));
        }
        if let Some(endpoint) = &config.store_endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.store_force_path_style)
            .build();

        debug!(
            bucket = %config.store_bucket,
            endpoint = ?config.store_endpoint,
            region = %config.store_region,
            "created S3 object store client"
        );

        Self::new(Client::from_conf(s3_config), config.store_bucket.clone())
    }

    /// The bucket this store writes to.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn copy_source(&self, key: &str) -> String {
        format!(
            "{}/{}",
            self.bucket,
            utf8_percent_encode(key, KEY_ESCAPE_SET)
        )
    }
}

/// Convert a store timestamp, falling back to the epoch when out of range.
fn to_chrono(ts: Option<&SmithyDateTime>) -> DateTime<Utc> {
    ts.and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
        .unwrap_or_default()
}

fn to_size(len: Option<i64>) -> u64 {
    len.and_then(|n| u64::try_from(n).ok()).unwrap_or_default()
}

fn unavailable<E: std::error::Error>(operation: &str, err: E) -> StoreError {
    StoreError::Unavailable(format!("{operation}: {}", DisplayErrorContext(err)))
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectEntry>> {
        let mut entries = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .delimiter("/")
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| unavailable("ListObjectsV2", e))?;

            entries.extend(output.contents().iter().filter_map(|obj| {
                let key = obj.key()?;
                // Some stores return a zero-byte placeholder for the prefix itself.
                if key == prefix {
                    return None;
                }
                Some(ObjectEntry {
                    key: key.to_owned(),
                    size: to_size(obj.size()),
                    last_modified: to_chrono(obj.last_modified()),
                    etag: obj.e_tag().map(ToOwned::to_owned),
                    content_type: None,
                })
            }));

            if output.is_truncated() == Some(true) {
                continuation_token = output.next_continuation_token().map(ToOwned::to_owned);
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        trace!(bucket = %self.bucket, prefix, count = entries.len(), "listed objects");
        Ok(entries)
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StoreResult<ObjectEntry> {
        let size = body.len() as u64;
        let output = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| unavailable("PutObject", e))?;

        trace!(bucket = %self.bucket, key, size, "put object");
        Ok(ObjectEntry {
            key: key.to_owned(),
            size,
            last_modified: Utc::now(),
            etag: output.e_tag().map(ToOwned::to_owned),
            content_type: Some(content_type.to_owned()),
        })
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StoreError::NotFound {
                        key: key.to_owned(),
                    }
                } else {
                    unavailable("GetObject", e)
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| unavailable("GetObject body", e))?;
        Ok(data.into_bytes())
    }

    async fn head(&self, key: &str) -> StoreResult<Option<ObjectEntry>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => Ok(Some(ObjectEntry {
                key: key.to_owned(),
                size: to_size(output.content_length()),
                last_modified: to_chrono(output.last_modified()),
                etag: output.e_tag().map(ToOwned::to_owned),
                content_type: output.content_type().map(ToOwned::to_owned),
            })),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(None),
            Err(e) => Err(unavailable("HeadObject", e)),
        }
    }

    async fn copy(&self, source: &str, destination: &str) -> StoreResult<()> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .copy_source(self.copy_source(source))
            .key(destination)
            .send()
            .await
            .map_err(|e| unavailable("CopyObject", e))?;

        debug!(bucket = %self.bucket, source, destination, "copied object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| unavailable("DeleteObject", e))?;

        trace!(bucket = %self.bucket, key, "deleted object");
        Ok(())
    }
}
