//! Resource operations over an [`ObjectStore`].
//!
//! [`ResourceService`] is stateless apart from its immutable settings; the
//! store is the only source of truth. Every operation validates its input
//! before touching the store, and store failures are surfaced verbatim
//! through [`ResourceError`].
//!
//! Rename is emulated as copy-then-delete because object stores have no
//! native rename:
//!
//! ```text
//! Start -> CopyInFlight -> CopyFailed
//!                       -> CopySucceeded -> DeleteInFlight -> Renamed
//!                                                          -> PartialRename
//! ```
//!
//! `CopyFailed` maps to [`ResourceError::RenameCopyFailed`] and
//! `PartialRename` to [`ResourceError::RenamedButOriginalNotRemoved`]. A
//! partial rename is never compensated by deleting the new object.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use percent_encoding::utf8_percent_encode;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregate::{BulkReport, aggregate};
use crate::config::CourseShelfConfig;
use crate::error::{ResourceError, ResourceResult};
use crate::path::{ResourcePath, resolve};
use crate::sanitize::{collation_key, sanitize, validate_segment};
use crate::store::{KEY_ESCAPE_SET, ObjectEntry, ObjectStore};

/// Page size used when a listing request does not specify one.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Worker count used for bulk uploads when none is configured.
pub const DEFAULT_BULK_UPLOAD_CONCURRENCY: usize = 4;

/// A window over a sorted listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of entries returned.
    pub limit: usize,
    /// Number of entries skipped.
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

/// One object in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredObject {
    /// Full storage key.
    pub key: String,
    /// Last key segment.
    pub display_name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub last_modified: DateTime<Utc>,
    /// Entity tag, when the store reports one.
    pub etag: Option<String>,
    /// Content type, when the store reports one.
    pub content_type: Option<String>,
    /// Public URL, when a public URL base is configured.
    pub public_url: Option<String>,
}

/// Key (and URL) of an object written by an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenObject {
    /// Full storage key.
    pub key: String,
    /// Public URL, when a public URL base is configured.
    pub public_url: Option<String>,
}

/// List, upload, rename, delete, and bulk-upload course resources.
#[derive(Debug, Clone)]
pub struct ResourceService {
    store: Arc<dyn ObjectStore>,
    public_url_base: Option<String>,
    bulk_upload_concurrency: usize,
}

impl ResourceService {
    /// Create a service without public URLs and with the default bulk concurrency.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            public_url_base: None,
            bulk_upload_concurrency: DEFAULT_BULK_UPLOAD_CONCURRENCY,
        }
    }

    /// Create a service using the settings of `config`.
    #[must_use]
    pub fn from_config(store: Arc<dyn ObjectStore>, config: &CourseShelfConfig) -> Self {
        Self::new(store)
            .with_public_url_base(config.public_url_base.clone())
            .with_bulk_upload_concurrency(config.bulk_upload_concurrency)
    }

    /// Set the base that public URLs are built from (`None` disables URLs).
    #[must_use]
    pub fn with_public_url_base(mut self, base: Option<String>) -> Self {
        self.public_url_base = base
            .map(|b| b.trim_end_matches('/').to_owned())
            .filter(|b| !b.is_empty());
        self
    }

    /// Set the number of concurrent uploads in a bulk upload (at least one).
    #[must_use]
    pub fn with_bulk_upload_concurrency(mut self, workers: usize) -> Self {
        self.bulk_upload_concurrency = workers.max(1);
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Public URL of `key`, if a public URL base is configured.
    #[must_use]
    pub fn public_url(&self, key: &str) -> Option<String> {
        self.public_url_base
            .as_ref()
            .map(|base| format!("{base}/{}", utf8_percent_encode(key, KEY_ESCAPE_SET)))
    }

    fn written(&self, key: String) -> WrittenObject {
        let public_url = self.public_url(&key);
        WrittenObject { key, public_url }
    }

    fn stored_object(&self, entry: ObjectEntry) -> StoredObject {
        let display_name = entry
            .key
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_owned();
        let public_url = self.public_url(&entry.key);
        StoredObject {
            key: entry.key,
            display_name,
            size: entry.size,
            last_modified: entry.last_modified,
            etag: entry.etag,
            content_type: entry.content_type,
            public_url,
        }
    }

    /// List the objects directly under `path`, sorted by name.
    ///
    /// Names are ordered case- and accent-insensitively, with the raw name
    /// as tie-breaker. A prefix with no objects yields an empty list, as does
    /// an offset past the end.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::StoreUnavailable`] if the listing fails.
    pub async fn list(&self, path: &ResourcePath, page: Page) -> ResourceResult<Vec<StoredObject>> {
        let prefix = path.list_prefix();
        let entries = self.store.list(&prefix).await?;
        let total = entries.len();

        let mut objects: Vec<StoredObject> = entries
            .into_iter()
            .map(|entry| self.stored_object(entry))
            .collect();
        objects.sort_by_cached_key(|obj| (collation_key(&obj.display_name), obj.display_name.clone()));

        let page: Vec<StoredObject> = objects
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();
        debug!(prefix = %prefix, total, returned = page.len(), "listed resources");
        Ok(page)
    }

    /// Upload `data` under `path`, naming it after the sanitized `original_name`.
    ///
    /// An existing object with the same key is replaced. A missing content
    /// type is stored as `application/octet-stream`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::EmptyUpload`] when `data` is empty,
    /// [`ResourceError::InvalidName`] when the name sanitizes to nothing, and
    /// [`ResourceError::StoreUnavailable`] if the put fails.
    pub async fn upload(
        &self,
        path: &ResourcePath,
        data: Bytes,
        original_name: &str,
        content_type: Option<&str>,
    ) -> ResourceResult<WrittenObject> {
        if data.is_empty() {
            return Err(ResourceError::EmptyUpload);
        }
        let name = sanitize(original_name)?;
        let key = path.child_key(&name);
        let fallback = mime::APPLICATION_OCTET_STREAM;
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(fallback.essence_str());

        let entry = self.store.put(&key, data, content_type).await?;
        info!(key = %key, size = entry.size, content_type, "uploaded resource");
        Ok(self.written(key))
    }

    /// Upload every regular file directly inside `folder` to the course folder.
    ///
    /// Directories and symbolic links are skipped and nothing is recursed
    /// into. Files keep their original name and are stored as
    /// `application/octet-stream`. Files are processed in name order, up to
    /// the configured number at a time; a failure of one file never stops
    /// the others and is reported in its own [`BulkResult`](crate::aggregate::BulkResult).
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingParameter`] when either argument is
    /// empty, [`ResourceError::InvalidPath`] for an unusable course path, and
    /// [`ResourceError::InvalidFolder`] when `folder` is not a readable
    /// directory.
    pub async fn bulk_upload_from_folder(
        &self,
        course_id: &str,
        folder: &Path,
    ) -> ResourceResult<BulkReport> {
        require("curso", course_id)?;
        if folder.as_os_str().is_empty() {
            return Err(ResourceError::MissingParameter("carpeta".to_owned()));
        }
        let resolved = resolve(course_id)?;
        let files = regular_files(folder).await?;
        debug!(
            folder = %folder.display(),
            course = %resolved,
            files = files.len(),
            "starting bulk upload"
        );

        let resolved = &resolved;
        let outcomes: Vec<(String, ResourceResult<String>)> = stream::iter(files)
            .map(|(file_path, file_name)| async move {
                let display = file_name.to_string_lossy().into_owned();
                let outcome = self.upload_local_file(resolved, &file_path, file_name).await;
                (display, outcome)
            })
            .buffered(self.bulk_upload_concurrency)
            .collect()
            .await;

        let report = aggregate(outcomes);
        if report.failed() > 0 {
            warn!(
                course = %resolved,
                succeeded = report.succeeded(),
                failed = report.failed(),
                "bulk upload finished with failures"
            );
        } else {
            info!(course = %resolved, succeeded = report.succeeded(), "bulk upload finished");
        }
        Ok(report)
    }

    async fn upload_local_file(
        &self,
        course: &ResourcePath,
        file_path: &Path,
        file_name: OsString,
    ) -> ResourceResult<String> {
        let name = file_name.into_string().map_err(|raw| {
            ResourceError::invalid_name(&raw.to_string_lossy(), "file name is not valid UTF-8")
        })?;
        validate_segment(&name)?;
        let data = tokio::fs::read(file_path)
            .await
            .map_err(|e| ResourceError::ReadFailed {
                path: file_path.display().to_string(),
                detail: e.to_string(),
            })?;

        let key = course.child_key(&name);
        let content_type = mime::APPLICATION_OCTET_STREAM;
        self.store
            .put(&key, Bytes::from(data), content_type.essence_str())
            .await?;
        debug!(key = %key, "bulk uploaded file");
        Ok(key)
    }

    /// Rename `current_name` to `new_name` inside the course folder.
    ///
    /// Renaming a file to its own name succeeds without touching the store
    /// beyond the existence check.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingParameter`] or
    /// [`ResourceError::InvalidName`] before any store call,
    /// [`ResourceError::NotFound`] when the source does not exist,
    /// [`ResourceError::RenameCopyFailed`] when the copy fails (nothing was
    /// changed), and [`ResourceError::RenamedButOriginalNotRemoved`] when the
    /// copy succeeded but the original could not be deleted.
    pub async fn rename(
        &self,
        course_id: &str,
        current_name: &str,
        new_name: &str,
    ) -> ResourceResult<WrittenObject> {
        require("curso", course_id)?;
        require("nombreActual", current_name)?;
        require("nombreNuevo", new_name)?;
        validate_segment(current_name)?;
        validate_segment(new_name)?;

        let resolved = resolve(course_id)?;
        let source_key = resolved.child_key(current_name);
        let destination_key = resolved.child_key(new_name);

        if self.store.head(&source_key).await?.is_none() {
            return Err(ResourceError::NotFound { key: source_key });
        }
        if source_key == destination_key {
            debug!(key = %source_key, "rename to same name, nothing to do");
            return Ok(self.written(destination_key));
        }

        if let Err(e) = self.store.copy(&source_key, &destination_key).await {
            warn!(source = %source_key, destination = %destination_key, error = %e, "rename copy failed");
            return Err(ResourceError::RenameCopyFailed {
                source_key,
                destination_key,
                detail: e.to_string(),
            });
        }

        if let Err(e) = self.store.delete(&source_key).await {
            warn!(
                source = %source_key,
                destination = %destination_key,
                error = %e,
                "renamed, but the original could not be deleted"
            );
            return Err(ResourceError::RenamedButOriginalNotRemoved {
                source_key,
                destination_key,
                detail: e.to_string(),
            });
        }

        info!(source = %source_key, destination = %destination_key, "renamed resource");
        Ok(self.written(destination_key))
    }

    /// Delete `name` from the course folder. Deleting an absent file succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingParameter`] or
    /// [`ResourceError::InvalidName`] before any store call, and
    /// [`ResourceError::StoreUnavailable`] if the delete fails.
    pub async fn delete(&self, course_id: &str, name: &str) -> ResourceResult<String> {
        require("curso", course_id)?;
        require("nombreArchivo", name)?;
        validate_segment(name)?;

        let key = resolve(course_id)?.child_key(name);
        self.store.delete(&key).await?;
        info!(key = %key, "deleted resource");
        Ok(key)
    }
}

fn require(parameter: &str, value: &str) -> ResourceResult<()> {
    if value.trim().is_empty() {
        Err(ResourceError::MissingParameter(parameter.to_owned()))
    } else {
        Ok(())
    }
}

/// Regular files directly inside `folder`, sorted by file name.
async fn regular_files(folder: &Path) -> ResourceResult<Vec<(PathBuf, OsString)>> {
    let invalid = || ResourceError::InvalidFolder(folder.display().to_string());

    // A symlink is not accepted as the folder itself.
    let metadata = tokio::fs::symlink_metadata(folder)
        .await
        .map_err(|_| invalid())?;
    if !metadata.is_dir() {
        return Err(invalid());
    }

    let mut read_dir = tokio::fs::read_dir(folder).await.map_err(|_| invalid())?;
    let mut files = Vec::new();
    while let Some(entry) = read_dir.next_entry().await.map_err(|_| invalid())? {
        // `DirEntry::file_type` does not follow symlinks.
        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => files.push((entry.path(), entry.file_name())),
            Ok(_) => {}
            Err(e) => debug!(path = %entry.path().display(), error = %e, "skipping unreadable entry"),
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}
