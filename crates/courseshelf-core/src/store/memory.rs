//! In-memory object store.
//!
//! [`InMemoryObjectStore`] keeps every object in a [`DashMap`] keyed by the
//! full object key. It behaves like an S3 bucket for the operations the
//! [`ObjectStore`] trait exposes: puts overwrite, deletes of absent keys
//! succeed, copies of absent keys fail with [`StoreError::NotFound`].
//!
//! # Failure injection
//!
//! Failures can be scheduled per operation (and optionally per key fragment)
//! with [`InMemoryObjectStore::fail_on`] and
//! [`InMemoryObjectStore::fail_on_key`]. A scheduled failure is reported as
//! [`StoreError::Unavailable`] every time a matching call is made, until
//! [`InMemoryObjectStore::clear_failures`] is called. The store state is not
//! touched by a failed call.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use md5::{Digest, Md5};
use tracing::{debug, trace};

use super::{ObjectEntry, ObjectStore, is_direct_child};
use crate::error::{StoreError, StoreResult};

/// The store call a failure rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// [`ObjectStore::list`].
    List,
    /// [`ObjectStore::put`].
    Put,
    /// [`ObjectStore::get`].
    Get,
    /// [`ObjectStore::head`].
    Head,
    /// [`ObjectStore::copy`] (matched against the destination key).
    Copy,
    /// [`ObjectStore::delete`].
    Delete,
}

#[derive(Debug, Clone)]
struct FailureRule {
    key_fragment: Option<String>,
    message: String,
}

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Bytes,
    content_type: String,
    etag: String,
    last_modified: DateTime<Utc>,
}

impl MemoryObject {
    fn entry(&self, key: &str) -> ObjectEntry {
        ObjectEntry {
            key: key.to_owned(),
            size: self.data.len() as u64,
            last_modified: self.last_modified,
            etag: Some(self.etag.clone()),
            content_type: Some(self.content_type.clone()),
        }
    }
}

/// Thread-safe in-memory object store.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use courseshelf_core::store::{InMemoryObjectStore, ObjectStore};
///
/// # tokio_test::block_on(async {
/// let store = InMemoryObjectStore::new();
/// store.put("eii/CII-2750/a.txt", Bytes::from("hello"), "text/plain").await.unwrap();
/// let data = store.get("eii/CII-2750/a.txt").await.unwrap();
/// assert_eq!(data.as_ref(), b"hello");
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: DashMap<String, MemoryObject>,
    failures: DashMap<StoreOperation, Vec<FailureRule>>,
}

impl InMemoryObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `op` fail with `message`.
    pub fn fail_on(&self, op: StoreOperation, message: impl Into<String>) {
        self.failures.entry(op).or_default().push(FailureRule {
            key_fragment: None,
            message: message.into(),
        });
    }

    /// Make calls of `op` whose key contains `key_fragment` fail with `message`.
    pub fn fail_on_key(
        &self,
        op: StoreOperation,
        key_fragment: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.failures.entry(op).or_default().push(FailureRule {
            key_fragment: Some(key_fragment.into()),
            message: message.into(),
        });
    }

    /// Remove every scheduled failure.
    pub fn clear_failures(&self) {
        self.failures.clear();
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether `key` exists.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Remove every object and scheduled failure.
    pub fn reset(&self) {
        self.objects.clear();
        self.failures.clear();
    }

    fn check_failure(&self, op: StoreOperation, key: &str) -> StoreResult<()> {
        let Some(rules) = self.failures.get(&op) else {
            return Ok(());
        };
        let hit = rules.iter().find(|rule| {
            rule.key_fragment
                .as_deref()
                .is_none_or(|fragment| key.contains(fragment))
        });
        match hit {
            Some(rule) => {
                debug!(?op, key, message = %rule.message, "injected store failure");
                Err(StoreError::Unavailable(rule.message.clone()))
            }
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list(&self, prefix: &str) -> StoreResult<Vec<ObjectEntry>> {
        self.check_failure(StoreOperation::List, prefix)?;
        let entries: Vec<ObjectEntry> = self
            .objects
            .iter()
            .filter(|item| is_direct_child(prefix, item.key()))
            .map(|item| item.value().entry(item.key()))
            .collect();
        trace!(prefix, count = entries.len(), "listed objects");
        Ok(entries)
    }

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StoreResult<ObjectEntry> {
        self.check_failure(StoreOperation::Put, key)?;
        let etag = format!("\"{}\"", hex::encode(Md5::digest(&body)));
        let stored = MemoryObject {
            data: body,
            content_type: content_type.to_owned(),
            etag,
            last_modified: Utc::now(),
        };
        let entry = stored.entry(key);
        self.objects.insert(key.to_owned(), stored);
        trace!(key, size = entry.size, "stored object");
        Ok(entry)
    }

    async fn get(&self, key: &str) -> StoreResult<Bytes> {
        self.check_failure(StoreOperation::Get, key)?;
        self.objects
            .get(key)
            .map(|obj| obj.data.clone())
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_owned(),
            })
    }

    async fn head(&self, key: &str) -> StoreResult<Option<ObjectEntry>> {
        self.check_failure(StoreOperation::Head, key)?;
        Ok(self.objects.get(key).map(|obj| obj.entry(key)))
    }

    async fn copy(&self, source: &str, destination: &str) -> StoreResult<()> {
        self.check_failure(StoreOperation::Copy, destination)?;
        // Clone out before inserting: holding a read guard on `source` while
        // inserting `destination` can deadlock when both hash to one shard.
        let stored = self
            .objects
            .get(source)
            .map(|obj| obj.value().clone())
            .ok_or_else(|| StoreError::NotFound {
                key: source.to_owned(),
            })?;
        let copied = MemoryObject {
            last_modified: Utc::now(),
            ..stored
        };
        self.objects.insert(destination.to_owned(), copied);
        debug!(source, destination, "copied object");
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.check_failure(StoreOperation::Delete, key)?;
        if self.objects.remove(key).is_some() {
            trace!(key, "deleted object");
        }
        Ok(())
    }
}
