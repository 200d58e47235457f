//! In-memory store implementations for development and tests.

use super::{
    Document, DocumentAtomic, DocumentOperation, DocumentPath, DocumentStore, SessionStore,
    StoreError,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

// Path segments are joined with a separator that cannot appear in ids or
// identifications, so distinct paths never collide on one map key.
const PATH_SEPARATOR: char = '\u{1f}';

fn path_key(path: &[String]) -> String {
    path.join(&PATH_SEPARATOR.to_string())
}

#[derive(Default)]
struct Documents {
    entries: BTreeMap<String, (DocumentPath, Value, u64)>,
    next_versionstamp: u64,
}

/// Versionstamped document store held in one map behind a single lock, which
/// makes every commit trivially atomic.
#[derive(Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Documents>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &[String]) -> Result<Document, StoreError> {
        let inner = self.inner.read().await;
        let (stored_path, data, versionstamp) = inner
            .entries
            .get(&path_key(path))
            .ok_or(StoreError::NotFound)?;
        Ok(Document {
            path: stored_path.clone(),
            data: data.clone(),
            versionstamp: versionstamp.to_string(),
        })
    }

    async fn commit(&self, atomic: DocumentAtomic) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;

        for check in &atomic.checks {
            let current = inner.entries.get(&path_key(&check.path));
            let matches = match (&check.versionstamp, current) {
                (None, None) => true,
                (Some(expected), Some((_, _, versionstamp))) => {
                    *expected == versionstamp.to_string()
                }
                _ => false,
            };
            if !matches {
                return Err(StoreError::CommitConflict);
            }
        }

        inner.next_versionstamp += 1;
        let versionstamp = inner.next_versionstamp;
        for operation in atomic.operations {
            match operation {
                DocumentOperation::Set { path, data } => {
                    inner
                        .entries
                        .insert(path_key(&path), (path, data, versionstamp));
                }
                DocumentOperation::Delete { path } => {
                    inner.entries.remove(&path_key(&path));
                }
            }
        }
        Ok(())
    }
}

/// Expiring key-value store for session records.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<String, (Value, Instant)>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                // Lazily drop the expired record.
                inner.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.insert(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.remove(key) {
            Some((_, expires_at)) => Ok(expires_at > Instant::now()),
            None => Ok(false),
        }
    }
}
