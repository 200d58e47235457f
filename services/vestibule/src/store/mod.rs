//! Narrow collaborator interfaces: document storage, session storage, and
//! notification delivery.
//!
//! The ceremony core never talks to a concrete backend; it consumes these
//! traits. The in-memory implementations in [`memory`] back development
//! servers and the test suite. Each trait is deliberately minimal: the
//! document store only needs versioned reads and one conditional batch
//! commit, the session store is a TTL'd key-value map, and the notifier is
//! fire-and-forget.

pub mod memory;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("atomic commit conflict")]
    CommitConflict,
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Hierarchical document path, e.g. `["identities", id, "components", "email"]`.
pub type DocumentPath = Vec<String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub data: Value,
    pub versionstamp: String,
}

/// One conditional write batch.
///
/// Checks and operations accumulate builder-style and commit as a unit; any
/// failed check aborts the whole batch with [`StoreError::CommitConflict`].
#[derive(Debug, Default)]
pub struct DocumentAtomic {
    pub(crate) checks: Vec<DocumentCheck>,
    pub(crate) operations: Vec<DocumentOperation>,
}

#[derive(Debug)]
pub(crate) struct DocumentCheck {
    pub(crate) path: DocumentPath,
    /// `None` asserts the document must not exist.
    pub(crate) versionstamp: Option<String>,
}

#[derive(Debug)]
pub(crate) enum DocumentOperation {
    Set { path: DocumentPath, data: Value },
    Delete { path: DocumentPath },
}

impl DocumentAtomic {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn check(mut self, path: DocumentPath, versionstamp: Option<String>) -> Self {
        self.checks.push(DocumentCheck { path, versionstamp });
        self
    }

    #[must_use]
    pub fn set(mut self, path: DocumentPath, data: Value) -> Self {
        self.operations.push(DocumentOperation::Set { path, data });
        self
    }

    #[must_use]
    pub fn delete(mut self, path: DocumentPath) -> Self {
        self.operations.push(DocumentOperation::Delete { path });
        self
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; [`StoreError::NotFound`] when absent.
    async fn get(&self, path: &[String]) -> Result<Document, StoreError>;

    /// Apply a conditional batch. All checks are evaluated against the
    /// current state before any operation is applied.
    async fn commit(&self, atomic: DocumentAtomic) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Store or replace a value; the record expires after `ttl`.
    async fn put(&self, key: &str, value: Value, ttl: Duration) -> Result<(), StoreError>;

    /// Remove a record. Returns whether one was present; never errors on a
    /// missing key.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

/// Out-of-band message addressed to an identity, keyed by MIME type.
#[derive(Debug, Clone)]
pub struct Notification {
    pub subject: String,
    pub content: HashMap<String, String>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification; returns whether delivery was accepted.
    async fn notify(&self, identity_id: &str, notification: &Notification) -> bool;
}

/// Logs instead of delivering. Development and test default.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, identity_id: &str, notification: &Notification) -> bool {
        info!(
            identity_id,
            subject = %notification.subject,
            "notification delivered to log sink"
        );
        true
    }
}
