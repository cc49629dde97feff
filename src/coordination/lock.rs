//! Content-keyed distributed lock.
//!
//! Mutual exclusion across processes for a named resource, with TTL-based
//! expiry as the crash-recovery bound. Acquisition is single-shot: there is
//! no retry, queueing, or fairness; callers decide what a failed acquisition
//! means for them.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::api::{ConditionalDeleteRequest, CoordinationStore, SetIfAbsentRequest};
use crate::coordination::error::CoordinationError;

/// Configuration for content-keyed locks.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Time-to-live for the lock key in milliseconds. Bounds how long a
    /// crashed holder can block others.
    pub ttl_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self { ttl_ms: 30_000 } // 30 seconds
    }
}

/// A single-resource distributed lock handle.
///
/// Each acquisition writes a fresh random token under the lock key. The key
/// exists in the store iff some caller holds the lock or an abandoned hold
/// has not yet expired.
pub struct ContentLock<S: CoordinationStore + ?Sized> {
    store: Arc<S>,
    key: String,
    config: LockConfig,
}

impl<S: CoordinationStore + ?Sized> ContentLock<S> {
    /// Create a new lock handle for `key`.
    pub fn new(store: Arc<S>, key: impl Into<String>, config: LockConfig) -> Self {
        Self {
            store,
            key: key.into(),
            config,
        }
    }

    /// Attempt to take the lock without blocking.
    ///
    /// Returns `true` only if this call created the lock key; `false` means
    /// another holder existed at that instant and is a normal outcome, not
    /// an error. Store failures are errors.
    pub async fn try_acquire(&self) -> Result<bool, CoordinationError> {
        let token = Uuid::new_v4().to_string();
        let result = self
            .store
            .try_set_if_absent(SetIfAbsentRequest::new(&self.key, &token, self.config.ttl_ms))
            .await?;

        if result.created {
            debug!(
                key = %self.key,
                token = %token,
                ttl_ms = self.config.ttl_ms,
                "lock acquired"
            );
        } else {
            debug!(key = %self.key, "lock already held");
        }

        Ok(result.created)
    }

    /// Release the lock.
    ///
    /// Deletes the lock key if it currently exists, as one server-side
    /// operation. The stored token is not compared: a release that runs
    /// after this holder's TTL has expired will delete whichever token a
    /// successor wrote in the meantime, reopening that successor's critical
    /// section.
    ///
    /// Returns `true` if a key was deleted.
    pub async fn release(&self) -> Result<bool, CoordinationError> {
        let result = self
            .store
            .conditional_delete(ConditionalDeleteRequest::new(&self.key))
            .await?;

        if result.deleted {
            debug!(key = %self.key, "lock released");
        } else {
            debug!(key = %self.key, "lock already gone at release");
        }

        Ok(result.deleted)
    }

    /// Get the lock key.
    pub fn key(&self) -> &str {
        &self.key
    }
}
