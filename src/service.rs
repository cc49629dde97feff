//! Duplicate-suppressing save orchestration.
//!
//! The caller-facing entry point. A save runs through two dedup gates
//! before touching the repository: an existence pre-check (committed or
//! in-flight content) and a content-keyed save lock in the orchestrator's
//! own key namespace. The repository's write lock underneath is a separate,
//! non-unified layer; the two nest outer-then-inner.

use std::sync::Arc;

use snafu::{ResultExt, Snafu};
use tracing::{debug, info, warn};

use crate::api::CoordinationStore;
use crate::coordination::{ContentLock, CoordinationError, LockConfig};
use crate::repository::{ItemBackend, RepositoryError};
use crate::types::{Item, SaveOutcome};

/// Key namespace for the orchestrator's save locks.
pub const SAVE_LOCK_PREFIX: &str = "lock:item:save:";

/// Save-lock key for `content`.
///
/// Case is folded so that equal-content callers contend on one key
/// regardless of casing.
pub fn save_lock_key(content: &str) -> String {
    format!("{SAVE_LOCK_PREFIX}{}", content.to_ascii_lowercase())
}

/// Errors from the save orchestrator.
///
/// Duplicates are never errors; they are `SaveOutcome { success: false }`.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ServiceError {
    /// Backend failure while persisting the item.
    #[snafu(display("backend failure: {source}"))]
    Backend {
        /// The underlying error.
        source: RepositoryError,
    },

    /// Coordination layer failure.
    #[snafu(display("coordination error: {source}"))]
    Coordination {
        /// The underlying error.
        source: CoordinationError,
    },
}

/// Configuration for the save orchestrator.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Configuration for the save locks.
    pub lock: LockConfig,
}

/// Caller-facing dedup save service.
///
/// Safe to share across tasks; calls with different content execute fully
/// in parallel, calls with equal content are serialized by the lock layers.
pub struct ItemIntegrationService<S: CoordinationStore + ?Sized> {
    store: Arc<S>,
    backend: Arc<dyn ItemBackend>,
    config: ServiceConfig,
}

impl<S: CoordinationStore + ?Sized> ItemIntegrationService<S> {
    /// Create a new service over `store` and `backend`.
    pub fn new(store: Arc<S>, backend: Arc<dyn ItemBackend>, config: ServiceConfig) -> Self {
        Self {
            store,
            backend,
            config,
        }
    }

    /// Save `content` unless an equal-content item exists or is in flight.
    ///
    /// Duplicate suppression is reported as a `SaveOutcome` with
    /// `success == false`; only infrastructure failures are errors. The
    /// save lock is released on every exit path.
    pub async fn save_item(&self, content: &str) -> Result<SaveOutcome, ServiceError> {
        // First dedup gate: committed items and in-flight repository writes.
        if self
            .backend
            .item_exists(content)
            .await
            .context(BackendSnafu)?
        {
            debug!(content, "duplicate rejected at pre-check");
            return Ok(SaveOutcome::duplicate(content));
        }

        // Second gate: the save lock. Held means an equal-content save is
        // in progress somewhere, which is the same duplicate outcome.
        let lock = ContentLock::new(
            self.store.clone(),
            save_lock_key(content),
            self.config.lock.clone(),
        );
        if !lock.try_acquire().await.context(CoordinationSnafu)? {
            debug!(content, "duplicate rejected at save lock");
            return Ok(SaveOutcome::duplicate(content));
        }

        let saved = self.backend.save_item(content).await;

        if let Err(error) = lock.release().await {
            warn!(key = lock.key(), %error, "save lock release failed, key expires via TTL");
        }

        match saved {
            Ok(item) => {
                info!(id = item.id, content = %item.content, "item saved");
                Ok(SaveOutcome::saved(&item))
            }
            // The repository's write lock is content-keyed too: denied means
            // an equal-content save won the inner race.
            Err(RepositoryError::LockUnavailable { .. }) => {
                debug!(content, "duplicate rejected at write lock");
                Ok(SaveOutcome::duplicate(content))
            }
            Err(source) => Err(ServiceError::Backend { source }),
        }
    }

    /// Snapshot of everything saved so far.
    pub async fn all_items(&self) -> Vec<Item> {
        self.backend.all_items().await
    }
}
