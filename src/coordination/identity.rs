//! Identity allocation backed by the store's atomic counter.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::{CoordinationStore, IncrementRequest};
use crate::coordination::error::CoordinationError;
use crate::coordination::lock::{ContentLock, LockConfig};

/// Key namespace for the disposable per-call allocation locks.
const ALLOC_LOCK_PREFIX: &str = "lock:item:id:";

/// Hands out globally unique, strictly increasing integer identities.
///
/// Each allocation guards the counter increment with a disposable lock on a
/// fresh random name; the increment itself is already atomic in the store,
/// so two allocations never observe each other through the lock.
pub struct IdentityAllocator<S: CoordinationStore + ?Sized> {
    store: Arc<S>,
    counter_key: String,
    lock_config: LockConfig,
}

impl<S: CoordinationStore + ?Sized> IdentityAllocator<S> {
    /// Create an allocator over the shared counter at `counter_key`.
    pub fn new(store: Arc<S>, counter_key: impl Into<String>, lock_config: LockConfig) -> Self {
        Self {
            store,
            counter_key: counter_key.into(),
            lock_config,
        }
    }

    /// Allocate the next identity.
    ///
    /// Returns the post-increment counter value, or `0` when the guarding
    /// lock was not granted. `0` therefore means "no identity assigned" and
    /// must never be treated as a real identity; no retry is attempted.
    /// The disposable lock is released on every path.
    pub async fn next_identity(&self) -> Result<u64, CoordinationError> {
        let scratch_key = format!("{ALLOC_LOCK_PREFIX}{}", Uuid::new_v4());
        let lock = ContentLock::new(self.store.clone(), scratch_key, self.lock_config.clone());

        let allocated = if lock.try_acquire().await? {
            self.store
                .increment(IncrementRequest::new(&self.counter_key))
                .await
                .map(|result| {
                    debug!(
                        counter = %self.counter_key,
                        value = result.value,
                        "identity allocated"
                    );
                    result.value
                })
                .map_err(CoordinationError::from)
        } else {
            warn!(
                counter = %self.counter_key,
                "allocation lock not granted, no identity assigned"
            );
            Ok(0)
        };

        if let Err(error) = lock.release().await {
            warn!(
                key = lock.key(),
                %error,
                "allocation lock release failed, key expires via TTL"
            );
        }

        allocated
    }
}
