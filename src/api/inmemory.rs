//! In-memory implementation of [`CoordinationStore`] for testing.
//!
//! Provides a deterministic, non-persistent implementation of the store
//! trait for use in unit tests and integration tests. Mirrors the behavior
//! of the Redis backend, including key expiry, without network I/O.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    ConditionalDeleteRequest, ConditionalDeleteResult, CoordinationStore, ExistsRequest,
    ExistsResult, IncrementRequest, IncrementResult, SetIfAbsentRequest, SetIfAbsentResult,
    StoreError,
};

/// A stored value with an optional expiry deadline.
#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// In-memory deterministic implementation of [`CoordinationStore`].
///
/// Expired entries are dropped lazily on the next access to their key,
/// matching the observable behavior of server-side expiry.
#[derive(Default)]
pub struct DeterministicCoordinationStore {
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl DeterministicCoordinationStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Drop the entry under `key` if its expiry deadline has passed.
fn drop_if_expired(entries: &mut HashMap<String, StoredEntry>, key: &str) {
    if entries.get(key).is_some_and(StoredEntry::is_expired) {
        entries.remove(key);
    }
}

#[async_trait]
impl CoordinationStore for DeterministicCoordinationStore {
    async fn try_set_if_absent(
        &self,
        request: SetIfAbsentRequest,
    ) -> Result<SetIfAbsentResult, StoreError> {
        let mut entries = self.entries.lock().await;
        drop_if_expired(&mut entries, &request.key);

        let created = if entries.contains_key(&request.key) {
            false
        } else {
            entries.insert(
                request.key.clone(),
                StoredEntry {
                    value: request.value,
                    expires_at: Some(Instant::now() + Duration::from_millis(request.ttl_ms)),
                },
            );
            true
        };

        Ok(SetIfAbsentResult {
            key: request.key,
            created,
        })
    }

    async fn exists(&self, request: ExistsRequest) -> Result<ExistsResult, StoreError> {
        let mut entries = self.entries.lock().await;
        drop_if_expired(&mut entries, &request.key);

        let exists = entries.contains_key(&request.key);
        Ok(ExistsResult {
            key: request.key,
            exists,
        })
    }

    async fn increment(&self, request: IncrementRequest) -> Result<IncrementResult, StoreError> {
        let mut entries = self.entries.lock().await;
        drop_if_expired(&mut entries, &request.key);

        let current = match entries.get(&request.key) {
            Some(entry) => entry
                .value
                .parse::<u64>()
                .map_err(|_| StoreError::NotAnInteger {
                    key: request.key.clone(),
                })?,
            None => 0,
        };

        let value = current + 1;
        entries.insert(
            request.key.clone(),
            StoredEntry {
                value: value.to_string(),
                expires_at: None,
            },
        );

        Ok(IncrementResult {
            key: request.key,
            value,
        })
    }

    async fn conditional_delete(
        &self,
        request: ConditionalDeleteRequest,
    ) -> Result<ConditionalDeleteResult, StoreError> {
        let mut entries = self.entries.lock().await;
        drop_if_expired(&mut entries, &request.key);

        let deleted = entries.remove(&request.key).is_some();
        Ok(ConditionalDeleteResult {
            key: request.key,
            deleted,
        })
    }
}
