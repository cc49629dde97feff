//! Authoritative store of saved items.
//!
//! The repository is the second line of dedup defense, independent of the
//! orchestrator's lock: it guards the actual write with its own
//! content-keyed lock in a separate key namespace, and its existence check
//! observes both committed items and in-flight saves.

use std::sync::Arc;

use async_trait::async_trait;
use snafu::Snafu;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tracing::{debug, warn};

use crate::api::{CoordinationStore, ExistsRequest};
use crate::coordination::{ContentLock, CoordinationError, IdentityAllocator, LockConfig};
use crate::types::Item;

/// Key namespace for the repository's write locks.
pub const WRITE_LOCK_PREFIX: &str = "lock:item:write:";

/// Counter key the identity allocator increments.
pub const ID_COUNTER_KEY: &str = "item:id:counter";

/// Write-lock key for `content`.
///
/// Case is folded so that writers of equal content contend on one key
/// regardless of casing, matching the dedup equality below.
pub fn write_lock_key(content: &str) -> String {
    format!("{WRITE_LOCK_PREFIX}{}", content.to_ascii_lowercase())
}

/// Errors from the item repository.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RepositoryError {
    /// The write lock for this content is already held. A hard failure at
    /// this layer, not a dedup outcome.
    #[snafu(display("could not acquire write lock for content '{content}'"))]
    LockUnavailable {
        /// The content whose lock was denied.
        content: String,
    },

    /// Coordination layer failure.
    #[snafu(display("coordination error: {source}"))]
    Coordination {
        /// The underlying error.
        source: CoordinationError,
    },
}

impl From<CoordinationError> for RepositoryError {
    fn from(source: CoordinationError) -> Self {
        RepositoryError::Coordination { source }
    }
}

/// Backend contract for item persistence.
#[async_trait]
pub trait ItemBackend: Send + Sync {
    /// True when a save for `content` is committed or currently in flight.
    async fn item_exists(&self, content: &str) -> Result<bool, RepositoryError>;

    /// Persist a new item, allocating its identity.
    async fn save_item(&self, content: &str) -> Result<Item, RepositoryError>;

    /// Point-in-time snapshot of the saved collection.
    async fn all_items(&self) -> Vec<Item>;
}

/// Configuration for the item repository.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Fixed delay while holding the write lock, modeling the latency of
    /// the downstream write.
    pub processing_delay_ms: u64,
    /// Configuration for the write locks.
    pub lock: LockConfig,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            processing_delay_ms: 2_000,
            lock: LockConfig::default(),
        }
    }
}

/// In-process repository of saved items over a coordination store.
///
/// The saved collection only grows; appends and snapshot reads are safe
/// under arbitrary concurrency and a snapshot never observes a
/// partially-constructed item.
pub struct ItemRepository<S: CoordinationStore + ?Sized> {
    store: Arc<S>,
    allocator: IdentityAllocator<S>,
    items: RwLock<Vec<Item>>,
    config: RepositoryConfig,
}

impl<S: CoordinationStore + ?Sized> ItemRepository<S> {
    /// Create an empty repository over `store`.
    pub fn new(store: Arc<S>, config: RepositoryConfig) -> Self {
        let allocator = IdentityAllocator::new(store.clone(), ID_COUNTER_KEY, config.lock.clone());
        Self {
            store,
            allocator,
            items: RwLock::new(Vec::new()),
            config,
        }
    }

    /// The guarded write: slow downstream write, identity, append.
    async fn write_item(&self, content: &str) -> Result<Item, RepositoryError> {
        tokio::time::sleep(Duration::from_millis(self.config.processing_delay_ms)).await;

        let id = self.allocator.next_identity().await?;
        let item = Item {
            id,
            content: content.to_string(),
        };

        self.items.write().await.push(item.clone());
        debug!(id = item.id, content = %item.content, "item appended");
        Ok(item)
    }
}

#[async_trait]
impl<S: CoordinationStore + ?Sized + 'static> ItemBackend for ItemRepository<S> {
    async fn item_exists(&self, content: &str) -> Result<bool, RepositoryError> {
        // A held write lock means a save for this content is in flight.
        let in_flight = self
            .store
            .exists(ExistsRequest::new(write_lock_key(content)))
            .await
            .map_err(CoordinationError::from)?;
        if in_flight.exists {
            return Ok(true);
        }

        let items = self.items.read().await;
        Ok(items
            .iter()
            .any(|item| item.content.eq_ignore_ascii_case(content)))
    }

    async fn save_item(&self, content: &str) -> Result<Item, RepositoryError> {
        let lock = ContentLock::new(
            self.store.clone(),
            write_lock_key(content),
            self.config.lock.clone(),
        );

        if !lock.try_acquire().await.map_err(RepositoryError::from)? {
            return LockUnavailableSnafu { content }.fail();
        }

        let saved = self.write_item(content).await;

        if let Err(error) = lock.release().await {
            warn!(key = lock.key(), %error, "write lock release failed, key expires via TTL");
        }

        saved
    }

    async fn all_items(&self) -> Vec<Item> {
        self.items.read().await.clone()
    }
}
