//! Distributed dedup-write coordination over a Redis-like store.
//!
//! Concurrent callers (threads, tasks, processes) submit content-keyed
//! items. Content-keyed locks in an external coordination store guarantee
//! that no two items with case-insensitive-equal content are ever
//! persisted, while saves of different content proceed fully in parallel.
//! An atomic counter in the same store hands every saved item a unique,
//! strictly increasing identity.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use clasp::{
//!     DeterministicCoordinationStore, ItemIntegrationService, ItemRepository,
//!     RepositoryConfig, ServiceConfig,
//! };
//!
//! let store = Arc::new(DeterministicCoordinationStore::new());
//! let repository = Arc::new(ItemRepository::new(store.clone(), RepositoryConfig::default()));
//! let service = ItemIntegrationService::new(store, repository, ServiceConfig::default());
//!
//! let outcome = service.save_item("a").await?;
//! assert!(outcome.success);
//! ```

pub mod api;
pub mod config;
pub mod coordination;
pub mod repository;
pub mod service;
pub mod types;

pub use api::{
    CoordinationStore, DeterministicCoordinationStore, RedisCoordinationStore, StoreError,
};
pub use config::{AppConfig, ConfigError};
pub use coordination::{ContentLock, CoordinationError, IdentityAllocator, LockConfig};
pub use repository::{ItemBackend, ItemRepository, RepositoryConfig, RepositoryError};
pub use service::{ItemIntegrationService, ServiceConfig, ServiceError};
pub use types::{Item, SaveOutcome};
