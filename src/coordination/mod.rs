//! Distributed coordination primitives built on the store's atomic operations.
//!
//! - [`ContentLock`] - single-shot mutual exclusion keyed by resource name
//! - [`IdentityAllocator`] - unique, increasing item identities
//!
//! Both primitives work against any [`crate::api::CoordinationStore`]
//! backend; the store is the only cross-process serialization point.

mod error;
mod identity;
mod lock;

pub use error::CoordinationError;
pub use identity::IdentityAllocator;
pub use lock::{ContentLock, LockConfig};
