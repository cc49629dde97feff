//! Coordination store API.
//!
//! The external coordination service is consumed through the
//! [`CoordinationStore`] trait: four single-key atomic primitives that any
//! Redis-like backend can provide. This layer performs no retries; store
//! failures surface to callers unchanged.
//!
//! Backends:
//! - [`RedisCoordinationStore`] for production deployments
//! - [`DeterministicCoordinationStore`] for tests and simulation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod inmemory;
pub mod redis;

pub use self::inmemory::DeterministicCoordinationStore;
pub use self::redis::RedisCoordinationStore;

/// Request to create a key with an expiry, only if it does not already exist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetIfAbsentRequest {
    pub key: String,
    pub value: String,
    /// Expiry applied to the key on creation, in milliseconds.
    pub ttl_ms: u64,
}

impl SetIfAbsentRequest {
    pub fn new(key: impl Into<String>, value: impl Into<String>, ttl_ms: u64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ttl_ms,
        }
    }
}

/// Result of a set-if-absent operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetIfAbsentResult {
    pub key: String,
    /// True only if this call created the key.
    pub created: bool,
}

/// Request to check whether a key currently exists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExistsRequest {
    pub key: String,
}

impl ExistsRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Result of an existence check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExistsResult {
    pub key: String,
    pub exists: bool,
}

/// Request to atomically increment a counter key by one.
///
/// A missing key counts as zero, so the first increment returns 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncrementRequest {
    pub key: String,
}

impl IncrementRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Result of an increment: the post-increment counter value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncrementResult {
    pub key: String,
    pub value: u64,
}

/// Request to delete a key only if it currently exists.
///
/// Backends must evaluate the existence check and the delete as a single
/// server-side operation, never as two round trips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConditionalDeleteRequest {
    pub key: String,
}

impl ConditionalDeleteRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Result of a conditional delete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConditionalDeleteResult {
    pub key: String,
    /// True if the key existed and was deleted.
    pub deleted: bool,
}

/// Errors from coordination store backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unreachable: {reason}")]
    Unavailable { reason: String },
    #[error("operation failed: {reason}")]
    Failed { reason: String },
    #[error("key '{key}' holds a non-integer value")]
    NotAnInteger { key: String },
}

/// Atomic single-key primitives of the coordination store.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Create `key` with `value` and expiry; succeeds only if the key is absent.
    async fn try_set_if_absent(
        &self,
        request: SetIfAbsentRequest,
    ) -> Result<SetIfAbsentResult, StoreError>;

    /// Check whether `key` currently exists.
    async fn exists(&self, request: ExistsRequest) -> Result<ExistsResult, StoreError>;

    /// Atomic fetch-and-add by one; returns the post-increment value.
    async fn increment(&self, request: IncrementRequest) -> Result<IncrementResult, StoreError>;

    /// Delete `key` only if it currently exists, as one server-side operation.
    async fn conditional_delete(
        &self,
        request: ConditionalDeleteRequest,
    ) -> Result<ConditionalDeleteResult, StoreError>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: CoordinationStore + ?Sized> CoordinationStore for std::sync::Arc<T> {
    async fn try_set_if_absent(
        &self,
        request: SetIfAbsentRequest,
    ) -> Result<SetIfAbsentResult, StoreError> {
        (**self).try_set_if_absent(request).await
    }

    async fn exists(&self, request: ExistsRequest) -> Result<ExistsResult, StoreError> {
        (**self).exists(request).await
    }

    async fn increment(&self, request: IncrementRequest) -> Result<IncrementResult, StoreError> {
        (**self).increment(request).await
    }

    async fn conditional_delete(
        &self,
        request: ConditionalDeleteRequest,
    ) -> Result<ConditionalDeleteResult, StoreError> {
        (**self).conditional_delete(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_unavailable_display() {
        let err = StoreError::Unavailable {
            reason: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "store unreachable: connection refused");
    }

    #[test]
    fn store_error_failed_display() {
        let err = StoreError::Failed {
            reason: "script rejected".to_string(),
        };
        assert_eq!(err.to_string(), "operation failed: script rejected");
    }

    #[test]
    fn store_error_not_an_integer_display() {
        let err = StoreError::NotAnInteger {
            key: "item:id:counter".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "key 'item:id:counter' holds a non-integer value"
        );
    }

    #[test]
    fn set_if_absent_request_construction() {
        let request = SetIfAbsentRequest::new("lock:a", "token", 30_000);
        assert_eq!(request.key, "lock:a");
        assert_eq!(request.value, "token");
        assert_eq!(request.ttl_ms, 30_000);
    }
}
