//! Error types for coordination primitives.

use snafu::Snafu;

use crate::api::StoreError;

/// Errors from coordination primitives.
///
/// "Lock already held" is not an error anywhere in this layer; acquisition
/// reports it as a normal `false` return.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CoordinationError {
    /// Underlying store error.
    #[snafu(display("storage error: {source}"))]
    Storage {
        /// The underlying error.
        source: StoreError,
    },
}

impl From<StoreError> for CoordinationError {
    fn from(source: StoreError) -> Self {
        CoordinationError::Storage { source }
    }
}
