// src/error.rs

use thiserror::Error;

/// A thread-safe wrapper for standard dynamic errors,
/// so they implement `Send` and `Sync`.
///
/// Linear-algebra backends report failures with this type; the engine turns
/// them into a fallback rather than into a caller-facing error.
pub type ThreadSafeStdError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type for standardization and dimensionality reduction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PcaError {
    /// Malformed observations or an out-of-range target rank.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// No decomposition path could produce a well-shaped result.
    #[error("decomposition failed: {0}")]
    DecompositionFailure(String),
}

impl PcaError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        PcaError::InvalidInput(msg.into())
    }
}
