//! Error types for the HAL crate.

use thiserror::Error;

/// Errors raised by execution backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// Execution failed on the backend.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// Invalid circuit.
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),

    /// Circuit exceeds backend capabilities.
    #[error("Circuit exceeds backend capabilities: {0}")]
    CircuitTooLarge(String),

    /// Unsupported feature.
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// Invalid number of shots.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// Backend returned a different number of results than circuits submitted.
    #[error("Backend returned {got} results for {expected} circuits")]
    ResultCountMismatch {
        /// Number of circuits submitted.
        expected: usize,
        /// Number of results returned.
        got: usize,
    },

    /// Circuit IR error.
    #[error("Circuit IR error: {0}")]
    Ir(#[from] tuneq_ir::IrError),

    /// Generic backend error.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for HAL operations.
pub type HalResult<T> = Result<T, HalError>;
