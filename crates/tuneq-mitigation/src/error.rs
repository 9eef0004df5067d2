//! Error types for calibration and mitigated execution.

use thiserror::Error;
use tuneq_hal::HalError;
use tuneq_ir::IrError;

use crate::config::ConfigError;
use crate::session::SessionState;

/// Errors raised while building or applying a readout calibration.
///
/// Everything that can go wrong before a session reaches the ready state is
/// reported here, as is a correction that collapses to an all-zero
/// distribution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CalibrationError {
    /// Qubit count outside `1..=max`.
    #[error("Invalid qubit count {num_qubits}: must be between 1 and {max}")]
    InvalidQubitCount {
        /// Requested number of qubits.
        num_qubits: usize,
        /// Configured upper bound.
        max: usize,
    },

    /// Shot count of zero.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// The executor failed while running calibration circuits.
    #[error("Calibration run failed: {0}")]
    Execution(#[source] HalError),

    /// The executor returned the wrong number of distributions.
    #[error("Expected {expected} calibration results, got {got}")]
    ResultCountMismatch {
        /// Number of calibration circuits submitted.
        expected: usize,
        /// Number of distributions returned.
        got: usize,
    },

    /// A count key is not an `n`-digit binary string.
    #[error("Malformed bitstring '{bitstring}': expected {expected_width} binary digits")]
    MalformedBitstring {
        /// The offending key.
        bitstring: String,
        /// Width required by the register.
        expected_width: usize,
    },

    /// A calibration column has no shots at all.
    #[error("Calibration column {column} (prepared {prepared}) has no counts")]
    EmptyColumn {
        /// Column index (prepared basis state).
        column: usize,
        /// Prepared bitstring, for diagnostics.
        prepared: String,
    },

    /// A calibration column does not sum to one.
    #[error("Calibration column {column} sums to {sum:.9}, expected 1 within {tolerance:e}")]
    ColumnSum {
        /// Column index (prepared basis state).
        column: usize,
        /// Observed column sum.
        sum: f64,
        /// Allowed deviation from one.
        tolerance: f64,
    },

    /// A calibration matrix entry is not a probability.
    #[error(
        "Calibration matrix entry ({row}, {column}) is {value}, outside [0, 1] by more than {tolerance:e}"
    )]
    EntryOutOfRange {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        column: usize,
        /// The entry itself.
        value: f64,
        /// Allowed deviation from `[0, 1]`.
        tolerance: f64,
    },

    /// The calibration matrix contains NaN or infinity.
    #[error("Calibration matrix entry ({row}, {column}) is not finite")]
    NonFinite {
        /// Row of the offending entry.
        row: usize,
        /// Column of the offending entry.
        column: usize,
    },

    /// Not even a pseudo-inverse exists.
    #[error("Calibration matrix is singular beyond pseudo-inversion: {0}")]
    Singular(String),

    /// A vector or matrix does not match the register dimension.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension (2^n).
        expected: usize,
        /// Actual dimension.
        got: usize,
    },

    /// All corrected probabilities were clipped to zero.
    #[error("Correction is degenerate: no probability mass left after clipping")]
    DegenerateCorrection,

    /// The session configuration does not validate.
    #[error("Invalid mitigation configuration: {0}")]
    Config(#[from] ConfigError),

    /// Building a calibration circuit failed.
    #[error("Calibration circuit error: {0}")]
    Circuit(#[from] IrError),
}

/// Result type for calibration operations.
pub type CalibrationResult<T> = Result<T, CalibrationError>;

/// Errors raised by a mitigation session once it is in use.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MitigationError {
    /// Calibration failed, or a correction was degenerate.
    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    /// The executor failed while running a payload circuit.
    #[error("Payload execution failed: {0}")]
    Execution(#[source] HalError),

    /// The executor returned the wrong number of payload distributions.
    #[error("Expected {expected} payload results, got {got}")]
    ResultCountMismatch {
        /// Number of payload circuits submitted.
        expected: usize,
        /// Number of distributions returned.
        got: usize,
    },

    /// Shot count of zero.
    #[error("Invalid shots: {0}")]
    InvalidShots(String),

    /// The session has not reached the ready state.
    #[error("Mitigation session is not ready (state: {state})")]
    NotReady {
        /// The state the session is actually in.
        state: SessionState,
    },

    /// The session has been closed.
    #[error("Mitigation session is closed")]
    Closed,
}

/// Result type for mitigation session operations.
pub type MitigationResult<T> = Result<T, MitigationError>;
