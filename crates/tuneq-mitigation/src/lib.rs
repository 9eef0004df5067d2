//! tuneq Readout-Error Mitigation
//!
//! This crate corrects the measurement (readout) errors of a noisy device
//! by linear inversion. A calibration step prepares computational basis
//! states, records how the device misreads them, and builds a
//! column-stochastic calibration matrix `M`. Raw payload counts are then
//! corrected with `M⁻¹`, projected back onto valid probabilities and rounded
//! to the original shot total.
//!
//! # Overview
//!
//! ```text
//!   basis states ─→ calibration circuits ─→ Executor ─→ CalibrationMatrix
//!                                                              │
//!                                                        MatrixInverter
//!                                                              │
//!   payload ─→ Executor ─→ raw counts ─────────────→ Corrector ─→ corrected counts
//! ```
//!
//! - [`basis`]: basis-state enumeration and bitstring encoding
//! - [`calibration`]: calibration circuit construction (full or tensored)
//! - [`CalibrationMatrix`]: column-stochastic readout model
//! - [`MatrixInverter`]: exact inverse with SVD pseudo-inverse fallback
//! - [`Corrector`]: inversion, clipping, renormalisation and rounding
//! - [`MitigationSession`]: calibrate once, correct many payloads
//!
//! # Bit Ordering
//!
//! Count keys are fixed-width binary strings with qubit 0 as the rightmost
//! character. The matrix index of a key is its integer value.
//!
//! # Example
//!
//! ```rust
//! use tuneq_hal::Counts;
//! use tuneq_mitigation::{CalibrationMatrix, Corrector, MatrixInverter, MitigationConfig};
//!
//! // Preparing |0⟩ reads "1" 10% of the time; preparing |1⟩ reads "0" 5%.
//! let calibration = vec![
//!     Counts::from_pairs([("0", 900), ("1", 100)]),
//!     Counts::from_pairs([("0", 50), ("1", 950)]),
//! ];
//! let config = MitigationConfig::default();
//! let matrix = CalibrationMatrix::from_counts(&calibration, 1, 1000, &config)?;
//! let inverse = MatrixInverter::from_config(&config).invert(&matrix)?;
//!
//! let raw = Counts::from_pairs([("0", 800), ("1", 200)]);
//! let corrected = Corrector::new(&inverse).correct(&raw)?;
//! assert_eq!(corrected.get("0"), 882);
//! assert_eq!(corrected.get("1"), 118);
//! # Ok::<(), tuneq_mitigation::CalibrationError>(())
//! ```

pub mod basis;
pub mod calibration;
pub mod config;
pub mod corrector;
pub mod error;
pub mod inverter;
pub mod matrix;
pub mod session;

pub use basis::BasisState;
pub use calibration::{build_calibration_circuits, build_tensored_circuits};
pub use config::{CalibrationStrategy, ConfigError, MitigationConfig};
pub use corrector::{Correction, Corrector};
pub use error::{CalibrationError, CalibrationResult, MitigationError, MitigationResult};
pub use inverter::{InversionMethod, InvertedMatrix, MatrixInverter};
pub use matrix::{CalibrationMatrix, CalibrationMatrixData};
pub use session::{MitigatedCounts, MitigationSession, SessionState, mitigate_measurement_errors};
