//! Calibration matrix inversion.
//!
//! Well-conditioned matrices are inverted exactly. When the ratio of the
//! largest to the smallest singular value exceeds the configured threshold
//! (or exact inversion fails numerically), the inverter falls back to a
//! truncated-SVD pseudo-inverse:
//!
//! ```text
//!   M = U Σ Vᵀ
//!   M⁺ = V Σ⁺ Uᵀ,   Σ⁺ᵢᵢ = 1/σᵢ if σᵢ > rcond · σ_max, else 0
//! ```

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::config::MitigationConfig;
use crate::error::{CalibrationError, CalibrationResult};
use crate::matrix::CalibrationMatrix;

/// How an [`InvertedMatrix`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "method")]
pub enum InversionMethod {
    /// Ordinary matrix inverse.
    Exact,
    /// Truncated-SVD pseudo-inverse keeping `rank` singular values.
    PseudoInverse {
        /// Number of singular values kept.
        rank: usize,
    },
}

impl fmt::Display for InversionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InversionMethod::Exact => write!(f, "exact inverse"),
            InversionMethod::PseudoInverse { rank } => {
                write!(f, "pseudo-inverse (rank {rank})")
            }
        }
    }
}

/// The cached inverse (or pseudo-inverse) of a calibration matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct InvertedMatrix {
    matrix: DMatrix<f64>,
    method: InversionMethod,
    condition_number: f64,
}

impl InvertedMatrix {
    /// How the inverse was computed.
    pub fn method(&self) -> InversionMethod {
        self.method
    }

    /// `σ_max / σ_min` of the calibration matrix; infinite when singular.
    pub fn condition_number(&self) -> f64 {
        self.condition_number
    }

    /// Whether the exact inverse was used.
    pub fn is_exact(&self) -> bool {
        self.method == InversionMethod::Exact
    }

    /// Matrix dimension, `2^n`.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Register width.
    pub fn num_qubits(&self) -> usize {
        self.dim().trailing_zeros() as usize
    }

    /// The underlying dense matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// `M⁻¹ · p`. The result may contain negative entries.
    pub fn apply(&self, probabilities: &[f64]) -> CalibrationResult<Vec<f64>> {
        if probabilities.len() != self.dim() {
            return Err(CalibrationError::DimensionMismatch {
                expected: self.dim(),
                got: probabilities.len(),
            });
        }
        let p = DVector::from_column_slice(probabilities);
        Ok((&self.matrix * p).iter().copied().collect())
    }
}

/// Inverts calibration matrices, falling back to a pseudo-inverse on
/// ill-conditioning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixInverter {
    condition_threshold: f64,
    rcond: f64,
}

impl Default for MatrixInverter {
    fn default() -> Self {
        Self::from_config(&MitigationConfig::default())
    }
}

impl MatrixInverter {
    /// Create an inverter.
    ///
    /// `condition_threshold` is the largest condition number inverted exactly;
    /// `rcond` is the relative singular-value cut-off of the pseudo-inverse.
    pub fn new(condition_threshold: f64, rcond: f64) -> Self {
        Self {
            condition_threshold,
            rcond,
        }
    }

    /// Take thresholds from a session configuration.
    pub fn from_config(config: &MitigationConfig) -> Self {
        Self::new(config.condition_threshold, config.pinv_rcond)
    }

    /// Invert a calibration matrix.
    pub fn invert(&self, calibration: &CalibrationMatrix) -> CalibrationResult<InvertedMatrix> {
        self.invert_matrix(calibration.as_matrix())
    }

    /// Invert a square matrix.
    pub fn invert_matrix(&self, m: &DMatrix<f64>) -> CalibrationResult<InvertedMatrix> {
        if m.nrows() != m.ncols() {
            return Err(CalibrationError::DimensionMismatch {
                expected: m.nrows(),
                got: m.ncols(),
            });
        }
        if m.is_empty() {
            return Err(CalibrationError::Singular("matrix is empty".into()));
        }
        for (column, col) in m.column_iter().enumerate() {
            if let Some(row) = col.iter().position(|v| !v.is_finite()) {
                return Err(CalibrationError::NonFinite { row, column });
            }
        }

        let svd = m.clone().svd(true, true);
        let sigma_max = svd.singular_values.max();
        let sigma_min = svd.singular_values.min();
        if !sigma_max.is_finite() || sigma_max <= 0.0 {
            return Err(CalibrationError::Singular(format!(
                "largest singular value is {sigma_max}"
            )));
        }
        let condition_number = if sigma_min > 0.0 {
            sigma_max / sigma_min
        } else {
            f64::INFINITY
        };
        debug!(
            dim = m.nrows(),
            sigma_max, sigma_min, condition_number, "calibration matrix conditioning"
        );

        if condition_number <= self.condition_threshold {
            match m.clone().try_inverse() {
                Some(inverse) if inverse.iter().all(|v| v.is_finite()) => {
                    return Ok(InvertedMatrix {
                        matrix: inverse,
                        method: InversionMethod::Exact,
                        condition_number,
                    });
                }
                _ => warn!(
                    condition_number,
                    "exact inversion failed, falling back to pseudo-inverse"
                ),
            }
        } else {
            warn!(
                condition_number,
                threshold = self.condition_threshold,
                "calibration matrix is ill-conditioned, using pseudo-inverse"
            );
        }

        let u = svd
            .u
            .ok_or_else(|| CalibrationError::Singular("SVD did not produce U".into()))?;
        let v_t = svd
            .v_t
            .ok_or_else(|| CalibrationError::Singular("SVD did not produce Vᵀ".into()))?;

        let cutoff = self.rcond * sigma_max;
        let inv_sigma = svd
            .singular_values
            .map(|s| if s > cutoff { 1.0 / s } else { 0.0 });
        let rank = inv_sigma.iter().filter(|&&s| s != 0.0).count();
        if rank == 0 {
            return Err(CalibrationError::Singular(format!(
                "no singular value above cut-off {cutoff:e}"
            )));
        }

        let pinv = v_t.transpose() * DMatrix::from_diagonal(&inv_sigma) * u.transpose();
        if let Some(idx) = pinv.iter().position(|v| !v.is_finite()) {
            let dim = pinv.nrows();
            return Err(CalibrationError::NonFinite {
                row: idx % dim,
                column: idx / dim,
            });
        }
        debug!(rank, dim = m.nrows(), "pseudo-inverse computed");

        Ok(InvertedMatrix {
            matrix: pinv,
            method: InversionMethod::PseudoInverse { rank },
            condition_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &DMatrix<f64>, b: &DMatrix<f64>, tol: f64) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < tol, "{a} != {b}");
        }
    }

    #[test]
    fn test_identity() {
        let inv = MatrixInverter::default()
            .invert(&CalibrationMatrix::identity(3))
            .unwrap();
        assert_eq!(inv.method(), InversionMethod::Exact);
        assert!((inv.condition_number() - 1.0).abs() < 1e-12);
        assert_eq!(inv.num_qubits(), 3);
        assert_close(inv.as_matrix(), &DMatrix::identity(8, 8), 1e-12);
    }

    #[test]
    fn test_round_trip() {
        let m = DMatrix::from_row_slice(2, 2, &[0.9, 0.05, 0.1, 0.95]);
        let inv = MatrixInverter::default().invert_matrix(&m).unwrap();
        assert!(inv.is_exact());
        assert_close(&(&m * inv.as_matrix()), &DMatrix::identity(2, 2), 1e-12);

        let corrected = inv.apply(&[0.8, 0.2]).unwrap();
        assert!((corrected[0] - 0.75 / 0.85).abs() < 1e-12);
        assert!((corrected[1] - 0.1 / 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_singular_uses_pseudo_inverse() {
        let m = DMatrix::from_element(2, 2, 0.5);
        let inv = MatrixInverter::default().invert_matrix(&m).unwrap();
        assert_eq!(inv.method(), InversionMethod::PseudoInverse { rank: 1 });
        assert!(inv.condition_number() > 1e10);
        assert_close(inv.as_matrix(), &DMatrix::from_element(2, 2, 0.5), 1e-12);
    }

    #[test]
    fn test_threshold_forces_pseudo_inverse() {
        let m = DMatrix::from_row_slice(2, 2, &[0.9, 0.05, 0.1, 0.95]);
        let inv = MatrixInverter::new(1.0, 1e-10).invert_matrix(&m).unwrap();
        assert_eq!(inv.method(), InversionMethod::PseudoInverse { rank: 2 });
        // Full rank: the pseudo-inverse is the inverse.
        assert_close(&(&m * inv.as_matrix()), &DMatrix::identity(2, 2), 1e-10);
    }

    #[test]
    fn test_undefined_inverse() {
        let zero = DMatrix::<f64>::zeros(2, 2);
        assert!(matches!(
            MatrixInverter::default().invert_matrix(&zero),
            Err(CalibrationError::Singular(_))
        ));

        let inf = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, f64::INFINITY, 1.0]);
        assert!(matches!(
            MatrixInverter::default().invert_matrix(&inf),
            Err(CalibrationError::NonFinite { row: 1, column: 0 })
        ));

        let rect = DMatrix::<f64>::zeros(2, 3);
        assert!(MatrixInverter::default().invert_matrix(&rect).is_err());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(InversionMethod::Exact.to_string(), "exact inverse");
        assert_eq!(
            InversionMethod::PseudoInverse { rank: 3 }.to_string(),
            "pseudo-inverse (rank 3)"
        );
    }
}
