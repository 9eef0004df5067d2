//! Readout calibration matrix.
//!
//! `M[i][j]` is the probability of reading out basis state `i` after
//! preparing basis state `j`, so every column is a probability distribution
//! and `M · p_true = p_observed`.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tuneq_hal::Counts;

use crate::basis::{self, BasisState};
use crate::config::{
    CalibrationStrategy, DEFAULT_COLUMN_TOLERANCE, MAX_SUPPORTED_QUBITS, MitigationConfig,
};
use crate::error::{CalibrationError, CalibrationResult};

/// A validated, column-stochastic `2^n × 2^n` readout calibration matrix.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CalibrationMatrixData", into = "CalibrationMatrixData")]
pub struct CalibrationMatrix {
    num_qubits: usize,
    strategy: CalibrationStrategy,
    matrix: DMatrix<f64>,
}

impl CalibrationMatrix {
    /// Build the matrix from full calibration results.
    ///
    /// `results[j]` must be the distribution observed after preparing basis
    /// state `j`. Each column is divided by `shots`, or by its own observed
    /// total when `config.normalize_by_observed_shots` is set.
    pub fn from_counts(
        results: &[Counts],
        num_qubits: usize,
        shots: u32,
        config: &MitigationConfig,
    ) -> CalibrationResult<Self> {
        basis::validate_num_qubits(num_qubits, config.max_qubits)?;
        check_shots(shots)?;

        let dim = basis::dimension(num_qubits);
        if results.len() != dim {
            return Err(CalibrationError::ResultCountMismatch {
                expected: dim,
                got: results.len(),
            });
        }

        let mut matrix = DMatrix::<f64>::zeros(dim, dim);
        for (column, counts) in results.iter().enumerate() {
            let divisor = column_divisor(counts, shots, config, column, || {
                format_state(column, num_qubits)
            })?;
            for (bitstring, &count) in counts.iter() {
                let outcome = BasisState::parse(bitstring, num_qubits)?;
                matrix[(outcome.index(), column)] += count as f64 / divisor;
            }
        }

        let built = Self {
            num_qubits,
            strategy: CalibrationStrategy::Full,
            matrix,
        };
        built.check_columns(config.column_tolerance)?;
        debug!(num_qubits, dim, "built full calibration matrix");
        Ok(built)
    }

    /// Build the matrix from tensored calibration results.
    ///
    /// `results` holds two distributions per qubit, in the order produced by
    /// [`build_tensored_circuits`](crate::calibration::build_tensored_circuits).
    /// Each pair is marginalised onto its qubit to give a 2×2 matrix `M_q`,
    /// and the register matrix is `M[i][j] = Π_q M_q[bit_q(i)][bit_q(j)]`.
    pub fn from_tensored_counts(
        results: &[Counts],
        num_qubits: usize,
        shots: u32,
        config: &MitigationConfig,
    ) -> CalibrationResult<Self> {
        basis::validate_num_qubits(num_qubits, config.max_qubits)?;
        check_shots(shots)?;

        let expected = 2 * num_qubits;
        if results.len() != expected {
            return Err(CalibrationError::ResultCountMismatch {
                expected,
                got: results.len(),
            });
        }

        let mut single = Vec::with_capacity(num_qubits);
        for qubit in 0..num_qubits {
            let mut m = [[0.0f64; 2]; 2];
            for prepared in 0..2 {
                let column = 2 * qubit + prepared;
                let counts = &results[column];
                let divisor = column_divisor(counts, shots, config, column, || {
                    format_state(prepared << qubit, num_qubits)
                })?;
                for (bitstring, &count) in counts.iter() {
                    let outcome = BasisState::parse(bitstring, num_qubits)?;
                    m[usize::from(outcome.bit(qubit))][prepared] += count as f64 / divisor;
                }

                let sum = m[0][prepared] + m[1][prepared];
                if (sum - 1.0).abs() > config.column_tolerance {
                    return Err(CalibrationError::ColumnSum {
                        column,
                        sum,
                        tolerance: config.column_tolerance,
                    });
                }
            }
            debug!(
                qubit,
                p0_given_0 = m[0][0],
                p1_given_1 = m[1][1],
                "single-qubit readout matrix"
            );
            single.push(m);
        }

        let dim = basis::dimension(num_qubits);
        let matrix = DMatrix::from_fn(dim, dim, |i, j| {
            single
                .iter()
                .enumerate()
                .map(|(q, m)| m[(i >> q) & 1][(j >> q) & 1])
                .product()
        });

        let built = Self {
            num_qubits,
            strategy: CalibrationStrategy::Tensored,
            matrix,
        };
        built.check_columns(config.column_tolerance)?;
        debug!(num_qubits, dim, "built tensored calibration matrix");
        Ok(built)
    }

    /// Wrap an existing matrix after checking shape and column sums.
    pub fn from_matrix(
        num_qubits: usize,
        matrix: DMatrix<f64>,
        tolerance: f64,
    ) -> CalibrationResult<Self> {
        basis::validate_num_qubits(num_qubits, MAX_SUPPORTED_QUBITS)?;
        let dim = basis::dimension(num_qubits);
        if matrix.nrows() != dim || matrix.ncols() != dim {
            return Err(CalibrationError::DimensionMismatch {
                expected: dim,
                got: matrix.nrows().max(matrix.ncols()),
            });
        }
        let built = Self {
            num_qubits,
            strategy: CalibrationStrategy::Full,
            matrix,
        };
        built.check_columns(tolerance)?;
        Ok(built)
    }

    /// The noiseless calibration matrix.
    pub fn identity(num_qubits: usize) -> Self {
        let dim = basis::dimension(num_qubits);
        Self {
            num_qubits,
            strategy: CalibrationStrategy::Full,
            matrix: DMatrix::identity(dim, dim),
        }
    }

    fn check_columns(&self, tolerance: f64) -> CalibrationResult<()> {
        for (column, col) in self.matrix.column_iter().enumerate() {
            for (row, &value) in col.iter().enumerate() {
                if !value.is_finite() {
                    return Err(CalibrationError::NonFinite { row, column });
                }
                if !(-tolerance..=1.0 + tolerance).contains(&value) {
                    return Err(CalibrationError::EntryOutOfRange {
                        row,
                        column,
                        value,
                        tolerance,
                    });
                }
            }
            let sum = col.sum();
            if (sum - 1.0).abs() > tolerance {
                return Err(CalibrationError::ColumnSum {
                    column,
                    sum,
                    tolerance,
                });
            }
        }
        Ok(())
    }

    /// Register width.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Matrix dimension, `2^n`.
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// How the calibration data was gathered.
    pub fn strategy(&self) -> CalibrationStrategy {
        self.strategy
    }

    /// `P(measure row | prepared column)`.
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        (row < self.dim() && column < self.dim()).then(|| self.matrix[(row, column)])
    }

    /// The underlying dense matrix.
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Probability of reading out basis state `index` correctly.
    pub fn readout_fidelity(&self, index: usize) -> Option<f64> {
        self.get(index, index)
    }

    /// Mean of the diagonal.
    pub fn average_fidelity(&self) -> f64 {
        self.matrix.trace() / self.dim() as f64
    }

    /// Push a true distribution through the noise model: `M · p`.
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

    /// Row-major copy of the entries.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.matrix
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }
}

fn check_shots(shots: u32) -> CalibrationResult<()> {
    if shots == 0 {
        return Err(CalibrationError::InvalidShots(
            "calibration shots must be at least 1".into(),
        ));
    }
    Ok(())
}

fn column_divisor(
    counts: &Counts,
    shots: u32,
    config: &MitigationConfig,
    column: usize,
    prepared: impl FnOnce() -> String,
) -> CalibrationResult<f64> {
    let observed = counts.total_shots();
    if observed == 0 {
        return Err(CalibrationError::EmptyColumn {
            column,
            prepared: prepared(),
        });
    }
    if config.normalize_by_observed_shots {
        Ok(observed as f64)
    } else {
        Ok(f64::from(shots))
    }
}

fn format_state(index: usize, num_qubits: usize) -> String {
    format!("{index:0num_qubits$b}")
}

/// Serialized form: row-major entries plus metadata.
///
/// Deserializing a [`CalibrationMatrix`] checks its columns against
/// [`DEFAULT_COLUMN_TOLERANCE`]. Deserialize this type instead and call
/// [`CalibrationMatrixData::into_matrix`] to check against another tolerance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationMatrixData {
    num_qubits: usize,
    #[serde(default)]
    strategy: CalibrationStrategy,
    rows: Vec<Vec<f64>>,
}

impl CalibrationMatrixData {
    /// Validate the entries and build the matrix.
    pub fn into_matrix(self, tolerance: f64) -> CalibrationResult<CalibrationMatrix> {
        let dim = basis::dimension(self.num_qubits);
        if self.rows.len() != dim {
            return Err(CalibrationError::DimensionMismatch {
                expected: dim,
                got: self.rows.len(),
            });
        }
        if let Some(row) = self.rows.iter().find(|r| r.len() != dim) {
            return Err(CalibrationError::DimensionMismatch {
                expected: dim,
                got: row.len(),
            });
        }
        let matrix = DMatrix::from_fn(dim, dim, |i, j| self.rows[i][j]);
        let mut built = CalibrationMatrix::from_matrix(self.num_qubits, matrix, tolerance)?;
        built.strategy = self.strategy;
        Ok(built)
    }
}

impl From<CalibrationMatrix> for CalibrationMatrixData {
    fn from(m: CalibrationMatrix) -> Self {
        Self {
            num_qubits: m.num_qubits,
            strategy: m.strategy,
            rows: m.to_rows(),
        }
    }
}

impl TryFrom<CalibrationMatrixData> for CalibrationMatrix {
    type Error = CalibrationError;

    fn try_from(data: CalibrationMatrixData) -> Result<Self, Self::Error> {
        data.into_matrix(DEFAULT_COLUMN_TOLERANCE)
    }
}
