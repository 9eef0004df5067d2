//! Applying the inverse calibration to raw counts.
//!
//! ```text
//!   raw counts ─→ p = counts / shots ─→ c = M⁻¹ p ─→ clip c < 0 ─→ c / Σc
//!              ─→ largest-remainder rounding to the original shot total
//! ```
//!
//! Linear inversion of sampled data routinely produces small negative
//! quasi-probabilities. They are clipped to zero and the remaining mass is
//! renormalised; only a correction with no positive mass left is an error.

use tracing::debug;
use tuneq_hal::Counts;

use crate::basis::{self, BasisState};
use crate::error::{CalibrationError, CalibrationResult};
use crate::inverter::InvertedMatrix;

/// Corrected counts plus what the projection discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    /// Corrected counts over all `2^n` bitstrings, summing to the raw total.
    pub counts: Counts,
    /// Corrected probabilities before rounding.
    pub probabilities: Vec<f64>,
    /// Total negative quasi-probability clipped away.
    pub clipped_mass: f64,
}

/// Applies a cached inverse calibration matrix to raw distributions.
#[derive(Debug, Clone, Copy)]
pub struct Corrector<'a> {
    inverse: &'a InvertedMatrix,
}

impl<'a> Corrector<'a> {
    /// Create a corrector over `inverse`.
    pub fn new(inverse: &'a InvertedMatrix) -> Self {
        Self { inverse }
    }

    /// Register width the corrector expects count keys to have.
    pub fn num_qubits(&self) -> usize {
        self.inverse.num_qubits()
    }

    /// Correct raw counts.
    ///
    /// The shot total is taken from `raw` itself, so backends that drop shots
    /// are handled as a smaller effective sample.
    pub fn correct(&self, raw: &Counts) -> CalibrationResult<Counts> {
        self.correct_with_report(raw).map(|c| c.counts)
    }

    /// Correct raw counts and report the clipped mass.
    pub fn correct_with_report(&self, raw: &Counts) -> CalibrationResult<Correction> {
        let num_qubits = self.num_qubits();
        let dim = self.inverse.dim();

        let mut observed = vec![0u64; dim];
        for (bitstring, &count) in raw.iter() {
            let state = BasisState::parse(bitstring, num_qubits)?;
            observed[state.index()] += count;
        }

        let total: u64 = observed.iter().sum();
        let keys = basis::bitstrings(num_qubits);
        if total == 0 {
            return Ok(Correction {
                counts: keys.into_iter().map(|k| (k, 0)).collect(),
                probabilities: vec![0.0; dim],
                clipped_mass: 0.0,
            });
        }

        let p: Vec<f64> = observed
            .iter()
            .map(|&c| c as f64 / total as f64)
            .collect();
        let (probabilities, clipped_mass) = self.project(&p)?;

        let counts =
            Counts::from_distribution(keys.into_iter().zip(probabilities.iter().copied()), total);
        Ok(Correction {
            counts,
            probabilities,
            clipped_mass,
        })
    }

    /// Correct a probability vector indexed by basis state.
    ///
    /// The result is non-negative and sums to one.
    pub fn correct_probabilities(&self, probabilities: &[f64]) -> CalibrationResult<Vec<f64>> {
        self.project(probabilities).map(|(c, _)| c)
    }

    fn project(&self, probabilities: &[f64]) -> CalibrationResult<(Vec<f64>, f64)> {
        let mut corrected = self.inverse.apply(probabilities)?;

        let mut clipped_mass = 0.0;
        for value in corrected.iter_mut() {
            if *value < 0.0 {
                clipped_mass -= *value;
                *value = 0.0;
            }
        }

        let sum: f64 = corrected.iter().sum();
        if !sum.is_finite() || sum <= 0.0 {
            return Err(CalibrationError::DegenerateCorrection);
        }
        if clipped_mass > 0.0 {
            debug!(clipped_mass, remaining = sum, "clipped negative quasi-probabilities");
        }

        for value in corrected.iter_mut() {
            *value /= sum;
        }
        Ok((corrected, clipped_mass))
    }
}
