//! Readout error channel and sampling modes.

use tuneq_hal::{HalError, HalResult};

/// Classical bit-flip channel applied to one qubit's measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReadoutError {
    /// Probability of reading 1 when the qubit is |0⟩.
    pub p1_given_0: f64,
    /// Probability of reading 0 when the qubit is |1⟩.
    pub p0_given_1: f64,
}

impl ReadoutError {
    /// Create a readout error, checking both rates lie in `[0, 1]`.
    pub fn new(p1_given_0: f64, p0_given_1: f64) -> HalResult<Self> {
        for (label, p) in [("p1_given_0", p1_given_0), ("p0_given_1", p0_given_1)] {
            if !(0.0..=1.0).contains(&p) {
                return Err(HalError::Backend(format!(
                    "{label} must be a probability in [0, 1], got {p}"
                )));
            }
        }
        Ok(Self {
            p1_given_0,
            p0_given_1,
        })
    }

    /// Same flip probability in both directions.
    pub fn symmetric(p: f64) -> HalResult<Self> {
        Self::new(p, p)
    }

    /// No readout error.
    pub fn none() -> Self {
        Self::default()
    }

    /// Probability of reading 1 given the true bit.
    #[inline]
    pub fn p_read_one(&self, bit: bool) -> f64 {
        if bit {
            1.0 - self.p0_given_1
        } else {
            self.p1_given_0
        }
    }

    /// Mean probability of a correct readout.
    pub fn fidelity(&self) -> f64 {
        1.0 - (self.p1_given_0 + self.p0_given_1) / 2.0
    }
}

/// How shots are drawn from the noisy outcome distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// Deterministic expected counts.
    #[default]
    Exact,
    /// Random sampling from an RNG seeded with this value.
    Seeded(u64),
}
