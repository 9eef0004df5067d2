//! Computational basis enumeration and bitstring encoding.
//!
//! A basis state of an `n`-qubit register is written as an `n`-character
//! binary string with qubit 0 as the **rightmost** character, the same
//! ordering count keys use. The matrix index of a state is the integer
//! value of that string:
//!
//! ```text
//!   "110"  →  q2=1 q1=1 q0=0  →  index 6
//! ```

use std::fmt;

use crate::config::MAX_SUPPORTED_QUBITS;
use crate::error::{CalibrationError, CalibrationResult};

/// A computational basis state of an `n`-qubit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BasisState {
    index: usize,
    num_qubits: usize,
}

impl BasisState {
    /// Create the basis state with the given index.
    ///
    /// Returns `None` if `index >= 2^num_qubits`.
    pub fn new(index: usize, num_qubits: usize) -> Option<Self> {
        if num_qubits >= usize::BITS as usize || index >= (1usize << num_qubits) {
            return None;
        }
        Some(Self { index, num_qubits })
    }

    /// Parse a count key of exactly `num_qubits` binary digits.
    pub fn parse(bitstring: &str, num_qubits: usize) -> CalibrationResult<Self> {
        let malformed = || CalibrationError::MalformedBitstring {
            bitstring: bitstring.to_string(),
            expected_width: num_qubits,
        };

        if bitstring.len() != num_qubits || num_qubits >= usize::BITS as usize {
            return Err(malformed());
        }

        let mut index = 0usize;
        for byte in bitstring.bytes() {
            index = (index << 1)
                | match byte {
                    b'0' => 0,
                    b'1' => 1,
                    _ => return Err(malformed()),
                };
        }
        Ok(Self { index, num_qubits })
    }

    /// Matrix row/column index of this state.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Register width.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Value of qubit `qubit` in this state.
    #[inline]
    pub fn bit(&self, qubit: usize) -> bool {
        (self.index >> qubit) & 1 == 1
    }

    /// Qubits that are |1⟩ in this state, lowest first.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.num_qubits).filter(move |&q| self.bit(q))
    }

    /// Fixed-width bitstring, qubit 0 rightmost.
    pub fn to_bitstring(&self) -> String {
        format!("{:0width$b}", self.index, width = self.num_qubits)
    }
}

impl fmt::Display for BasisState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{}⟩", self.to_bitstring())
    }
}

/// Check `num_qubits` against `1..=max_qubits`.
///
/// `max_qubits` is capped at [`MAX_SUPPORTED_QUBITS`] whatever the caller
/// passes.
pub fn validate_num_qubits(num_qubits: usize, max_qubits: usize) -> CalibrationResult<()> {
    let max = max_qubits.min(MAX_SUPPORTED_QUBITS);
    if num_qubits == 0 || num_qubits > max {
        return Err(CalibrationError::InvalidQubitCount { num_qubits, max });
    }
    Ok(())
}

/// All `2^n` basis states of an `n`-qubit register, in ascending index order.
///
/// Callers are expected to have bounded `num_qubits` with
/// [`validate_num_qubits`].
pub fn enumerate(num_qubits: usize) -> impl ExactSizeIterator<Item = BasisState> {
    let dim = dimension(num_qubits);
    (0..dim).map(move |index| BasisState { index, num_qubits })
}

/// `2^n`, saturating at zero states for widths the platform cannot index.
#[inline]
pub fn dimension(num_qubits: usize) -> usize {
    1usize.checked_shl(num_qubits as u32).unwrap_or(0)
}

/// Bitstrings of all basis states, in ascending index order.
pub fn bitstrings(num_qubits: usize) -> Vec<String> {
    enumerate(num_qubits).map(|s| s.to_bitstring()).collect()
}
