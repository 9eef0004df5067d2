//! Quantum gate types.

use serde::{Deserialize, Serialize};

/// Standard gates understood by tuneq backends.
///
/// Rotation angles are concrete radians; the mitigation core never needs
/// symbolic parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "gate", content = "angle", rename_all = "lowercase")]
pub enum StandardGate {
    // Single-qubit Pauli gates
    /// Identity gate.
    I,
    /// Pauli-X gate.
    X,
    /// Pauli-Y gate.
    Y,
    /// Pauli-Z gate.
    Z,

    // Single-qubit Clifford gates
    /// Hadamard gate.
    H,
    /// S gate (sqrt(Z)).
    S,
    /// S-dagger gate.
    Sdg,
    /// T gate (fourth root of Z).
    T,
    /// T-dagger gate.
    Tdg,
    /// sqrt(X) gate.
    SX,

    // Single-qubit rotation gates
    /// Rotation around X axis.
    Rx(f64),
    /// Rotation around Y axis.
    Ry(f64),
    /// Rotation around Z axis.
    Rz(f64),

    // Multi-qubit gates
    /// Controlled-X (CNOT) gate.
    CX,
    /// Controlled-Z gate.
    CZ,
    /// SWAP gate.
    Swap,
    /// Toffoli gate (CCX).
    CCX,
}

impl StandardGate {
    /// Get the name of this gate.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            StandardGate::I => "id",
            StandardGate::X => "x",
            StandardGate::Y => "y",
            StandardGate::Z => "z",
            StandardGate::H => "h",
            StandardGate::S => "s",
            StandardGate::Sdg => "sdg",
            StandardGate::T => "t",
            StandardGate::Tdg => "tdg",
            StandardGate::SX => "sx",
            StandardGate::Rx(_) => "rx",
            StandardGate::Ry(_) => "ry",
            StandardGate::Rz(_) => "rz",
            StandardGate::CX => "cx",
            StandardGate::CZ => "cz",
            StandardGate::Swap => "swap",
            StandardGate::CCX => "ccx",
        }
    }

    /// Number of qubits this gate acts on.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        match self {
            StandardGate::CX | StandardGate::CZ | StandardGate::Swap => 2,
            StandardGate::CCX => 3,
            _ => 1,
        }
    }

    /// Whether the gate is diagonal in the computational basis.
    ///
    /// Diagonal gates only add phases, so they leave measured basis-state
    /// populations unchanged.
    pub fn is_diagonal(&self) -> bool {
        matches!(
            self,
            StandardGate::I
                | StandardGate::Z
                | StandardGate::S
                | StandardGate::Sdg
                | StandardGate::T
                | StandardGate::Tdg
                | StandardGate::Rz(_)
                | StandardGate::CZ
        )
    }

    /// Whether the gate maps every basis state onto a single basis state
    /// (up to phase).
    pub fn is_permutation(&self) -> bool {
        self.is_diagonal()
            || matches!(
                self,
                StandardGate::X
                    | StandardGate::Y
                    | StandardGate::CX
                    | StandardGate::Swap
                    | StandardGate::CCX
            )
    }
}

impl std::fmt::Display for StandardGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StandardGate::Rx(theta) | StandardGate::Ry(theta) | StandardGate::Rz(theta) => {
                write!(f, "{}({theta:.4})", self.name())
            }
            _ => write!(f, "{}", self.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity() {
        assert_eq!(StandardGate::X.num_qubits(), 1);
        assert_eq!(StandardGate::Rz(0.5).num_qubits(), 1);
        assert_eq!(StandardGate::CX.num_qubits(), 2);
        assert_eq!(StandardGate::CCX.num_qubits(), 3);
    }

    #[test]
    fn test_classical_action() {
        assert!(StandardGate::X.is_permutation());
        assert!(StandardGate::CCX.is_permutation());
        assert!(StandardGate::Rz(1.0).is_diagonal());
        assert!(!StandardGate::X.is_diagonal());
        assert!(!StandardGate::H.is_permutation());
        assert!(!StandardGate::Ry(0.3).is_permutation());
    }

    #[test]
    fn test_display() {
        assert_eq!(StandardGate::CX.to_string(), "cx");
        assert_eq!(StandardGate::Rx(0.25).to_string(), "rx(0.2500)");
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&StandardGate::X).unwrap();
        assert_eq!(json, r#"{"gate":"x"}"#);
        let rz: StandardGate = serde_json::from_str(r#"{"gate":"rz","angle":1.5}"#).unwrap();
        assert_eq!(rz, StandardGate::Rz(1.5));
    }
}
