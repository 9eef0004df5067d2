//! Calibration circuit construction.
//!
//! Each calibration circuit prepares one computational basis state with
//! X gates and then measures every qubit `i` into classical bit `i`.

use tuneq_ir::{Circuit, QubitId};

use crate::basis::{self, BasisState};
use crate::config::CalibrationStrategy;
use crate::error::CalibrationResult;

/// Circuit that prepares `state` and measures the whole register.
pub fn preparation_circuit(state: BasisState) -> CalibrationResult<Circuit> {
    let n = state.num_qubits() as u32;
    let mut circuit = Circuit::with_size(format!("cal_{}", state.to_bitstring()), n, n);
    for qubit in state.ones() {
        circuit.x(QubitId(qubit as u32))?;
    }
    circuit.measure_all()?;
    Ok(circuit)
}

/// One preparation circuit per basis state, in ascending index order.
///
/// Circuit `j` prepares the state whose bitstring has integer value `j`.
pub fn build_calibration_circuits(
    num_qubits: usize,
    max_qubits: usize,
) -> CalibrationResult<Vec<Circuit>> {
    basis::validate_num_qubits(num_qubits, max_qubits)?;
    basis::enumerate(num_qubits).map(preparation_circuit).collect()
}

/// Two circuits per qubit: `q` left in |0⟩, then `q` flipped to |1⟩, with
/// every other qubit in |0⟩.
///
/// The order is `q0:|0⟩, q0:|1⟩, q1:|0⟩, q1:|1⟩, ...`.
pub fn build_tensored_circuits(
    num_qubits: usize,
    max_qubits: usize,
) -> CalibrationResult<Vec<Circuit>> {
    basis::validate_num_qubits(num_qubits, max_qubits)?;
    let n = num_qubits as u32;

    let mut circuits = Vec::with_capacity(2 * num_qubits);
    for qubit in 0..n {
        for prepared in [false, true] {
            let mut circuit =
                Circuit::with_size(format!("cal_q{qubit}_{}", u8::from(prepared)), n, n);
            if prepared {
                circuit.x(QubitId(qubit))?;
            }
            circuit.measure_all()?;
            circuits.push(circuit);
        }
    }
    Ok(circuits)
}

/// Calibration circuits for `strategy`.
pub fn build_for_strategy(
    strategy: CalibrationStrategy,
    num_qubits: usize,
    max_qubits: usize,
) -> CalibrationResult<Vec<Circuit>> {
    match strategy {
        CalibrationStrategy::Full => build_calibration_circuits(num_qubits, max_qubits),
        CalibrationStrategy::Tensored => build_tensored_circuits(num_qubits, max_qubits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalibrationError;
    use tuneq_ir::{InstructionKind, StandardGate};

    fn x_targets(circuit: &Circuit) -> Vec<u32> {
        circuit
            .instructions()
            .iter()
            .filter(|inst| inst.kind == InstructionKind::Gate(StandardGate::X))
            .map(|inst| inst.qubits[0].0)
            .collect()
    }

    #[test]
    fn test_full_circuits() {
        let circuits = build_calibration_circuits(2, 10).unwrap();
        assert_eq!(circuits.len(), 4);

        let names: Vec<_> = circuits.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["cal_00", "cal_01", "cal_10", "cal_11"]);

        assert!(x_targets(&circuits[0]).is_empty());
        assert_eq!(x_targets(&circuits[1]), vec![0]);
        assert_eq!(x_targets(&circuits[2]), vec![1]);
        assert_eq!(x_targets(&circuits[3]), vec![0, 1]);

        for circuit in &circuits {
            assert_eq!(circuit.num_qubits(), 2);
            assert_eq!(circuit.num_clbits(), 2);
            assert!(circuit.has_measurements());
        }
    }

    #[test]
    fn test_tensored_circuits() {
        let circuits = build_tensored_circuits(3, 10).unwrap();
        assert_eq!(circuits.len(), 6);
        assert_eq!(circuits[0].name(), "cal_q0_0");
        assert_eq!(circuits[5].name(), "cal_q2_1");
        assert!(x_targets(&circuits[2]).is_empty());
        assert_eq!(x_targets(&circuits[3]), vec![1]);
    }

    #[test]
    fn test_invalid_qubit_counts() {
        assert!(matches!(
            build_calibration_circuits(0, 10),
            Err(CalibrationError::InvalidQubitCount { .. })
        ));
        assert!(matches!(
            build_for_strategy(CalibrationStrategy::Tensored, 5, 4),
            Err(CalibrationError::InvalidQubitCount { num_qubits: 5, max: 4 })
        ));
    }
}
