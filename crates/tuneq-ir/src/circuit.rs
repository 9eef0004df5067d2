//! High-level circuit builder API.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// A quantum circuit.
///
/// Instructions are stored in program order. Every operand is checked
/// against the circuit width when the instruction is appended, so a
/// `Circuit` that exists is always well formed. Deserialization goes
/// through the same checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CircuitData")]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of qubits.
    num_qubits: u32,
    /// Number of classical bits.
    num_clbits: u32,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

/// Unchecked wire form of a [`Circuit`].
#[derive(Deserialize)]
struct CircuitData {
    name: String,
    num_qubits: u32,
    num_clbits: u32,
    #[serde(default)]
    instructions: Vec<Instruction>,
}

impl TryFrom<CircuitData> for Circuit {
    type Error = IrError;

    fn try_from(data: CircuitData) -> IrResult<Self> {
        Self::from_instructions(data.name, data.num_qubits, data.num_clbits, data.instructions)
    }
}

impl Circuit {
    /// Create a new empty circuit with no qubits.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_size(name, 0, 0)
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            instructions: vec![],
        }
    }

    /// Rebuild a circuit from raw parts, validating every instruction.
    pub fn from_instructions(
        name: impl Into<String>,
        num_qubits: u32,
        num_clbits: u32,
        instructions: impl IntoIterator<Item = Instruction>,
    ) -> IrResult<Self> {
        let mut circuit = Self::with_size(name, num_qubits, num_clbits);
        for inst in instructions {
            circuit.apply(inst)?;
        }
        Ok(circuit)
    }

    /// Append an instruction after checking its operands.
    pub fn apply(&mut self, inst: Instruction) -> IrResult<&mut Self> {
        self.validate(&inst)?;
        self.instructions.push(inst);
        Ok(self)
    }

    /// Check an instruction against this circuit's width.
    pub fn validate(&self, inst: &Instruction) -> IrResult<()> {
        let gate_name = inst.as_gate().map(|g| g.name().to_string());

        if let InstructionKind::Gate(gate) = &inst.kind {
            let got = inst.qubits.len() as u32;
            if got != gate.num_qubits() {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: gate.num_qubits(),
                    got,
                });
            }
        }

        for (pos, qubit) in inst.qubits.iter().enumerate() {
            if qubit.0 >= self.num_qubits {
                return Err(IrError::QubitNotFound {
                    qubit: *qubit,
                    num_qubits: self.num_qubits,
                    gate_name,
                });
            }
            if inst.qubits[..pos].contains(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit: *qubit,
                    gate_name,
                });
            }
        }

        if inst.is_measure() && inst.qubits.len() != inst.clbits.len() {
            return Err(IrError::MeasureArityMismatch {
                qubits: inst.qubits.len(),
                clbits: inst.clbits.len(),
            });
        }
        for clbit in &inst.clbits {
            if clbit.0 >= self.num_clbits {
                return Err(IrError::ClbitNotFound {
                    clbit: *clbit,
                    num_clbits: self.num_clbits,
                });
            }
        }

        Ok(())
    }

    /// Re-check every instruction.
    pub fn validate_all(&self) -> IrResult<()> {
        self.instructions.iter().try_for_each(|inst| self.validate(inst))
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Y, qubit))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Z, qubit))
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::S, qubit))
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::T, qubit))
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::SX, qubit))
    }

    /// Apply Rx rotation gate.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Rx(theta), qubit))
    }

    /// Apply Ry rotation gate.
    pub fn ry(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Ry(theta), qubit))
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Rz(theta), qubit))
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CZ, q1, q2))
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::Swap, q1, q2))
    }

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(StandardGate::CCX, [c1, c2, target]))
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Measure every qubit `i` into classical bit `i`.
    ///
    /// Classical bits are added if the circuit has fewer than qubits.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        self.num_clbits = self.num_clbits.max(self.num_qubits);
        let inst = Instruction::measure_all(
            (0..self.num_qubits).map(QubitId),
            (0..self.num_qubits).map(ClbitId),
        )?;
        self.apply(inst)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::reset(qubit))
    }

    /// Apply a barrier to all qubits.
    pub fn barrier_all(&mut self) -> IrResult<&mut Self> {
        self.apply(Instruction::barrier((0..self.num_qubits).map(QubitId)))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.num_clbits as usize
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of non-barrier operations.
    pub fn num_ops(&self) -> usize {
        self.instructions
            .iter()
            .filter(|inst| !matches!(inst.kind, InstructionKind::Barrier))
            .count()
    }

    /// Whether the circuit contains at least one measurement.
    pub fn has_measurements(&self) -> bool {
        self.instructions.iter().any(Instruction::is_measure)
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit.h(QubitId(0))?.cx(QubitId(0), QubitId(1))?.measure_all()?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit.
    pub fn ghz(n: u32) -> IrResult<Self> {
        if n == 0 {
            return Ok(Self::new("ghz_0"));
        }

        let mut circuit = Self::with_size("ghz", n, n);
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        circuit.measure_all()?;
        Ok(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.num_clbits(), 0);
        assert!(!circuit.has_measurements());
    }

    #[test]
    fn test_fluent_api() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit
            .h(QubitId(0))
            .unwrap()
            .cx(QubitId(0), QubitId(1))
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .measure(QubitId(1), ClbitId(1))
            .unwrap();

        assert_eq!(circuit.num_ops(), 4);
        assert!(circuit.has_measurements());
    }

    #[test]
    fn test_measure_all_grows_clbits() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.measure_all().unwrap();
        assert_eq!(circuit.num_clbits(), 3);
        let last = circuit.instructions().last().unwrap();
        assert_eq!(last.qubits.len(), 3);
        assert_eq!(last.clbits, vec![ClbitId(0), ClbitId(1), ClbitId(2)]);
    }

    #[test]
    fn test_out_of_range_qubit() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        let err = circuit.x(QubitId(2)).unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitNotFound {
                qubit: QubitId(2),
                num_qubits: 2,
                ..
            }
        ));
        assert!(circuit.instructions().is_empty());
    }

    #[test]
    fn test_duplicate_qubit() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        let err = circuit.cx(QubitId(1), QubitId(1)).unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { .. }));
    }

    #[test]
    fn test_gate_arity() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        let inst = Instruction::gate(StandardGate::CX, [QubitId(0)]);
        let err = circuit.apply(inst).unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_clbit_out_of_range() {
        let mut circuit = Circuit::with_size("test", 2, 1);
        let err = circuit.measure(QubitId(1), ClbitId(1)).unwrap_err();
        assert!(matches!(err, IrError::ClbitNotFound { .. }));
    }

    #[test]
    fn test_presets() {
        let bell = Circuit::bell().unwrap();
        assert_eq!(bell.num_qubits(), 2);
        assert_eq!(bell.num_ops(), 3);

        let ghz = Circuit::ghz(4).unwrap();
        assert_eq!(ghz.num_qubits(), 4);
        assert_eq!(ghz.num_ops(), 5);
    }

    #[test]
    fn test_json_roundtrip_validates() {
        let circuit = Circuit::ghz(3).unwrap();
        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, circuit);
        back.validate_all().unwrap();
    }

    #[test]
    fn test_from_instructions_rejects_bad_operands() {
        let insts = vec![
            Instruction::single_qubit_gate(StandardGate::X, QubitId(0)),
            Instruction::single_qubit_gate(StandardGate::X, QubitId(5)),
        ];
        assert!(Circuit::from_instructions("bad", 2, 2, insts).is_err());
    }

    #[test]
    fn test_deserialize_rejects_out_of_range_qubit() {
        let mut circuit = Circuit::with_size("flip", 1, 1);
        circuit.x(QubitId(0)).unwrap().measure_all().unwrap();
        let mut value = serde_json::to_value(&circuit).unwrap();
        value["instructions"][0]["qubits"][0] = serde_json::json!(5);

        let err = serde_json::from_value::<Circuit>(value).unwrap_err();
        assert!(err.to_string().contains("Qubit"), "{err}");
    }

    #[test]
    fn test_deserialize_defaults_instructions() {
        let circuit: Circuit =
            serde_json::from_str(r#"{"name": "empty", "num_qubits": 2, "num_clbits": 0}"#).unwrap();
        assert_eq!(circuit.num_ops(), 0);
    }
}
