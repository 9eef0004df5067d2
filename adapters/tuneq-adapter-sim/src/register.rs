//! Classical propagation of computational basis states.

use tuneq_hal::{HalError, HalResult};
use tuneq_ir::{Circuit, InstructionKind, StandardGate};

/// A computational basis state plus the qubit each clbit last measured.
pub(crate) struct BasisRegister {
    bits: Vec<bool>,
    /// `measured[c] = Some((value, qubit))` once clbit `c` has been written.
    measured: Vec<Option<(bool, usize)>>,
}

impl BasisRegister {
    /// Start from |0...0⟩ with no clbits written.
    pub(crate) fn new(num_qubits: usize, num_clbits: usize) -> Self {
        Self {
            bits: vec![false; num_qubits],
            measured: vec![None; num_clbits],
        }
    }

    /// Run every instruction of `circuit`.
    pub(crate) fn run(circuit: &Circuit) -> HalResult<Self> {
        let mut register = Self::new(circuit.num_qubits(), circuit.num_clbits());
        for inst in circuit.instructions() {
            let q: Vec<usize> = inst.qubits.iter().map(|q| q.index()).collect();
            match &inst.kind {
                InstructionKind::Gate(gate) => register.apply_gate(gate, &q)?,
                InstructionKind::Reset => {
                    for &qubit in &q {
                        register.bits[qubit] = false;
                    }
                }
                InstructionKind::Measure => {
                    for (&qubit, clbit) in q.iter().zip(&inst.clbits) {
                        register.measured[clbit.index()] = Some((register.bits[qubit], qubit));
                    }
                }
                InstructionKind::Barrier => {}
            }
        }
        Ok(register)
    }

    fn apply_gate(&mut self, gate: &StandardGate, q: &[usize]) -> HalResult<()> {
        match gate {
            StandardGate::I
            | StandardGate::Z
            | StandardGate::S
            | StandardGate::Sdg
            | StandardGate::T
            | StandardGate::Tdg
            | StandardGate::Rz(_)
            | StandardGate::CZ => {}
            StandardGate::X | StandardGate::Y => self.bits[q[0]] ^= true,
            StandardGate::CX => {
                if self.bits[q[0]] {
                    self.bits[q[1]] ^= true;
                }
            }
            StandardGate::Swap => self.bits.swap(q[0], q[1]),
            StandardGate::CCX => {
                if self.bits[q[0]] && self.bits[q[1]] {
                    self.bits[q[2]] ^= true;
                }
            }
            StandardGate::H | StandardGate::SX | StandardGate::Rx(_) | StandardGate::Ry(_) => {
                return Err(HalError::Unsupported(format!(
                    "gate '{}' creates superposition; the readout simulator only \
                     handles basis-permuting circuits",
                    gate.name()
                )));
            }
        }
        Ok(())
    }

    /// Clbit values, `None` for clbits never written.
    pub(crate) fn measured(&self) -> &[Option<(bool, usize)>] {
        &self.measured
    }

    /// Whether any clbit was written.
    pub(crate) fn has_measurements(&self) -> bool {
        self.measured.iter().any(Option::is_some)
    }
}
