//! tuneq Circuit Descriptors
//!
//! This crate provides the small circuit representation that flows between the
//! mitigation core and an execution backend. The core only ever builds two
//! shapes of circuit itself (basis-state preparations followed by a full
//! measurement); everything else is a user payload that is handed through to
//! the backend untouched.
//!
//! # Core Components
//!
//! - **Qubits and Classical Bits**: [`QubitId`], [`ClbitId`]
//! - **Gates**: [`StandardGate`] for the built-in gate set
//! - **Instructions**: [`Instruction`] combining an [`InstructionKind`] with operands
//! - **Circuit**: [`Circuit`] builder with eager operand validation
//!
//! # Example: Preparing |101⟩
//!
//! ```rust
//! use tuneq_ir::{Circuit, QubitId};
//!
//! let mut circuit = Circuit::with_size("prep_101", 3, 3);
//! circuit.x(QubitId(0)).unwrap().x(QubitId(2)).unwrap();
//! circuit.measure_all().unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 3);
//! assert_eq!(circuit.num_ops(), 3);
//! ```
//!
//! # Bit ordering
//!
//! Measured bitstrings follow the OpenQASM 3 convention: the rightmost
//! character corresponds to classical bit 0.

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use qubit::{ClbitId, QubitId};
