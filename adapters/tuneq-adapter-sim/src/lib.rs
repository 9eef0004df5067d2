//! tuneq Readout-Noise Simulator
//!
//! A local [`Executor`](tuneq_hal::Executor) for circuits that only permute
//! computational basis states (X, CX, SWAP, CCX, diagonal phases, resets),
//! which covers every calibration circuit and the classical payloads used to
//! exercise mitigation. Each measured bit then passes through a per-qubit
//! readout error channel.
//!
//! Gates that create superpositions (H, SX, Rx, Ry) are rejected with
//! [`HalError::Unsupported`](tuneq_hal::HalError::Unsupported).
//!
//! # Sampling
//!
//! | Mode | Counts |
//! |------|--------|
//! | [`Sampling::Exact`] | expected counts, apportioned with the largest-remainder method |
//! | [`Sampling::Seeded`] | per-shot Bernoulli flips from a seeded RNG |
//!
//! # Example
//!
//! ```rust
//! use tuneq_adapter_sim::{ReadoutError, ReadoutSimulator};
//! use tuneq_hal::Executor;
//! use tuneq_ir::{Circuit, QubitId};
//!
//! let sim = ReadoutSimulator::new(ReadoutError::new(0.1, 0.05).unwrap());
//!
//! let mut circuit = Circuit::with_size("one", 1, 1);
//! circuit.x(QubitId(0)).unwrap().measure_all().unwrap();
//!
//! let counts = sim.execute(&[circuit], 1000).unwrap();
//! assert_eq!(counts[0].get("1"), 950);
//! assert_eq!(counts[0].get("0"), 50);
//! ```

mod noise;
mod register;
mod simulator;

pub use noise::{ReadoutError, Sampling};
pub use simulator::ReadoutSimulator;
