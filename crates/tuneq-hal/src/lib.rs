//! tuneq Hardware Abstraction Layer
//!
//! This crate defines the boundary between the mitigation core and whatever
//! actually runs circuits: a local simulator, a cloud service, or a test
//! double. The core never talks to hardware directly; it hands a batch of
//! [`Circuit`](tuneq_ir::Circuit)s and a shot count to an [`Executor`] and
//! gets one [`Counts`] back per circuit.
//!
//! # Overview
//!
//! - [`Executor`]: synchronous, order-preserving batch execution
//! - [`executor_fn`]: wrap a closure as an [`Executor`]
//! - [`Counts`]: bitstring → count distribution with exact-total apportioning
//!
//! # Example: A Closure Backend
//!
//! ```rust
//! use tuneq_hal::{executor_fn, Counts, Executor, HalResult};
//! use tuneq_ir::Circuit;
//!
//! // Every circuit reads out all zeros.
//! let backend = executor_fn(|circuits: &[Circuit], shots: u32| -> HalResult<Vec<Counts>> {
//!     Ok(circuits
//!         .iter()
//!         .map(|c| Counts::from_pairs([("0".repeat(c.num_clbits()), u64::from(shots))]))
//!         .collect())
//! });
//!
//! let circuit = Circuit::with_size("idle", 2, 2);
//! let results = backend.execute(&[circuit], 100).unwrap();
//! assert_eq!(results[0].get("00"), 100);
//! ```
//!
//! # Concurrency
//!
//! `Executor::execute` takes `&self`. A mitigation session may be shared
//! across threads only when its executor is `Sync`; nothing in tuneq
//! serializes calls on the executor's behalf.

pub mod error;
pub mod executor;
pub mod result;

pub use error::{HalError, HalResult};
pub use executor::{Executor, FnExecutor, executor_fn};
pub use result::Counts;
