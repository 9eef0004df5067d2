//! Execution adapter contract.
//!
//! An [`Executor`] runs an ordered batch of circuits for a fixed shot count
//! and returns exactly one [`Counts`] per circuit, in submission order.
//!
//! ```text
//!   [c0, c1, ..., ck], shots ──→ execute() ──→ [counts0, counts1, ..., countsk]
//! ```
//!
//! Implementations decide how (or whether) to batch on the wire; callers
//! always submit a whole batch in one call. Retries, timeouts and
//! cancellation belong to the executor, not to its callers.

use std::fmt;

use tuneq_ir::Circuit;

use crate::error::{HalError, HalResult};
use crate::result::Counts;

/// A synchronous circuit execution backend.
pub trait Executor {
    /// Human-readable backend name used in logs.
    fn name(&self) -> &str {
        "executor"
    }

    /// Execute `circuits` with `shots` shots each.
    ///
    /// Must return one [`Counts`] per circuit, in the same order.
    fn execute(&self, circuits: &[Circuit], shots: u32) -> HalResult<Vec<Counts>>;

    /// Execute and check that the backend honoured the one-result-per-circuit
    /// contract.
    fn execute_checked(&self, circuits: &[Circuit], shots: u32) -> HalResult<Vec<Counts>> {
        if shots == 0 {
            return Err(HalError::InvalidShots("shots must be at least 1".into()));
        }
        let results = self.execute(circuits, shots)?;
        if results.len() != circuits.len() {
            return Err(HalError::ResultCountMismatch {
                expected: circuits.len(),
                got: results.len(),
            });
        }
        tracing::trace!(
            backend = self.name(),
            circuits = circuits.len(),
            shots,
            "batch executed"
        );
        Ok(results)
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn execute(&self, circuits: &[Circuit], shots: u32) -> HalResult<Vec<Counts>> {
        (**self).execute(circuits, shots)
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn execute(&self, circuits: &[Circuit], shots: u32) -> HalResult<Vec<Counts>> {
        (**self).execute(circuits, shots)
    }
}

impl<E: Executor + ?Sized> Executor for std::sync::Arc<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn execute(&self, circuits: &[Circuit], shots: u32) -> HalResult<Vec<Counts>> {
        (**self).execute(circuits, shots)
    }
}

/// An [`Executor`] backed by a closure.
///
/// Created with [`executor_fn`].
pub struct FnExecutor<F> {
    name: String,
    f: F,
}

impl<F> FnExecutor<F> {
    /// Set the name reported in logs.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> fmt::Debug for FnExecutor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<F> Executor for FnExecutor<F>
where
    F: Fn(&[Circuit], u32) -> HalResult<Vec<Counts>>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, circuits: &[Circuit], shots: u32) -> HalResult<Vec<Counts>> {
        (self.f)(circuits, shots)
    }
}

/// Wrap a closure with the adapter signature as an [`Executor`].
pub fn executor_fn<F>(f: F) -> FnExecutor<F>
where
    F: Fn(&[Circuit], u32) -> HalResult<Vec<Counts>>,
{
    FnExecutor {
        name: "fn".into(),
        f,
    }
}
