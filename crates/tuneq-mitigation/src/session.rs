//! Mitigation sessions.
//!
//! A session calibrates once, caches the inverted calibration matrix, and
//! then corrects every payload it runs:
//!
//! ```text
//!   Uninitialized ──calibrate()──→ Calibrating ──ok──→ Ready ──close()/drop──→ Closed
//!                                       │
//!                                       └──error──→ Failed
//! ```
//!
//! Dropping a session closes it, so the cached matrices are released on
//! every exit path, including unwinding out of a `run` call.

use std::fmt;

use tracing::{debug, info, instrument};
use tuneq_hal::{Counts, Executor, HalError};
use tuneq_ir::Circuit;

use crate::basis;
use crate::calibration;
use crate::config::{CalibrationStrategy, MitigationConfig};
use crate::corrector::Corrector;
use crate::error::{CalibrationError, CalibrationResult, MitigationError, MitigationResult};
use crate::inverter::{InvertedMatrix, MatrixInverter};
use crate::matrix::CalibrationMatrix;

/// Lifecycle state of a [`MitigationSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Created, calibration not yet started.
    Uninitialized,
    /// Calibration circuits are being run and processed.
    Calibrating,
    /// Calibration succeeded; payloads can be run.
    Ready,
    /// Released; the cached matrices are gone.
    Closed,
    /// Calibration failed. Terminal.
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Calibrating => "calibrating",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Raw and corrected counts for one payload circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct MitigatedCounts {
    /// Counts as returned by the executor.
    pub raw: Counts,
    /// Counts after readout correction.
    pub corrected: Counts,
    /// Negative quasi-probability discarded during correction.
    pub clipped_mass: f64,
}

/// A calibrated readout-error mitigation session over an [`Executor`].
///
/// Payload methods take `&self`, so a ready session can be shared across
/// threads whenever the executor is `Sync`.
pub struct MitigationSession<E: Executor> {
    num_qubits: usize,
    executor: E,
    config: MitigationConfig,
    state: SessionState,
    calibration: Option<CalibrationMatrix>,
    inverse: Option<InvertedMatrix>,
}

impl<E: Executor> MitigationSession<E> {
    /// Create an uncalibrated session.
    pub fn new(num_qubits: usize, executor: E, config: MitigationConfig) -> Self {
        Self {
            num_qubits,
            executor,
            config,
            state: SessionState::Uninitialized,
            calibration: None,
            inverse: None,
        }
    }

    /// Create a session and calibrate it.
    ///
    /// Returns only once the session is ready; a calibration failure is
    /// returned as an error and the session is dropped.
    pub fn open(num_qubits: usize, executor: E, config: MitigationConfig) -> MitigationResult<Self> {
        let mut session = Self::new(num_qubits, executor, config);
        session.calibrate()?;
        Ok(session)
    }

    /// Run calibration and cache the inverted matrix.
    ///
    /// All calibration circuits go to the executor in a single batch. Calling
    /// this on a ready session does nothing.
    #[instrument(skip(self), fields(num_qubits = self.num_qubits, backend = self.executor.name()))]
    pub fn calibrate(&mut self) -> MitigationResult<()> {
        match self.state {
            SessionState::Uninitialized => {}
            SessionState::Ready => {
                debug!("session already calibrated");
                return Ok(());
            }
            SessionState::Closed => return Err(MitigationError::Closed),
            state @ (SessionState::Calibrating | SessionState::Failed) => {
                return Err(MitigationError::NotReady { state });
            }
        }

        self.state = SessionState::Calibrating;
        match self.build_calibration() {
            Ok((calibration, inverse)) => {
                info!(
                    strategy = %calibration.strategy(),
                    average_fidelity = calibration.average_fidelity(),
                    condition_number = inverse.condition_number(),
                    method = %inverse.method(),
                    "calibration complete"
                );
                self.calibration = Some(calibration);
                self.inverse = Some(inverse);
                self.state = SessionState::Ready;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "calibration failed");
                self.state = SessionState::Failed;
                Err(e.into())
            }
        }
    }

    fn build_calibration(&self) -> CalibrationResult<(CalibrationMatrix, InvertedMatrix)> {
        let config = &self.config;
        basis::validate_num_qubits(self.num_qubits, config.max_qubits)?;
        if config.shots == 0 {
            return Err(CalibrationError::InvalidShots(
                "calibration shots must be at least 1".into(),
            ));
        }
        config.validate()?;

        let circuits =
            calibration::build_for_strategy(config.strategy, self.num_qubits, config.max_qubits)?;
        info!(
            circuits = circuits.len(),
            shots = config.shots,
            strategy = %config.strategy,
            "running calibration circuits"
        );

        let results = self
            .executor
            .execute_checked(&circuits, config.shots)
            .map_err(|e| match e {
                HalError::ResultCountMismatch { expected, got } => {
                    CalibrationError::ResultCountMismatch { expected, got }
                }
                other => CalibrationError::Execution(other),
            })?;

        let matrix = match config.strategy {
            CalibrationStrategy::Full => {
                CalibrationMatrix::from_counts(&results, self.num_qubits, config.shots, config)?
            }
            CalibrationStrategy::Tensored => CalibrationMatrix::from_tensored_counts(
                &results,
                self.num_qubits,
                config.shots,
                config,
            )?,
        };
        let inverse = MatrixInverter::from_config(config).invert(&matrix)?;
        Ok((matrix, inverse))
    }

    /// Run a payload circuit with the session's shot count and correct it.
    pub fn run(&self, circuit: &Circuit) -> MitigationResult<Counts> {
        self.run_with_shots(circuit, self.config.shots)
    }

    /// Run a payload circuit with an explicit shot count and correct it.
    pub fn run_with_shots(&self, circuit: &Circuit, shots: u32) -> MitigationResult<Counts> {
        self.run_detailed_with_shots(circuit, shots)
            .map(|m| m.corrected)
    }

    /// Run a payload circuit and return both raw and corrected counts.
    pub fn run_detailed(&self, circuit: &Circuit) -> MitigationResult<MitigatedCounts> {
        self.run_detailed_with_shots(circuit, self.config.shots)
    }

    fn run_detailed_with_shots(
        &self,
        circuit: &Circuit,
        shots: u32,
    ) -> MitigationResult<MitigatedCounts> {
        let mut results = self.run_batch_detailed(std::slice::from_ref(circuit), shots)?;
        results.pop().ok_or(MitigationError::ResultCountMismatch {
            expected: 1,
            got: 0,
        })
    }

    /// Run several payload circuits in one executor call and correct each.
    pub fn run_batch(&self, circuits: &[Circuit]) -> MitigationResult<Vec<Counts>> {
        Ok(self
            .run_batch_detailed(circuits, self.config.shots)?
            .into_iter()
            .map(|m| m.corrected)
            .collect())
    }

    /// Run several payload circuits in one executor call, keeping raw counts.
    #[instrument(skip(self, circuits), fields(circuits = circuits.len()))]
    pub fn run_batch_detailed(
        &self,
        circuits: &[Circuit],
        shots: u32,
    ) -> MitigationResult<Vec<MitigatedCounts>> {
        let inverse = self.ready_inverse()?;
        if shots == 0 {
            return Err(MitigationError::InvalidShots(
                "payload shots must be at least 1".into(),
            ));
        }
        if circuits.is_empty() {
            return Ok(Vec::new());
        }

        let raw_results = self
            .executor
            .execute_checked(circuits, shots)
            .map_err(|e| match e {
                HalError::ResultCountMismatch { expected, got } => {
                    MitigationError::ResultCountMismatch { expected, got }
                }
                other => MitigationError::Execution(other),
            })?;

        let corrector = Corrector::new(inverse);
        raw_results
            .into_iter()
            .zip(circuits)
            .map(|(raw, circuit)| -> MitigationResult<MitigatedCounts> {
                let correction = corrector.correct_with_report(&raw)?;
                debug!(
                    circuit = circuit.name(),
                    shots = raw.total_shots(),
                    clipped_mass = correction.clipped_mass,
                    "payload corrected"
                );
                Ok(MitigatedCounts {
                    raw,
                    corrected: correction.counts,
                    clipped_mass: correction.clipped_mass,
                })
            })
            .collect()
    }

    /// Correct counts obtained outside the session.
    pub fn correct(&self, raw: &Counts) -> MitigationResult<Counts> {
        let inverse = self.ready_inverse()?;
        Ok(Corrector::new(inverse).correct(raw)?)
    }

    fn ready_inverse(&self) -> MitigationResult<&InvertedMatrix> {
        match (self.state, self.inverse.as_ref()) {
            (SessionState::Ready, Some(inverse)) => Ok(inverse),
            (SessionState::Closed, _) => Err(MitigationError::Closed),
            (state, _) => Err(MitigationError::NotReady { state }),
        }
    }

    /// Release the cached matrices.
    ///
    /// A failed session stays failed. Closing twice is a no-op.
    pub fn close(&mut self) {
        if matches!(self.state, SessionState::Closed) {
            return;
        }
        self.calibration = None;
        self.inverse = None;
        if !matches!(self.state, SessionState::Failed) {
            self.state = SessionState::Closed;
        }
        debug!(num_qubits = self.num_qubits, "mitigation session closed");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether payloads can be run.
    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    /// Register width.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Session configuration.
    pub fn config(&self) -> &MitigationConfig {
        &self.config
    }

    /// The wrapped executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// The calibration matrix, while ready.
    pub fn calibration_matrix(&self) -> Option<&CalibrationMatrix> {
        self.calibration.as_ref()
    }

    /// The cached inverse, while ready.
    pub fn inverted_matrix(&self) -> Option<&InvertedMatrix> {
        self.inverse.as_ref()
    }
}

impl<E: Executor> Drop for MitigationSession<E> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<E: Executor> fmt::Debug for MitigationSession<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MitigationSession")
            .field("num_qubits", &self.num_qubits)
            .field("backend", &self.executor.name())
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Calibrate a session, hand it to `body`, and close it afterwards.
///
/// The session is closed whether `body` returns normally, returns an error,
/// or panics.
///
/// ```rust
/// use tuneq_hal::{executor_fn, Counts, HalResult};
/// use tuneq_ir::Circuit;
/// use tuneq_mitigation::{mitigate_measurement_errors, MitigationConfig, MitigationError};
///
/// // A perfect one-qubit device that always reads out what was prepared.
/// let device = executor_fn(|circuits: &[Circuit], shots: u32| -> HalResult<Vec<Counts>> {
///     Ok(circuits
///         .iter()
///         .map(|c| {
///             let flipped = c.instructions().iter().any(|i| i.is_gate());
///             let bit = if flipped { "1" } else { "0" };
///             Counts::from_pairs([(bit, u64::from(shots))])
///         })
///         .collect())
/// });
///
/// let mut circuit = Circuit::with_size("payload", 1, 1);
/// circuit.measure_all().unwrap();
///
/// let counts = mitigate_measurement_errors(1, device, MitigationConfig::default(), |session| {
///     session.run(&circuit)
/// })?;
/// assert_eq!(counts.get("0"), 1024);
/// assert_eq!(counts.get("1"), 0);
/// # Ok::<(), MitigationError>(())
/// ```
pub fn mitigate_measurement_errors<E, F, T, R>(
    num_qubits: usize,
    executor: E,
    config: MitigationConfig,
    body: F,
) -> Result<T, R>
where
    E: Executor,
    F: FnOnce(&MitigationSession<E>) -> Result<T, R>,
    R: From<MitigationError>,
{
    let mut session = MitigationSession::open(num_qubits, executor, config)?;
    let result = body(&session);
    session.close();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tuneq_hal::{HalResult, executor_fn};
    use tuneq_ir::QubitId;

    /// One-qubit device with the classic 0.9 / 0.95 readout fidelities.
    fn noisy_device(circuits: &[Circuit], _shots: u32) -> HalResult<Vec<Counts>> {
        Ok(circuits
            .iter()
            .map(|c| {
                if c.name() == "cal_0" {
                    Counts::from_pairs([("0", 900), ("1", 100)])
                } else if c.name() == "cal_1" {
                    Counts::from_pairs([("0", 50), ("1", 950)])
                } else {
                    Counts::from_pairs([("0", 800), ("1", 200)])
                }
            })
            .collect())
    }

    fn payload() -> Circuit {
        let mut c = Circuit::with_size("payload", 1, 1);
        c.measure(QubitId(0), tuneq_ir::ClbitId(0)).unwrap();
        c
    }

    fn config() -> MitigationConfig {
        MitigationConfig::default().with_shots(1000)
    }

    #[test]
    fn test_lifecycle() {
        let mut session = MitigationSession::new(1, executor_fn(noisy_device), config());
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert!(matches!(
            session.run(&payload()),
            Err(MitigationError::NotReady {
                state: SessionState::Uninitialized
            })
        ));

        session.calibrate().unwrap();
        assert!(session.is_ready());
        assert!(session.calibration_matrix().is_some());
        assert!(session.inverted_matrix().unwrap().is_exact());

        let counts = session.run(&payload()).unwrap();
        assert_eq!(counts.get("0"), 882);
        assert_eq!(counts.get("1"), 118);

        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.inverted_matrix().is_none());
        assert!(matches!(session.run(&payload()), Err(MitigationError::Closed)));
        assert!(matches!(session.calibrate(), Err(MitigationError::Closed)));
    }

    #[test]
    fn test_calibration_is_one_batch() {
        let calls = Cell::new(0);
        let exec = executor_fn(|c: &[Circuit], s: u32| {
            calls.set(calls.get() + 1);
            noisy_device(c, s)
        });
        let session = MitigationSession::open(1, &exec, config()).unwrap();
        assert_eq!(calls.get(), 1);

        session.run_batch(&[payload(), payload(), payload()]).unwrap();
        assert_eq!(calls.get(), 2);

        // Already calibrated: no new executor call.
        let mut session = session;
        session.calibrate().unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_failed_calibration_is_terminal() {
        let exec = executor_fn(|_: &[Circuit], _: u32| -> HalResult<Vec<Counts>> {
            Err(HalError::ExecutionFailed("device offline".into()))
        });
        let mut session = MitigationSession::new(1, exec, config());
        let err = session.calibrate().unwrap_err();
        assert!(matches!(
            err,
            MitigationError::Calibration(CalibrationError::Execution(_))
        ));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(matches!(
            session.run(&payload()),
            Err(MitigationError::NotReady {
                state: SessionState::Failed
            })
        ));
        session.close();
        assert_eq!(session.state(), SessionState::Failed);
    }

    #[test]
    fn test_payload_failure_is_not_calibration_error() {
        let exec = executor_fn(|c: &[Circuit], s: u32| {
            if c.iter().any(|c| c.name() == "payload") {
                Err(HalError::ExecutionFailed("queue full".into()))
            } else {
                noisy_device(c, s)
            }
        });
        let session = MitigationSession::open(1, exec, config()).unwrap();
        assert!(matches!(
            session.run(&payload()),
            Err(MitigationError::Execution(HalError::ExecutionFailed(_)))
        ));
        // A failed payload leaves the session usable.
        assert!(session.is_ready());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            MitigationSession::open(0, executor_fn(noisy_device), config()),
            Err(MitigationError::Calibration(
                CalibrationError::InvalidQubitCount { .. }
            ))
        ));

        let session = MitigationSession::open(1, executor_fn(noisy_device), config()).unwrap();
        assert!(matches!(
            session.run_with_shots(&payload(), 0),
            Err(MitigationError::InvalidShots(_))
        ));
        assert!(session.run_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_correct_external_counts() {
        let session = MitigationSession::open(1, executor_fn(noisy_device), config()).unwrap();
        let corrected = session
            .correct(&Counts::from_pairs([("0", 400), ("1", 100)]))
            .unwrap();
        assert_eq!(corrected.total_shots(), 500);
        assert_eq!(corrected.get("0"), 441);
        assert_eq!(corrected.get("1"), 59);
    }

    #[test]
    fn test_run_detailed() {
        let session = MitigationSession::open(1, executor_fn(noisy_device), config()).unwrap();
        let result = session.run_detailed(&payload()).unwrap();
        assert_eq!(result.raw.get("0"), 800);
        assert_eq!(result.corrected.get("0"), 882);
        assert!(result.clipped_mass.abs() < f64::EPSILON);
    }

    /// Records when the session releases its executor.
    struct TrackedDevice<'a> {
        released: &'a Cell<bool>,
    }

    impl Executor for TrackedDevice<'_> {
        fn execute(&self, circuits: &[Circuit], shots: u32) -> HalResult<Vec<Counts>> {
            noisy_device(circuits, shots)
        }
    }

    impl Drop for TrackedDevice<'_> {
        fn drop(&mut self) {
            self.released.set(true);
        }
    }

    #[test]
    fn test_scoped_session_closes_on_error() {
        let released = Cell::new(false);
        let device = TrackedDevice {
            released: &released,
        };
        let result: Result<(), MitigationError> =
            mitigate_measurement_errors(1, device, config(), |session| {
                assert!(session.is_ready());
                assert!(!released.get());
                Err(MitigationError::Closed)
            });
        assert!(matches!(result, Err(MitigationError::Closed)));
        assert!(released.get());
    }

    #[test]
    fn test_scoped_session_closes_on_panic() {
        let released = Cell::new(false);
        let device = TrackedDevice {
            released: &released,
        };
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            mitigate_measurement_errors(1, device, config(), |_| -> MitigationResult<()> {
                panic!("payload body failed")
            })
        }));
        assert!(outcome.is_err());
        assert!(released.get());
    }

    #[test]
    fn test_drop_releases_cached_matrices() {
        let released = Cell::new(false);
        let mut session = MitigationSession::open(
            1,
            TrackedDevice {
                released: &released,
            },
            config(),
        )
        .unwrap();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.calibration_matrix().is_none());
        assert!(session.inverted_matrix().is_none());
        drop(session);
        assert!(released.get());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Ready.to_string(), "ready");
        assert_eq!(
            MitigationError::NotReady {
                state: SessionState::Failed
            }
            .to_string(),
            "Mitigation session is not ready (state: failed)"
        );
    }
}
