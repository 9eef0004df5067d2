//! Readout simulator backend.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::sync::Mutex;
use tracing::{debug, instrument};

use tuneq_hal::{Counts, Executor, HalError, HalResult};
use tuneq_ir::Circuit;

use crate::noise::{ReadoutError, Sampling};
use crate::register::BasisRegister;

/// Widest classical register the simulator can key.
const MAX_CLBITS: usize = 64;

/// Local simulator with per-qubit readout errors.
///
/// Every circuit in a batch is simulated independently. With
/// [`Sampling::Seeded`], one RNG stream is shared across calls, so a fixed
/// sequence of calls reproduces the same counts.
pub struct ReadoutSimulator {
    name: String,
    default_error: ReadoutError,
    qubit_errors: FxHashMap<usize, ReadoutError>,
    sampling: Sampling,
    rng: Option<Mutex<StdRng>>,
    max_qubits: usize,
}

impl ReadoutSimulator {
    /// Create a simulator applying `error` to every qubit.
    pub fn new(error: ReadoutError) -> Self {
        Self {
            name: "readout_simulator".into(),
            default_error: error,
            qubit_errors: FxHashMap::default(),
            sampling: Sampling::Exact,
            rng: None,
            max_qubits: 16,
        }
    }

    /// A simulator with perfect readout.
    pub fn ideal() -> Self {
        Self::new(ReadoutError::none())
    }

    /// Override the readout error of one qubit.
    pub fn with_qubit_error(mut self, qubit: usize, error: ReadoutError) -> Self {
        self.qubit_errors.insert(qubit, error);
        self
    }

    /// Choose the sampling mode.
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.rng = match sampling {
            Sampling::Exact => None,
            Sampling::Seeded(seed) => Some(Mutex::new(StdRng::seed_from_u64(seed))),
        };
        self.sampling = sampling;
        self
    }

    /// Limit circuit width.
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Rename the backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Readout error applied to `qubit`.
    pub fn readout_error(&self, qubit: usize) -> ReadoutError {
        self.qubit_errors
            .get(&qubit)
            .copied()
            .unwrap_or(self.default_error)
    }

    /// Sampling mode.
    pub fn sampling(&self) -> Sampling {
        self.sampling
    }

    /// Maximum circuit width.
    pub fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    fn run_circuit(&self, circuit: &Circuit, shots: u32) -> HalResult<Counts> {
        if circuit.num_qubits() > self.max_qubits {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                self.max_qubits
            )));
        }
        if circuit.num_clbits() > MAX_CLBITS {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} classical bits; at most {MAX_CLBITS} are supported",
                circuit.num_clbits()
            )));
        }

        let register = BasisRegister::run(circuit)?;
        if !register.has_measurements() {
            return Err(HalError::InvalidCircuit(format!(
                "circuit '{}' has no measurements",
                circuit.name()
            )));
        }

        // Probability of reading 1 on each clbit; unwritten clbits read 0.
        let p_one: Vec<f64> = register
            .measured()
            .iter()
            .map(|m| match *m {
                Some((bit, qubit)) => self.readout_error(qubit).p_read_one(bit),
                None => 0.0,
            })
            .collect();

        let width = circuit.num_clbits();
        let outcomes = match &self.rng {
            None => exact_counts(&p_one, u64::from(shots)),
            Some(rng) => {
                let mut rng = rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                sampled_counts(&p_one, shots, &mut *rng)
            }
        };

        debug!(
            circuit = circuit.name(),
            outcomes = outcomes.len(),
            shots,
            "circuit simulated"
        );
        Ok(outcomes
            .into_iter()
            .map(|(index, count)| (format!("{index:0width$b}"), count))
            .collect())
    }
}

impl Default for ReadoutSimulator {
    fn default() -> Self {
        Self::ideal()
    }
}

impl std::fmt::Debug for ReadoutSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadoutSimulator")
            .field("name", &self.name)
            .field("default_error", &self.default_error)
            .field("qubit_errors", &self.qubit_errors)
            .field("sampling", &self.sampling)
            .field("max_qubits", &self.max_qubits)
            .finish_non_exhaustive()
    }
}

impl Executor for ReadoutSimulator {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, circuits), fields(circuits = circuits.len()))]
    fn execute(&self, circuits: &[Circuit], shots: u32) -> HalResult<Vec<Counts>> {
        if shots == 0 {
            return Err(HalError::InvalidShots("shots must be at least 1".into()));
        }
        circuits
            .iter()
            .map(|circuit| self.run_circuit(circuit, shots))
            .collect()
    }
}

/// Expected counts over the outcomes with non-zero probability.
fn exact_counts(p_one: &[f64], shots: u64) -> Vec<(u64, u64)> {
    let mut distribution: Vec<(u64, f64)> = vec![(0, 1.0)];
    for (clbit, &p) in p_one.iter().enumerate() {
        let bit = 1u64 << clbit;
        if p <= 0.0 {
            continue;
        }
        if p >= 1.0 {
            for (index, _) in &mut distribution {
                *index |= bit;
            }
            continue;
        }
        distribution = distribution
            .into_iter()
            .flat_map(|(index, prob)| [(index, prob * (1.0 - p)), (index | bit, prob * p)])
            .collect();
    }

    let apportioned = Counts::from_distribution(
        distribution
            .iter()
            .map(|&(index, prob)| (index.to_string(), prob)),
        shots,
    );
    distribution
        .into_iter()
        .map(|(index, _)| (index, apportioned.get(&index.to_string())))
        .filter(|&(_, count)| count > 0)
        .collect()
}

/// Per-shot Bernoulli readout.
fn sampled_counts<R: Rng + ?Sized>(p_one: &[f64], shots: u32, rng: &mut R) -> Vec<(u64, u64)> {
    let mut tally: FxHashMap<u64, u64> = FxHashMap::default();
    for _ in 0..shots {
        let mut index = 0u64;
        for (clbit, &p) in p_one.iter().enumerate() {
            if p > 0.0 && rng.gen_bool(p) {
                index |= 1 << clbit;
            }
        }
        *tally.entry(index).or_default() += 1;
    }
    tally.into_iter().collect()
}
