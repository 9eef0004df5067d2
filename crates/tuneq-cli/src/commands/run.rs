//! Run command implementation.

use anyhow::{Context, Result};
use console::style;
use serde::Serialize;

use tuneq_hal::Counts;
use tuneq_mitigation::MitigationSession;

use super::common::{
    build_simulator, load_circuit, print_comparison, session_config, spinner, write_json,
};
use crate::{DeviceArgs, SessionArgs};

/// JSON written by `--output`.
#[derive(Serialize)]
struct RunOutput<'a> {
    circuit: &'a str,
    raw: &'a Counts,
    corrected: &'a Counts,
    clipped_mass: f64,
}

/// Execute the run command.
pub fn execute(
    input: &str,
    device: &DeviceArgs,
    session: &SessionArgs,
    output: Option<&str>,
) -> Result<()> {
    let config = session_config(session)?;

    let circuit = load_circuit(input)?;
    let num_qubits = circuit.num_clbits();
    if num_qubits == 0 {
        anyhow::bail!("Circuit '{}' has no classical bits to mitigate", circuit.name());
    }

    println!(
        "{} Running {} on {} ({} shots, readout mitigation on {} bits)",
        style("→").cyan().bold(),
        style(input).green(),
        style("simulator").yellow(),
        config.shots,
        num_qubits
    );
    println!(
        "  Loaded: {} qubits, {} ops",
        circuit.num_qubits(),
        circuit.num_ops()
    );

    let simulator = build_simulator(device)?;

    let progress = spinner("Calibrating...");
    let opened = MitigationSession::open(num_qubits, simulator, config);
    let mitigation = match opened {
        Ok(session) => session,
        Err(e) => {
            progress.finish_and_clear();
            return Err(e).context("Calibration failed");
        }
    };

    progress.set_message(format!("Running {}...", circuit.name()));
    let result = mitigation.run_detailed(&circuit);
    progress.finish_and_clear();
    let result = result.with_context(|| format!("Failed to run {}", circuit.name()))?;

    print_comparison(&result.raw, &result.corrected);
    if result.clipped_mass > 0.0 {
        println!(
            "\n  Clipped negative quasi-probability: {}",
            style(format!("{:.3e}", result.clipped_mass)).dim()
        );
    }

    if let Some(path) = output {
        write_json(
            path,
            &RunOutput {
                circuit: circuit.name(),
                raw: &result.raw,
                corrected: &result.corrected,
                clipped_mass: result.clipped_mass,
            },
        )?;
    }

    Ok(())
}
