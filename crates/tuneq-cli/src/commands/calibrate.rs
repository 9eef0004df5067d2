//! Calibrate command implementation.

use anyhow::{Context, Result};
use console::style;
use tracing::info;

use tuneq_mitigation::{MitigationSession, basis};

use super::common::{build_simulator, print_calibration, session_config, spinner, write_json};
use crate::{DeviceArgs, SessionArgs};

/// Execute the calibrate command.
pub fn execute(
    qubits: usize,
    device: &DeviceArgs,
    session: &SessionArgs,
    export: Option<&str>,
) -> Result<()> {
    let config = session_config(session)?;
    let simulator = build_simulator(device)?;

    println!(
        "{} Calibrating {} qubits on {} ({} strategy, {} shots)",
        style("→").cyan().bold(),
        style(qubits).green(),
        style("simulator").yellow(),
        config.strategy,
        config.shots
    );

    let progress = spinner("Running calibration circuits...");
    let opened = MitigationSession::open(qubits, simulator, config);
    progress.finish_and_clear();
    let mitigation = opened.context("Calibration failed")?;

    let (Some(matrix), Some(inverse)) = (
        mitigation.calibration_matrix(),
        mitigation.inverted_matrix(),
    ) else {
        anyhow::bail!("Session is ready but holds no calibration");
    };
    info!(
        qubits,
        fidelity = matrix.average_fidelity(),
        "calibration finished"
    );

    print_calibration(matrix, inverse);

    if qubits <= 3 {
        println!("\n  Per-state readout fidelity:");
        for state in basis::enumerate(qubits) {
            if let Some(fidelity) = matrix.readout_fidelity(state.index()) {
                println!("    {}  {:.4}", style(state).cyan(), fidelity);
            }
        }
    }

    if let Some(path) = export {
        write_json(path, matrix)?;
    }

    Ok(())
}
