//! Correct command implementation.

use anyhow::{Context, Result};
use console::style;

use tuneq_mitigation::{Corrector, MatrixInverter};

use super::common::{load_calibration, load_config, load_counts, print_comparison, write_json};

/// Execute the correct command.
pub fn execute(
    counts_path: &str,
    calibration_path: &str,
    config: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let config = load_config(config, None, None)?;
    let calibration = load_calibration(calibration_path, config.column_tolerance)?;
    let raw = load_counts(counts_path)?;

    println!(
        "{} Correcting {} with {} ({} qubits)",
        style("→").cyan().bold(),
        style(counts_path).green(),
        style(calibration_path).yellow(),
        calibration.num_qubits()
    );

    let inverse = MatrixInverter::from_config(&config)
        .invert(&calibration)
        .context("Failed to invert calibration matrix")?;
    println!(
        "  Inversion: {} (condition number {:.4e})",
        inverse.method(),
        inverse.condition_number()
    );

    let corrected = Corrector::new(&inverse)
        .correct(&raw)
        .context("Correction failed")?;

    print_comparison(&raw, &corrected);

    if let Some(path) = output {
        write_json(path, &corrected)?;
    }

    Ok(())
}
