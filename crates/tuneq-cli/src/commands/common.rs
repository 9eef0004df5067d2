//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use tuneq_adapter_sim::{ReadoutError, ReadoutSimulator, Sampling};
use tuneq_hal::Counts;
use tuneq_ir::Circuit;
use tuneq_mitigation::{
    CalibrationMatrix, CalibrationMatrixData, InvertedMatrix, MitigationConfig,
};

use crate::{DeviceArgs, SessionArgs};

/// Largest matrix printed in full.
const MAX_PRINTED_DIM: usize = 8;

/// Most outcomes listed per distribution.
const MAX_PRINTED_OUTCOMES: usize = 16;

/// Load configuration (file, then environment), then apply CLI overrides.
pub fn load_config(
    config: Option<&str>,
    shots: Option<u32>,
    strategy: Option<&str>,
) -> Result<MitigationConfig> {
    let mut cfg = MitigationConfig::load(config.map(Path::new))
        .with_context(|| format!("Failed to load configuration{}", describe_path(config)))?;

    if let Some(shots) = shots {
        cfg.shots = shots;
    }
    if let Some(strategy) = strategy {
        cfg.strategy = strategy.parse()?;
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Configuration for a session-backed command.
pub fn session_config(session: &SessionArgs) -> Result<MitigationConfig> {
    load_config(
        session.config.as_deref(),
        session.shots,
        session.strategy.as_deref(),
    )
}

fn describe_path(path: Option<&str>) -> String {
    path.map(|p| format!(" from {p}")).unwrap_or_default()
}

/// Build the simulated device described on the command line.
pub fn build_simulator(device: &DeviceArgs) -> Result<ReadoutSimulator> {
    let error = ReadoutError::new(device.p10, device.p01)
        .map_err(|e| anyhow::anyhow!("Invalid readout error: {e}"))?;
    let sampling = device.seed.map_or(Sampling::Exact, Sampling::Seeded);
    Ok(ReadoutSimulator::new(error)
        .with_sampling(sampling)
        .with_name("simulator"))
}

/// Load a circuit from a JSON file.
pub fn load_circuit(path: &str) -> Result<Circuit> {
    let source = read_file(path)?;
    serde_json::from_str(&source).with_context(|| format!("Failed to parse circuit JSON: {path}"))
}

/// Load a counts object (`{"00": 480, "11": 520}`) from a JSON file.
pub fn load_counts(path: &str) -> Result<Counts> {
    let source = read_file(path)?;
    serde_json::from_str(&source).with_context(|| format!("Failed to parse counts JSON: {path}"))
}

/// Load an exported calibration matrix, checking columns against `tolerance`.
pub fn load_calibration(path: &str, tolerance: f64) -> Result<CalibrationMatrix> {
    let source = read_file(path)?;
    let data: CalibrationMatrixData = serde_json::from_str(&source)
        .with_context(|| format!("Failed to parse calibration JSON: {path}"))?;
    data.into_matrix(tolerance)
        .with_context(|| format!("Invalid calibration matrix in {path}"))
}

fn read_file(path: &str) -> Result<String> {
    if !Path::new(path).exists() {
        anyhow::bail!("File not found: {path}");
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))
}

/// Write `value` as pretty JSON.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write file: {path}"))?;
    println!("  Wrote {}", style(path).green());
    Ok(())
}

/// Spinner shown while the executor is busy.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print raw and corrected counts side by side, most frequent corrected
/// outcome first, with a bar for the corrected probability.
#[allow(clippy::cast_precision_loss)]
pub fn print_comparison(raw: &Counts, corrected: &Counts) {
    println!(
        "\n{} Raw vs corrected ({} shots):",
        style("✓").green().bold(),
        corrected.total_shots()
    );

    let sorted = corrected.sorted();
    let total = corrected.total_shots().max(1) as f64;

    for (bitstring, count) in sorted.iter().take(MAX_PRINTED_OUTCOMES) {
        let prob = **count as f64 / total * 100.0;
        let bar_len = (prob / 2.0).round() as usize;
        let bar: String = "█".repeat(bar_len);

        println!(
            "  {}: {:>6} → {:>6} ({:>5.2}%) {}",
            style(bitstring).cyan(),
            raw.get(bitstring),
            count,
            prob,
            style(bar).green()
        );
    }

    if sorted.len() > MAX_PRINTED_OUTCOMES {
        println!("  ... and {} more outcomes", sorted.len() - MAX_PRINTED_OUTCOMES);
    }
}

/// Print calibration diagnostics and, for small registers, the matrix.
pub fn print_calibration(matrix: &CalibrationMatrix, inverse: &InvertedMatrix) {
    println!(
        "\n{} Calibration ({} qubits, {} strategy):",
        style("✓").green().bold(),
        matrix.num_qubits(),
        matrix.strategy()
    );
    println!(
        "  Average readout fidelity: {}",
        style(format!("{:.4}", matrix.average_fidelity())).yellow()
    );
    println!(
        "  Condition number:         {}",
        style(format!("{:.4e}", inverse.condition_number())).yellow()
    );
    println!("  Inversion:                {}", style(inverse.method()).yellow());

    if matrix.dim() > MAX_PRINTED_DIM {
        println!("  ({0}×{0} matrix not shown)", matrix.dim());
        return;
    }

    let width = matrix.num_qubits();
    println!();
    print!("  {:>width$}  ", "");
    for j in 0..matrix.dim() {
        print!("{:>8}", format!("{j:0width$b}"));
    }
    println!();
    for (i, row) in matrix.to_rows().iter().enumerate() {
        print!("  {}  ", style(format!("{i:0width$b}")).cyan());
        for &value in row {
            print!("{value:>8.4}");
        }
        println!();
    }
}
