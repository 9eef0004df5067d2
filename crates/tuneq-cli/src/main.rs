//! tuneq Command-Line Interface
//!
//! Calibrate a (simulated) device's readout, run circuits through a
//! mitigation session, and correct counts captured elsewhere.
//!
//! ```text
//!   tuneq calibrate -q 3 --p10 0.02 --p01 0.05 --export cal.json
//!   tuneq run -i circuit.json --p10 0.02 --p01 0.05
//!   tuneq correct --counts raw.json --calibration cal.json
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{calibrate, correct, run, version};

/// tuneq - readout-error calibration and mitigation
#[derive(Parser)]
#[command(name = "tuneq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Readout noise of the simulated device.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Probability of reading 1 when the qubit is |0⟩
    #[arg(long, default_value = "0.02")]
    pub p10: f64,

    /// Probability of reading 0 when the qubit is |1⟩
    #[arg(long, default_value = "0.05")]
    pub p01: f64,

    /// Sample shots from a seeded RNG instead of using expected counts
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Mitigation session settings; override the config file and environment.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Number of shots per circuit
    #[arg(short, long)]
    pub shots: Option<u32>,

    /// Calibration strategy (full, tensored)
    #[arg(long)]
    pub strategy: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "TUNEQ_CONFIG")]
    pub config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate the simulated device and report its readout matrix
    Calibrate {
        /// Number of qubits to calibrate
        #[arg(short, long)]
        qubits: usize,

        #[command(flatten)]
        device: DeviceArgs,

        #[command(flatten)]
        session: SessionArgs,

        /// Write the calibration matrix as JSON
        #[arg(short, long)]
        export: Option<String>,
    },

    /// Run a JSON circuit through a mitigation session
    Run {
        /// Input circuit file (JSON)
        #[arg(short, long)]
        input: String,

        #[command(flatten)]
        device: DeviceArgs,

        #[command(flatten)]
        session: SessionArgs,

        /// Write raw and corrected counts as JSON
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Correct a JSON counts file with an exported calibration
    Correct {
        /// Raw counts file (JSON object of bitstring → count)
        #[arg(long)]
        counts: String,

        /// Calibration matrix file written by `tuneq calibrate --export`
        #[arg(long)]
        calibration: String,

        /// YAML configuration file
        #[arg(short, long, env = "TUNEQ_CONFIG")]
        config: Option<String>,

        /// Write corrected counts as JSON
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Calibrate {
            qubits,
            device,
            session,
            export,
        } => calibrate::execute(qubits, &device, &session, export.as_deref()),

        Commands::Run {
            input,
            device,
            session,
            output,
        } => run::execute(&input, &device, &session, output.as_deref()),

        Commands::Correct {
            counts,
            calibration,
            config,
            output,
        } => correct::execute(&counts, &calibration, config.as_deref(), output.as_deref()),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
