//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - readout-error calibration and mitigation",
        style("tuneq").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  tuneq-ir           Circuit descriptors");
    println!("  tuneq-hal          Execution adapter contract");
    println!("  tuneq-mitigation   Calibration, inversion and correction");
    println!("  tuneq-adapter-sim  Readout-noise simulator");
    println!("  tuneq-cli          Command-line interface");
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
