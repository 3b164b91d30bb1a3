//! Convert command implementation.

use catsync_core::Platform;
use catsync_engine::convert_file;
use std::path::Path;
use std::process::ExitCode;

/// Runs the convert command.
pub fn run(
    input: &Path,
    from: Platform,
    to: Platform,
    output: &Path,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let summary = convert_file(input, from, to, output)?;

    println!("Converted {} ({from}) to {} ({to})", input.display(), output.display());
    println!("  Rows read:    {}", summary.read);
    println!("  Rows dropped: {}", summary.dropped);
    println!("  Rows written: {}", summary.written);
    for warning in &summary.warnings {
        println!("  Warning: {warning}");
    }

    Ok(ExitCode::SUCCESS)
}
