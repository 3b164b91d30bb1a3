//! Run command implementation.

use catsync_engine::{
    Credentials, ExportFormat, Orchestrator, PipelineName, SyncConfig, SyncReport,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Command-line overrides applied on top of the environment configuration.
#[derive(Debug, Default)]
pub struct Overrides {
    /// Export directory.
    pub output_dir: Option<PathBuf>,
    /// Export format.
    pub format: Option<ExportFormat>,
    /// Items per API page.
    pub page_size: Option<usize>,
}

impl Overrides {
    fn apply(self, mut config: SyncConfig) -> SyncConfig {
        if let Some(dir) = self.output_dir {
            config = config.with_output_dir(dir);
        }
        if let Some(format) = self.format {
            config = config.with_export_format(format);
        }
        if let Some(size) = self.page_size {
            config = config.with_page_size(size);
        }
        config
    }
}

/// Runs the run command. Fails on an unknown pipeline name; any other
/// failure is reported and turns into a non-zero exit code.
pub fn run(
    name: &str,
    overrides: Overrides,
    json: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let pipeline: PipelineName = name.parse()?;
    let config = overrides.apply(SyncConfig::from_env());
    let orchestrator = Orchestrator::connect(config, Credentials::from_env());

    let report = orchestrator.run(pipeline);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text_output(&report);
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_text_output(report: &SyncReport) {
    println!("Pipeline {}", report.pipeline);
    println!("Run:      {}", report.run_id);
    println!("Status:   {}", report.status);
    if let Some(reason) = &report.reason {
        println!("Reason:   {reason}");
    }
    println!();
    println!("Records:");
    println!("  Fetched:    {}", report.fetched);
    println!("  Normalized: {}", report.normalized);
    println!("  Dropped:    {}", report.dropped);
    println!("  Delivered:  {}", report.delivered);

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &report.warnings {
            println!("  {warning}");
        }
    }

    println!();
    println!("Stages:");
    for stage in &report.stages {
        match &stage.error {
            Some(error) => println!("  {:<10} FAILED: {error}", stage.stage.to_string()),
            None => println!("  {:<10} {} records", stage.stage.to_string(), stage.records),
        }
    }
    println!();
    println!("Elapsed: {} ms", report.duration.as_millis());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_pipeline_fails_before_any_work() {
        let err = run("erp-to-mars", Overrides::default(), false).unwrap_err();
        assert!(err.to_string().contains("unknown pipeline"));
    }

    #[test]
    fn overrides_replace_configured_values() {
        let config = Overrides {
            output_dir: Some(PathBuf::from("exports")),
            format: Some(ExportFormat::Json),
            page_size: Some(25),
        }
        .apply(SyncConfig::new());
        assert_eq!(config.output_dir, PathBuf::from("exports"));
        assert_eq!(config.export_format, ExportFormat::Json);
        assert_eq!(config.page_size, 25);
    }

    #[test]
    fn empty_overrides_keep_defaults() {
        let config = Overrides::default().apply(SyncConfig::new());
        assert_eq!(config.page_size, SyncConfig::new().page_size);
    }
}
