//! catsync CLI
//!
//! Runs product catalog pipelines between the ERP and the storefronts.
//!
//! # Commands
//!
//! - `run` - Run a named pipeline
//! - `convert` - Convert a product file between platform layouts
//! - `pipelines` - List the named pipelines
//!
//! Credentials come from `NETSUITE_ACCESS_TOKEN`, `SHOPIFY_ACCESS_TOKEN` and
//! `ZOEY_API_KEY`. Endpoints can be overridden with the `CATSYNC_*` variables.

mod commands;

use catsync_core::Platform;
use catsync_engine::ExportFormat;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Product catalog synchronization between ERP and storefronts.
#[derive(Parser)]
#[command(name = "catsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (ignored when RUST_LOG is set)
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named pipeline
    Run {
        /// Pipeline name, e.g. netsuite-to-shopify
        pipeline: String,

        /// Directory for export files
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Export file format (csv, json, xlsx)
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Items per API page
        #[arg(long)]
        page_size: Option<usize>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert a product file from one platform layout to another
    Convert {
        /// Layout of the input file (netsuite, shopify, zoey)
        #[arg(long)]
        from: Platform,

        /// Layout of the output file (netsuite, shopify, zoey)
        #[arg(long)]
        to: Platform,

        /// Input file (.csv, .json or .xlsx)
        input: PathBuf,

        /// Output file; the extension selects csv, json or xlsx
        output: PathBuf,
    },

    /// List the named pipelines
    Pipelines,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            pipeline,
            output_dir,
            format,
            page_size,
            json,
        } => commands::run::run(
            &pipeline,
            commands::run::Overrides {
                output_dir,
                format,
                page_size,
            },
            json,
        ),
        Commands::Convert {
            from,
            to,
            input,
            output,
        } => commands::convert::run(&input, from, to, &output),
        Commands::Pipelines => {
            commands::pipelines::run();
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_options() {
        let cli = Cli::parse_from([
            "catsync",
            "run",
            "netsuite-to-shopify",
            "--format",
            "json",
            "--page-size",
            "50",
        ]);
        match cli.command {
            Commands::Run {
                pipeline,
                format,
                page_size,
                json,
                ..
            } => {
                assert_eq!(pipeline, "netsuite-to-shopify");
                assert_eq!(format, Some(ExportFormat::Json));
                assert_eq!(page_size, Some(50));
                assert!(!json);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parses_convert_platforms() {
        let cli = Cli::parse_from([
            "catsync", "convert", "--from", "shopify", "--to", "zoey", "in.csv", "out.json",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Convert {
                from: Platform::Shopify,
                to: Platform::Zoey,
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_platform() {
        let parsed = Cli::try_parse_from([
            "catsync", "convert", "--from", "magento", "--to", "zoey", "in.csv", "out.csv",
        ]);
        assert!(parsed.is_err());
    }
}
