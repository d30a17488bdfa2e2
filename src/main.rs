//! VTY config checker
//!
//! Runs every sample config of every daemon listed in the app descriptor
//! and exits non-zero if any of them failed.

use std::path::PathBuf;

use clap::Parser;
use vtycheck::common::config::Config;
use vtycheck::common::logging;
use vtycheck::{Descriptor, Result, Suite, SuiteOptions};

#[derive(Parser)]
#[command(name = "vty-config-check", about = "Test daemon sample configs over the VTY")]
#[command(version, long_about = None)]
struct Cli {
    /// Verbose mode: log every daemon invocation
    #[arg(short, long)]
    verbose: bool,

    /// Directory containing the app descriptor
    #[arg(short = 'p', long = "descriptor-path", default_value = ".")]
    descriptor_path: PathBuf,

    /// Add the configs of a named extension from the descriptor
    /// (may be given more than once)
    #[arg(short = 'e', long = "extend")]
    extend: Vec<String>,

    /// Harness settings file (default: platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scratch directory for config copies
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Root searched for sample configs no app tests
    #[arg(long)]
    samples_root: Option<PathBuf>,

    /// Remove the scratch directory afterwards
    #[arg(long)]
    cleanup: bool,

    /// Print the report as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_cli(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let settings = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let mut descriptor = Descriptor::locate(&cli.descriptor_path, &settings.suite.descriptor_file)?;
    for name in &cli.extend {
        descriptor.extend(name)?;
    }

    let mut options = SuiteOptions::from_config(&settings);
    options.verbose = cli.verbose;
    options.cleanup = cli.cleanup;
    if let Some(dir) = cli.scratch_dir {
        options.scratch_dir = dir;
    }
    if let Some(root) = cli.samples_root {
        options.samples_root = Some(root);
    }

    let report = Suite::new(&descriptor, &settings, options).run().await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        report.print_summary();
    }

    Ok(report.exit_code())
}
