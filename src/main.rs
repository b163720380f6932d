//! `vsfsck` — consistency checker and repair tool for VSFS disk images.

mod bitmap;
mod checks;
mod diagnostic;
mod error;
mod image;
mod inode;
mod layout;
mod orchestrator;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use crate::error::CheckerError;
use crate::image::Checker;

/// Checks a VSFS image for metadata inconsistencies and repairs them in place.
#[derive(Parser)]
#[command(name = "vsfsck", version, about)]
struct Cli {
    /// Path to the VSFS image file.
    image: PathBuf,

    /// Report what would be repaired without writing anything back.
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Enable verbose operational logging.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("vsfsck: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode, CheckerError> {
    info!("opening {}", cli.image.display());
    let mut checker = Checker::open(&cli.image)?;

    let mut diagnostics = Vec::new();
    let clean = orchestrator::run(&mut checker, cli.dry_run, &mut diagnostics)?;

    for d in &diagnostics {
        println!("{d}");
    }

    if clean {
        println!("No errors found or all errors have been fixed");
    } else if cli.dry_run {
        println!("Errors found. Re-run without --dry-run to fix them.");
    } else {
        println!("All errors have been fixed. Re-run the checker to verify.");
    }

    Ok(ExitCode::SUCCESS)
}
