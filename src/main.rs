//! Paging simulator - Main Entry Point
//!
//! Usage: paging-sim [OPTIONS] <CONFIG> <PROGRAMS>
//!
//! Arguments:
//!   CONFIG    - Configuration file (key=value lines)
//!   PROGRAMS  - Process file, one ID/arrival/priority/{EVENTS} record per line
//!
//! Options:
//!   -o, --output <FILE>  Write trace and report to FILE instead of stdout
//!   -v, --verbose        Log scheduler and memory decisions to stderr

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use paging_sim::io::{load_simulation, write_output};
use paging_sim::SimError;

/// FCFS scheduler and demand-paging simulator
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file
    config: PathBuf,

    /// Process file
    programs: PathBuf,

    /// Write the trace and the report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log scheduler and memory decisions
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(SimError::UnsupportedPolicy(strategy)) = e.downcast_ref::<SimError>() {
                println!("Unsupported scheduling strategy: {:?}", strategy);
                println!("Set processus-ordonnancement=FIFO in the configuration file.");
                return ExitCode::SUCCESS;
            }
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut sim = load_simulation(&args.config, &args.programs)?;
    log::debug!("{} processes loaded", sim.processes().len());

    match &args.output {
        Some(path) => {
            let mut text = String::new();
            sim.run_with(|line| {
                text.push_str(&line.to_string());
                text.push('\n');
            });
            text.push_str(&sim.summary());
            write_output(path, &text)
                .with_context(|| format!("Unable to write output file {}", path.display()))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let mut failed = None;
            sim.run_with(|line| {
                if failed.is_none() {
                    failed = writeln!(out, "{}", line).err();
                }
            });
            if let Some(e) = failed {
                return Err(e).context("Unable to write trace");
            }
            write!(out, "{}", sim.summary()).context("Unable to write report")?;
        }
    }

    Ok(())
}
