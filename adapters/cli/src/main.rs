#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the Zombie Defence balance engine headlessly.

mod analyze;
mod config;
mod simulate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::SimulationConfig;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML file overriding the default simulation settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,
    /// What to run
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play a seeded session and print the final balance report
    Simulate(SimulateArgs),
    /// Evaluate the tower roster against one wave
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Default, Args)]
struct SimulateArgs {
    /// Seed overriding the configured one
    #[arg(long)]
    seed: Option<u64>,
    /// Number of waves overriding the configured one
    #[arg(long)]
    waves: Option<u32>,
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// Wave to evaluate against
    #[arg(long, default_value_t = 1)]
    wave: u32,
    /// Money to spend; defaults to the configured starting money
    #[arg(long)]
    budget: Option<f64>,
}

/// Entry point for the Zombie Defence command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => SimulationConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimulationConfig::default(),
    };

    match cli
        .command
        .unwrap_or(Command::Simulate(SimulateArgs::default()))
    {
        Command::Simulate(args) => {
            if let Some(seed) = args.seed {
                config.seed = seed;
            }
            if let Some(waves) = args.waves {
                anyhow::ensure!(waves > 0, "--waves must be at least 1");
                config.waves = waves;
            }
            let summary = simulate::run(&config);
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).context("serializing simulation")?
                );
            } else {
                println!("{summary}");
            }
        }
        Command::Analyze(args) => {
            let budget = args.budget.unwrap_or(config.starting_money as f64);
            anyhow::ensure!(budget.is_finite(), "--budget must be a finite number");
            let analysis = analyze::run(&config, args.wave, budget);
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&analysis).context("serializing analysis")?
                );
            } else {
                println!("{analysis}");
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
