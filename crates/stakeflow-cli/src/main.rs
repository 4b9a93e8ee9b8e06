//! Stakeflow CLI
//!
//! Replays staking scenarios against an in-memory reward pool.

mod scenario;
mod units;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scenario::{simulate, Scenario};
use stakeflow_core::PoolConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "stakeflow")]
#[command(author = "Stakeflow Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Stakeflow - time-weighted staking reward simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "STAKEFLOW_JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file and print a JSON report
    Simulate {
        /// Scenario file path
        #[arg(short, long, env = "STAKEFLOW_SCENARIO", default_value = "scenarios/deploy.toml")]
        scenario: PathBuf,

        /// Abort on the first failing step
        #[arg(long)]
        strict: bool,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Print the default pool configuration as TOML
    Config,

    /// Version information
    Version,
}

fn init_logging(verbose: bool, json: bool) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // stdout carries the report
    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false),
            )
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    match cli.command {
        Commands::Simulate {
            scenario,
            strict,
            compact,
        } => {
            let loaded = Scenario::load(&scenario)?;
            let report = simulate(&loaded, strict)?;

            let json = if compact {
                serde_json::to_string(&report)?
            } else {
                serde_json::to_string_pretty(&report)?
            };
            println!("{}", json);

            if report.failures() > 0 {
                tracing::warn!(failures = report.failures(), "Scenario finished with failed steps");
            } else {
                tracing::info!(steps = report.steps.len(), "Scenario finished");
            }
        }

        Commands::Config => {
            let toml = toml::to_string_pretty(&PoolConfig::default())
                .context("cannot serialize default config")?;
            print!("{}", toml);
        }

        Commands::Version => {
            println!("stakeflow {}", env!("CARGO_PKG_VERSION"));
            println!("Fixed-point precision: 18 decimals");
            println!(
                "Default reward period: {} days",
                stakeflow_core::DEFAULT_REWARDS_DURATION / stakeflow_core::SECONDS_PER_DAY
            );
        }
    }

    Ok(())
}
