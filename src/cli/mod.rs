//! Command-line interface for batchbench
//!
//! This module provides the main CLI structure and command handling.
//! It uses clap for argument parsing and sets up tracing from the verbosity flags.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;
mod output;

pub use output::Output;

/// batchbench - find the best batch size for a parallel worker pool
#[derive(Parser)]
#[command(
    name = "batchbench",
    author,
    version,
    about = "Batch-size sweep benchmark for fixed-size parallel worker pools",
    long_about = "Runs a synthetic CPU-bound workload on a fixed pool of workers while sweeping \
                  the number of jobs dispatched per batch, then reports the fastest batch size \
                  for every (job count, length) combination."
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress logs and progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file (TOML or JSON)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sweep batch sizes and report the best one per configuration
    Run(commands::run::RunArgs),
    /// Show host CPUs and the resolved worker pool configuration
    Profile(commands::profile::ProfileArgs),
    /// Serve batches over stdin/stdout for the process backend
    #[command(hide = true)]
    Worker,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose > 0, self.quiet);

        match self.command {
            Some(Commands::Run(args)) => {
                commands::run::execute(args, self.config.as_deref(), &output)
            }
            Some(Commands::Profile(args)) => {
                commands::profile::execute(args, self.config.as_deref(), &output)
            }
            Some(Commands::Worker) => commands::worker::execute(),
            None => {
                // Show help when no command is provided
                let mut cmd = Cli::command();
                cmd.print_help()?;
                Ok(())
            }
        }
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info"),
            2 => tracing_subscriber::EnvFilter::new("debug"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // stdout is reserved for the report and the worker protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
