//! Profile command implementation
//!
//! Shows the host's CPUs and the worker pool a sweep would use, read from the
//! resolved configuration rather than from a live pool.

use anyhow::Result;
use clap::Args;
use std::path::Path;

use crate::bench::{SweepOverrides, SweepPlan};
use crate::cli::Output;
use crate::config::BenchConfig;
use crate::parallel::{Backend, HostProfile};
use crate::{PKG_NAME, VERSION};

#[derive(Debug, Args)]
pub struct ProfileArgs {
    /// Worker count to resolve instead of the configured one
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Backend to resolve instead of the configured one
    #[arg(short, long, value_enum)]
    pub backend: Option<Backend>,
}

/// Execute the profile command
pub fn execute(args: ProfileArgs, config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config = BenchConfig::load_with_custom_config(config_path)?;
    let overrides = SweepOverrides {
        workers: args.workers,
        backend: args.backend,
        ..Default::default()
    };
    let plan = SweepPlan::resolve(&config, &overrides)?;
    let host = HostProfile::get();

    output.header(&format!("{PKG_NAME} {VERSION} profile"));

    output.category("Host");
    output.key_value("Platform:", &format!("{} ({})", host.os, host.arch), false);
    output.key_value("Logical CPUs:", &host.logical_cpus.to_string(), true);
    output.key_value("Physical CPUs:", &host.physical_cpus.to_string(), false);

    output.category("Worker pool");
    output.key_value("Backend:", &plan.pool.backend.to_string(), false);
    output.key_value("Workers:", &plan.pool.workers().to_string(), true);
    let configured = if config.pool.workers == 0 {
        "auto".to_string()
    } else {
        config.pool.workers.to_string()
    };
    output.key_value("Configured workers:", &configured, false);
    output.key_value(
        "Thread percentage:",
        &format!("{}%", config.pool.thread_percentage),
        false,
    );
    let max_threads = if config.pool.max_threads == 0 {
        "unlimited".to_string()
    } else {
        config.pool.max_threads.to_string()
    };
    output.key_value("Max threads:", &max_threads, false);

    output.category("Sweep");
    output.key_value("Workload:", &plan.workload_kind.to_string(), false);
    output.key_value("Repeats:", &plan.repeats.to_string(), false);
    output.key_value("Job counts:", &format!("{:?}", plan.job_counts), false);
    output.key_value("Lengths:", &format!("{:?}", plan.lengths), false);
    output.key_value("Batch sizes:", &format!("{:?}", plan.batch_sizes), false);
    output.key_value("Planned runs:", &plan.total_runs().to_string(), false);

    Ok(())
}
