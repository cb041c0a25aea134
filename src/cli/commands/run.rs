//! Run command implementation
//!
//! Resolves the sweep plan, runs it with a progress bar and prints the report.

use anyhow::Result;
use clap::{Args, ValueEnum};
use indicatif::ProgressBar;
use std::path::Path;

use crate::bench::{SweepOverrides, SweepPlan, SweepReport, run_sweep};
use crate::cli::Output;
use crate::config::BenchConfig;
use crate::parallel::{Backend, HostProfile};
use crate::workload::WorkloadKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Job counts to test
    #[arg(long, num_args = 1.., value_name = "N")]
    pub njobs: Option<Vec<usize>>,

    /// Data points per series (work per job)
    #[arg(long, num_args = 1.., value_name = "N")]
    pub lengths: Option<Vec<usize>>,

    /// Batch sizes to test (default grid from config)
    #[arg(long = "batch-sizes", visible_alias = "chunksizes", num_args = 1.., value_name = "N")]
    pub batch_sizes: Option<Vec<usize>>,

    /// Worker count (default: derived from available CPUs)
    #[arg(short, long, visible_alias = "max-workers", value_name = "N")]
    pub workers: Option<usize>,

    /// Repetitions per configuration
    #[arg(short, long, value_name = "N")]
    pub repeats: Option<usize>,

    /// Use the smaller default batch-size grid
    #[arg(long)]
    pub quick: bool,

    /// Synthetic workload each job runs
    #[arg(long, value_enum)]
    pub workload: Option<WorkloadKind>,

    /// Worker pool implementation
    #[arg(short, long, value_enum)]
    pub backend: Option<Backend>,

    /// Multiplier turning a job index into its series seed
    #[arg(long, value_name = "N")]
    pub seed_stride: Option<u64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

impl RunArgs {
    pub fn overrides(&self) -> SweepOverrides {
        SweepOverrides {
            njobs: self.njobs.clone(),
            lengths: self.lengths.clone(),
            batch_sizes: self.batch_sizes.clone(),
            workers: self.workers,
            repeats: self.repeats,
            quick: self.quick,
            workload: self.workload,
            backend: self.backend,
            seed_stride: self.seed_stride,
        }
    }
}

/// Execute the run command
pub fn execute(args: RunArgs, config_path: Option<&Path>, output: &Output) -> Result<()> {
    let config = BenchConfig::load_with_custom_config(config_path)?;
    let plan = SweepPlan::resolve(&config, &args.overrides())?;

    output.verbose(&HostProfile::get().summary());
    output.verbose(&format!(
        "{} {} workers, {} runs planned",
        plan.pool.workers,
        plan.pool.backend,
        plan.total_runs()
    ));

    let progress = match args.format {
        ReportFormat::Text => output.progress_bar(plan.total_runs() as u64, "sweeping"),
        ReportFormat::Json => ProgressBar::hidden(),
    };

    let groups = run_sweep(&plan, |measurement| {
        progress.set_message(format!(
            "n_jobs={} length={} batch={}",
            measurement.job_count, measurement.length, measurement.batch_size
        ));
        progress.inc(1);
    });
    progress.finish_and_clear();

    let groups = match groups {
        Ok(groups) => groups,
        Err(e) => {
            output.error("Sweep aborted");
            return Err(e);
        }
    };

    let report = SweepReport::new(&plan, groups);
    match args.format {
        ReportFormat::Text => output.report(&report.render_text()?),
        ReportFormat::Json => output.report(&report.render_json()?),
    }

    if let Some(best) = report
        .best
        .iter()
        .filter(|best| best.speedup.is_finite())
        .max_by(|a, b| a.speedup.total_cmp(&b.speedup))
    {
        output.success(&format!(
            "Largest speedup: {:.2}x with batch size {} (n_jobs={}, length={})",
            best.speedup, best.batch_size, best.job_count, best.length
        ));
    }

    Ok(())
}
