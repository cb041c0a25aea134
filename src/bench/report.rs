use anyhow::Result;
use serde::Serialize;
use std::fmt::Write;

use super::plan::SweepPlan;
use super::summary::{BestRow, best_per_group};
use super::sweep::GroupResult;
use crate::parallel::{Backend, HostProfile};
use crate::workload::WorkloadKind;

/// Everything printed at the end of a sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub host: HostProfile,
    pub backend: Backend,
    pub workers: usize,
    pub workload: WorkloadKind,
    pub repeats: usize,
    pub job_counts: Vec<usize>,
    pub lengths: Vec<usize>,
    pub batch_sizes: Vec<usize>,
    pub groups: Vec<GroupResult>,
    pub best: Vec<BestRow>,
}

impl SweepReport {
    pub fn new(plan: &SweepPlan, groups: Vec<GroupResult>) -> Self {
        let rows: Vec<_> = groups.iter().flat_map(|g| g.rows.iter().cloned()).collect();
        Self {
            host: HostProfile::get().as_ref().clone(),
            backend: plan.pool.backend,
            workers: plan.pool.workers,
            workload: plan.workload_kind,
            repeats: plan.repeats,
            job_counts: plan.job_counts.clone(),
            lengths: plan.lengths.clone(),
            batch_sizes: plan.batch_sizes.clone(),
            best: best_per_group(&rows),
            groups,
        }
    }

    pub fn render_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text report with one table per group and a best-per-group summary
    pub fn render_text(&self) -> Result<String> {
        let mut out = String::new();

        writeln!(
            out,
            "CPUs={}  workers={}  backend={}  workload={}  repeats={}",
            self.host.logical_cpus, self.workers, self.backend, self.workload, self.repeats
        )?;
        writeln!(out, "n_jobs grid: {:?}", self.job_counts)?;
        writeln!(out, "length grid: {:?}", self.lengths)?;
        writeln!(out, "batch sizes: {:?}", self.batch_sizes)?;

        for group in &self.groups {
            writeln!(out)?;
            writeln!(
                out,
                "=== n_jobs={}  length={} ===",
                group.job_count, group.length
            )?;
            writeln!(out, "baseline (batch=1): {}", format_secs(group.baseline_secs))?;
            writeln!(
                out,
                "{:>8}  {:>9}  {:>12}  {:>14}  checksum",
                "batch", "effective", "median_time", "speedup_vs_b1"
            )?;
            for row in &group.rows {
                writeln!(
                    out,
                    "{:>8}  {:>9}  {:>12}  {:>14}  {}",
                    row.batch_size,
                    row.effective_batch,
                    format_secs(row.median_secs),
                    format_speedup(row.speedup),
                    row.checksum
                )?;
            }
        }

        writeln!(out)?;
        writeln!(out, "=== Best batch size per configuration (by median time) ===")?;
        let header = format!(
            "{:>6}  {:>6}  {:>10}  {:>10}  {:>9}",
            "n_jobs", "length", "best_batch", "time", "speedup"
        );
        writeln!(out, "{header}")?;
        writeln!(out, "{}", "-".repeat(header.len()))?;
        for best in &self.best {
            writeln!(
                out,
                "{:>6}  {:>6}  {:>10}  {:>10}  {:>9}",
                best.job_count,
                best.length,
                best.batch_size,
                format_secs(best.median_secs),
                format_speedup(best.speedup)
            )?;
        }

        Ok(out)
    }
}

/// Milliseconds below one second, seconds otherwise
pub fn format_secs(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.1} ms", secs * 1000.0)
    } else {
        format!("{secs:.3} s")
    }
}

pub fn format_speedup(speedup: f64) -> String {
    if speedup.is_finite() {
        format!("{speedup:.2}x")
    } else {
        "inf".to_string()
    }
}
