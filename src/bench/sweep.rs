use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;

use super::plan::SweepPlan;
use super::runner::{Measurement, run_once};
use super::summary::{median, speedup};
use crate::workload::{Checksum, Workload};

/// Median result for one (job count, length, batch size) tuple
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepRow {
    pub job_count: usize,
    pub length: usize,
    /// Batch size as requested in the grid
    pub batch_size: usize,
    /// Batch size after clamping to the job and worker counts
    pub effective_batch: usize,
    pub median_secs: f64,
    pub speedup: f64,
    pub times_secs: Vec<f64>,
    pub checksum: Checksum,
}

/// All rows measured for one (job count, length) group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResult {
    pub job_count: usize,
    pub length: usize,
    /// Median time with batch size 1
    pub baseline_secs: f64,
    pub rows: Vec<SweepRow>,
}

/// Run the whole sweep, calling `on_measurement` after every timed run.
///
/// Each group first measures the batch-size-1 baseline, then every batch size
/// in the grid; every measurement uses `plan.repeats` runs on fresh pools.
pub fn run_sweep<F>(plan: &SweepPlan, mut on_measurement: F) -> Result<Vec<GroupResult>>
where
    F: FnMut(&Measurement),
{
    let mut groups = Vec::new();

    for (job_count, length) in plan.groups() {
        let workload = plan.workload(length);
        tracing::info!("Sweeping n_jobs={} length={}", job_count, length);

        let (baseline_times, baseline) =
            repeat(plan, &workload, job_count, 1, &mut on_measurement)
                .with_context(|| format!("Baseline for n_jobs={job_count} length={length} failed"))?;
        let baseline_median = median_of(&baseline_times);

        let mut rows = Vec::with_capacity(plan.batch_sizes.len());
        for &batch_size in &plan.batch_sizes {
            let (times, last) =
                repeat(plan, &workload, job_count, batch_size, &mut on_measurement).with_context(
                    || {
                        format!(
                            "n_jobs={job_count} length={length} batch size {batch_size} failed"
                        )
                    },
                )?;

            if last.checksum != baseline.checksum {
                tracing::warn!(
                    "Checksum mismatch for n_jobs={} length={} batch={}: {} vs baseline {}",
                    job_count,
                    length,
                    batch_size,
                    last.checksum,
                    baseline.checksum
                );
            }

            let med = median_of(&times);
            rows.push(SweepRow {
                job_count,
                length,
                batch_size,
                effective_batch: last.batch_size,
                median_secs: med.as_secs_f64(),
                speedup: speedup(baseline_median, med),
                times_secs: times.iter().map(Duration::as_secs_f64).collect(),
                checksum: last.checksum,
            });
        }

        groups.push(GroupResult {
            job_count,
            length,
            baseline_secs: baseline_median.as_secs_f64(),
            rows,
        });
    }

    Ok(groups)
}

fn repeat<F>(
    plan: &SweepPlan,
    workload: &Workload,
    job_count: usize,
    batch_size: usize,
    on_measurement: &mut F,
) -> Result<(Vec<Duration>, Measurement)>
where
    F: FnMut(&Measurement),
{
    let mut times = Vec::with_capacity(plan.repeats);
    let mut last = None;

    for _ in 0..plan.repeats {
        let measurement = run_once(&plan.pool, workload, job_count, batch_size)?;
        on_measurement(&measurement);
        times.push(measurement.elapsed);
        last = Some(measurement);
    }

    let last = last.context("repeats must be at least 1")?;
    Ok((times, last))
}

fn median_of(times: &[Duration]) -> Duration {
    median(times).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::{Backend, PoolConfig};
    use crate::workload::WorkloadKind;

    fn plan(job_counts: Vec<usize>, batch_sizes: Vec<usize>, repeats: usize) -> SweepPlan {
        SweepPlan {
            job_counts,
            lengths: vec![16],
            batch_sizes,
            repeats,
            workload_kind: WorkloadKind::Spin,
            seed_stride: 1,
            pool: PoolConfig::new(Backend::Threads, 2),
        }
    }

    #[test]
    fn test_sweep_shape_and_observer() {
        let plan = plan(vec![0, 12], vec![1, 4, 64], 3);
        let mut observed = 0;
        let groups = run_sweep(&plan, |_| observed += 1).unwrap();

        assert_eq!(observed, plan.total_runs());
        assert_eq!(groups.len(), 2);
        for group in &groups {
            assert_eq!(group.rows.len(), 3);
            for row in &group.rows {
                assert_eq!(row.times_secs.len(), 3);
            }
        }

        // 12 jobs on 2 workers: 64 is clamped to 6
        let clamped: Vec<_> = groups[1].rows.iter().map(|r| r.effective_batch).collect();
        assert_eq!(clamped, vec![1, 4, 6]);
    }

    #[test]
    fn test_zero_jobs_group_is_instant() {
        let plan = plan(vec![0], vec![1, 8], 2);
        let groups = run_sweep(&plan, |_| {}).unwrap();
        assert_eq!(groups[0].baseline_secs, 0.0);
        for row in &groups[0].rows {
            assert_eq!(row.median_secs, 0.0);
            assert!(row.speedup.is_infinite());
            assert_eq!(row.checksum, Checksum::Xor(0));
        }
    }

    #[test]
    fn test_checksums_agree_across_batch_sizes() {
        let plan = plan(vec![40], vec![1, 3, 20], 1);
        let groups = run_sweep(&plan, |_| {}).unwrap();
        let checksums: Vec<_> = groups[0].rows.iter().map(|r| r.checksum).collect();
        assert!(checksums.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_median_reported_from_repeats() {
        let plan = plan(vec![8], vec![2], 3);
        let groups = run_sweep(&plan, |_| {}).unwrap();
        let row = &groups[0].rows[0];

        let mut sorted = row.times_secs.clone();
        sorted.sort_by(f64::total_cmp);
        assert_eq!(row.median_secs, sorted[1]);
    }
}
