use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::sweep::SweepRow;

/// Median of repeated timings: element `len / 2` of the sorted values.
///
/// For an odd count this is the middle value; for an even count it is the upper
/// of the two middle values.
pub fn median(times: &[Duration]) -> Option<Duration> {
    let mut sorted = times.to_vec();
    sorted.sort_unstable();
    sorted.get(sorted.len() / 2).copied()
}

/// Speedup of `median` over `baseline`; infinite when the median is zero
pub fn speedup(baseline: Duration, median: Duration) -> f64 {
    if median.is_zero() {
        f64::INFINITY
    } else {
        baseline.as_secs_f64() / median.as_secs_f64()
    }
}

/// Fastest batch size of one (job count, length) group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestRow {
    pub job_count: usize,
    pub length: usize,
    pub batch_size: usize,
    pub median_secs: f64,
    pub speedup: f64,
}

/// Pick the minimum-median batch size per (job count, length), ordered by key.
///
/// On equal medians the row seen first wins.
pub fn best_per_group(rows: &[SweepRow]) -> Vec<BestRow> {
    let mut best: BTreeMap<(usize, usize), BestRow> = BTreeMap::new();

    for row in rows {
        let candidate = BestRow {
            job_count: row.job_count,
            length: row.length,
            batch_size: row.batch_size,
            median_secs: row.median_secs,
            speedup: row.speedup,
        };
        best.entry((row.job_count, row.length))
            .and_modify(|current| {
                if candidate.median_secs < current.median_secs {
                    *current = candidate.clone();
                }
            })
            .or_insert(candidate);
    }

    best.into_values().collect()
}
