//! Batch-size sweep harness
//!
//! - [`plan`]: merges configuration and command-line overrides into a validated plan
//! - [`runner`]: one timed run on a freshly spawned pool
//! - [`sweep`]: baseline plus every batch size, repeated, per (job count, length)
//! - [`summary`]: medians, speedups and the best batch size per group
//! - [`report`]: text and JSON rendering

pub mod plan;
pub mod report;
pub mod runner;
pub mod summary;
pub mod sweep;

pub use plan::{SweepOverrides, SweepPlan};
pub use report::SweepReport;
pub use runner::{Measurement, run_once};
pub use sweep::{GroupResult, SweepRow, run_sweep};
