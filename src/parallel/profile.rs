//! Cached host profile
//!
//! Computed once on first access and read-only afterwards.

use serde::Serialize;
use std::sync::{Arc, LazyLock};

static HOST: LazyLock<Arc<HostProfile>> = LazyLock::new(|| Arc::new(HostProfile::detect()));

/// CPU and platform facts used to size worker pools
#[derive(Debug, Clone, Serialize)]
pub struct HostProfile {
    /// Logical CPUs (including hyperthreads)
    pub logical_cpus: usize,
    pub physical_cpus: usize,
    pub os: &'static str,
    pub arch: &'static str,
}

impl HostProfile {
    fn detect() -> Self {
        Self {
            logical_cpus: num_cpus::get().max(1),
            physical_cpus: num_cpus::get_physical().max(1),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }

    pub fn get() -> Arc<HostProfile> {
        HOST.clone()
    }

    pub fn logical_cpus() -> usize {
        HOST.logical_cpus
    }

    pub fn physical_cpus() -> usize {
        HOST.physical_cpus
    }

    pub fn summary(&self) -> String {
        format!(
            "{} ({}), {} logical CPUs, {} physical",
            self.os, self.arch, self.logical_cpus, self.physical_cpus
        )
    }
}
