use anyhow::{Context, Result, ensure};
use figment::{
    Figment,
    providers::{Env, Format, Json, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{PoolSettings, SweepConfig, WorkloadSettings};

// Embed the default config at compile time
pub const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

/// Project-level config file picked up from the working directory
pub const PROJECT_CONFIG_FILE: &str = "batchbench.toml";

pub const ENV_PREFIX: &str = "BATCHBENCH_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchConfig {
    pub sweep: SweepConfig,
    pub pool: PoolSettings,
    pub workload: WorkloadSettings,
}

impl BenchConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    /// Embedded defaults only, ignoring files and environment
    pub fn defaults() -> Result<Self> {
        Figment::from(Toml::string(DEFAULT_CONFIG))
            .extract()
            .context("Embedded default configuration is invalid")
    }

    pub fn load_with_custom_config(custom_config: Option<&Path>) -> Result<Self> {
        Self::figment(custom_config)?
            .extract()
            .context("Invalid batchbench configuration")
    }

    /// Build the layered figment without extracting it
    pub fn figment(custom_config: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        // A custom config replaces the project file; it must exist
        if let Some(custom_path) = custom_config {
            ensure!(
                custom_path.is_file(),
                "Config file not found: {}",
                custom_path.display()
            );
            tracing::debug!("Loading config from {}", custom_path.display());

            let is_json = custom_path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            figment = if is_json {
                figment.merge(Json::file(custom_path))
            } else {
                figment.merge(Toml::file(custom_path))
            };
        } else {
            figment = figment.merge(Toml::file(PROJECT_CONFIG_FILE));
        }

        // Environment variables always have highest priority
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }
}
