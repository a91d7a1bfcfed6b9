use anyhow::{Context, Result};
use config::{Config, Environment, File};
use orasrs_registry::RegistryConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "ORASRS";
pub const DEFAULT_LEDGER_PATH: &str = "orasrs-ledger.json";

/// CLI settings: optional TOML file, then `ORASRS_*` environment overrides.
///
/// Nested keys use `__`, e.g. `ORASRS_REGISTRY__SLASH_PENALTY_RATE=50`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ledger_path: PathBuf,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    pub registry: RegistryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ledger_path: PathBuf::from(DEFAULT_LEDGER_PATH),
            log_level: "info".to_string(),
            registry: RegistryConfig::default(),
        }
    }
}

impl Settings {
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .context("failed to read settings")?
            .try_deserialize()
            .context("invalid settings")?;

        settings
            .registry
            .validate()
            .context("invalid registry configuration")?;
        Ok(settings)
    }
}
