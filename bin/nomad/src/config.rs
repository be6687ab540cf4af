//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. CLI arguments (applied after Figment load)
//! 2. Config file (TOML)
//! 3. Environment variables (`NOMAD_` prefix, `__` between nested keys)
//! 4. Defaults

use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use nomad_reputation::ServiceConfig;
use serde::{Deserialize, Serialize};

/// Snapshot database file name inside the data directory.
pub(crate) const DB_FILE: &str = "scores.redb";

/// Data directory used when none is configured.
const DEFAULT_DATADIR: &str = "nomad-data";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct NomadConfig {
    pub(crate) service: ServiceConfig,
    pub(crate) database: DatabaseConfig,
    pub(crate) source: SourceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct DatabaseConfig {
    /// Keep snapshots in memory only.
    pub(crate) in_memory: bool,
    pub(crate) datadir: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            in_memory: false,
            datadir: PathBuf::from(DEFAULT_DATADIR),
        }
    }
}

impl DatabaseConfig {
    pub(crate) fn db_path(&self) -> PathBuf {
        self.datadir.join(DB_FILE)
    }
}

/// Where activity summaries are read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct SourceConfig {
    /// JSON file of indexer work summaries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) path: Option<PathBuf>,
}

impl NomadConfig {
    /// Load configuration from defaults, environment, and config file.
    /// CLI overrides should be applied separately after loading.
    pub(crate) fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(NomadConfig::default()))
            .merge(Env::prefixed("NOMAD_").split("__"));

        if let Some(path) = config_path {
            if !path.exists() {
                eyre::bail!("config file {} does not exist", path.display());
            }
            figment = figment.merge(Toml::file(path));
        }

        figment.extract().wrap_err("failed to load configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = NomadConfig::load(None).unwrap();
        assert_eq!(config.service, ServiceConfig::default());
        assert!(!config.database.in_memory);
        assert_eq!(config.database.db_path(), PathBuf::from("nomad-data/scores.redb"));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nomad.toml");

        fs::write(
            &config_path,
            r#"
[service]
fetch_timeout_secs = 5

[service.cache]
ttl_secs = 60

[service.weights]
bidding_max = 50.0

[database]
in_memory = true

[source]
path = "activity.json"
"#,
        )
        .unwrap();

        let config = NomadConfig::load(Some(&config_path)).unwrap();
        assert_eq!(config.service.fetch_timeout_secs, 5);
        assert_eq!(config.service.cache.ttl_secs, 60);
        assert_eq!(config.service.cache.grace_secs, 60);
        assert_eq!(config.service.weights.bidding_max, 50.0);
        assert_eq!(config.service.weights.completion_max, 400.0);
        assert!(config.database.in_memory);
        assert_eq!(config.source.path, Some(PathBuf::from("activity.json")));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.toml");
        assert!(NomadConfig::load(Some(&missing)).is_err());
    }
}
