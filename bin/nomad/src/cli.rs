//! Command line entry point.

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use nomad_observability::{LogArgs, init_logging};
use nomad_reputation::ReputationService;
use nomad_source::FileActivitySource;
use nomad_storage::{MemorySnapshotStore, SnapshotStore};
use nomad_storage_redb::RedbSnapshotStore;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::NomadConfig;

/// Nomad - reputation scoring for marketplace participants
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    /// Logging configuration (applies to all subcommands).
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// Path to a TOML configuration file.
    #[arg(long, value_name = "FILE", global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Directory holding the snapshot database.
    #[arg(long, value_name = "DIR", global = true)]
    pub(crate) datadir: Option<PathBuf>,

    /// Keep snapshots in memory instead of on disk.
    #[arg(long = "db.memory", global = true)]
    pub(crate) in_memory: bool,

    /// JSON file of indexer work summaries to score from.
    #[arg(long, value_name = "FILE", global = true)]
    pub(crate) source: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Current score of an address, served from cache when fresh.
    Score {
        address: String,
        /// Recompute from a fresh activity fetch.
        #[arg(long)]
        force: bool,
    },
    /// Persisted score snapshots, newest first.
    History {
        address: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Addresses ranked by their latest score.
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
    /// Improvement suggestions for an address.
    Suggest { address: String },
    /// Check the latest score change of an address for anomalies.
    Anomaly { address: String },
    /// Raw activity counts of an address.
    Stats { address: String },
    /// Score, tier, leaderboard rank and activity counts of an address.
    Profile { address: String },
}

impl Cli {
    /// Fold CLI overrides into the loaded configuration.
    fn apply(&self, config: &mut NomadConfig) {
        if let Some(datadir) = &self.datadir {
            config.database.datadir = datadir.clone();
        }
        if self.in_memory {
            config.database.in_memory = true;
        }
        if let Some(source) = &self.source {
            config.source.path = Some(source.clone());
        }
    }
}

/// Parse arguments, set up logging and run the selected command.
pub(crate) async fn run() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let _log_guard = init_logging(&cli.logs)?;

    let mut config = NomadConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    debug!(?config, "loaded configuration");

    let service = build_service(&config)?;
    execute(&service, cli.command).await
}

fn build_service(config: &NomadConfig) -> Result<ReputationService> {
    let path = config
        .source
        .path
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no activity source configured, pass --source <FILE>"))?;
    let source = FileActivitySource::load(path)
        .wrap_err_with(|| format!("failed to load activity from {}", path.display()))?;
    info!(path = %path.display(), addresses = source.len(), "loaded activity source");

    let store: Arc<dyn SnapshotStore> = if config.database.in_memory {
        Arc::new(MemorySnapshotStore::new())
    } else {
        let datadir = &config.database.datadir;
        std::fs::create_dir_all(datadir)
            .wrap_err_with(|| format!("failed to create data directory {}", datadir.display()))?;
        let db_path = config.database.db_path();
        let store = RedbSnapshotStore::open(&db_path)
            .wrap_err_with(|| format!("failed to open snapshot database {}", db_path.display()))?;
        info!(path = %db_path.display(), snapshots = store.len()?, "opened snapshot database");
        Arc::new(store)
    };

    let service = ReputationService::new(Arc::new(source), store, config.service.clone())?;
    Ok(service)
}

async fn execute(service: &ReputationService, command: Commands) -> Result<()> {
    match command {
        Commands::Score { address, force } => {
            let result = if force {
                service.calculate_score(&address).await?
            } else {
                service.get_user_score(&address).await?
            };
            print_json(&result)
        }
        Commands::History {
            address,
            limit,
            offset,
        } => print_json(&service.get_score_history(&address, limit, offset).await?),
        Commands::Leaderboard { limit, offset } => {
            print_json(&service.get_leaderboard(limit, offset))
        }
        Commands::Suggest { address } => {
            print_json(&service.get_improvement_suggestions(&address).await?)
        }
        Commands::Anomaly { address } => {
            print_json(&service.get_anomaly_detection(&address).await?)
        }
        Commands::Stats { address } => print_json(&service.get_user_stats(&address).await?),
        Commands::Profile { address } => {
            print_json(&service.get_user_profile(&address).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).wrap_err("failed to encode output")?;
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score() {
        let cli = Cli::try_parse_from([
            "nomad",
            "--source",
            "activity.json",
            "score",
            "0x00000000000000000000000000000000000000aa",
            "--force",
        ])
        .unwrap();

        assert_eq!(cli.source, Some(PathBuf::from("activity.json")));
        match cli.command {
            Commands::Score { address, force } => {
                assert!(address.ends_with("aa"));
                assert!(force);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_profile() {
        let cli = Cli::try_parse_from([
            "nomad",
            "profile",
            "0x00000000000000000000000000000000000000bb",
        ])
        .unwrap();

        match cli.command {
            Commands::Profile { address } => assert!(address.ends_with("bb")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["nomad", "leaderboard", "--limit", "5", "--db.memory", "-v"])
            .unwrap();
        assert!(cli.in_memory);
        assert_eq!(cli.logs.verbosity, 1);
        match cli.command {
            Commands::Leaderboard { limit, offset } => assert_eq!((limit, offset), (5, 0)),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_overrides_win_over_config() {
        let cli = Cli::try_parse_from([
            "nomad",
            "--datadir",
            "/var/lib/nomad",
            "--source",
            "work.json",
            "stats",
            "0x00000000000000000000000000000000000000aa",
        ])
        .unwrap();

        let mut config = NomadConfig::default();
        cli.apply(&mut config);
        assert_eq!(
            config.database.db_path(),
            PathBuf::from("/var/lib/nomad/scores.redb")
        );
        assert_eq!(config.source.path, Some(PathBuf::from("work.json")));
        assert!(!config.database.in_memory);
    }

    #[test]
    fn test_missing_source_is_reported() {
        let config = NomadConfig::default();
        let err = build_service(&config).unwrap_err();
        assert!(err.to_string().contains("--source"));
    }
}
