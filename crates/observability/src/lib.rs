//! Logging for the Nomad reputation engine.
//!
//! Logs always go to stderr so command output on stdout stays machine
//! readable. With `--log.dir` a daily rolling file is written as well.

use std::path::PathBuf;

use clap::Args;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix of the rolling log file.
const LOG_FILE_PREFIX: &str = "nomad.log";

/// Logging configuration.
#[derive(Debug, Default, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Logging")]
#[serde(default)]
pub struct LogArgs {
    /// Silence all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    #[serde(skip)]
    pub verbosity: u8,

    /// Log filter directive (e.g., "nomad_reputation=debug,nomad_cache=trace").
    #[arg(long = "log.filter", value_name = "DIRECTIVE", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json", global = true)]
    pub json: bool,

    /// Also write logs to a daily rolling file in this directory.
    #[arg(long = "log.dir", value_name = "DIR", global = true)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl LogArgs {
    /// Build the filter for these arguments.
    ///
    /// Precedence:
    /// 1. `--quiet` shows errors only
    /// 2. otherwise `RUST_LOG` if set, else a level from `-v` (info, debug, trace)
    /// 3. `--log.filter` directives are added on top; invalid ones are skipped
    pub fn env_filter(&self) -> EnvFilter {
        if self.quiet {
            return EnvFilter::new("error");
        }

        let base_level = match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };

        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));

        if let Some(custom) = &self.filter {
            for directive in custom.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                match directive.parse() {
                    Ok(directive) => filter = filter.add_directive(directive),
                    Err(err) => eprintln!("ignoring invalid log directive {directive:?}: {err}"),
                }
            }
        }

        filter
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
pub fn init_logging(args: &LogArgs) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();

    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    layers.push(if args.json {
        stderr.json().boxed()
    } else {
        stderr.without_time().boxed()
    });

    let guard = match &args.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .wrap_err_with(|| format!("failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            layers.push(if args.json {
                file.json().boxed()
            } else {
                file.boxed()
            });
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers.with_filter(args.env_filter()))
        .try_init()
        .wrap_err("failed to install log subscriber")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        logs: LogArgs,
    }

    #[test]
    fn test_parse_flags() {
        let cli = TestCli::parse_from([
            "nomad",
            "-vv",
            "--log.filter",
            "nomad_cache=trace",
            "--log.json",
            "--log.dir",
            "/tmp/nomad-logs",
        ]);
        assert_eq!(cli.logs.verbosity, 2);
        assert_eq!(cli.logs.filter.as_deref(), Some("nomad_cache=trace"));
        assert!(cli.logs.json);
        assert_eq!(cli.logs.dir, Some(PathBuf::from("/tmp/nomad-logs")));
        assert!(!cli.logs.quiet);
    }

    #[test]
    fn test_quiet_filter() {
        let args = LogArgs {
            quiet: true,
            filter: Some("nomad_cache=trace".into()),
            ..Default::default()
        };
        let filter = args.env_filter().to_string();
        assert!(filter.contains("error"));
        assert!(!filter.contains("nomad_cache"));
    }

    #[test]
    fn test_verbosity_is_not_serialized() {
        let args = LogArgs {
            verbosity: 3,
            json: true,
            ..Default::default()
        };
        let json = serde_json::to_value(&args).unwrap();
        assert!(json.get("verbosity").is_none());
        assert_eq!(json["json"], true);

        let back: LogArgs = serde_json::from_value(json).unwrap();
        assert_eq!(back.verbosity, 0);
    }
}
