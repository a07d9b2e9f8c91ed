//! Log level and format selection for the `rota` binary.
//!
//! Precedence, lowest to highest: built-in default (`info`, human), the
//! `RUST_LOG` / `ROTA_LOG` / `ROTA_LOG_FORMAT` environment, then the
//! `-v` / `-q` / `--log-format` flags.

use serde::{Deserialize, Serialize};

pub const ENV_LOG: &str = "ROTA_LOG";
pub const ENV_LOG_FORMAT: &str = "ROTA_LOG_FORMAT";

/// How log lines are rendered on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per line, for batch runs and log shippers.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" | "text" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LogFormat::Human => "human",
            LogFormat::Jsonl => "jsonl",
        })
    }
}

/// Verbosity threshold, ordered from most to least verbose.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Level implied by the CLI flags; `None` defers to the environment.
    pub fn from_flags(verbose: u8, quiet: bool) -> Option<LogLevel> {
        match (quiet, verbose) {
            (true, _) => Some(LogLevel::Error),
            (false, 0) => None,
            (false, 1) => Some(LogLevel::Debug),
            (false, _) => Some(LogLevel::Trace),
        }
    }

    /// Most verbose level named anywhere in a `RUST_LOG` style directive
    /// list, e.g. `rota_core=debug,warn` gives `Debug`.
    fn from_directives(directives: &str) -> Option<LogLevel> {
        directives
            .split(',')
            .filter_map(|d| d.rsplit('=').next())
            .filter_map(|lvl| lvl.parse().ok())
            .min()
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        use tracing_subscriber::filter::LevelFilter;
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogConfig {
    /// Settings for a CLI run: environment first, flags on top.
    pub fn from_cli(verbose: u8, quiet: bool, format: Option<LogFormat>) -> Self {
        Self::resolve(
            std::env::var(ENV_LOG).ok().as_deref(),
            std::env::var("RUST_LOG").ok().as_deref(),
            std::env::var(ENV_LOG_FORMAT).ok().as_deref(),
            LogLevel::from_flags(verbose, quiet),
            format,
        )
    }

    fn resolve(
        rota_log: Option<&str>,
        rust_log: Option<&str>,
        env_format: Option<&str>,
        flag_level: Option<LogLevel>,
        flag_format: Option<LogFormat>,
    ) -> Self {
        let env_level = match rota_log {
            Some(val) => val.parse().ok(),
            None => rust_log.and_then(LogLevel::from_directives),
        };
        LogConfig {
            level: flag_level.or(env_level).unwrap_or_default(),
            format: flag_format
                .or_else(|| env_format.and_then(|f| f.parse().ok()))
                .unwrap_or_default(),
        }
    }

    /// Show event targets in human output; only useful at trace level.
    pub fn show_targets(&self) -> bool {
        self.level == LogLevel::Trace
    }
}
