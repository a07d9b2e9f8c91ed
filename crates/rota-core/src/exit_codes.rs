//! Exit codes for the `rota` CLI.
//!
//! Exit code ranges:
//! - 0-2: Operational outcomes (parse outcome from code, not output)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors

use rota_common::{Error, ErrorCategory};

/// Exit codes for rota operations. Stable contract for automation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success, nothing flagged.
    Clean = 0,

    /// Success, anomalies or recommendations were produced.
    Findings = 1,

    /// Forecast stopped between days; emitted days are complete.
    Interrupted = 2,

    /// Invalid arguments or input files.
    ArgsError = 10,

    /// Configuration could not be loaded or validated.
    ConfigError = 11,

    /// Forecast model missing or incompatible with the feature set.
    ModelError = 12,

    /// Another writer holds the model artifact lock.
    LockError = 14,

    /// Scheduling store query failed.
    DataSourceError = 15,

    InternalError = 20,

    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Codes 0-2.
    pub fn is_success(self) -> bool {
        (self as i32) < 10
    }

    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Error code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Findings => "OK_FINDINGS",
            ExitCode::Interrupted => "OK_INTERRUPTED",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::ModelError => "ERR_MODEL",
            ExitCode::LockError => "ERR_LOCK",
            ExitCode::DataSourceError => "ERR_DATA_SOURCE",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::ArtifactLocked { .. } => ExitCode::LockError,
            Error::Json(_) => ExitCode::ArgsError,
            _ => match err.category() {
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::DataSource => ExitCode::DataSourceError,
                ErrorCategory::Model => ExitCode::ModelError,
                ErrorCategory::Input => ExitCode::ArgsError,
                ErrorCategory::Io => ExitCode::IoError,
            },
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
