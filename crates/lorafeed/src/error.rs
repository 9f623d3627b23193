//! Process-level errors with miette diagnostics.
//!
//! Maps config and core failures onto user-facing errors with help text
//! and a stable exit code.

use std::path::Path;

use miette::Diagnostic;
use thiserror::Error;

use lorafeed_config::ConfigError;
use lorafeed_core::CoreError;

/// Exit codes. A clean shutdown exits 0.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const NOT_SET_UP: i32 = 3;
    pub const INVALID_CONFIG: i32 = 4;
    pub const RADIO: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum AppError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration not set up yet")]
    #[diagnostic(
        code(lorafeed::not_set_up),
        help(
            "A template was written to {path}.\n\
             Fill in api_key, username, group_name and address, then start again."
        )
    )]
    NotSetUp { path: String },

    #[error("Invalid configuration in {path}: {message}")]
    #[diagnostic(
        code(lorafeed::invalid_config),
        help("Fix the setting in the file, or override it with a LORAFEED_* environment variable.")
    )]
    InvalidConfig { path: String, message: String },

    // ── Radio ────────────────────────────────────────────────────────
    #[error("Radio failure: {message}")]
    #[diagnostic(
        code(lorafeed::radio),
        help("Check that the radio daemon is running and that radio_bind / radio_peer are correct.")
    )]
    Radio { message: String },

    // ── Everything else ──────────────────────────────────────────────
    #[error("Cannot set up feed client: {message}")]
    #[diagnostic(code(lorafeed::cloud))]
    Cloud { message: String },

    #[error("Cannot listen for shutdown signals")]
    #[diagnostic(code(lorafeed::signal))]
    Signal(#[source] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(lorafeed::io))]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotSetUp { .. } => exit_code::NOT_SET_UP,
            Self::InvalidConfig { .. } => exit_code::INVALID_CONFIG,
            Self::Radio { .. } => exit_code::RADIO,
            Self::Cloud { .. } | Self::Signal(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }

    /// Translate a config failure, naming the file it came from.
    pub fn from_config(err: ConfigError, path: &Path) -> Self {
        let path_str = path.display().to_string();
        match err {
            ConfigError::NotSetUp { path } => Self::NotSetUp {
                path: path.display().to_string(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::InvalidConfig {
                path: path_str,
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Radio { message } => Self::Radio { message },
            CoreError::RadioClosed => Self::Radio {
                message: "radio event stream closed".into(),
            },
            CoreError::Config { message } => Self::InvalidConfig {
                path: "<settings>".into(),
                message,
            },
            other => Self::Cloud {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn config_failures_map_to_documented_exit_codes() {
        let path = PathBuf::from("/etc/lorafeed/config.json");
        let not_set_up = AppError::from_config(
            ConfigError::NotSetUp { path: path.clone() },
            &path,
        );
        assert_eq!(not_set_up.exit_code(), exit_code::NOT_SET_UP);

        let placeholder = AppError::from_config(
            ConfigError::Placeholder {
                field: "api_key".into(),
            },
            &path,
        );
        assert_eq!(placeholder.exit_code(), exit_code::INVALID_CONFIG);
    }

    #[test]
    fn radio_failures_exit_with_radio_code() {
        let err = AppError::from(CoreError::RadioClosed);
        assert_eq!(err.exit_code(), exit_code::RADIO);
    }
}
