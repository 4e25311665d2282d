//! CLI error types and exit codes.

use proxmon_core::error::{ConfigError, UtilityError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or I/O
    pub const GENERAL_ERROR: i32 = 1;
    /// The host could not be reached or returned no usable data
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Host or username not set
    #[error("{0}")]
    NotConfigured(String),

    /// Connection test failed
    #[error("Connection test failed: {0}")]
    TestFailed(String),

    /// A remote step failed
    #[error("{0}")]
    Connection(String),

    /// The poll produced no status
    #[error("Host unavailable: {0}")]
    Unavailable(String),

    /// Async runtime could not be created
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<UtilityError> for CliError {
    fn from(err: UtilityError) -> Self {
        match err {
            UtilityError::NotConfigured(msg) => Self::NotConfigured(msg),
            UtilityError::CommandFailed(msg) => Self::Connection(msg),
            UtilityError::MissingFile(_) => Self::Config(err.to_string()),
            UtilityError::Io { .. } => Self::Connection(err.to_string()),
        }
    }
}

impl CliError {
    /// Returns the exit code for this error.
    ///
    /// - 1: configuration, validation, runtime or I/O errors
    /// - 2: the host was unreachable or a remote step failed
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::TestFailed(_) | Self::Connection(_) | Self::Unavailable(_) => {
                exit_codes::CONNECTION_FAILURE
            }
            Self::Config(_) | Self::NotConfigured(_) | Self::Runtime(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}
