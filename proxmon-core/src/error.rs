//! Error types for `proxmon-core`
//!
//! Each concern has its own `thiserror` enum. [`ProxmonError`] wraps them
//! for callers that only need a single error type (the CLI).

use std::path::PathBuf;

use thiserror::Error;

use crate::monitoring::MissingField;

/// Errors produced while invoking a command on the remote host
#[derive(Debug, Error)]
pub enum TransportError {
    /// The local `ssh`/`sshpass` process could not be started
    #[error("Failed to spawn SSH process: {0}")]
    Spawn(#[source] std::io::Error),

    /// The remote command (or the SSH client itself) exited unsuccessfully
    #[error("SSH command failed (exit {code}): {stderr}")]
    NonZeroExit {
        /// Exit status, `-1` when the process was killed by a signal
        code: i32,
        /// Captured standard error, trimmed
        stderr: String,
    },

    /// The remote call did not complete within the execution timeout
    #[error("SSH command timed out after {0}s")]
    Timeout(u64),

    /// Standard output was not valid UTF-8
    #[error("Invalid UTF-8 in SSH output: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Errors produced while decoding the health payload
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// The remote command produced no output after trimming
    #[error("Remote command produced empty output")]
    EmptyOutput,

    /// The output is not a well-formed health payload
    #[error("Malformed health payload: {0}")]
    Malformed(String),
}

/// Why a single poll cycle produced no health record
#[derive(Debug, Error)]
pub enum PollError {
    /// Host or username is missing; no remote call was made
    #[error("Monitor is not configured (missing {})", join_fields(.0))]
    NotConfigured(Vec<MissingField>),

    /// The remote call failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The remote call succeeded but its output could not be decoded
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

fn join_fields(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No user configuration directory could be determined
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,

    /// The configuration file could not be parsed
    #[error("Failed to parse {path}: {reason}")]
    Parse {
        /// File being parsed
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// The configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    /// Unknown setting key
    #[error("Unknown setting key: {0}")]
    UnknownKey(String),

    /// A value could not be converted to the key's type
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Setting key
        key: String,
        /// Rejected value
        value: String,
    },

    /// I/O error while reading or writing the configuration
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the one-shot connection test and upload utilities
#[derive(Debug, Error)]
pub enum UtilityError {
    /// Required settings are missing
    #[error("{0}")]
    NotConfigured(String),

    /// The local file to upload does not exist
    #[error("Script file not found: {0}")]
    MissingFile(PathBuf),

    /// The external command failed
    #[error("{0}")]
    CommandFailed(String),

    /// The external command could not be started
    #[error("Failed to run {program}: {source}")]
    Io {
        /// Program that failed to start
        program: &'static str,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Top-level error type for `proxmon-core`
#[derive(Debug, Error)]
pub enum ProxmonError {
    /// Remote execution error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Payload decoding error
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Utility error
    #[error(transparent)]
    Utility(#[from] UtilityError),

    /// Poll error
    #[error(transparent)]
    Poll(#[from] PollError),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for `proxmon-core` operations
pub type ProxmonResult<T> = Result<T, ProxmonError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for utility operations
pub type UtilityResult<T> = Result<T, UtilityError>;
