//! One-shot SSH connection test
//!
//! Checks that the configured host accepts a key-based login by running
//! `echo "Connection successful"` and looking for the marker in stdout.
//! Password authentication is explicitly disabled, so a host that only
//! accepts passwords fails the test.

use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;

use crate::error::{UtilityError, UtilityResult};
use crate::monitoring::ssh_exec::{
    DEFAULT_EXEC_TIMEOUT_SECS, SSH_CONNECT_TIMEOUT_SECS, remote_command,
};
use crate::monitoring::{DEFAULT_SSH_PORT, MonitorConfig};

/// Text the remote echo prints on success
pub const CONNECTION_MARKER: &str = "Connection successful";

/// Message when host or username is missing
pub const NOT_CONFIGURED_MESSAGE: &str = "Please fill in Server Host and Username";

/// Outcome of a connection test or script upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtilityReport {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable result
    pub message: String,
}

impl UtilityReport {
    /// Creates a successful report
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates a failed report
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Builds the `ssh` arguments for the connection test
#[must_use]
pub fn build_test_args(config: &MonitorConfig) -> Vec<String> {
    let mut args = vec![
        "-o".to_string(),
        format!("ConnectTimeout={SSH_CONNECT_TIMEOUT_SECS}"),
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        "PasswordAuthentication=no".to_string(),
    ];

    if let Some(ref identity) = config.identity_file {
        args.push("-i".to_string());
        args.push(identity.to_string_lossy().into_owned());
    }
    if config.port != DEFAULT_SSH_PORT {
        args.push("-p".to_string());
        args.push(config.port.to_string());
    }

    args.push(config.destination());
    args.push(format!("echo \"{CONNECTION_MARKER}\""));
    args
}

/// Classifies a finished test command
#[must_use]
pub fn evaluate_test_output(exit_success: bool, stdout: &str, stderr: &str) -> UtilityReport {
    if !exit_success {
        return UtilityReport::failure(format!("Connection failed: {}", stderr.trim()));
    }
    if stdout.contains(CONNECTION_MARKER) {
        UtilityReport::success(format!("{CONNECTION_MARKER}!"))
    } else {
        UtilityReport::failure("Connection failed: No response")
    }
}

/// Tests the SSH connection described by `config`
///
/// # Errors
///
/// Returns [`UtilityError::NotConfigured`] if host or username is missing
/// and [`UtilityError::Io`] if `ssh` cannot be started. A failed login is
/// an `Ok` report with `success == false`.
pub async fn test_connection(config: &MonitorConfig) -> UtilityResult<UtilityReport> {
    if !config.is_configured() {
        return Err(UtilityError::NotConfigured(NOT_CONFIGURED_MESSAGE.to_string()));
    }

    tracing::info!(host = %config.host, port = config.port, "Testing SSH connection");

    let limit = Duration::from_secs(DEFAULT_EXEC_TIMEOUT_SECS);
    let output = remote_command("ssh").args(build_test_args(config)).output();

    let report = match timeout(limit, output).await {
        Ok(Ok(output)) => evaluate_test_output(
            output.status.success(),
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        ),
        Ok(Err(source)) => {
            return Err(UtilityError::Io {
                program: "ssh",
                source,
            });
        }
        Err(_) => UtilityReport::failure(format!(
            "Connection failed: timed out after {}s",
            limit.as_secs()
        )),
    };

    tracing::info!(success = report.success, "Connection test finished");
    Ok(report)
}
