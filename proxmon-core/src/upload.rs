//! Health script upload
//!
//! Copies the health script to [`REMOTE_SCRIPT_PATH`] with `scp` and marks
//! it executable with `ssh`. Both steps require key-based authentication.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::Instrument;

use crate::error::{UtilityError, UtilityResult};
use crate::monitoring::ssh_exec::SSH_CONNECT_TIMEOUT_SECS;
use crate::monitoring::{MonitorConfig, REMOTE_SCRIPT_PATH};
use crate::testing::UtilityReport;
use crate::tracing::span_names;

/// Message when host, username or identity file is missing
pub const MISSING_FIELDS_MESSAGE: &str = "Missing SSH fields (host, username or identity file)";

/// Message when the copy step fails
pub const SCP_FAILED_MESSAGE: &str =
    "SCP upload failed. Check your SSH settings and network connection.";

/// Message when the copy succeeded but `chmod` failed
pub const CHMOD_FAILED_MESSAGE: &str = "Upload completed but failed to set execute permissions.";

fn common_options(config: &MonitorConfig, identity: &Path, port_flag: &str) -> Vec<String> {
    vec![
        port_flag.to_string(),
        config.port.to_string(),
        "-i".to_string(),
        identity.to_string_lossy().into_owned(),
        "-o".to_string(),
        format!("ConnectTimeout={SSH_CONNECT_TIMEOUT_SECS}"),
        "-o".to_string(),
        "BatchMode=yes".to_string(),
    ]
}

/// Builds the `scp` arguments. The port is always passed explicitly.
#[must_use]
pub fn build_scp_args(config: &MonitorConfig, identity: &Path, local: &Path) -> Vec<String> {
    let mut args = common_options(config, identity, "-P");
    args.push(local.to_string_lossy().into_owned());
    args.push(format!("{}:{REMOTE_SCRIPT_PATH}", config.destination()));
    args
}

/// Builds the `ssh` arguments that mark the uploaded script executable
#[must_use]
pub fn build_chmod_args(config: &MonitorConfig, identity: &Path) -> Vec<String> {
    let mut args = common_options(config, identity, "-p");
    args.push(config.destination());
    args.push(format!("chmod +x {REMOTE_SCRIPT_PATH}"));
    args
}

async fn run(program: &'static str, args: Vec<String>) -> UtilityResult<bool> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| UtilityError::Io { program, source })?;

    let success = output.status.success();
    if !success {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(
            program,
            code = output.status.code(),
            stderr = %stderr.trim(),
            "Upload step failed"
        );
    }
    Ok(success)
}

/// Uploads `local` to the configured host and makes it executable
///
/// # Errors
///
/// - [`UtilityError::NotConfigured`] if host, username or identity file is
///   missing
/// - [`UtilityError::MissingFile`] if `local` does not exist
/// - [`UtilityError::CommandFailed`] if either step exits non-zero, with a
///   message naming the step
/// - [`UtilityError::Io`] if `scp` or `ssh` cannot be started
pub async fn upload_script(config: &MonitorConfig, local: &Path) -> UtilityResult<UtilityReport> {
    let identity = match (&config.identity_file, config.is_configured()) {
        (Some(identity), true) => identity.clone(),
        _ => return Err(UtilityError::NotConfigured(MISSING_FIELDS_MESSAGE.to_string())),
    };
    if !local.is_file() {
        return Err(UtilityError::MissingFile(local.to_path_buf()));
    }

    let span = tracing::info_span!(
        span_names::SCRIPT_UPLOAD,
        host = %config.host,
        file = %local.display()
    );

    async {
        tracing::info!("Uploading health script");
        if !run("scp", build_scp_args(config, &identity, local)).await? {
            return Err(UtilityError::CommandFailed(SCP_FAILED_MESSAGE.to_string()));
        }
        if !run("ssh", build_chmod_args(config, &identity)).await? {
            return Err(UtilityError::CommandFailed(CHMOD_FAILED_MESSAGE.to_string()));
        }
        tracing::info!("Health script uploaded");

        Ok(UtilityReport::success(format!(
            "Script successfully uploaded!\n\nFile location: {REMOTE_SCRIPT_PATH}\n\
             Execute permissions have been set."
        )))
    }
    .instrument(span)
    .await
}
