//! SSH command execution for monitoring
//!
//! Runs the health command on the remote host via `ssh` (or `sshpass -e ssh`
//! for password-authenticated connections). The child process is awaited on
//! the tokio runtime so the scheduler loop keeps handling timer ticks and
//! setting changes while a poll is outstanding.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tokio::process::Command;
use tokio::sync::OnceCell;

use super::settings::{DEFAULT_SSH_PORT, MonitorConfig};
use crate::error::TransportError;

/// SSH connect timeout passed as `-o ConnectTimeout` (seconds)
pub const SSH_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default bound on the whole remote call (seconds)
pub const DEFAULT_EXEC_TIMEOUT_SECS: u64 = 30;

/// Captured result of a finished remote command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status, `-1` when terminated by a signal
    pub exit_status: i32,
    /// Captured standard output
    pub stdout: Vec<u8>,
    /// Captured standard error
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Creates a successful output with the given stdout
    #[must_use]
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_status: 0,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Returns true if the command exited with status 0
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.exit_status == 0
    }

    /// Returns standard error, lossily decoded and trimmed
    #[must_use]
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Converts into stdout text, treating a non-zero exit as a failure
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NonZeroExit`] for a failed command and
    /// [`TransportError::InvalidUtf8`] if stdout is not UTF-8.
    pub fn into_stdout(self) -> Result<String, TransportError> {
        if !self.is_success() {
            return Err(TransportError::NonZeroExit {
                code: self.exit_status,
                stderr: self.stderr_text(),
            });
        }
        Ok(String::from_utf8(self.stdout)?)
    }
}

/// Runs a command on the configured remote host
///
/// Implementations must not block the calling task.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Executes `command` on the host described by `config`
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the command could not be run to
    /// completion. A command that runs but exits non-zero is returned as
    /// `Ok` with its exit status.
    async fn execute(
        &self,
        command: &str,
        config: &MonitorConfig,
    ) -> Result<CommandOutput, TransportError>;
}

/// [`RemoteExecutor`] backed by the OpenSSH client
#[derive(Debug, Clone)]
pub struct SshExecutor {
    timeout: Duration,
    ssh_program: PathBuf,
}

impl Default for SshExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SshExecutor {
    /// Creates an executor with the default execution timeout
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_EXEC_TIMEOUT_SECS))
    }

    /// Creates an executor with a custom execution timeout
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ssh_program: PathBuf::from("ssh"),
        }
    }

    /// Runs `program` instead of the `ssh` found on `PATH`
    #[must_use]
    pub fn with_ssh_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.ssh_program = program.into();
        self
    }

    /// Returns the execution timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Returns whether `sshpass` is installed. Checked once per process.
async fn sshpass_available() -> bool {
    static AVAILABLE: OnceCell<bool> = OnceCell::const_new();
    *AVAILABLE
        .get_or_init(|| async {
            Command::new("sshpass")
                .arg("-V")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .is_ok()
        })
        .await
}

/// Creates a non-interactive command for `program`.
///
/// The child is killed when the command's future is dropped, so a call
/// abandoned by a timeout does not leave the process behind.
pub(crate) fn remote_command(program: impl AsRef<OsStr>) -> Command {
    let mut cmd = Command::new(program);
    cmd.stdin(Stdio::null()).kill_on_drop(true);
    cmd
}

/// Builds the `ssh` argument list (without the program name).
///
/// `-o ConnectTimeout=10` always; `-o BatchMode=yes` unless a password is
/// supplied through `sshpass`; `-i` only for a non-empty identity file;
/// `-p` only when the port differs from 22.
#[must_use]
pub fn build_ssh_args(config: &MonitorConfig, command: &str, use_sshpass: bool) -> Vec<String> {
    let mut args = vec![
        "-o".to_string(),
        format!("ConnectTimeout={SSH_CONNECT_TIMEOUT_SECS}"),
    ];

    if !use_sshpass {
        args.push("-o".to_string());
        args.push("BatchMode=yes".to_string());
    }

    if let Some(ref identity) = config.identity_file {
        args.push("-i".to_string());
        args.push(identity.to_string_lossy().into_owned());
    }

    if config.port != DEFAULT_SSH_PORT {
        args.push("-p".to_string());
        args.push(config.port.to_string());
    }

    args.push(config.destination());
    args.push(command.to_string());
    args
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn execute(
        &self,
        command: &str,
        config: &MonitorConfig,
    ) -> Result<CommandOutput, TransportError> {
        let use_sshpass = config.password.is_some() && sshpass_available().await;

        let mut cmd = if use_sshpass {
            let mut cmd = remote_command("sshpass");
            cmd.arg("-e").arg(&self.ssh_program);
            // sshpass reads the password from SSHPASS with -e
            if let Some(ref password) = config.password {
                cmd.env("SSHPASS", password.expose_secret());
            }
            cmd
        } else {
            remote_command(&self.ssh_program)
        };

        cmd.args(build_ssh_args(config, command, use_sshpass))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!(
            host = %config.host,
            port = config.port,
            sshpass = use_sshpass,
            "Executing remote health command"
        );

        match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => Ok(CommandOutput {
                exit_status: output.status.code().unwrap_or(-1),
                stdout: output.stdout,
                stderr: output.stderr,
            }),
            Ok(Err(e)) => Err(TransportError::Spawn(e)),
            Err(_) => Err(TransportError::Timeout(self.timeout.as_secs())),
        }
    }
}
