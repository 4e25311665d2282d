//! Command handler modules for the CLI.

mod completions;
mod config;
mod poll;
mod run;
mod upload;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Options shared by every command
#[derive(Debug, Clone, Copy)]
pub struct GlobalOptions<'a> {
    /// Custom configuration directory
    pub config_path: Option<&'a Path>,
    /// Whether to emit ANSI colors
    pub color: bool,
    /// Whether to suppress informational output
    pub quiet: bool,
}

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(options: GlobalOptions<'_>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Run => run::cmd_run(options),
        Commands::Poll { json } => poll::cmd_poll(options, json),
        Commands::Test => test::cmd_test(options),
        Commands::Upload { file } => upload::cmd_upload(options, &file),
        Commands::Config(subcmd) => config::cmd_config(options, subcmd),
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}
