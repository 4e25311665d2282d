//! `proxmon` - command-line host for the Proxmox host status monitor
//!
//! Runs the monitor in a terminal, polls once, tests the SSH connection,
//! uploads the health script and edits the settings file.

mod cli;
mod commands;
mod error;
mod terminal_sink;
mod util;

use clap::Parser;
use cli::Cli;
use commands::GlobalOptions;
use proxmon_core::tracing::{TracingConfig, TracingLevel, TracingOutput, init_tracing};

fn main() {
    let cli = Cli::parse();

    let level = TracingLevel::from_verbosity(TracingLevel::Warn, cli.verbose, cli.quiet);
    let mut tracing_config = TracingConfig::new().with_level(level);
    if let Some(ref path) = cli.log_file {
        tracing_config = tracing_config.with_output(TracingOutput::File(path.clone()));
    }
    if let Err(e) = init_tracing(&tracing_config) {
        eprintln!("Warning: {e}");
    }

    let options = GlobalOptions {
        config_path: cli.config.as_deref(),
        color: !cli.no_color,
        quiet: cli.quiet,
    };

    if let Err(e) = commands::dispatch(options, cli.command) {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
