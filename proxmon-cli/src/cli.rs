//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Proxmox host status monitor
#[derive(Parser)]
#[command(name = "proxmon")]
#[command(author, version, about = "Monitor a Proxmox host over SSH")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true, env = "PROXMON_CONFIG_DIR")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write logs to a file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Poll the host on a timer until interrupted
    #[command(about = "Run the monitor, redrawing on every poll (Ctrl-C to stop)")]
    Run,

    /// Poll the host once
    #[command(about = "Poll the host once and print the result")]
    Poll {
        /// Print the display state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Test the SSH connection
    #[command(about = "Check that the host accepts a key-based SSH login")]
    Test,

    /// Upload the health script
    #[command(about = "Copy the health script to the host and make it executable")]
    Upload {
        /// Local path of proxmox-monitor.sh
        file: PathBuf,
    },

    /// Inspect or edit settings
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Settings subcommands
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print every setting
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change one setting
    Set {
        /// Setting key, e.g. server-host or refresh-interval
        key: String,

        /// New value; prompted for when omitted for server-password
        value: Option<String>,
    },

    /// Print the configuration file path
    Path,
}
