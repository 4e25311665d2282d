//! Long-running monitor command.
//!
//! Starts the poll scheduler against a settings store fed from
//! `config.toml`. Edits to the file are applied to the store while the
//! monitor runs, which the scheduler picks up like any other setting change.

use std::path::PathBuf;
use std::sync::Arc;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use proxmon_core::config::{CONFIG_FILE_NAME, ConfigManager};
use proxmon_core::monitoring::{SshExecutor, start_monitor};
use proxmon_core::settings::MemorySettingsStore;
use tokio::sync::mpsc;

use super::GlobalOptions;
use crate::error::CliError;
use crate::terminal_sink::TerminalSink;
use crate::util::{create_config_manager, create_runtime, load_store};

/// Run command handler
pub fn cmd_run(options: GlobalOptions<'_>) -> Result<(), CliError> {
    let manager = create_config_manager(options.config_path)?;
    let store = load_store(&manager)?;
    let runtime = create_runtime()?;

    runtime.block_on(async {
        let (reload_tx, mut reload_rx) = mpsc::unbounded_channel();
        // Dropping the watcher stops file notifications
        let _watcher = watch_config_file(&manager, reload_tx)?;

        let sink = TerminalSink::stdout(options.color).with_timestamps();
        let handle = start_monitor(store.clone(), Arc::new(SshExecutor::new()), sink);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                    }
                    break;
                }
                Some(()) = reload_rx.recv() => reload(&manager, &store),
            }
        }

        tracing::info!("Stopping monitor");
        handle.shutdown().await;
        Ok::<(), CliError>(())
    })
}

fn reload(manager: &ConfigManager, store: &MemorySettingsStore) {
    match manager.apply(store) {
        Ok(changed) if changed.is_empty() => {
            tracing::debug!("Configuration file touched, no setting changed");
        }
        Ok(changed) => tracing::info!(?changed, "Configuration reloaded"),
        // Half-written or invalid files keep the previous settings
        Err(e) => tracing::warn!(error = %e, "Ignoring unreadable configuration"),
    }
}

/// Watches the configuration directory and signals `tx` whenever
/// `config.toml` is created, modified or replaced.
fn watch_config_file(
    manager: &ConfigManager,
    tx: mpsc::UnboundedSender<()>,
) -> Result<RecommendedWatcher, CliError> {
    std::fs::create_dir_all(manager.config_dir())?;
    let dir = std::fs::canonicalize(manager.config_dir())?;
    let target: PathBuf = dir.join(CONFIG_FILE_NAME);

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) if !event.kind.is_access() && event.paths.iter().any(|p| p == &target) => {
            let _ = tx.send(());
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Configuration watch error"),
    })
    .map_err(|e| CliError::Config(format!("Failed to watch configuration: {e}")))?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| CliError::Config(format!("Failed to watch {}: {e}", dir.display())))?;

    tracing::debug!(dir = %dir.display(), "Watching configuration directory");
    Ok(watcher)
}
