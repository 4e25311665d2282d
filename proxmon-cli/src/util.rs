//! Shared utility functions used across command modules.

use std::path::Path;
use std::sync::Arc;

use proxmon_core::config::ConfigManager;
use proxmon_core::settings::MemorySettingsStore;

use crate::error::CliError;

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::with_config_dir(path.to_path_buf())),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

/// Loads `config.toml` into a fresh settings store
pub fn load_store(manager: &ConfigManager) -> Result<Arc<MemorySettingsStore>, CliError> {
    let store = Arc::new(MemorySettingsStore::new());
    manager.apply(&store)?;
    Ok(store)
}

/// Creates the tokio runtime commands run on
pub fn create_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Runtime(format!("Failed to create async runtime: {e}")))
}
