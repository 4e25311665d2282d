//! Loading and saving `config.toml`

use std::path::{Path, PathBuf};

use super::stored::StoredSettings;
use crate::error::{ConfigError, ConfigResult};
use crate::settings::{MemorySettingsStore, SettingKey};
use crate::tracing::span_names;

/// Name of the configuration file inside the config directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory under the user configuration directory
const APP_DIR_NAME: &str = "proxmon";

/// Reads and writes the configuration file
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager for `$XDG_CONFIG_HOME/proxmon`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] if no configuration directory
    /// can be determined.
    pub fn new() -> ConfigResult<Self> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::with_config_dir(base.join(APP_DIR_NAME)))
    }

    /// Creates a manager for a specific directory
    #[must_use]
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Returns the configuration directory
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the path of `config.toml`
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads the settings; a missing file yields defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> ConfigResult<StoredSettings> {
        let path = self.config_path();
        let _span = tracing::debug_span!(span_names::CONFIG_LOAD, path = %path.display()).entered();

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No configuration file, using defaults");
                return Ok(StoredSettings::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path,
            reason: e.to_string(),
        })
    }

    /// Writes the settings, creating the directory if needed.
    ///
    /// The file is written to a temporary sibling and renamed into place.
    /// On Unix it is readable by the owner only, since it may hold a
    /// password.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    pub fn save(&self, settings: &StoredSettings) -> ConfigResult<()> {
        let path = self.config_path();
        let _span = tracing::debug_span!(span_names::CONFIG_SAVE, path = %path.display()).entered();

        let text =
            toml::to_string_pretty(settings).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::create_dir_all(&self.config_dir)?;
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, text)?;
        restrict_permissions(&tmp)?;
        std::fs::rename(&tmp, &path)?;

        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Loads the file and applies it to `store`. Returns the changed keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded.
    pub fn apply(&self, store: &MemorySettingsStore) -> ConfigResult<Vec<SettingKey>> {
        let changed = self.load()?.apply_to(store);
        if !changed.is_empty() {
            tracing::info!(?changed, "Configuration applied");
        }
        Ok(changed)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
