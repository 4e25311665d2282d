//! On-disk representation of the monitor settings

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigResult;
use crate::monitoring::{DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_SSH_PORT, Placement};
use crate::settings::{MemorySettingsStore, SettingKey, SettingValue, SettingsStore};

/// Contents of `config.toml`
///
/// Field names match the setting keys. Missing fields take their defaults,
/// so an empty file is valid. Values are stored as entered; range checks
/// and fallbacks happen when the monitor takes its snapshot.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StoredSettings {
    /// Proxmox host name or address
    pub server_host: String,
    /// SSH port
    pub server_port: i64,
    /// SSH user
    pub server_username: String,
    /// SSH password, used through `sshpass`. Stored in plain text.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server_password: String,
    /// Path to the SSH private key
    pub server_identity_file: String,
    /// Seconds between polls
    pub refresh_interval: i64,
    /// Indicator placement: `left`, `center` or `right`
    pub placement: String,
}

impl Default for StoredSettings {
    fn default() -> Self {
        Self {
            server_host: String::new(),
            server_port: i64::from(DEFAULT_SSH_PORT),
            server_username: String::new(),
            server_password: String::new(),
            server_identity_file: String::new(),
            refresh_interval: i64::from(DEFAULT_REFRESH_INTERVAL_SECS),
            placement: Placement::default().as_str().to_string(),
        }
    }
}

impl fmt::Debug for StoredSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredSettings")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("server_username", &self.server_username)
            .field(
                "server_password",
                &if self.server_password.is_empty() {
                    ""
                } else {
                    "[REDACTED]"
                },
            )
            .field("server_identity_file", &self.server_identity_file)
            .field("refresh_interval", &self.refresh_interval)
            .field("placement", &self.placement)
            .finish()
    }
}

impl StoredSettings {
    /// Reads every key from a settings store
    #[must_use]
    pub fn from_store(store: &dyn SettingsStore) -> Self {
        Self {
            server_host: store.get_string(SettingKey::ServerHost),
            server_port: store.get_int(SettingKey::ServerPort),
            server_username: store.get_string(SettingKey::ServerUsername),
            server_password: store.get_string(SettingKey::ServerPassword),
            server_identity_file: store.get_string(SettingKey::ServerIdentityFile),
            refresh_interval: store.get_int(SettingKey::RefreshInterval),
            placement: store.get_string(SettingKey::Placement),
        }
    }

    /// Returns the stored value for `key`
    #[must_use]
    pub fn value(&self, key: SettingKey) -> SettingValue {
        match key {
            SettingKey::ServerHost => SettingValue::Str(self.server_host.clone()),
            SettingKey::ServerPort => SettingValue::Int(self.server_port),
            SettingKey::ServerUsername => SettingValue::Str(self.server_username.clone()),
            SettingKey::ServerPassword => SettingValue::Str(self.server_password.clone()),
            SettingKey::ServerIdentityFile => SettingValue::Str(self.server_identity_file.clone()),
            SettingKey::RefreshInterval => SettingValue::Int(self.refresh_interval),
            SettingKey::Placement => SettingValue::Str(self.placement.clone()),
        }
    }

    /// Parses `raw` for `key` and stores it
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::ConfigError::InvalidValue`] if an integer
    /// key gets a non-numeric value.
    pub fn set_value(&mut self, key: SettingKey, raw: &str) -> ConfigResult<()> {
        let value = SettingValue::parse_for(key, raw)?;
        match key {
            SettingKey::ServerHost => self.server_host = value.as_string(),
            SettingKey::ServerPort => self.server_port = value.as_int(),
            SettingKey::ServerUsername => self.server_username = value.as_string(),
            SettingKey::ServerPassword => self.server_password = value.as_string(),
            SettingKey::ServerIdentityFile => self.server_identity_file = value.as_string(),
            SettingKey::RefreshInterval => self.refresh_interval = value.as_int(),
            SettingKey::Placement => self.placement = value.as_string(),
        }
        Ok(())
    }

    /// Returns the value for display, with the password masked
    #[must_use]
    pub fn display_value(&self, key: SettingKey) -> String {
        let value = self.value(key).as_string();
        if key.is_secret() && !value.is_empty() {
            "********".to_string()
        } else {
            value
        }
    }

    /// Writes every key into `store`. Returns the keys that changed.
    ///
    /// The store emits one change event per changed key, so a running
    /// monitor reacts exactly as it would to individual edits.
    pub fn apply_to(&self, store: &MemorySettingsStore) -> Vec<SettingKey> {
        SettingKey::ALL
            .into_iter()
            .filter(|key| store.set(*key, self.value(*key)))
            .collect()
    }
}
