//! Settings store consumed by the monitor
//!
//! The monitor never persists configuration itself. It reads a snapshot
//! from a [`SettingsStore`] at poll time and subscribes to its change
//! stream. [`MemorySettingsStore`] is the in-process implementation used by
//! the CLI host (fed from `config.toml`) and by tests.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use crate::error::{ConfigError, ConfigResult};

/// Capacity of the change-event channel
const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// A setting key, named exactly as it appears in the settings store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SettingKey {
    /// `server-host`
    ServerHost,
    /// `server-port`
    ServerPort,
    /// `server-username`
    ServerUsername,
    /// `server-password`
    ServerPassword,
    /// `server-identity-file`
    ServerIdentityFile,
    /// `refresh-interval`
    RefreshInterval,
    /// `placement`
    Placement,
}

/// Whether a key holds a string or an integer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// String-valued key
    String,
    /// Integer-valued key
    Int,
}

impl SettingKey {
    /// All keys, in display order
    pub const ALL: [Self; 7] = [
        Self::ServerHost,
        Self::ServerPort,
        Self::ServerUsername,
        Self::ServerPassword,
        Self::ServerIdentityFile,
        Self::RefreshInterval,
        Self::Placement,
    ];

    /// Returns the store name of this key
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServerHost => "server-host",
            Self::ServerPort => "server-port",
            Self::ServerUsername => "server-username",
            Self::ServerPassword => "server-password",
            Self::ServerIdentityFile => "server-identity-file",
            Self::RefreshInterval => "refresh-interval",
            Self::Placement => "placement",
        }
    }

    /// Returns the value type stored under this key
    #[must_use]
    pub const fn kind(self) -> ValueKind {
        match self {
            Self::ServerPort | Self::RefreshInterval => ValueKind::Int,
            _ => ValueKind::String,
        }
    }

    /// Returns true for keys that describe how to reach the server
    #[must_use]
    pub const fn is_server_key(self) -> bool {
        matches!(
            self,
            Self::ServerHost
                | Self::ServerPort
                | Self::ServerUsername
                | Self::ServerPassword
                | Self::ServerIdentityFile
        )
    }

    /// Returns true if values of this key must not be printed or logged
    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(self, Self::ServerPassword)
    }

    /// Returns the value a fresh store holds for this key
    #[must_use]
    pub fn default_value(self) -> SettingValue {
        use crate::monitoring::{DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_SSH_PORT, Placement};

        match self {
            Self::ServerPort => SettingValue::Int(i64::from(DEFAULT_SSH_PORT)),
            Self::RefreshInterval => SettingValue::Int(i64::from(DEFAULT_REFRESH_INTERVAL_SECS)),
            Self::Placement => SettingValue::Str(Placement::default().as_str().to_string()),
            _ => SettingValue::Str(String::new()),
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

/// A raw value held by the settings store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    /// String value
    Str(String),
    /// Integer value
    Int(i64),
}

impl SettingValue {
    /// Parses `raw` according to the key's value kind
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if an integer key gets a
    /// non-numeric value.
    pub fn parse_for(key: SettingKey, raw: &str) -> ConfigResult<Self> {
        match key.kind() {
            ValueKind::String => Ok(Self::Str(raw.to_string())),
            ValueKind::Int => raw
                .trim()
                .parse()
                .map(Self::Int)
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    /// Returns the value as a string
    #[must_use]
    pub fn as_string(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
        }
    }

    /// Returns the value as an integer, or 0 if it is not numeric
    #[must_use]
    pub fn as_int(&self) -> i64 {
        match self {
            Self::Str(s) => s.trim().parse().unwrap_or(0),
            Self::Int(i) => *i,
        }
    }
}

/// Key-value settings with a change-notification stream
///
/// Reads never fail: an unset key yields its default value.
pub trait SettingsStore: Send + Sync {
    /// Reads a string setting
    fn get_string(&self, key: SettingKey) -> String;

    /// Reads an integer setting
    fn get_int(&self, key: SettingKey) -> i64;

    /// Subscribes to change events, one event per changed key
    fn subscribe(&self) -> broadcast::Receiver<SettingKey>;
}

/// In-memory [`SettingsStore`]
#[derive(Debug)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<SettingKey, SettingValue>>,
    changes: broadcast::Sender<SettingKey>,
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySettingsStore {
    /// Creates a store holding default values for every key
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let values = SettingKey::ALL
            .into_iter()
            .map(|key| (key, key.default_value()))
            .collect();
        Self {
            values: RwLock::new(values),
            changes,
        }
    }

    /// Stores a value and emits a change event if it differs from the
    /// current one. Returns whether the value changed.
    pub fn set(&self, key: SettingKey, value: SettingValue) -> bool {
        let changed = {
            let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
            if values.get(&key) == Some(&value) {
                false
            } else {
                values.insert(key, value);
                true
            }
        };

        if changed {
            tracing::debug!(key = %key, "Setting changed");
            // No subscribers is not an error
            let _ = self.changes.send(key);
        }
        changed
    }

    /// Stores a string value
    pub fn set_string(&self, key: SettingKey, value: impl Into<String>) -> bool {
        self.set(key, SettingValue::Str(value.into()))
    }

    /// Stores an integer value
    pub fn set_int(&self, key: SettingKey, value: i64) -> bool {
        self.set(key, SettingValue::Int(value))
    }

    /// Parses `raw` for `key` and stores it
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the value does not match the
    /// key's type.
    pub fn set_from_str(&self, key: SettingKey, raw: &str) -> ConfigResult<bool> {
        Ok(self.set(key, SettingValue::parse_for(key, raw)?))
    }

    fn get(&self, key: SettingKey) -> SettingValue {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .unwrap_or_else(|| key.default_value())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get_string(&self, key: SettingKey) -> String {
        self.get(key).as_string()
    }

    fn get_int(&self, key: SettingKey) -> i64 {
        self.get(key).as_int()
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingKey> {
        self.changes.subscribe()
    }
}
