//! Connection and refresh settings snapshot
//!
//! [`MonitorConfig`] is read from a [`SettingsStore`] at poll time. Values
//! the store holds but that are out of range fall back to defaults rather
//! than erroring: port 22, right placement, clamped refresh interval.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::settings::{SettingKey, SettingsStore};

/// Port the SSH transport uses when none is given
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Refresh interval used by a fresh store (seconds)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u32 = 300;

/// Shortest accepted refresh interval (seconds)
pub const MIN_REFRESH_INTERVAL_SECS: u32 = 30;

/// Longest accepted refresh interval (seconds)
pub const MAX_REFRESH_INTERVAL_SECS: u32 = 3600;

/// Horizontal position of the indicator on the display surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    /// Left side
    Left,
    /// Center
    Center,
    /// Right side (default)
    #[default]
    Right,
}

impl Placement {
    /// Parses a store value. Anything unrecognized is [`Placement::Right`].
    #[must_use]
    pub fn from_setting(value: &str) -> Self {
        match value.trim() {
            "left" => Self::Left,
            "center" => Self::Center,
            "right" => Self::Right,
            _ => Self::Right,
        }
    }

    /// Returns the store value for this placement
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A required setting that is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingField {
    /// `server-host` is empty
    Host,
    /// `server-username` is empty
    Username,
}

impl MissingField {
    /// Settings key backing this field
    #[must_use]
    pub const fn setting_key(self) -> SettingKey {
        match self {
            Self::Host => SettingKey::ServerHost,
            Self::Username => SettingKey::ServerUsername,
        }
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Host => f.write_str("Server Host"),
            Self::Username => f.write_str("Username"),
        }
    }
}

/// Snapshot of the monitor configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Remote host name or address
    pub host: String,
    /// SSH port (1–65535)
    pub port: u16,
    /// Remote user name
    pub username: String,
    /// Private key file, `~` expanded
    pub identity_file: Option<PathBuf>,
    /// Password for `sshpass` authentication
    pub password: Option<SecretString>,
    /// Refresh interval in seconds, within the accepted bounds
    pub refresh_interval_secs: u32,
    /// Indicator placement
    pub placement: Placement,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_SSH_PORT,
            username: String::new(),
            identity_file: None,
            password: None,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            placement: Placement::default(),
        }
    }
}

impl MonitorConfig {
    /// Creates a config for `username@host` with every other field at its
    /// default
    #[must_use]
    pub fn new(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            ..Self::default()
        }
    }

    /// Reads a snapshot from the settings store
    #[must_use]
    pub fn from_store(store: &dyn SettingsStore) -> Self {
        let identity = store.get_string(SettingKey::ServerIdentityFile);
        let password = store.get_string(SettingKey::ServerPassword);

        Self {
            host: store.get_string(SettingKey::ServerHost).trim().to_string(),
            port: port_from_setting(store.get_int(SettingKey::ServerPort)),
            username: store
                .get_string(SettingKey::ServerUsername)
                .trim()
                .to_string(),
            identity_file: identity_from_setting(&identity),
            password: (!password.is_empty()).then(|| SecretString::from(password)),
            refresh_interval_secs: interval_from_setting(
                store.get_int(SettingKey::RefreshInterval),
            ),
            placement: Placement::from_setting(&store.get_string(SettingKey::Placement)),
        }
    }

    /// Returns the required fields that are empty, in display order
    #[must_use]
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.host.is_empty() {
            missing.push(MissingField::Host);
        }
        if self.username.is_empty() {
            missing.push(MissingField::Username);
        }
        missing
    }

    /// Returns true if host and username are both set
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Returns the SSH destination, `user@host`
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }

    /// Returns the refresh interval as a [`Duration`]
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.refresh_interval_secs))
    }
}

/// Converts a stored port, falling back to 22 outside 1–65535
#[must_use]
pub fn port_from_setting(value: i64) -> u16 {
    u16::try_from(value)
        .ok()
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_SSH_PORT)
}

/// Converts a stored refresh interval, clamped to the accepted bounds
#[must_use]
pub fn interval_from_setting(value: i64) -> u32 {
    value.clamp(
        i64::from(MIN_REFRESH_INTERVAL_SECS),
        i64::from(MAX_REFRESH_INTERVAL_SECS),
    ) as u32
}

/// Converts a stored identity path. Blank means "no identity file".
#[must_use]
pub fn identity_from_setting(value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(PathBuf::from(shellexpand::tilde(trimmed).into_owned()))
}
