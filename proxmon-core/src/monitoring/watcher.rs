//! Reactions to setting changes
//!
//! Each key maps to exactly one reaction through a fixed table:
//! placement moves the indicator, the refresh interval restarts the timer,
//! and any server-connection key requests an immediate poll.

use super::settings::{MonitorConfig, Placement};
use crate::settings::SettingKey;

/// Kind of reaction a key triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    /// Recreate the indicator at the configured placement
    Reposition,
    /// Restart the refresh timer at the configured interval
    Reschedule,
    /// Run one out-of-band poll
    PollNow,
}

/// Key-to-reaction dispatch table
const DISPATCH_TABLE: [(SettingKey, ReactionKind); 7] = [
    (SettingKey::Placement, ReactionKind::Reposition),
    (SettingKey::RefreshInterval, ReactionKind::Reschedule),
    (SettingKey::ServerHost, ReactionKind::PollNow),
    (SettingKey::ServerPort, ReactionKind::PollNow),
    (SettingKey::ServerUsername, ReactionKind::PollNow),
    (SettingKey::ServerPassword, ReactionKind::PollNow),
    (SettingKey::ServerIdentityFile, ReactionKind::PollNow),
];

/// A reaction with the values it needs, resolved from a config snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Move the indicator; no data is refetched
    Reposition(Placement),
    /// Restart the timer at this interval (seconds)
    Reschedule(u32),
    /// Poll now, unless a poll is already in flight
    PollNow,
}

/// Decides how the monitor reacts to a changed setting
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigWatcher;

impl ConfigWatcher {
    /// Looks up the reaction kind for a key
    #[must_use]
    pub fn reaction_kind(key: SettingKey) -> Option<ReactionKind> {
        DISPATCH_TABLE
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, kind)| *kind)
    }

    /// Resolves the reaction for a changed key against the current config
    #[must_use]
    pub fn on_change(key: SettingKey, config: &MonitorConfig) -> Option<Reaction> {
        let reaction = match Self::reaction_kind(key)? {
            ReactionKind::Reposition => Reaction::Reposition(config.placement),
            ReactionKind::Reschedule => Reaction::Reschedule(config.refresh_interval_secs),
            ReactionKind::PollNow => Reaction::PollNow,
        };
        tracing::debug!(key = %key, ?reaction, "Setting change dispatched");
        Some(reaction)
    }
}
