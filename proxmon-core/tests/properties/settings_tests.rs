//! Property tests for settings fallbacks and the change dispatch table

use proptest::prelude::*;
use proxmon_core::monitoring::{
    DEFAULT_SSH_PORT, MAX_REFRESH_INTERVAL_SECS, MIN_REFRESH_INTERVAL_SECS, ReactionKind,
    interval_from_setting, port_from_setting,
};
use proxmon_core::{
    ConfigWatcher, MemorySettingsStore, MonitorConfig, Placement, Reaction, SettingKey,
    SettingsStore,
};

fn arb_key() -> impl Strategy<Value = SettingKey> {
    prop::sample::select(SettingKey::ALL.to_vec())
}

proptest! {
    /// Property: the port is kept when valid and falls back to 22 otherwise
    #[test]
    fn port_fallback(value in any::<i64>()) {
        let port = port_from_setting(value);
        if (1..=65535).contains(&value) {
            prop_assert_eq!(i64::from(port), value);
        } else {
            prop_assert_eq!(port, DEFAULT_SSH_PORT);
        }
    }

    /// Property: the interval is always within bounds and unchanged inside them
    #[test]
    fn interval_clamped(value in any::<i64>()) {
        let secs = interval_from_setting(value);
        prop_assert!((MIN_REFRESH_INTERVAL_SECS..=MAX_REFRESH_INTERVAL_SECS).contains(&secs));
        if (i64::from(MIN_REFRESH_INTERVAL_SECS)..=i64::from(MAX_REFRESH_INTERVAL_SECS)).contains(&value) {
            prop_assert_eq!(i64::from(secs), value);
        }
    }

    /// Property: anything but a known placement name is right
    #[test]
    fn placement_fallback(value in "\\PC{0,12}") {
        let placement = Placement::from_setting(&value);
        match value.trim() {
            "left" => prop_assert_eq!(placement, Placement::Left),
            "center" => prop_assert_eq!(placement, Placement::Center),
            _ => prop_assert_eq!(placement, Placement::Right),
        }
    }

    /// Property: host and username are trimmed and decide configuredness
    #[test]
    fn configured_iff_host_and_user(host in "[ ]{0,2}[a-z]{0,6}[ ]{0,2}", user in "[ ]{0,2}[a-z]{0,6}") {
        let store = MemorySettingsStore::new();
        store.set_string(SettingKey::ServerHost, host.clone());
        store.set_string(SettingKey::ServerUsername, user.clone());

        let config = MonitorConfig::from_store(&store);
        prop_assert_eq!(config.host.as_str(), host.trim());
        prop_assert_eq!(
            config.is_configured(),
            !host.trim().is_empty() && !user.trim().is_empty()
        );
    }

    /// Property: every key maps to exactly one reaction, by key class
    #[test]
    fn dispatch_by_key_class(key in arb_key()) {
        let expected = match key {
            SettingKey::Placement => ReactionKind::Reposition,
            SettingKey::RefreshInterval => ReactionKind::Reschedule,
            _ => ReactionKind::PollNow,
        };
        prop_assert_eq!(ConfigWatcher::reaction_kind(key), Some(expected));
        prop_assert_eq!(key.is_server_key(), expected == ReactionKind::PollNow);
    }

    /// Property: resolved reactions carry the snapshot's values
    #[test]
    fn reaction_uses_snapshot(interval in any::<i64>(), placement in "(left|center|right|bogus)") {
        let store = MemorySettingsStore::new();
        store.set_int(SettingKey::RefreshInterval, interval);
        store.set_string(SettingKey::Placement, placement.clone());
        let config = MonitorConfig::from_store(&store);

        prop_assert_eq!(
            ConfigWatcher::on_change(SettingKey::RefreshInterval, &config),
            Some(Reaction::Reschedule(interval_from_setting(interval)))
        );
        prop_assert_eq!(
            ConfigWatcher::on_change(SettingKey::Placement, &config),
            Some(Reaction::Reposition(Placement::from_setting(&placement)))
        );
    }

    /// Property: string values round-trip through the store, with a change
    /// event only on actual change
    #[test]
    fn store_emits_only_on_change(values in prop::collection::vec("[a-c]{0,2}", 1..10)) {
        let store = MemorySettingsStore::new();
        let mut events = store.subscribe();
        let mut current = String::new();
        let mut expected_events = 0;

        for value in values {
            let changed = store.set_string(SettingKey::ServerHost, value.clone());
            prop_assert_eq!(changed, value != current);
            if changed {
                expected_events += 1;
                current = value;
            }
        }

        let mut seen = 0;
        while events.try_recv().is_ok() {
            seen += 1;
        }
        prop_assert_eq!(seen, expected_events);
        prop_assert_eq!(store.get_string(SettingKey::ServerHost), current);
    }
}
