//! `config.toml` persistence and its path into the settings store

use std::sync::Arc;

use proxmon_core::config::CONFIG_FILE_NAME;
use proxmon_core::{
    ConfigError, ConfigManager, MemorySettingsStore, MonitorConfig, Placement, SettingKey,
    SettingsStore, StoredSettings,
};
use tempfile::TempDir;

fn manager(dir: &TempDir) -> ConfigManager {
    ConfigManager::with_config_dir(dir.path().join("proxmon"))
}

#[test]
fn test_save_creates_directory_and_round_trips() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);

    let mut settings = StoredSettings::default();
    settings.set_value(SettingKey::ServerHost, "pve.lan").unwrap();
    settings.set_value(SettingKey::ServerPort, "2222").unwrap();
    settings.set_value(SettingKey::Placement, "left").unwrap();
    manager.save(&settings).unwrap();

    assert!(manager.config_path().ends_with(CONFIG_FILE_NAME));
    assert_eq!(manager.load().unwrap(), settings);
}

#[cfg(unix)]
#[test]
fn test_saved_file_is_private() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);
    let mut settings = StoredSettings::default();
    settings
        .set_value(SettingKey::ServerPassword, "hunter2")
        .unwrap();
    manager.save(&settings).unwrap();

    let mode = std::fs::metadata(manager.config_path())
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_parse_error_names_the_file() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);
    std::fs::create_dir_all(manager.config_dir()).unwrap();
    std::fs::write(manager.config_path(), "server-port = \"twenty-two\"\n").unwrap();

    let err = manager.load().unwrap_err();
    assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == &manager.config_path()));
}

#[test]
fn test_out_of_range_values_survive_file_but_fall_back_in_snapshot() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);
    std::fs::create_dir_all(manager.config_dir()).unwrap();
    std::fs::write(
        manager.config_path(),
        "server-host = \" pve.lan \"\n\
         server-username = \"root\"\n\
         server-port = 70000\n\
         refresh-interval = 10\n\
         placement = \"top\"\n",
    )
    .unwrap();

    let store = MemorySettingsStore::new();
    manager.apply(&store).unwrap();
    assert_eq!(store.get_int(SettingKey::ServerPort), 70000);

    let config = MonitorConfig::from_store(&store);
    assert_eq!(config.host, "pve.lan");
    assert_eq!(config.port, 22);
    assert_eq!(config.refresh_interval_secs, 30);
    assert_eq!(config.placement, Placement::Right);
    assert!(config.is_configured());
}

#[test]
fn test_apply_reports_only_changed_keys() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);
    let store = MemorySettingsStore::new();
    let mut events = store.subscribe();

    // Missing file is all defaults: nothing changes
    assert!(manager.apply(&store).unwrap().is_empty());
    assert!(events.try_recv().is_err());

    let mut settings = StoredSettings::default();
    settings.set_value(SettingKey::ServerHost, "pve.lan").unwrap();
    settings
        .set_value(SettingKey::RefreshInterval, "60")
        .unwrap();
    manager.save(&settings).unwrap();

    let changed = manager.apply(&store).unwrap();
    assert_eq!(
        changed,
        vec![SettingKey::ServerHost, SettingKey::RefreshInterval]
    );
    assert_eq!(events.try_recv().unwrap(), SettingKey::ServerHost);
    assert_eq!(events.try_recv().unwrap(), SettingKey::RefreshInterval);
    assert!(events.try_recv().is_err());

    // Re-applying the same file is a no-op
    assert!(manager.apply(&store).unwrap().is_empty());
}

#[test]
fn test_store_snapshot_round_trips_through_file() {
    let dir = TempDir::new().unwrap();
    let manager = manager(&dir);
    let store = Arc::new(MemorySettingsStore::new());
    store.set_string(SettingKey::ServerUsername, "monitor");
    store.set_string(SettingKey::ServerIdentityFile, "~/.ssh/id_ed25519");

    manager
        .save(&StoredSettings::from_store(store.as_ref()))
        .unwrap();

    let reloaded = MemorySettingsStore::new();
    manager.apply(&reloaded).unwrap();
    assert_eq!(
        reloaded.get_string(SettingKey::ServerIdentityFile),
        "~/.ssh/id_ed25519"
    );
    assert_eq!(reloaded.get_string(SettingKey::ServerUsername), "monitor");
}
