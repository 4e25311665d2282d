//! Settings inspection and editing commands.

use std::collections::BTreeMap;

use proxmon_core::config::{ConfigManager, StoredSettings};
use proxmon_core::settings::SettingKey;
use secrecy::{ExposeSecret, SecretString};

use super::GlobalOptions;
use crate::cli::ConfigCommands;
use crate::error::CliError;
use crate::util::create_config_manager;

/// Config command handler
pub fn cmd_config(options: GlobalOptions<'_>, subcmd: ConfigCommands) -> Result<(), CliError> {
    let manager = create_config_manager(options.config_path)?;
    match subcmd {
        ConfigCommands::Show { json } => cmd_show(&manager, json),
        ConfigCommands::Set { key, value } => cmd_set(&manager, &key, value, options.quiet),
        ConfigCommands::Path => {
            println!("{}", manager.config_path().display());
            Ok(())
        }
    }
}

fn cmd_show(manager: &ConfigManager, json: bool) -> Result<(), CliError> {
    let settings = manager.load()?;

    if json {
        let map: BTreeMap<&str, String> = SettingKey::ALL
            .into_iter()
            .map(|key| (key.as_str(), settings.display_value(key)))
            .collect();
        let text = serde_json::to_string_pretty(&map)
            .map_err(|e| CliError::Config(format!("Failed to encode settings: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    let width = SettingKey::ALL
        .iter()
        .map(|key| key.as_str().len())
        .max()
        .unwrap_or_default();
    for key in SettingKey::ALL {
        println!("{:<width$}  {}", key.as_str(), settings.display_value(key));
    }
    Ok(())
}

fn cmd_set(
    manager: &ConfigManager,
    key: &str,
    value: Option<String>,
    quiet: bool,
) -> Result<(), CliError> {
    let key: SettingKey = key.parse()?;

    let value = match value {
        Some(value) => SecretString::from(value),
        None if key.is_secret() => {
            eprint!("Enter value for {key}: ");
            SecretString::from(
                rpassword::read_password()
                    .map_err(|e| CliError::Config(format!("Failed to read password: {e}")))?,
            )
        }
        None => {
            return Err(CliError::Config(format!("A value is required for {key}")));
        }
    };

    let mut settings: StoredSettings = manager.load()?;
    settings.set_value(key, value.expose_secret())?;
    manager.save(&settings)?;

    if !quiet {
        println!("{key} = {}", settings.display_value(key));
    }
    Ok(())
}
