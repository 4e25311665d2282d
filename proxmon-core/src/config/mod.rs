//! Configuration file handling
//!
//! Settings persist in `config.toml` under the user configuration
//! directory. The file is loaded into a [`StoredSettings`] and applied to a
//! [`crate::settings::MemorySettingsStore`], which the monitor reads.

mod manager;
mod stored;

pub use manager::{CONFIG_FILE_NAME, ConfigManager};
pub use stored::StoredSettings;
