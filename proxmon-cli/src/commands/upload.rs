//! Health script upload command.

use std::path::Path;

use proxmon_core::monitoring::MonitorConfig;
use proxmon_core::upload::upload_script;

use super::GlobalOptions;
use crate::error::CliError;
use crate::util::{create_config_manager, create_runtime, load_store};

/// Upload command handler
pub fn cmd_upload(options: GlobalOptions<'_>, file: &Path) -> Result<(), CliError> {
    let manager = create_config_manager(options.config_path)?;
    let store = load_store(&manager)?;
    let config = MonitorConfig::from_store(store.as_ref());

    if !options.quiet {
        println!("Uploading {}...", file.display());
    }

    let runtime = create_runtime()?;
    let report = runtime.block_on(upload_script(&config, file))?;

    if !options.quiet {
        println!("{}", report.message);
    }
    Ok(())
}
