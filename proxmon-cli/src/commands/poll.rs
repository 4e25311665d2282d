//! One-shot poll command.

use proxmon_core::display::{DisplayProjector, RenderedView};
use proxmon_core::monitoring::{
    DisplayState, HEALTH_COMMAND, MonitorConfig, SshExecutor, Unavailable, poll_state,
};
use proxmon_core::trace_operation;
use proxmon_core::tracing::span_names;
use tracing::Instrument;

use super::GlobalOptions;
use crate::error::CliError;
use crate::terminal_sink::TerminalSink;
use crate::util::{create_config_manager, create_runtime, load_store};

/// Poll command handler
pub fn cmd_poll(options: GlobalOptions<'_>, json: bool) -> Result<(), CliError> {
    let manager = create_config_manager(options.config_path)?;
    let store = load_store(&manager)?;
    let config = MonitorConfig::from_store(store.as_ref());

    let runtime = create_runtime()?;
    let executor = SshExecutor::new();
    let span = trace_operation!(span_names::POLL_CYCLE, host = %config.host);
    let state = runtime.block_on(poll_state(&executor, HEALTH_COMMAND, &config).instrument(span));

    let projector = DisplayProjector::new();
    if json {
        let text = serde_json::to_string_pretty(&state)
            .map_err(|e| CliError::Config(format!("Failed to encode state: {e}")))?;
        println!("{text}");
    } else {
        projector.project(Some(&state), &mut TerminalSink::stdout(options.color));
    }

    outcome(&state, &projector.render(Some(&state)))
}

fn outcome(state: &DisplayState, view: &RenderedView) -> Result<(), CliError> {
    match state {
        DisplayState::Status(_) => Ok(()),
        DisplayState::Unavailable(Unavailable::NotConfigured(_)) => {
            Err(CliError::NotConfigured(view.entries.first().map_or_else(
                || view.label.clone(),
                |entry| entry.text().to_string(),
            )))
        }
        DisplayState::Unavailable(_) => Err(CliError::Unavailable(view.label.clone())),
    }
}
