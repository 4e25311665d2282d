//! `proxmon` Core Library
//!
//! Polls a Proxmox host over SSH for a JSON health report and turns it into
//! a compact status indicator: a short label, a severity icon and a detail
//! list of uptime, load, memory and temperatures.
//!
//! # Crate Structure
//!
//! - [`monitoring`] - Health records, payload parsing, classification,
//!   SSH execution and the poll scheduler
//! - [`display`] - Projection of display states onto a [`DisplaySink`]
//! - [`settings`] - Setting keys and the [`SettingsStore`] the monitor reads
//! - [`config`] - `config.toml` persistence
//! - [`testing`] / [`upload`] - Connection test and script upload utilities
//! - [`tracing`] - Logging setup

#![warn(missing_docs)]

pub mod config;
pub mod display;
pub mod error;
pub mod monitoring;
pub mod settings;
pub mod testing;
pub mod tracing;
pub mod upload;

pub use config::{ConfigManager, StoredSettings};
pub use display::{DetailEntry, DisplayProjector, DisplaySink, RecordingSink, RenderedView};
pub use error::{
    ConfigError, ConfigResult, PayloadError, PollError, ProxmonError, ProxmonResult,
    TransportError, UtilityError, UtilityResult,
};
pub use monitoring::{
    AlertClassifier, CommandOutput, ConfigWatcher, DisplayState, HealthRecord, MissingField,
    MonitorConfig, MonitorHandle, PayloadParser, Placement, PollScheduler, Reaction,
    RemoteExecutor, SchedulerPhase, Severity, SshExecutor, StatusView, Unavailable, poll_once,
    poll_state, start_monitor,
};
pub use settings::{MemorySettingsStore, SettingKey, SettingValue, SettingsStore};
pub use testing::{UtilityReport, test_connection};
pub use self::tracing::{
    TracingConfig, TracingError, TracingLevel, TracingOutput, TracingResult, init_tracing,
};
pub use upload::upload_script;
