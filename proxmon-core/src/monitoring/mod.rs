//! Proxmox host health monitoring
//!
//! A remote script prints one JSON document describing the host (hostname,
//! uptime, load, memory, CPU and drive temperatures). The scheduler runs it
//! over SSH on a timer, decodes the output into a [`HealthRecord`],
//! classifies it into a [`DisplayState`] and hands that to a display sink.
//!
//! This module is GUI-free; display surfaces implement
//! [`crate::display::DisplaySink`].

mod classifier;
mod metrics;
mod parser;
pub mod scheduler;
mod settings;
pub mod ssh_exec;
mod watcher;

pub use classifier::{
    AlertClassifier, CPU_CRITICAL_CELSIUS, CPU_WARNING_CELSIUS, DISK_MARKER_CELSIUS,
    DISK_WARNING_CELSIUS, DiskLine, DiskStatus, DisplayState, LABEL_ELLIPSIS, LABEL_MAX_CHARS,
    Severity, StatusView, Unavailable, format_celsius, truncate_label,
};
pub use metrics::{
    DISK_TEMP_NOISE_CEILING, DiskTemperature, HealthRecord, LoadAverage, MemoryUsage,
};
pub use parser::{PayloadParser, PayloadResult};
pub use scheduler::{
    HEALTH_COMMAND, MonitorHandle, PollScheduler, REMOTE_SCRIPT_PATH, SchedulerPhase, poll_once,
    poll_state, start_monitor,
};
pub use settings::{
    DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_SSH_PORT, MAX_REFRESH_INTERVAL_SECS,
    MIN_REFRESH_INTERVAL_SECS, MissingField, MonitorConfig, Placement, interval_from_setting,
    port_from_setting,
};
pub use ssh_exec::{CommandOutput, RemoteExecutor, SshExecutor};
pub use watcher::{ConfigWatcher, Reaction, ReactionKind};
