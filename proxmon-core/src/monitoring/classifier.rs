//! Alert classification for health records
//!
//! [`AlertClassifier::classify`] is a pure function from a [`HealthRecord`]
//! to a [`DisplayState`]: the truncated label, a severity, and the
//! per-component status lines shown in the detail view.

use serde::Serialize;

use super::metrics::{DiskTemperature, HealthRecord, MemoryUsage};
use super::settings::MissingField;

/// Maximum characters of the hostname shown in the label
pub const LABEL_MAX_CHARS: usize = 12;

/// Appended to a truncated label
pub const LABEL_ELLIPSIS: &str = "...";

/// CPU temperature above which the host is critical
pub const CPU_CRITICAL_CELSIUS: f64 = 80.0;

/// CPU temperature above which the host is in warning
pub const CPU_WARNING_CELSIUS: f64 = 60.0;

/// Drive temperature above which the host is in warning
pub const DISK_WARNING_CELSIUS: f64 = 50.0;

/// Drive temperature above which the drive line is marked
pub const DISK_MARKER_CELSIUS: f64 = 45.0;

/// Aggregate health of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// All temperatures nominal
    Normal,
    /// Something runs warm
    Warning,
    /// CPU is overheating
    Critical,
}

impl Severity {
    /// Symbolic icon name for this severity
    #[must_use]
    pub const fn icon_name(self) -> &'static str {
        match self {
            Self::Normal => "computer-symbolic",
            Self::Warning => "computer-warning-symbolic",
            Self::Critical => "computer-fail-symbolic",
        }
    }
}

/// Marker shown next to one drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskStatus {
    /// At or below [`DISK_MARKER_CELSIUS`]
    Ok,
    /// Above [`DISK_MARKER_CELSIUS`]
    Warm,
}

impl DiskStatus {
    /// Glyph displayed for this status
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Ok => "✓",
            Self::Warm => "⚠️",
        }
    }
}

/// One drive line in the detail view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskLine {
    /// Drive identifier
    pub drive: String,
    /// Temperature in degrees Celsius
    pub temp_celsius: f64,
    /// Status marker
    pub status: DiskStatus,
}

impl DiskLine {
    /// Text of the detail entry, e.g. `"  sda: 36°C ✓"`
    #[must_use]
    pub fn text(&self) -> String {
        format!(
            "  {}: {} {}",
            self.drive,
            format_celsius(self.temp_celsius),
            self.status.glyph()
        )
    }
}

/// Display state derived from a successful poll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusView {
    /// Full hostname, used as the detail header
    pub hostname: String,
    /// Hostname truncated for the label
    pub label: String,
    /// Aggregate severity
    pub severity: Severity,
    /// `Uptime: ...`
    pub uptime_line: String,
    /// `Load: a, b, c`
    pub load_line: String,
    /// `Memory: 8.0GB / 16.0GB (50%)`
    pub memory_line: String,
    /// `CPU Temp: 48°C`
    pub cpu_temp_line: String,
    /// Drives left after noise filtering, in payload order
    pub disks: Vec<DiskLine>,
    /// Collection time, epoch milliseconds
    pub timestamp_millis: i64,
}

/// Why no status can be shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Unavailable {
    /// Host or username is not set
    NotConfigured(Vec<MissingField>),
    /// The remote call failed or returned nothing
    Offline,
    /// The payload could not be decoded; carries the decode error
    DataError(String),
    /// A poll completed without a record
    NoData,
}

/// What the display surface should show
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayState {
    /// Health data is available
    Status(StatusView),
    /// Health data is not available
    Unavailable(Unavailable),
}

impl DisplayState {
    /// Returns the status view, if any
    #[must_use]
    pub const fn status(&self) -> Option<&StatusView> {
        match self {
            Self::Status(view) => Some(view),
            Self::Unavailable(_) => None,
        }
    }

    /// Returns the reason no status is shown, if any
    #[must_use]
    pub const fn unavailable(&self) -> Option<&Unavailable> {
        match self {
            Self::Status(_) => None,
            Self::Unavailable(reason) => Some(reason),
        }
    }
}

impl From<Unavailable> for DisplayState {
    fn from(reason: Unavailable) -> Self {
        Self::Unavailable(reason)
    }
}

/// Maps health records to display states using fixed thresholds
pub struct AlertClassifier;

impl AlertClassifier {
    /// Classifies a health record
    #[must_use]
    pub fn classify(record: &HealthRecord) -> DisplayState {
        let disks = record
            .valid_disk_temps()
            .map(|disk| DiskLine {
                drive: disk.drive.clone(),
                temp_celsius: disk.temp_celsius,
                status: Self::disk_status(disk),
            })
            .collect();

        DisplayState::Status(StatusView {
            hostname: record.hostname.clone(),
            label: truncate_label(&record.hostname),
            severity: Self::severity(record),
            uptime_line: format!("Uptime: {}", record.uptime),
            load_line: load_line(&record.load.tokens()),
            memory_line: memory_line(record.memory.as_ref()),
            cpu_temp_line: format!(
                "CPU Temp: {}",
                record
                    .cpu_temp_celsius
                    .map_or_else(|| "N/A".to_string(), format_celsius)
            ),
            disks,
            timestamp_millis: record.timestamp_millis,
        })
    }

    /// Aggregate severity; the first matching rule wins:
    /// CPU > 80 critical, CPU > 60 warning, any valid drive > 50 warning.
    #[must_use]
    pub fn severity(record: &HealthRecord) -> Severity {
        match record.cpu_temp_celsius {
            Some(cpu) if cpu > CPU_CRITICAL_CELSIUS => Severity::Critical,
            Some(cpu) if cpu > CPU_WARNING_CELSIUS => Severity::Warning,
            _ if record
                .valid_disk_temps()
                .any(|disk| disk.temp_celsius > DISK_WARNING_CELSIUS) =>
            {
                Severity::Warning
            }
            _ => Severity::Normal,
        }
    }

    /// Per-drive marker, independent of the aggregate severity
    #[must_use]
    pub fn disk_status(disk: &DiskTemperature) -> DiskStatus {
        if disk.temp_celsius > DISK_MARKER_CELSIUS {
            DiskStatus::Warm
        } else {
            DiskStatus::Ok
        }
    }
}

/// Truncates a hostname to [`LABEL_MAX_CHARS`] characters plus an ellipsis
#[must_use]
pub fn truncate_label(hostname: &str) -> String {
    if hostname.chars().count() > LABEL_MAX_CHARS {
        let head: String = hostname.chars().take(LABEL_MAX_CHARS).collect();
        format!("{head}{LABEL_ELLIPSIS}")
    } else {
        hostname.to_string()
    }
}

/// Formats a temperature the way the host reports it: `36°C`, `47.5°C`
#[must_use]
pub fn format_celsius(temp: f64) -> String {
    format!("{temp}°C")
}

fn load_line(tokens: &[&str]) -> String {
    if tokens.is_empty() {
        "Load: N/A".to_string()
    } else {
        format!("Load: {}", tokens.join(", "))
    }
}

fn memory_line(memory: Option<&MemoryUsage>) -> String {
    match memory.and_then(|mem| mem.percent().map(|pct| (mem, pct))) {
        Some((mem, pct)) => format!(
            "Memory: {:.1}GB / {:.1}GB ({pct}%)",
            mem.used_gb(),
            mem.total_gb()
        ),
        None => "Memory: unavailable".to_string(),
    }
}
