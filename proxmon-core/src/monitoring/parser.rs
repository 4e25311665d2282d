//! Parser for the remote health payload
//!
//! The remote script prints a single JSON object:
//!
//! ```json
//! {
//!   "system_info": {
//!     "hostname": "pve1",
//!     "uptime": "up 3 days, 4 hours",
//!     "load": "0.42, 0.37, 0.30",
//!     "memory_used": 8388608,
//!     "memory_total": 16777216
//!   },
//!   "cpu_temp": 48.0,
//!   "hdd_temps": [{ "drive": "sda", "temp": 36 }],
//!   "timestamp": 1718000000000
//! }
//! ```
//!
//! `hostname`, the `cpu_temp` key (its value may be `null`), the `hdd_temps`
//! array and `timestamp` are required. A payload missing any of them is
//! rejected as a whole rather than partially displayed.

use serde::{Deserialize, Deserializer};

use super::metrics::{DiskTemperature, HealthRecord, LoadAverage, MemoryUsage};
use crate::error::PayloadError;

/// Result type for payload parsing
pub type PayloadResult<T> = Result<T, PayloadError>;

#[derive(Debug, Deserialize)]
struct RawPayload {
    system_info: Option<RawSystemInfo>,
    #[serde(default, deserialize_with = "deserialize_present")]
    cpu_temp: Option<Option<f64>>,
    hdd_temps: Option<Vec<RawDiskTemp>>,
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawSystemInfo {
    hostname: Option<String>,
    #[serde(default)]
    uptime: Option<String>,
    #[serde(default)]
    load: Option<String>,
    #[serde(default)]
    memory_used: Option<u64>,
    #[serde(default)]
    memory_total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawDiskTemp {
    drive: String,
    temp: f64,
}

/// Distinguishes a key that is present with `null` (`Some(None)`) from a
/// key that is absent (`None`, via `#[serde(default)]`).
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

/// Stateless parser for the remote health payload
pub struct PayloadParser;

impl PayloadParser {
    /// Parses raw command output into a [`HealthRecord`].
    ///
    /// # Errors
    ///
    /// - [`PayloadError::EmptyOutput`] if the output is blank after trimming
    /// - [`PayloadError::Malformed`] if it is not JSON or a required field
    ///   is missing
    pub fn parse(output: &str) -> PayloadResult<HealthRecord> {
        let trimmed = output.trim();
        if trimmed.is_empty() {
            return Err(PayloadError::EmptyOutput);
        }

        let raw: RawPayload = serde_json::from_str(trimmed)
            .map_err(|e| PayloadError::Malformed(e.to_string()))?;

        let system_info = raw
            .system_info
            .ok_or_else(|| Self::missing("system_info"))?;
        let hostname = system_info
            .hostname
            .ok_or_else(|| Self::missing("system_info.hostname"))?;
        let cpu_temp_celsius = raw.cpu_temp.ok_or_else(|| Self::missing("cpu_temp"))?;
        let hdd_temps = raw.hdd_temps.ok_or_else(|| Self::missing("hdd_temps"))?;
        let timestamp_millis = raw.timestamp.ok_or_else(|| Self::missing("timestamp"))?;

        let memory = match (system_info.memory_used, system_info.memory_total) {
            (Some(used_kib), Some(total_kib)) => Some(MemoryUsage {
                used_kib,
                total_kib,
            }),
            _ => None,
        };

        Ok(HealthRecord {
            hostname,
            uptime: system_info.uptime.unwrap_or_default(),
            load: LoadAverage::new(system_info.load.unwrap_or_default()),
            memory,
            cpu_temp_celsius,
            disk_temps: hdd_temps
                .into_iter()
                .map(|disk| DiskTemperature {
                    drive: disk.drive,
                    temp_celsius: disk.temp,
                })
                .collect(),
            timestamp_millis,
        })
    }

    fn missing(field: &str) -> PayloadError {
        PayloadError::Malformed(format!("missing required field `{field}`"))
    }
}
