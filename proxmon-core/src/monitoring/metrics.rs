//! Data model for one remote health payload
//!
//! A [`HealthRecord`] is produced fresh on every successful poll and is
//! never mutated afterwards; the next successful poll supersedes it.

use serde::{Deserialize, Serialize};

/// Disk temperatures at or above this value are sensor noise
pub const DISK_TEMP_NOISE_CEILING: f64 = 100.0;

/// Number of load average tokens shown
const LOAD_TOKEN_COUNT: usize = 3;

/// Health data reported by the remote host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Remote host name
    pub hostname: String,
    /// Human-readable uptime as reported by the host
    pub uptime: String,
    /// Load average line as reported by the host
    pub load: LoadAverage,
    /// Memory usage, absent when the host did not report it
    pub memory: Option<MemoryUsage>,
    /// CPU package temperature, absent when no sensor is available
    pub cpu_temp_celsius: Option<f64>,
    /// Per-drive temperatures, unfiltered
    pub disk_temps: Vec<DiskTemperature>,
    /// Collection time, epoch milliseconds
    pub timestamp_millis: i64,
}

impl HealthRecord {
    /// Returns drive temperatures with sensor noise (>= 100°C) removed
    pub fn valid_disk_temps(&self) -> impl Iterator<Item = &DiskTemperature> {
        self.disk_temps.iter().filter(|disk| disk.is_plausible())
    }
}

/// Temperature of one drive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskTemperature {
    /// Drive identifier (e.g. `sda`, `nvme0n1`)
    pub drive: String,
    /// Temperature in degrees Celsius
    pub temp_celsius: f64,
}

impl DiskTemperature {
    /// Returns false for readings at or above [`DISK_TEMP_NOISE_CEILING`]
    #[must_use]
    pub fn is_plausible(&self) -> bool {
        self.temp_celsius < DISK_TEMP_NOISE_CEILING
    }
}

/// Memory usage in kibibytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    /// Used memory (KiB)
    pub used_kib: u64,
    /// Total memory (KiB)
    pub total_kib: u64,
}

impl MemoryUsage {
    /// Returns usage rounded to a whole percent, or `None` when the total
    /// is zero
    #[must_use]
    pub fn percent(&self) -> Option<u32> {
        if self.total_kib == 0 {
            return None;
        }
        Some((self.used_kib as f64 / self.total_kib as f64 * 100.0).round() as u32)
    }

    /// Used memory in GB (KiB / 1024 / 1024)
    #[must_use]
    pub fn used_gb(&self) -> f64 {
        kib_to_gb(self.used_kib)
    }

    /// Total memory in GB (KiB / 1024 / 1024)
    #[must_use]
    pub fn total_gb(&self) -> f64 {
        kib_to_gb(self.total_kib)
    }
}

fn kib_to_gb(kib: u64) -> f64 {
    kib as f64 / 1024.0 / 1024.0
}

/// Load average text, e.g. `"0.42, 0.37, 0.30"`
///
/// Kept as text: the tokens are displayed exactly as the host sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadAverage {
    raw: String,
}

impl LoadAverage {
    /// Wraps the raw load line
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// Returns at most the first three comma-separated tokens, each with
    /// surrounding whitespace removed. Empty slots are kept; a blank line
    /// has no tokens.
    #[must_use]
    pub fn tokens(&self) -> Vec<&str> {
        if self.raw.trim().is_empty() {
            return Vec::new();
        }
        self.raw
            .split(',')
            .map(str::trim)
            .take(LOAD_TOKEN_COUNT)
            .collect()
    }
}
