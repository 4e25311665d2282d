//! Property tests for alert classification

use proptest::prelude::*;
use proxmon_core::display::FAILURE_ICON;
use proxmon_core::monitoring::{
    CPU_CRITICAL_CELSIUS, DISK_TEMP_NOISE_CEILING, DiskTemperature, LABEL_ELLIPSIS,
    LABEL_MAX_CHARS, LoadAverage, MemoryUsage, truncate_label,
};
use proxmon_core::{
    AlertClassifier, DetailEntry, DisplayProjector, DisplayState, HealthRecord, Severity,
    StatusView, Unavailable,
};

fn arb_disk() -> impl Strategy<Value = DiskTemperature> {
    ("[a-z]{2,4}[0-9]?", 0.0f64..200.0).prop_map(|(drive, temp_celsius)| DiskTemperature {
        drive,
        temp_celsius,
    })
}

fn arb_record() -> impl Strategy<Value = HealthRecord> {
    (
        "[a-z][a-z0-9-]{0,24}",
        proptest::option::of(0.0f64..110.0),
        prop::collection::vec(arb_disk(), 0..6),
        proptest::option::of((0u64..64_000_000, 0u64..64_000_000)),
    )
        .prop_map(|(hostname, cpu, disk_temps, memory)| HealthRecord {
            hostname,
            uptime: "up 1 day".to_string(),
            load: LoadAverage::new("0.10, 0.20, 0.30"),
            memory: memory.map(|(used_kib, total_kib)| MemoryUsage {
                used_kib,
                total_kib,
            }),
            cpu_temp_celsius: cpu,
            disk_temps,
            timestamp_millis: 1_718_000_000_000,
        })
}

fn status(record: &HealthRecord) -> StatusView {
    match AlertClassifier::classify(record) {
        DisplayState::Status(view) => view,
        DisplayState::Unavailable(reason) => panic!("unexpected {reason:?}"),
    }
}

proptest! {
    /// Property: classification is deterministic
    #[test]
    fn classify_is_pure(record in arb_record()) {
        prop_assert_eq!(
            AlertClassifier::classify(&record),
            AlertClassifier::classify(&record)
        );
    }

    /// Property: noise readings never reach the view or the severity
    #[test]
    fn noise_readings_are_ignored(
        record in arb_record(),
        noise in prop::collection::vec(DISK_TEMP_NOISE_CEILING..500.0, 1..4),
    ) {
        let mut noisy = record.clone();
        let clean: Vec<_> = record.valid_disk_temps().cloned().collect();
        noisy.disk_temps = clean.clone();
        noisy.disk_temps.extend(noise.into_iter().map(|temp_celsius| DiskTemperature {
            drive: "sdz".to_string(),
            temp_celsius,
        }));

        let mut filtered = record;
        filtered.disk_temps = clean;

        let view = status(&noisy);
        prop_assert!(view.disks.iter().all(|d| d.temp_celsius < DISK_TEMP_NOISE_CEILING));
        prop_assert_eq!(
            AlertClassifier::severity(&noisy),
            AlertClassifier::severity(&filtered)
        );
    }

    /// Property: a CPU above the critical threshold always wins
    #[test]
    fn hot_cpu_is_critical(record in arb_record(), cpu in 80.001f64..150.0) {
        let mut record = record;
        record.cpu_temp_celsius = Some(cpu);
        prop_assert!(cpu > CPU_CRITICAL_CELSIUS);
        prop_assert_eq!(AlertClassifier::severity(&record), Severity::Critical);
    }

    /// Property: with a cool CPU, severity is warning exactly when a valid
    /// drive is above 50°C
    #[test]
    fn cool_cpu_follows_disks(record in arb_record(), cpu in proptest::option::of(0.0f64..=60.0)) {
        let mut record = record;
        record.cpu_temp_celsius = cpu;
        let hot_disk = record.valid_disk_temps().any(|d| d.temp_celsius > 50.0);
        let expected = if hot_disk { Severity::Warning } else { Severity::Normal };
        prop_assert_eq!(AlertClassifier::severity(&record), expected);
    }

    /// Property: labels are at most 12 characters plus the ellipsis, and
    /// short names pass through unchanged
    #[test]
    fn label_truncation(hostname in "\\PC{0,40}") {
        let label = truncate_label(&hostname);
        let count = hostname.chars().count();
        if count <= LABEL_MAX_CHARS {
            prop_assert_eq!(label, hostname);
        } else {
            prop_assert!(label.ends_with(LABEL_ELLIPSIS));
            prop_assert_eq!(
                label.chars().count(),
                LABEL_MAX_CHARS + LABEL_ELLIPSIS.chars().count()
            );
            prop_assert!(hostname.starts_with(label.trim_end_matches(LABEL_ELLIPSIS)));
        }
    }

    /// Property: memory is shown as unavailable whenever the total is zero
    #[test]
    fn zero_total_memory_is_unavailable(record in arb_record(), used in 0u64..1_000_000) {
        let mut record = record;
        record.memory = Some(MemoryUsage { used_kib: used, total_kib: 0 });
        prop_assert_eq!(status(&record).memory_line, "Memory: unavailable");
    }

    /// Property: the rendered detail view is a full rebuild with a fixed
    /// frame around the drive lines
    #[test]
    fn status_view_layout(record in arb_record()) {
        let state = AlertClassifier::classify(&record);
        let view = DisplayProjector::new().render(Some(&state));
        let drives = record.valid_disk_temps().count().max(1);

        prop_assert_eq!(view.entries.len(), 6 + drives + 2);
        prop_assert_eq!(&view.entries[0], &DetailEntry::Header(record.hostname.clone()));
        prop_assert_eq!(&view.entries[view.entries.len() - 2], &DetailEntry::Separator);
        prop_assert!(view.entries[view.entries.len() - 1].text().starts_with("Last update: "));
        prop_assert_ne!(view.icon, FAILURE_ICON);
    }
}

#[test]
fn unavailable_states_use_failure_icon() {
    let projector = DisplayProjector::new();
    for reason in [
        Unavailable::Offline,
        Unavailable::DataError("eof".to_string()),
        Unavailable::NoData,
        Unavailable::NotConfigured(Vec::new()),
    ] {
        let view = projector.render(Some(&DisplayState::Unavailable(reason)));
        assert_eq!(view.icon, FAILURE_ICON);
        assert_eq!(view.entries.len(), 1);
    }
}
