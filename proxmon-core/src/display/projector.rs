//! Rendering of display states into sink calls

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use super::sink::{DetailEntry, DisplaySink};
use super::{
    FAILURE_ICON, HDD_SECTION_HEADER, IDLE_ICON, LOADING_LABEL, NO_DATA_ENTRY, NO_HDD_ENTRY,
};
use crate::monitoring::{DisplayState, MissingField, Placement, StatusView, Unavailable};

/// Label, icon and detail entries for one display state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedView {
    /// Indicator label
    pub label: String,
    /// Symbolic icon name
    pub icon: String,
    /// Detail entries, in display order
    pub entries: Vec<DetailEntry>,
}

/// Projects [`DisplayState`]s onto a [`DisplaySink`]
///
/// The time zone is used to format the last-update time; it defaults to
/// the local zone.
#[derive(Debug, Clone)]
pub struct DisplayProjector<Tz: TimeZone = Local> {
    tz: Tz,
}

impl Default for DisplayProjector<Local> {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayProjector<Local> {
    /// Creates a projector that formats times in the local zone
    #[must_use]
    pub const fn new() -> Self {
        Self { tz: Local }
    }
}

impl<Tz> DisplayProjector<Tz>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    /// Creates a projector that formats times in `tz`
    #[must_use]
    pub fn with_timezone(tz: Tz) -> Self {
        Self { tz }
    }

    /// Renders `state` and applies it to `sink`, replacing all entries.
    ///
    /// `None` (nothing published yet) is shown as not configured.
    pub fn project(&self, state: Option<&DisplayState>, sink: &mut dyn DisplaySink) {
        let view = self.render(state);
        sink.set_label(&view.label);
        sink.set_icon(&view.icon);
        sink.replace_entries(view.entries);
    }

    /// Shows the loading placeholder
    pub fn project_loading(&self, sink: &mut dyn DisplaySink) {
        sink.set_label(LOADING_LABEL);
        sink.set_icon(IDLE_ICON);
        sink.replace_entries(Vec::new());
    }

    /// Recreates the indicator at `placement` and redraws `last` without
    /// fetching new data
    pub fn reposition(
        &self,
        placement: Placement,
        last: Option<&DisplayState>,
        sink: &mut dyn DisplaySink,
    ) {
        sink.reposition(placement);
        match last {
            Some(state) => self.project(Some(state), sink),
            None => self.project_loading(sink),
        }
    }

    /// Renders a state without applying it
    #[must_use]
    pub fn render(&self, state: Option<&DisplayState>) -> RenderedView {
        match state {
            None => Self::unavailable_view(
                "Not Configured",
                not_configured_entry(&[MissingField::Host, MissingField::Username]),
            ),
            Some(DisplayState::Unavailable(reason)) => match reason {
                Unavailable::NotConfigured(missing) => {
                    Self::unavailable_view("Not Configured", not_configured_entry(missing))
                }
                Unavailable::Offline => Self::unavailable_view("Offline", NO_DATA_ENTRY.into()),
                Unavailable::DataError(_) => {
                    Self::unavailable_view("Data Error", NO_DATA_ENTRY.into())
                }
                Unavailable::NoData => Self::unavailable_view("No Data", NO_DATA_ENTRY.into()),
            },
            Some(DisplayState::Status(view)) => RenderedView {
                label: view.label.clone(),
                icon: view.severity.icon_name().to_string(),
                entries: self.status_entries(view),
            },
        }
    }

    fn unavailable_view(label: &str, entry: String) -> RenderedView {
        RenderedView {
            label: label.to_string(),
            icon: FAILURE_ICON.to_string(),
            entries: vec![DetailEntry::Item(entry)],
        }
    }

    fn status_entries(&self, view: &StatusView) -> Vec<DetailEntry> {
        let mut entries = vec![
            DetailEntry::Header(view.hostname.clone()),
            DetailEntry::item(&view.uptime_line),
            DetailEntry::item(&view.load_line),
            DetailEntry::item(&view.memory_line),
            DetailEntry::item(&view.cpu_temp_line),
            DetailEntry::item(HDD_SECTION_HEADER),
        ];

        if view.disks.is_empty() {
            entries.push(DetailEntry::item(NO_HDD_ENTRY));
        } else {
            entries.extend(view.disks.iter().map(|disk| DetailEntry::Item(disk.text())));
        }

        entries.push(DetailEntry::Separator);
        entries.push(DetailEntry::Item(format!(
            "Last update: {}",
            self.format_update_time(view.timestamp_millis)
        )));
        entries
    }

    /// Formats an epoch-millisecond timestamp as a time of day
    #[must_use]
    pub fn format_update_time(&self, timestamp_millis: i64) -> String {
        DateTime::from_timestamp_millis(timestamp_millis).map_or_else(
            || "unknown".to_string(),
            |utc| utc.with_timezone(&self.tz).format("%H:%M:%S").to_string(),
        )
    }
}

fn not_configured_entry(missing: &[MissingField]) -> String {
    let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
    format!("Please configure: {}", names.join(", "))
}
