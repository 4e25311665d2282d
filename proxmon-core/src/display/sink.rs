//! Display sink trait and a recording implementation

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::monitoring::Placement;

/// One line of the detail view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum DetailEntry {
    /// Emphasized header line (rendered bold where the sink supports it)
    Header(String),
    /// Plain text line
    Item(String),
    /// Visual separator
    Separator,
}

impl DetailEntry {
    /// Creates a plain text entry
    #[must_use]
    pub fn item(text: impl Into<String>) -> Self {
        Self::Item(text.into())
    }

    /// Returns the text of the entry, empty for separators
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Header(text) | Self::Item(text) => text,
            Self::Separator => "",
        }
    }

    /// Returns Pango-style markup for the entry
    #[must_use]
    pub fn markup(&self) -> String {
        match self {
            Self::Header(text) => format!("<b>{}</b>", escape_markup(text)),
            Self::Item(text) => escape_markup(text),
            Self::Separator => String::new(),
        }
    }
}

impl fmt::Display for DetailEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Separator => f.write_str("────────"),
            other => f.write_str(other.text()),
        }
    }
}

fn escape_markup(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// The display surface the monitor renders into
pub trait DisplaySink: Send {
    /// Sets the indicator label
    fn set_label(&mut self, text: &str);

    /// Sets the indicator icon by symbolic name
    fn set_icon(&mut self, icon_name: &str);

    /// Clears the detail view and fills it with `entries`, in order
    fn replace_entries(&mut self, entries: Vec<DetailEntry>);

    /// Destroys the indicator and recreates it at `placement`
    fn reposition(&mut self, placement: Placement);
}

/// Everything a [`RecordingSink`] has received
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordedDisplay {
    /// Current label
    pub label: String,
    /// Current icon
    pub icon: String,
    /// Current detail entries
    pub entries: Vec<DetailEntry>,
    /// Every label set, oldest first
    pub labels: Vec<String>,
    /// Every placement the indicator was moved to
    pub placements: Vec<Placement>,
    /// Number of detail view rebuilds
    pub rebuilds: usize,
}

/// [`DisplaySink`] that records calls; clones share the same record
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<RecordedDisplay>>,
}

impl RecordingSink {
    /// Creates an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far
    #[must_use]
    pub fn snapshot(&self) -> RecordedDisplay {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn with<R>(&self, f: impl FnOnce(&mut RecordedDisplay) -> R) -> R {
        f(&mut self.inner.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl DisplaySink for RecordingSink {
    fn set_label(&mut self, text: &str) {
        self.with(|rec| {
            rec.label = text.to_string();
            rec.labels.push(text.to_string());
        });
    }

    fn set_icon(&mut self, icon_name: &str) {
        self.with(|rec| rec.icon = icon_name.to_string());
    }

    fn replace_entries(&mut self, entries: Vec<DetailEntry>) {
        self.with(|rec| {
            rec.entries = entries;
            rec.rebuilds += 1;
        });
    }

    fn reposition(&mut self, placement: Placement) {
        self.with(|rec| rec.placements.push(placement));
    }
}
