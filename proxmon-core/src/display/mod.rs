//! Projection of display states onto a display surface
//!
//! The display surface (a panel indicator, a terminal, a test recorder) is
//! reached only through [`DisplaySink`]. [`DisplayProjector`] translates a
//! [`DisplayState`](crate::monitoring::DisplayState) into label, icon and an
//! ordered list of detail entries, always replacing the previous entries
//! wholesale.

mod projector;
mod sink;

pub use projector::{DisplayProjector, RenderedView};
pub use sink::{DetailEntry, DisplaySink, RecordedDisplay, RecordingSink};

/// Label shown before the first poll completes
pub const LOADING_LABEL: &str = "Loading...";

/// Icon for every unavailable state
pub const FAILURE_ICON: &str = "computer-fail-symbolic";

/// Icon shown before the first poll completes
pub const IDLE_ICON: &str = "computer-symbolic";

/// Detail entry for offline / no-data states
pub const NO_DATA_ENTRY: &str = "No server data available";

/// Detail entry when the filtered drive list is empty
pub const NO_HDD_ENTRY: &str = "  No HDD data available";

/// Section header above the drive lines
pub const HDD_SECTION_HEADER: &str = "HDD Temperatures:";
