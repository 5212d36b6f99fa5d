//! Where the locator found a transaction

use serde::{Deserialize, Serialize};

use crate::bpm::BpmFinding;
use crate::markers::StatusMarkers;

/// Surfaces searched, in lookup order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Live,
    History,
    SanctionsBypass,
    Bpm,
}

impl Surface {
    pub const LOOKUP_ORDER: [Surface; 4] = [
        Surface::Live,
        Surface::History,
        Surface::SanctionsBypass,
        Surface::Bpm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Live => "live",
            Surface::History => "history",
            Surface::SanctionsBypass => "sanctions_bypass",
            Surface::Bpm => "bpm",
        }
    }
}

/// Position of the selected row in the live result table (0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowHandle {
    pub index: usize,
}

/// A live-surface hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveMatch {
    /// Number of rows the data filter returned
    pub row_count: usize,
    /// Row chosen for disposition
    pub selected: RowHandle,
    /// Markers read from the selected row
    pub markers: StatusMarkers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "surface", rename_all = "snake_case")]
pub enum LocationResult {
    FoundInLive(LiveMatch),
    FoundInHistory,
    FoundInSanctionsBypass,
    FoundInBpm(BpmFinding),
    NotFoundAnywhere,
}

impl LocationResult {
    pub fn surface(&self) -> Option<Surface> {
        match self {
            LocationResult::FoundInLive(_) => Some(Surface::Live),
            LocationResult::FoundInHistory => Some(Surface::History),
            LocationResult::FoundInSanctionsBypass => Some(Surface::SanctionsBypass),
            LocationResult::FoundInBpm(_) => Some(Surface::Bpm),
            LocationResult::NotFoundAnywhere => None,
        }
    }
}
