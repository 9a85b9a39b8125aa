//! Threshold alerts and snapshot persistence.

mod engine;
mod persist;

use std::fmt;
use std::path::PathBuf;

pub use engine::AlertEngine;
pub use persist::{snapshot_path, AlertPersister, JpegPersister};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlertKind {
    HighPersonCount,
    HighDensity,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertKind::HighPersonCount => "HIGH_PERSON_COUNT",
            AlertKind::HighDensity => "HIGH_DENSITY",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One alert, raised for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertEvent {
    /// Never empty. `HighPersonCount` comes first when both trigger.
    pub kinds: Vec<AlertKind>,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub snapshot_path: PathBuf,
    /// False when the snapshot write failed.
    pub persisted: bool,
}

/// Comma-joined kind names, e.g. `HIGH_PERSON_COUNT,HIGH_DENSITY`.
pub fn format_kinds(kinds: &[AlertKind]) -> String {
    kinds
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
