use std::path::PathBuf;

use thiserror::Error;

/// Failure taxonomy for a monitoring session.
///
/// Pause and quit are loop state transitions and never appear here.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The frame source could not be opened. The loop never starts.
    #[error("cannot open frame source {source_id}: {reason}")]
    SourceOpen { source_id: String, reason: String },

    /// A frame read failed. Fatal to the loop, which shuts down gracefully.
    #[error("cannot read frame from {source_id}: {reason}")]
    FrameRead { source_id: String, reason: String },

    /// Startup mode input was neither `w` nor `v`.
    #[error("invalid mode selection '{0}'")]
    InvalidMode(String),

    /// An alert snapshot could not be written. Logged; monitoring continues.
    #[error("failed to persist alert snapshot {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}
