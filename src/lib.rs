//! Crowd Monitor
//!
//! Real-time person counting and crowd density alerting over a camera or
//! video file.
//!
//! # Pipeline
//!
//! Every frame flows one way through the same stages:
//!
//! 1. `ingest`: read a frame, resize to the canonical resolution.
//! 2. `detect`: run the person detector, drop low-confidence boxes.
//! 3. `density`: person count and occupied-area ratio.
//! 4. `alert`: threshold checks; qualifying frames are saved as JPEG snapshots.
//! 5. `fps`, `render`, `display`: overlays, frame rate, key input.
//!
//! `monitor::FrameLoop` owns all of it and drives the RUNNING / PAUSED /
//! STOPPED state machine on a single thread.

pub mod alert;
pub mod config;
pub mod density;
pub mod detect;
pub mod display;
pub mod error;
pub mod fps;
pub mod frame;
pub mod ingest;
pub mod monitor;
pub mod prompt;
pub mod render;

pub use alert::{AlertEngine, AlertEvent, AlertKind, AlertPersister, JpegPersister};
pub use config::{AlertThresholds, MonitorConfig};
pub use density::{occupied_ratio, FrameMetrics};
pub use detect::{
    BoundingBox, DetectionFilter, DetectionSet, PersonDetector, ScoredBox, ScriptedDetector,
    SyntheticCrowdDetector,
};
pub use display::{Display, TerminalDisplay};
pub use error::MonitorError;
pub use fps::{FpsMeter, FpsReading};
pub use frame::Frame;
pub use ingest::{open_source, FrameSource, SourceId, SourceStats};
pub use monitor::{FrameLoop, FrameReport, LoopState, RunSummary, StopReason};
pub use render::OverlayRenderer;
