//! Frame ingestion sources.
//!
//! This module provides the sources the monitor can read from:
//! - Local camera devices by index (feature: ingest-v4l2)
//! - Local video files (feature: ingest-file-ffmpeg)
//! - Synthetic `stub://` sources (testing and demos)
//!
//! Every source yields RGB `Frame`s at the size the device or file delivers;
//! canonicalizing to the configured resolution is the frame loop's job.
//! A source reports end of stream as `Ok(None)` and device or decode failures
//! as `Err`. The loop stops on either and never retries.

pub mod camera;
pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
#[cfg(feature = "ingest-v4l2")]
mod normalize;
mod synthetic;

use std::fmt;

use anyhow::Result;

pub use camera::{CameraConfig, CameraSource};
pub use file::{FileConfig, FileSource};

use crate::error::MonitorError;
use crate::frame::Frame;

/// Where frames come from, as chosen at the startup prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceId {
    Device(u32),
    Path(String),
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Device(index) => write!(f, "camera {index}"),
            SourceId::Path(path) => f.write_str(path),
        }
    }
}

/// An opened frame source.
pub trait FrameSource {
    /// Read the next frame. `Ok(None)` means the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    fn stats(&self) -> SourceStats;

    /// Release the underlying device or file. Called once when the loop stops.
    fn release(&mut self) {}
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        (**self).next_frame()
    }

    fn stats(&self) -> SourceStats {
        (**self).stats()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// Statistics for a source.
#[derive(Clone, Debug)]
pub struct SourceStats {
    pub frames_captured: u64,
    pub origin: String,
}

/// Open and connect the source for `id`.
pub fn open_source(id: &SourceId) -> Result<Box<dyn FrameSource>, MonitorError> {
    let opened: Result<Box<dyn FrameSource>> = match id {
        SourceId::Device(index) => {
            CameraSource::open(CameraConfig::for_index(*index)).map(|s| Box::new(s) as _)
        }
        SourceId::Path(path) => {
            FileSource::open(FileConfig::new(path.clone())).map(|s| Box::new(s) as _)
        }
    };
    opened.map_err(|e| MonitorError::SourceOpen {
        source_id: id.to_string(),
        reason: format!("{e:#}"),
    })
}
