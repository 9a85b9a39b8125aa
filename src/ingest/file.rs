//! Local file frame source.
//!
//! This module provides `FileSource` for reading frames from local video files.
//! The file source is responsible for:
//! - Reading frames from a local video file (no network access)
//! - Decoding video frames in-memory to RGB
//! - Reporting end of file as end of stream
//!
//! `stub://name?frames=N` paths produce a finite synthetic clip instead, so the
//! whole pipeline can run without a decoder.

use anyhow::{anyhow, Result};

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use super::synthetic::SyntheticFrames;
use super::{FrameSource, SourceStats};
use crate::frame::Frame;

const STUB_SCHEME: &str = "stub://";
const DEFAULT_STUB_FRAMES: u64 = 300;
const STUB_WIDTH: u32 = 640;
const STUB_HEIGHT: u32 = 480;

/// Configuration for a local file source.
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Local file path (e.g., "videos/crowd.mp4").
    pub path: String,
}

impl FileConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Local file frame source.
///
/// `release` drops the decoder and closes the file; the source then reports
/// end of stream and keeps its final stats.
pub struct FileSource {
    path: String,
    backend: Option<FileBackend>,
    frames_at_release: u64,
}

enum FileBackend {
    Synthetic(SyntheticFileSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileBackend {
    fn connect(&mut self) -> Result<()> {
        match self {
            FileBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.connect(),
        }
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match self {
            FileBackend::Synthetic(source) => Ok(source.next_frame()),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.next_frame(),
        }
    }

    fn stats(&self) -> SourceStats {
        match self {
            FileBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.stats(),
        }
    }
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "file ingestion only supports local paths (no URL schemes)"
            ));
        }
        let path = config.path.clone();
        let backend = if config.path.starts_with(STUB_SCHEME) {
            FileBackend::Synthetic(SyntheticFileSource::new(config)?)
        } else {
            #[cfg(feature = "ingest-file-ffmpeg")]
            {
                FileBackend::Ffmpeg(FfmpegFileSource::new(config)?)
            }
            #[cfg(not(feature = "ingest-file-ffmpeg"))]
            {
                return Err(anyhow!(
                    "file ingestion requires the ingest-file-ffmpeg feature"
                ));
            }
        };
        Ok(Self {
            path,
            backend: Some(backend),
            frames_at_release: 0,
        })
    }

    /// Create and connect in one step.
    pub fn open(config: FileConfig) -> Result<Self> {
        let mut source = Self::new(config)?;
        source.connect()?;
        Ok(source)
    }

    /// Connect to the file source.
    pub fn connect(&mut self) -> Result<()> {
        self.backend
            .as_mut()
            .ok_or_else(|| anyhow!("file source {} already released", self.path))?
            .connect()
    }

    pub fn is_released(&self) -> bool {
        self.backend.is_none()
    }
}

impl FrameSource for FileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            Some(backend) => backend.next_frame(),
            None => Ok(None),
        }
    }

    fn stats(&self) -> SourceStats {
        match &self.backend {
            Some(backend) => backend.stats(),
            None => SourceStats {
                frames_captured: self.frames_at_release,
                origin: self.path.clone(),
            },
        }
    }

    fn release(&mut self) {
        let Some(backend) = self.backend.take() else {
            return;
        };
        self.frames_at_release = backend.stats().frames_captured;
        drop(backend);
        log::info!(
            "FileSource: released {} after {} frames",
            self.path,
            self.frames_at_release
        );
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests
// ----------------------------------------------------------------------------

struct SyntheticFileSource {
    config: FileConfig,
    frames: SyntheticFrames,
}

impl SyntheticFileSource {
    fn new(config: FileConfig) -> Result<Self> {
        let limit = stub_frame_limit(&config.path)?;
        Ok(Self {
            frames: SyntheticFrames::new(STUB_WIDTH, STUB_HEIGHT, Some(limit)),
            config,
        })
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("FileSource: connected to {} (synthetic)", self.config.path);
        Ok(())
    }

    fn next_frame(&mut self) -> Option<Frame> {
        self.frames.next_frame()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames.frames_generated(),
            origin: self.config.path.clone(),
        }
    }
}

/// Clip length from a `stub://name?frames=N` path.
fn stub_frame_limit(path: &str) -> Result<u64> {
    let Some((_, query)) = path.split_once('?') else {
        return Ok(DEFAULT_STUB_FRAMES);
    };
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix("frames=") {
            return value
                .parse()
                .map_err(|_| anyhow!("invalid stub frame count '{}'", value));
        }
    }
    Ok(DEFAULT_STUB_FRAMES)
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with(STUB_SCHEME) {
        return true;
    }
    !path.contains("://")
}
