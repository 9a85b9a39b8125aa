use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::ImageFormat;

use crate::frame::Frame;

/// Alert snapshot sink.
pub trait AlertPersister {
    /// Create the storage directory if absent. Called once at startup.
    fn prepare(&mut self, dir: &Path) -> Result<()>;

    /// Write the annotated frame to `path`, replacing any existing file.
    fn persist(&mut self, frame: &Frame, path: &Path) -> Result<()>;
}

/// `{dir}/alert_{timestamp}.jpg`
pub fn snapshot_path(dir: &Path, timestamp: u64) -> PathBuf {
    dir.join(format!("alert_{timestamp}.jpg"))
}

/// Writes snapshots as JPEG files on the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct JpegPersister;

impl AlertPersister for JpegPersister {
    fn prepare(&mut self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating alert storage directory {}", dir.display()))
    }

    fn persist(&mut self, frame: &Frame, path: &Path) -> Result<()> {
        frame
            .image()
            .save_with_format(path, ImageFormat::Jpeg)
            .with_context(|| format!("writing alert snapshot {}", path.display()))
    }
}
