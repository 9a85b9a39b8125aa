//! Camera frame source.
//!
//! This module provides `CameraSource` for reading frames from a local camera,
//! addressed by device index (index N is `/dev/videoN`).
//!
//! The camera source is responsible for:
//! - Opening the device and negotiating a capture format
//! - Capturing frames in-memory through mmap buffers
//! - Converting RGB24, NV12, YUYV or MJPEG captures to RGB
//!
//! `stub://` device paths produce an endless synthetic feed instead.

use anyhow::Result;
#[cfg(feature = "ingest-v4l2")]
use anyhow::{anyhow, Context};
#[cfg(feature = "ingest-v4l2")]
use ouroboros::self_referencing;

#[cfg(feature = "ingest-v4l2")]
use super::normalize::{normalize_to_rgb, PixelFormat};
use super::synthetic::SyntheticFrames;
use super::{FrameSource, SourceStats};
use crate::frame::Frame;

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0").
    pub device: String,
    /// Target frame rate requested from the driver.
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl CameraConfig {
    pub fn for_index(index: u32) -> Self {
        Self {
            device: format!("/dev/video{index}"),
            ..Self::default()
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            target_fps: 30,
            width: 640,
            height: 480,
        }
    }
}

/// Camera frame source.
///
/// Uses V4L2 for real devices, with a synthetic fallback for `stub://` paths.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCameraSource),
    #[cfg(feature = "ingest-v4l2")]
    Device(DeviceCameraSource),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        if config.device.starts_with("stub://") {
            return Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCameraSource::new(config)),
            });
        }
        #[cfg(feature = "ingest-v4l2")]
        {
            Ok(Self {
                backend: CameraBackend::Device(DeviceCameraSource::new(config)),
            })
        }
        #[cfg(not(feature = "ingest-v4l2"))]
        {
            Err(anyhow::anyhow!(
                "camera capture from {} requires the ingest-v4l2 feature",
                config.device
            ))
        }
    }

    /// Create and connect in one step.
    pub fn open(config: CameraConfig) -> Result<Self> {
        let mut source = Self::new(config)?;
        source.connect()?;
        Ok(source)
    }

    /// Connect to the camera device.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.connect(),
        }
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => Ok(source.next_frame()),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.next_frame().map(Some),
        }
    }

    fn stats(&self) -> SourceStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.stats(),
        }
    }

    fn release(&mut self) {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => {
                log::info!("CameraSource: released {} (synthetic)", source.config.device)
            }
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.release(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests
// ----------------------------------------------------------------------------

struct SyntheticCameraSource {
    config: CameraConfig,
    frames: SyntheticFrames,
}

impl SyntheticCameraSource {
    fn new(config: CameraConfig) -> Self {
        Self {
            frames: SyntheticFrames::new(config.width, config.height, None),
            config,
        }
    }

    /// Synthetic sources are always "connected".
    fn connect(&mut self) -> Result<()> {
        log::info!("CameraSource: connected to {} (synthetic)", self.config.device);
        Ok(())
    }

    fn next_frame(&mut self) -> Option<Frame> {
        self.frames.next_frame()
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frames.frames_generated(),
            origin: self.config.device.clone(),
        }
    }
}

// ----------------------------------------------------------------------------
// V4L2 device source
// ----------------------------------------------------------------------------

#[cfg(feature = "ingest-v4l2")]
struct DeviceCameraSource {
    config: CameraConfig,
    state: Option<DeviceCameraState>,
    frame_count: u64,
    active_width: u32,
    active_height: u32,
    active_format: PixelFormat,
}

#[cfg(feature = "ingest-v4l2")]
#[self_referencing]
struct DeviceCameraState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

#[cfg(feature = "ingest-v4l2")]
impl DeviceCameraSource {
    fn new(config: CameraConfig) -> Self {
        Self {
            active_width: config.width,
            active_height: config.height,
            active_format: PixelFormat::Rgb24,
            config,
            state: None,
            frame_count: 0,
        }
    }

    fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open camera device {}", self.config.device))?;
        let mut format = device.format().context("read camera format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "CameraSource: failed to set RGB format on {}: {}",
                    self.config.device,
                    err
                );
                device
                    .format()
                    .context("read camera format after set failure")?
            }
        };
        let fourcc = format.fourcc.repr;
        self.active_format = PixelFormat::from_fourcc(&fourcc).ok_or_else(|| {
            anyhow!(
                "camera {} delivers unsupported pixel format {}",
                self.config.device,
                String::from_utf8_lossy(&fourcc)
            )
        })?;

        if self.config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "CameraSource: failed to set fps on {}: {}",
                    self.config.device,
                    err
                );
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;

        let state = DeviceCameraStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create camera buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        log::info!(
            "CameraSource: connected to {} ({}x{}, {:?})",
            self.config.device,
            self.active_width,
            self.active_height,
            self.active_format
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("camera device not connected")?;
        let (width, height, format) = (self.active_width, self.active_height, self.active_format);
        let (pixels, width, height) = state.with_mut(|fields| -> Result<_> {
            let (buf, meta) = fields.stream.next().context("capture camera frame")?;
            let used = (meta.bytesused as usize).min(buf.len());
            let used = if used == 0 { buf.len() } else { used };
            normalize_to_rgb(&buf[..used], width, height, format)
        })?;

        self.frame_count += 1;
        Frame::from_rgb(width, height, pixels)
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.frame_count,
            origin: self.config.device.clone(),
        }
    }

    fn release(&mut self) {
        self.state = None;
        log::info!(
            "CameraSource: released {} after {} frames",
            self.config.device,
            self.frame_count
        );
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
