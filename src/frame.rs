//! Decoded video frames.
//!
//! A `Frame` owns one RGB8 image. Sources produce frames at whatever size the
//! device or file delivers; the frame loop canonicalizes them to the configured
//! resolution before anything else touches the pixels. Overlays are drawn onto
//! the frame in place, so the same buffer is what gets shown and what gets
//! persisted as an alert snapshot.

use anyhow::{anyhow, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;

pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Wrap tightly packed RGB24 bytes.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                pixels.len()
            ));
        }
        RgbImage::from_raw(width, height, pixels)
            .map(Self::new)
            .ok_or_else(|| anyhow!("invalid {}x{} RGB buffer", width, height))
    }

    /// Solid-colour frame, mostly useful for tests.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        Self::new(RgbImage::from_pixel(width, height, image::Rgb(rgb)))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Resize to the canonical resolution. Frames already at that size pass
    /// through untouched.
    pub fn canonicalize(self, width: u32, height: u32) -> Self {
        if self.width() == width && self.height() == height {
            return self;
        }
        Self::new(imageops::resize(
            &self.image,
            width,
            height,
            FilterType::Triangle,
        ))
    }
}
