//! Overlay drawing.
//!
//! Boxes are always drawn. Text needs a TrueType font; without one the text
//! overlays are skipped and only the boxes appear.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::alert::{format_kinds, AlertKind};
use crate::density::FrameMetrics;
use crate::detect::DetectionSet;
use crate::frame::Frame;

const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const FPS_COLOR: Rgb<u8> = Rgb([0, 255, 255]);
const ALERT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const BOX_THICKNESS: i32 = 2;

/// Text line positions (top-left) and sizes.
const COUNT_LINE: (i32, i32, f32) = (10, 4, 22.0);
const RATIO_LINE: (i32, i32, f32) = (10, 30, 19.0);
const INFER_LINE: (i32, i32, f32) = (10, 56, 16.0);
const FPS_LINE: (i32, i32, f32) = (10, 78, 19.0);
const ALERT_LINE: (i32, i32, f32) = (10, 102, 26.0);

#[derive(Clone, Default)]
pub struct OverlayRenderer {
    font: Option<FontArc>,
}

impl OverlayRenderer {
    /// Renderer that draws boxes only.
    pub fn boxes_only() -> Self {
        Self { font: None }
    }

    pub fn with_font(font: FontArc) -> Self {
        Self { font: Some(font) }
    }

    pub fn from_font_file(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .with_context(|| format!("parsing font {}", path.display()))?;
        Ok(Self::with_font(font))
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    pub fn draw_detections(&self, frame: &mut Frame, detections: &DetectionSet) {
        let canvas = frame.image_mut();
        for bbox in detections {
            for inset in 0..BOX_THICKNESS {
                let w = bbox.w as i64 - 2 * inset as i64;
                let h = bbox.h as i64 - 2 * inset as i64;
                if w <= 0 || h <= 0 {
                    break;
                }
                let rect = Rect::at(bbox.x + inset, bbox.y + inset).of_size(w as u32, h as u32);
                draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
            }
        }
    }

    pub fn draw_metrics(&self, frame: &mut Frame, metrics: &FrameMetrics) {
        let canvas = frame.image_mut();
        self.text(canvas, COUNT_LINE, TEXT_COLOR, &format!("Count: {}", metrics.person_count));
        self.text(
            canvas,
            RATIO_LINE,
            TEXT_COLOR,
            &format!("OccRatio: {:.2}", metrics.occupied_ratio),
        );
        self.text(
            canvas,
            INFER_LINE,
            TEXT_COLOR,
            &format!("Infer: {:.0}ms", metrics.inference_latency_ms),
        );
    }

    pub fn draw_alert(&self, frame: &mut Frame, kinds: &[AlertKind]) {
        let line = format!("ALERT: {}", format_kinds(kinds));
        self.text(frame.image_mut(), ALERT_LINE, ALERT_COLOR, &line);
    }

    pub fn draw_fps(&self, frame: &mut Frame, frames: u32) {
        self.text(frame.image_mut(), FPS_LINE, FPS_COLOR, &format!("FPS: {frames}"));
    }

    fn text(&self, canvas: &mut RgbImage, (x, y, size): (i32, i32, f32), color: Rgb<u8>, line: &str) {
        if let Some(font) = &self.font {
            draw_text_mut(canvas, color, x, y, PxScale::from(size), font, line);
        }
    }
}
