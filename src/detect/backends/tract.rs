#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use tract_onnx::prelude::*;

use crate::detect::backend::PersonDetector;
use crate::detect::result::{BoundingBox, ScoredBox};
use crate::frame::Frame;

/// COCO class index for "person".
const PERSON_CLASS: usize = 0;
/// Candidates below this score are dropped before NMS to keep it cheap.
const DEFAULT_CANDIDATE_FLOOR: f32 = 0.1;
const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// Tract-based backend for YOLOv8-style ONNX person detection.
///
/// Expects a single `[1, 3, S, S]` float input and a `[1, 4 + classes, N]`
/// output (cx, cy, w, h in input pixels followed by class scores). Only the
/// person score is used; the score is reported as the box confidence.
pub struct TractDetector {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_size: u32,
    candidate_floor: f32,
    iou_threshold: f32,
}

impl TractDetector {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            candidate_floor: DEFAULT_CANDIDATE_FLOOR,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        })
    }

    /// Override the NMS overlap threshold.
    pub fn with_iou_threshold(mut self, iou: f32) -> Self {
        self.iou_threshold = iou;
        self
    }

    fn build_input(&self, frame: &Frame) -> Tensor {
        let side = self.input_size;
        let resized = imageops::resize(frame.image(), side, side, FilterType::Triangle);
        let side = side as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
            resized.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        });
        input.into_tensor()
    }

    fn decode(&self, outputs: TVec<TValue>, frame: &Frame) -> Result<Vec<ScoredBox>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("model output is not [1, channels, anchors]")?;
        let channels = view.shape()[1];
        if channels <= 4 + PERSON_CLASS {
            return Err(anyhow!("model output has only {} channels", channels));
        }

        let sx = frame.width() as f32 / self.input_size as f32;
        let sy = frame.height() as f32 / self.input_size as f32;
        let mut candidates = Vec::new();
        for anchor in 0..view.shape()[2] {
            let score = view[[0, 4 + PERSON_CLASS, anchor]];
            if score < self.candidate_floor {
                continue;
            }
            let (cx, cy) = (view[[0, 0, anchor]] * sx, view[[0, 1, anchor]] * sy);
            let (w, h) = (view[[0, 2, anchor]] * sx, view[[0, 3, anchor]] * sy);
            candidates.push(Candidate {
                x1: (cx - w / 2.0).max(0.0),
                y1: (cy - h / 2.0).max(0.0),
                x2: (cx + w / 2.0).min(frame.width() as f32),
                y2: (cy + h / 2.0).min(frame.height() as f32),
                score,
            });
        }

        Ok(nms(candidates, self.iou_threshold)
            .into_iter()
            .filter_map(Candidate::into_scored)
            .collect())
    }
}

impl PersonDetector for TractDetector {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<ScoredBox>> {
        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.decode(outputs, frame)
    }

    fn warm_up(&mut self) -> Result<()> {
        let blank = Frame::filled(self.input_size, self.input_size, [0, 0, 0]);
        self.detect(&blank).map(|_| ())
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    score: f32,
}

impl Candidate {
    fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    fn iou(&self, other: &Candidate) -> f32 {
        let w = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let h = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        let inter = w * h;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Degenerate boxes (zero width or height after clipping) are dropped.
    fn into_scored(self) -> Option<ScoredBox> {
        let w = (self.x2 - self.x1).round() as i64;
        let h = (self.y2 - self.y1).round() as i64;
        if w <= 0 || h <= 0 {
            return None;
        }
        Some(ScoredBox::new(
            BoundingBox::new(self.x1.round() as i32, self.y1.round() as i32, w as u32, h as u32),
            f64::from(self.score),
        ))
    }
}

/// Greedy NMS: highest score first, suppress anything overlapping a kept box.
fn nms(mut candidates: Vec<Candidate>, iou_threshold: f32) -> Vec<Candidate> {
    candidates.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}
