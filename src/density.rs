//! Per-frame crowd metrics.
//!
//! The occupied-area ratio is a density proxy: the summed pixel area of every
//! accepted box over the frame area. Overlap is not subtracted, so crowded
//! scenes can legitimately report a ratio above 1.0.

use crate::detect::{BoundingBox, DetectionSet};

/// Metrics derived from one frame's accepted detections.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameMetrics {
    pub person_count: usize,
    pub occupied_ratio: f64,
    /// Wall-clock duration of the detector call only.
    pub inference_latency_ms: f64,
}

impl FrameMetrics {
    pub fn measure(
        detections: &DetectionSet,
        frame_width: u32,
        frame_height: u32,
        inference_latency_ms: f64,
    ) -> Self {
        Self {
            person_count: detections.len(),
            occupied_ratio: occupied_ratio(detections.boxes(), frame_width, frame_height),
            inference_latency_ms,
        }
    }
}

/// `Σ w·h / (width · height)`. Returns exactly 0.0 for no boxes.
///
/// Frame dimensions must be positive; the frame loop only calls this with
/// canonical dimensions, which config validation guarantees.
pub fn occupied_ratio(boxes: &[BoundingBox], frame_width: u32, frame_height: u32) -> f64 {
    if boxes.is_empty() {
        return 0.0;
    }
    let occupied: u64 = boxes.iter().map(BoundingBox::area).sum();
    let frame_area = u64::from(frame_width) * u64::from(frame_height);
    occupied as f64 / frame_area as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_is_zero() {
        let metrics = FrameMetrics::measure(&DetectionSet::default(), 640, 480, 3.0);
        assert_eq!(metrics.person_count, 0);
        assert_eq!(metrics.occupied_ratio, 0.0);
    }

    #[test]
    fn two_halves_fill_the_frame() {
        let boxes = [
            BoundingBox::new(0, 0, 320, 480),
            BoundingBox::new(320, 0, 320, 480),
        ];
        assert_eq!(occupied_ratio(&boxes, 640, 480), 1.0);
    }

    #[test]
    fn overlap_is_not_corrected() {
        let boxes = [
            BoundingBox::new(0, 0, 640, 480),
            BoundingBox::new(0, 0, 640, 480),
        ];
        assert_eq!(occupied_ratio(&boxes, 640, 480), 2.0);
    }

    #[test]
    fn seven_people_in_vga() {
        let boxes: Vec<BoundingBox> = (0..7)
            .map(|i| BoundingBox::new(i * 100, 0, 100, 100))
            .collect();
        let set = DetectionSet::from_boxes(boxes);
        let metrics = FrameMetrics::measure(&set, 640, 480, 0.0);
        assert_eq!(metrics.person_count, 7);
        assert!((metrics.occupied_ratio - 70_000.0 / 307_200.0).abs() < 1e-12);
        assert!(metrics.occupied_ratio > 0.2279 && metrics.occupied_ratio < 0.2280);
    }
}
