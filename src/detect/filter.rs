use crate::detect::result::{DetectionSet, ScoredBox};

/// Drops detections at or below the confidence threshold.
#[derive(Clone, Copy, Debug)]
pub struct DetectionFilter {
    threshold: f64,
}

impl DetectionFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Keep boxes whose confidence is strictly greater than the threshold,
    /// preserving detector order.
    pub fn apply(&self, candidates: &[ScoredBox]) -> DetectionSet {
        DetectionSet::from_boxes(
            candidates
                .iter()
                .filter(|candidate| candidate.confidence > self.threshold)
                .map(|candidate| candidate.bbox)
                .collect(),
        )
    }
}
