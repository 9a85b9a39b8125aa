use std::path::PathBuf;

use crate::error::MonitorError;

const DEFAULT_PERSON_COUNT_THRESHOLD: usize = 6;
const DEFAULT_OCCUPIED_RATIO_THRESHOLD: f64 = 0.20;
const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;
const DEFAULT_CANONICAL_WIDTH: u32 = 640;
const DEFAULT_CANONICAL_HEIGHT: u32 = 480;
const DEFAULT_ALERT_STORAGE_DIR: &str = "alerts";

/// Process-wide settings, read-only once the monitor starts.
///
/// There is no file or environment layer: every field starts from its
/// compile-time default.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub thresholds: AlertThresholds,
    /// Detections must score strictly above this to be counted.
    pub confidence_threshold: f64,
    /// Every frame is resized to this resolution before detection.
    pub canonical_width: u32,
    pub canonical_height: u32,
    pub alert_storage_dir: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    pub person_count: usize,
    pub occupied_ratio: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            person_count: DEFAULT_PERSON_COUNT_THRESHOLD,
            occupied_ratio: DEFAULT_OCCUPIED_RATIO_THRESHOLD,
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            thresholds: AlertThresholds::default(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            canonical_width: DEFAULT_CANONICAL_WIDTH,
            canonical_height: DEFAULT_CANONICAL_HEIGHT,
            alert_storage_dir: PathBuf::from(DEFAULT_ALERT_STORAGE_DIR),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), MonitorError> {
        let ratio = self.thresholds.occupied_ratio;
        if !ratio.is_finite() || ratio < 0.0 {
            return Err(MonitorError::Config(format!(
                "occupied ratio threshold must be a non-negative number, got {ratio}"
            )));
        }
        if !self.confidence_threshold.is_finite() {
            return Err(MonitorError::Config(
                "confidence threshold must be finite".to_string(),
            ));
        }
        if self.canonical_width == 0 || self.canonical_height == 0 {
            return Err(MonitorError::Config(format!(
                "canonical resolution must be positive, got {}x{}",
                self.canonical_width, self.canonical_height
            )));
        }
        if self.alert_storage_dir.as_os_str().is_empty() {
            return Err(MonitorError::Config(
                "alert storage directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
