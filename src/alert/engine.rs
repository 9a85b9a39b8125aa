use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use super::persist::{snapshot_path, AlertPersister};
use super::{format_kinds, AlertEvent, AlertKind};
use crate::config::AlertThresholds;
use crate::density::FrameMetrics;
use crate::error::MonitorError;
use crate::frame::Frame;

/// Threshold evaluation plus snapshot persistence.
///
/// Holds no per-frame history: every qualifying frame raises its own alert and
/// writes its own snapshot. Two alerts within the same second share a file
/// name, so the later snapshot replaces the earlier one.
pub struct AlertEngine<P> {
    thresholds: AlertThresholds,
    storage_dir: PathBuf,
    persister: P,
    raised: u64,
    failed_writes: u64,
}

impl<P: AlertPersister> AlertEngine<P> {
    pub fn new(thresholds: AlertThresholds, storage_dir: impl Into<PathBuf>, persister: P) -> Self {
        Self {
            thresholds,
            storage_dir: storage_dir.into(),
            persister,
            raised: 0,
            failed_writes: 0,
        }
    }

    /// Create the storage directory. Run once before the first frame.
    pub fn prepare_storage(&mut self) -> Result<()> {
        self.persister.prepare(&self.storage_dir)
    }

    /// Kinds triggered by these metrics. Each condition is checked on its own;
    /// both are inclusive (`>=`).
    pub fn evaluate(&self, metrics: &FrameMetrics) -> Vec<AlertKind> {
        let mut kinds = Vec::with_capacity(2);
        if metrics.person_count >= self.thresholds.person_count {
            kinds.push(AlertKind::HighPersonCount);
        }
        if metrics.occupied_ratio >= self.thresholds.occupied_ratio {
            kinds.push(AlertKind::HighDensity);
        }
        kinds
    }

    /// Raise an alert stamped with the current epoch second.
    pub fn raise(&mut self, kinds: Vec<AlertKind>, frame: &Frame) -> Result<Option<AlertEvent>> {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        Ok(self.raise_at(kinds, frame, timestamp))
    }

    /// Build the event and write exactly one snapshot for it. Nothing happens
    /// for an empty kind set.
    ///
    /// A failed write is logged and counted rather than returned: losing one
    /// snapshot must not stop monitoring.
    pub fn raise_at(
        &mut self,
        kinds: Vec<AlertKind>,
        frame: &Frame,
        timestamp: u64,
    ) -> Option<AlertEvent> {
        if kinds.is_empty() {
            return None;
        }
        let path = snapshot_path(&self.storage_dir, timestamp);
        let persisted = match self.persister.persist(frame, &path) {
            Ok(()) => {
                log::warn!("ALERT saved: {} [{}]", path.display(), format_kinds(&kinds));
                true
            }
            Err(e) => {
                self.failed_writes += 1;
                let err = MonitorError::Persistence {
                    path: path.clone(),
                    reason: format!("{e:#}"),
                };
                log::error!("ALERT [{}] not saved: {}", format_kinds(&kinds), err);
                false
            }
        };
        self.raised += 1;
        Some(AlertEvent {
            kinds,
            timestamp,
            snapshot_path: path,
            persisted,
        })
    }

    /// Alerts raised so far, including ones whose snapshot failed.
    pub fn raised(&self) -> u64 {
        self.raised
    }

    pub fn failed_writes(&self) -> u64 {
        self.failed_writes
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn persister(&self) -> &P {
        &self.persister
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[derive(Default)]
    struct Recorder {
        writes: Vec<PathBuf>,
        fail: bool,
    }

    impl AlertPersister for Recorder {
        fn prepare(&mut self, _dir: &Path) -> Result<()> {
            Ok(())
        }

        fn persist(&mut self, _frame: &Frame, path: &Path) -> Result<()> {
            if self.fail {
                return Err(anyhow!("disk full"));
            }
            self.writes.push(path.to_path_buf());
            Ok(())
        }
    }

    fn engine(fail: bool) -> AlertEngine<Recorder> {
        AlertEngine::new(
            AlertThresholds::default(),
            "alerts",
            Recorder {
                fail,
                ..Recorder::default()
            },
        )
    }

    fn metrics(person_count: usize, occupied_ratio: f64) -> FrameMetrics {
        FrameMetrics {
            person_count,
            occupied_ratio,
            inference_latency_ms: 0.0,
        }
    }

    #[test]
    fn count_at_threshold_only() {
        assert_eq!(
            engine(false).evaluate(&metrics(6, 0.0)),
            vec![AlertKind::HighPersonCount]
        );
    }

    #[test]
    fn ratio_at_threshold_only() {
        assert_eq!(
            engine(false).evaluate(&metrics(0, 0.20)),
            vec![AlertKind::HighDensity]
        );
    }

    #[test]
    fn below_both_thresholds() {
        assert!(engine(false).evaluate(&metrics(5, 0.199)).is_empty());
    }

    #[test]
    fn both_kinds_share_one_snapshot() {
        let mut engine = engine(false);
        let kinds = engine.evaluate(&metrics(7, 0.2279));
        let frame = Frame::filled(4, 4, [0, 0, 0]);
        let event = engine.raise_at(kinds, &frame, 1_700_000_000).unwrap();

        assert_eq!(
            event.kinds,
            vec![AlertKind::HighPersonCount, AlertKind::HighDensity]
        );
        assert_eq!(event.snapshot_path, PathBuf::from("alerts/alert_1700000000.jpg"));
        assert!(event.persisted);
        assert_eq!(engine.persister().writes, vec![event.snapshot_path.clone()]);
        assert_eq!(format_kinds(&event.kinds), "HIGH_PERSON_COUNT,HIGH_DENSITY");
    }

    #[test]
    fn empty_kinds_write_nothing() {
        let mut engine = engine(false);
        let frame = Frame::filled(4, 4, [0, 0, 0]);
        assert!(engine.raise_at(Vec::new(), &frame, 1).is_none());
        assert!(engine.persister().writes.is_empty());
        assert_eq!(engine.raised(), 0);
    }

    #[test]
    fn every_qualifying_frame_alerts() {
        let mut engine = engine(false);
        let frame = Frame::filled(4, 4, [0, 0, 0]);
        for ts in [10, 10, 11] {
            let kinds = engine.evaluate(&metrics(9, 0.0));
            assert!(engine.raise_at(kinds, &frame, ts).is_some());
        }
        assert_eq!(engine.raised(), 3);
        assert_eq!(engine.persister().writes.len(), 3);
    }

    #[test]
    fn failed_write_is_counted_not_returned() {
        let mut engine = engine(true);
        let frame = Frame::filled(4, 4, [0, 0, 0]);
        let event = engine
            .raise_at(vec![AlertKind::HighDensity], &frame, 5)
            .unwrap();
        assert!(!event.persisted);
        assert_eq!(engine.failed_writes(), 1);
        assert_eq!(engine.raised(), 1);
    }
}
