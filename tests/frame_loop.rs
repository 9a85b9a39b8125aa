use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};

use crowd_monitor::{
    AlertEngine, AlertKind, AlertPersister, BoundingBox, Display, Frame, FrameLoop, FrameSource,
    JpegPersister, LoopState, MonitorConfig, OverlayRenderer, PersonDetector, ScoredBox,
    ScriptedDetector, SourceStats, StopReason,
};

/// Finite clip of solid frames, optionally failing at one index.
struct Clip {
    frames: u64,
    read: u64,
    fail_at: Option<u64>,
    size: (u32, u32),
    releases: u32,
}

impl Clip {
    fn new(frames: u64) -> Self {
        Self {
            frames,
            read: 0,
            fail_at: None,
            size: (320, 240),
            releases: 0,
        }
    }

    fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }
}

impl FrameSource for Clip {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.fail_at == Some(self.read) {
            return Err(anyhow!("decoder gave up"));
        }
        if self.read == self.frames {
            return Ok(None);
        }
        self.read += 1;
        Ok(Some(Frame::filled(self.size.0, self.size.1, [40, 40, 40])))
    }

    fn stats(&self) -> SourceStats {
        SourceStats {
            frames_captured: self.read,
            origin: "clip".to_string(),
        }
    }

    fn release(&mut self) {
        self.releases += 1;
    }
}

/// Display that replays scripted keys and records what it was shown.
#[derive(Default)]
struct Keys {
    polls: VecDeque<Option<char>>,
    waits: VecDeque<char>,
    shown: Vec<(u32, u32)>,
    wait_calls: u32,
    closes: u32,
}

impl Keys {
    fn polls(polls: impl IntoIterator<Item = Option<char>>) -> Self {
        Self {
            polls: polls.into_iter().collect(),
            ..Self::default()
        }
    }
}

impl Display for Keys {
    fn show(&mut self, frame: &Frame) -> Result<()> {
        self.shown.push((frame.width(), frame.height()));
        Ok(())
    }

    fn poll_key(&mut self, _timeout: Duration) -> Result<Option<char>> {
        Ok(self.polls.pop_front().flatten())
    }

    fn wait_key(&mut self) -> Result<char> {
        self.wait_calls += 1;
        self.waits
            .pop_front()
            .ok_or_else(|| anyhow!("no key scripted"))
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

struct BrokenDisk;

impl AlertPersister for BrokenDisk {
    fn prepare(&mut self, _dir: &Path) -> Result<()> {
        Ok(())
    }

    fn persist(&mut self, _frame: &Frame, path: &Path) -> Result<()> {
        Err(anyhow!("no space left writing {}", path.display()))
    }
}

fn crowd(people: usize) -> Vec<ScoredBox> {
    (0..people)
        .map(|i| {
            let x = (i as i32 % 6) * 105;
            let y = (i as i32 / 6) * 105;
            ScoredBox::new(BoundingBox::new(x, y, 100, 100), 0.9)
        })
        .collect()
}

fn config_in(dir: &Path) -> MonitorConfig {
    MonitorConfig {
        alert_storage_dir: dir.join("alerts"),
        ..MonitorConfig::default()
    }
}

fn jpeg_alerts(cfg: &MonitorConfig) -> Result<AlertEngine<JpegPersister>> {
    let mut alerts = AlertEngine::new(cfg.thresholds, &cfg.alert_storage_dir, JpegPersister);
    alerts.prepare_storage()?;
    Ok(alerts)
}

fn snapshots(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        files.push(entry?.path());
    }
    files.sort();
    Ok(files)
}

#[test]
fn empty_scene_raises_nothing() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_in(tmp.path());
    let mut monitor = FrameLoop::new(
        &cfg,
        Clip::new(3),
        ScriptedDetector::default(),
        Keys::default(),
        jpeg_alerts(&cfg)?,
        OverlayRenderer::boxes_only(),
    );

    let summary = monitor.run()?;
    assert_eq!(summary.frames_processed, 3);
    assert_eq!(summary.alerts_raised, 0);
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);

    let report = monitor.last_report().expect("a processed frame");
    assert_eq!(report.metrics.person_count, 0);
    assert_eq!(report.metrics.occupied_ratio, 0.0);
    assert!(report.alert.is_none());
    assert!(snapshots(&cfg.alert_storage_dir)?.is_empty());
    Ok(())
}

#[test]
fn crowded_frame_saves_one_snapshot_with_both_kinds() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_in(tmp.path());
    let mut monitor = FrameLoop::new(
        &cfg,
        Clip::new(1),
        ScriptedDetector::new(vec![crowd(7)]),
        Keys::default(),
        jpeg_alerts(&cfg)?,
        OverlayRenderer::boxes_only(),
    );

    assert_eq!(monitor.step()?, LoopState::Running);
    let report = monitor.last_report().expect("a processed frame").clone();
    assert_eq!(report.metrics.person_count, 7);
    assert!((report.metrics.occupied_ratio - 70_000.0 / 307_200.0).abs() < 1e-9);

    let alert = report.alert.expect("alert raised");
    assert_eq!(
        alert.kinds,
        vec![AlertKind::HighPersonCount, AlertKind::HighDensity]
    );
    assert!(alert.persisted);
    assert_eq!(
        alert.snapshot_path,
        cfg.alert_storage_dir
            .join(format!("alert_{}.jpg", alert.timestamp))
    );

    let files = snapshots(&cfg.alert_storage_dir)?;
    assert_eq!(files, vec![alert.snapshot_path.clone()]);
    let saved = image::open(&files[0])?.to_rgb8();
    assert_eq!(saved.dimensions(), (640, 480));

    monitor.run()?;
    assert_eq!(monitor.summary().alerts_raised, 1);
    Ok(())
}

#[test]
fn low_confidence_boxes_do_not_count() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_in(tmp.path());
    let mut weak = crowd(7);
    for det in &mut weak {
        det.confidence = cfg.confidence_threshold;
    }
    let mut monitor = FrameLoop::new(
        &cfg,
        Clip::new(1),
        ScriptedDetector::new(vec![weak]),
        Keys::default(),
        jpeg_alerts(&cfg)?,
        OverlayRenderer::boxes_only(),
    );

    let summary = monitor.run()?;
    assert_eq!(summary.alerts_raised, 0);
    assert!(snapshots(&cfg.alert_storage_dir)?.is_empty());
    Ok(())
}

#[test]
fn frames_are_shown_at_canonical_size() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_in(tmp.path());
    let mut monitor = FrameLoop::new(
        &cfg,
        Clip::new(2),
        ScriptedDetector::default(),
        Keys::default(),
        jpeg_alerts(&cfg)?,
        OverlayRenderer::boxes_only(),
    );

    monitor.run()?;
    assert_eq!(monitor.display().shown, vec![(640, 480), (640, 480)]);
    Ok(())
}

#[test]
fn quit_key_stops_and_releases_once() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_in(tmp.path());
    let mut monitor = FrameLoop::new(
        &cfg,
        Clip::new(100),
        ScriptedDetector::default(),
        Keys::polls([None, Some('x'), Some('q')]),
        jpeg_alerts(&cfg)?,
        OverlayRenderer::boxes_only(),
    );

    let summary = monitor.run()?;
    assert_eq!(summary.stop_reason, StopReason::QuitRequested);
    assert_eq!(summary.frames_processed, 3);
    assert_eq!(monitor.state(), LoopState::Stopped);
    assert_eq!(monitor.source().releases, 1);
    assert_eq!(monitor.display().closes, 1);

    // STOPPED is terminal
    assert_eq!(monitor.step()?, LoopState::Stopped);
    assert_eq!(monitor.source().read, 3);
    Ok(())
}

#[test]
fn pause_blocks_until_any_key() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_in(tmp.path());
    let mut keys = Keys::polls([Some('p'), None, Some('q')]);
    keys.waits.push_back('z');
    let mut monitor = FrameLoop::new(
        &cfg,
        Clip::new(100),
        ScriptedDetector::default(),
        keys,
        jpeg_alerts(&cfg)?,
        OverlayRenderer::boxes_only(),
    );

    assert_eq!(monitor.step()?, LoopState::Paused);
    assert_eq!(monitor.source().read, 1);

    // no frame is read while paused
    assert_eq!(monitor.step()?, LoopState::Running);
    assert_eq!(monitor.source().read, 1);
    assert_eq!(monitor.display().wait_calls, 1);

    let summary = monitor.run()?;
    assert_eq!(summary.frames_processed, 3);
    assert_eq!(summary.stop_reason, StopReason::QuitRequested);
    Ok(())
}

#[test]
fn pause_key_resumes_instead_of_quitting() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_in(tmp.path());
    let mut keys = Keys::polls([Some('p')]);
    keys.waits.push_back('q');
    let mut monitor = FrameLoop::new(
        &cfg,
        Clip::new(2),
        ScriptedDetector::default(),
        keys,
        jpeg_alerts(&cfg)?,
        OverlayRenderer::boxes_only(),
    );

    let summary = monitor.run()?;
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);
    assert_eq!(summary.frames_processed, 2);
    Ok(())
}

#[test]
fn read_failure_stops_cleanly() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_in(tmp.path());
    let mut monitor = FrameLoop::new(
        &cfg,
        Clip::new(10).failing_at(2),
        ScriptedDetector::default(),
        Keys::default(),
        jpeg_alerts(&cfg)?,
        OverlayRenderer::boxes_only(),
    );

    let summary = monitor.run()?;
    assert_eq!(summary.frames_processed, 2);
    match summary.stop_reason {
        StopReason::ReadFailed(reason) => assert!(reason.contains("decoder gave up")),
        other => panic!("unexpected stop reason {other:?}"),
    }
    assert_eq!(monitor.source().releases, 1);
    Ok(())
}

#[test]
fn failed_snapshot_does_not_stop_monitoring() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_in(tmp.path());
    let alerts = AlertEngine::new(cfg.thresholds, &cfg.alert_storage_dir, BrokenDisk);
    let mut monitor = FrameLoop::new(
        &cfg,
        Clip::new(3),
        ScriptedDetector::repeating(crowd(8), 3),
        Keys::default(),
        alerts,
        OverlayRenderer::boxes_only(),
    );

    let summary = monitor.run()?;
    assert_eq!(summary.frames_processed, 3);
    assert_eq!(summary.alerts_raised, 3);
    assert_eq!(summary.failed_snapshots, 3);
    assert_eq!(summary.stop_reason, StopReason::EndOfStream);

    let alert = monitor
        .last_report()
        .and_then(|report| report.alert.clone())
        .expect("alert on last frame");
    assert!(!alert.persisted);
    Ok(())
}

#[test]
fn every_qualifying_frame_alerts() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_in(tmp.path());
    let script = vec![crowd(6), crowd(2), crowd(6)];
    let mut monitor = FrameLoop::new(
        &cfg,
        Clip::new(3),
        ScriptedDetector::new(script),
        Keys::default(),
        jpeg_alerts(&cfg)?,
        OverlayRenderer::boxes_only(),
    );

    let summary = monitor.run()?;
    assert_eq!(summary.alerts_raised, 2);
    assert_eq!(monitor.detector().calls(), 3);
    // alerts within one second share a file name
    assert!(!snapshots(&cfg.alert_storage_dir)?.is_empty());
    Ok(())
}

/// Detector whose model load outlasts a whole FPS window.
struct SlowStart(ScriptedDetector);

impl PersonDetector for SlowStart {
    fn name(&self) -> &'static str {
        "slow-start"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<ScoredBox>> {
        self.0.detect(frame)
    }

    fn warm_up(&mut self) -> Result<()> {
        std::thread::sleep(Duration::from_millis(1100));
        Ok(())
    }
}

#[test]
fn warm_up_time_is_not_counted_as_frame_time() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let cfg = config_in(tmp.path());
    let mut monitor = FrameLoop::new(
        &cfg,
        Clip::new(1),
        SlowStart(ScriptedDetector::default()),
        Keys::default(),
        jpeg_alerts(&cfg)?,
        OverlayRenderer::boxes_only(),
    );

    monitor.run()?;
    let fps = monitor.last_report().expect("a processed frame").fps;
    assert!(!fps.window_closed, "first frame closed the FPS window");
    assert_eq!(fps.frames, 1);
    Ok(())
}
