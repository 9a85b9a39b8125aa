//! The per-frame control loop.
//!
//! One thread, fully synchronous. Each RUNNING step reads a frame, runs the
//! detector, derives metrics, draws overlays, checks alerts, ticks the FPS
//! meter, shows the frame and polls for a key:
//!
//! ```text
//! RUNNING --q--> STOPPED
//! RUNNING --p--> PAUSED --any key--> RUNNING
//! RUNNING --end of stream / read error--> STOPPED
//! ```
//!
//! STOPPED is terminal; the source and display are released exactly once.

use std::time::{Duration, Instant};

use anyhow::Result;

use crate::alert::{AlertEngine, AlertEvent, AlertPersister};
use crate::config::MonitorConfig;
use crate::density::FrameMetrics;
use crate::detect::{DetectionFilter, PersonDetector};
use crate::display::{Display, PAUSE_KEY, QUIT_KEY};
use crate::error::MonitorError;
use crate::fps::{FpsMeter, FpsReading};
use crate::frame::Frame;
use crate::ingest::FrameSource;
use crate::render::OverlayRenderer;

/// Key poll timeout per frame.
pub const KEY_POLL_TIMEOUT: Duration = Duration::from_millis(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Paused,
    Stopped,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    QuitRequested,
    EndOfStream,
    ReadFailed(String),
}

/// What a finished run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub alerts_raised: u64,
    pub failed_snapshots: u64,
    pub stop_reason: StopReason,
}

/// Result of processing one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub metrics: FrameMetrics,
    pub alert: Option<AlertEvent>,
    pub fps: FpsReading,
}

pub struct FrameLoop<S, D, V, P> {
    source: S,
    detector: D,
    display: V,
    alerts: AlertEngine<P>,
    renderer: OverlayRenderer,
    filter: DetectionFilter,
    fps: FpsMeter,
    canonical: (u32, u32),
    state: LoopState,
    stop_reason: Option<StopReason>,
    frames_processed: u64,
    last_report: Option<FrameReport>,
    released: bool,
}

impl<S, D, V, P> FrameLoop<S, D, V, P>
where
    S: FrameSource,
    D: PersonDetector,
    V: Display,
    P: AlertPersister,
{
    /// Build a loop around an already opened source. It starts RUNNING.
    ///
    /// The alert storage directory is expected to exist already
    /// (`AlertEngine::prepare_storage`).
    pub fn new(
        config: &MonitorConfig,
        source: S,
        detector: D,
        display: V,
        alerts: AlertEngine<P>,
        renderer: OverlayRenderer,
    ) -> Self {
        Self {
            source,
            detector,
            display,
            alerts,
            renderer,
            filter: DetectionFilter::new(config.confidence_threshold),
            fps: FpsMeter::new(),
            canonical: (config.canonical_width, config.canonical_height),
            state: LoopState::Running,
            stop_reason: None,
            frames_processed: 0,
            last_report: None,
            released: false,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Perform one state transition and return the new state.
    pub fn step(&mut self) -> Result<LoopState> {
        match self.state {
            LoopState::Running => self.step_running()?,
            LoopState::Paused => {
                let key = self.display.wait_key()?;
                log::info!("resumed (key {:?})", key);
                self.state = LoopState::Running;
            }
            LoopState::Stopped => {}
        }
        Ok(self.state)
    }

    /// Step until STOPPED, then release resources.
    ///
    /// Resources are released on error paths too; the error is returned after.
    pub fn run(&mut self) -> Result<RunSummary> {
        let outcome = self.run_until_stopped();
        self.release();
        outcome?;

        let summary = self.summary();
        log::info!(
            "monitor stopped ({:?}): {} frames, {} alerts, {} failed snapshots",
            summary.stop_reason,
            summary.frames_processed,
            summary.alerts_raised,
            summary.failed_snapshots
        );
        Ok(summary)
    }

    fn run_until_stopped(&mut self) -> Result<()> {
        self.detector.warm_up()?;
        log::info!("monitor running with detector '{}'", self.detector.name());
        // the first window opens with the loop, not at construction
        self.fps = FpsMeter::new();
        while self.step()? != LoopState::Stopped {}
        Ok(())
    }

    fn step_running(&mut self) -> Result<()> {
        let frame = match self.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("frame stream ended");
                self.stop(StopReason::EndOfStream);
                return Ok(());
            }
            Err(e) => {
                let err = MonitorError::FrameRead {
                    source_id: self.source.stats().origin,
                    reason: format!("{e:#}"),
                };
                log::error!("{}", err);
                self.stop(StopReason::ReadFailed(err.to_string()));
                return Ok(());
            }
        };

        let report = self.process_frame(frame)?;
        self.last_report = Some(report);

        match self.display.poll_key(KEY_POLL_TIMEOUT)? {
            Some(QUIT_KEY) => {
                log::info!("quit requested");
                self.stop(StopReason::QuitRequested);
            }
            Some(PAUSE_KEY) => {
                log::info!("paused; press any key to resume");
                self.state = LoopState::Paused;
            }
            _ => {}
        }
        Ok(())
    }

    fn process_frame(&mut self, frame: Frame) -> Result<FrameReport> {
        let (width, height) = self.canonical;
        let mut frame = frame.canonicalize(width, height);

        let started = Instant::now();
        let candidates = self.detector.detect(&frame)?;
        let inference_latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        let detections = self.filter.apply(&candidates);
        let metrics = FrameMetrics::measure(&detections, width, height, inference_latency_ms);
        self.frames_processed += 1;
        log::debug!(
            "frame {}: {} of {} candidates kept, ratio {:.3}, infer {:.1}ms",
            self.frames_processed,
            metrics.person_count,
            candidates.len(),
            metrics.occupied_ratio,
            metrics.inference_latency_ms
        );

        self.renderer.draw_detections(&mut frame, &detections);
        self.renderer.draw_metrics(&mut frame, &metrics);

        let kinds = self.alerts.evaluate(&metrics);
        let alert = if kinds.is_empty() {
            None
        } else {
            self.renderer.draw_alert(&mut frame, &kinds);
            self.alerts.raise(kinds, &frame)?
        };

        // drawn after the snapshot, so persisted alerts never carry it
        let fps = self.fps.tick();
        if fps.window_closed {
            self.renderer.draw_fps(&mut frame, fps.frames);
            log::debug!("fps: {}", fps.frames);
        }

        self.display.show(&frame)?;
        Ok(FrameReport {
            metrics,
            alert,
            fps,
        })
    }

    fn stop(&mut self, reason: StopReason) {
        self.state = LoopState::Stopped;
        self.stop_reason = Some(reason);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.state = LoopState::Stopped;
        self.source.release();
        self.display.close();
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames_processed: self.frames_processed,
            alerts_raised: self.alerts.raised(),
            failed_snapshots: self.alerts.failed_writes(),
            stop_reason: self
                .stop_reason
                .clone()
                .unwrap_or(StopReason::QuitRequested),
        }
    }

    /// Report for the most recently processed frame.
    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn display(&self) -> &V {
        &self.display
    }

    pub fn alerts(&self) -> &AlertEngine<P> {
        &self.alerts
    }
}
