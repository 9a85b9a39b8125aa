use anyhow::Result;

use crate::detect::result::ScoredBox;
use crate::frame::Frame;

/// Person detector backend.
///
/// A backend maps one canonical frame to candidate person boxes with a
/// confidence weight each. It does not threshold its output; the frame loop
/// runs every candidate through `DetectionFilter`.
///
/// The loop measures the wall-clock time of `detect` as the inference latency
/// and never bounds it: a slow backend simply slows the loop.
pub trait PersonDetector {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame. The frame is read-only.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<ScoredBox>>;

    /// Optional warm-up hook, called once before the first frame.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: PersonDetector + ?Sized> PersonDetector for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<ScoredBox>> {
        (**self).detect(frame)
    }

    fn warm_up(&mut self) -> Result<()> {
        (**self).warm_up()
    }
}
