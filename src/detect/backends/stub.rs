use std::collections::VecDeque;

use anyhow::Result;

use crate::detect::backend::PersonDetector;
use crate::detect::result::ScoredBox;
use crate::frame::Frame;

/// Stub backend for testing. Replays a fixed script of detections, one entry
/// per `detect` call, and returns nothing once the script runs out.
#[derive(Default)]
pub struct ScriptedDetector {
    script: VecDeque<Vec<ScoredBox>>,
    calls: u64,
}

impl ScriptedDetector {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = Vec<ScoredBox>>,
    {
        Self {
            script: script.into_iter().collect(),
            calls: 0,
        }
    }

    /// Same detections on every call.
    pub fn repeating(detections: Vec<ScoredBox>, calls: usize) -> Self {
        Self::new(std::iter::repeat(detections).take(calls))
    }

    /// Number of `detect` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl PersonDetector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _frame: &Frame) -> Result<Vec<ScoredBox>> {
        self.calls += 1;
        Ok(self.script.pop_front().unwrap_or_default())
    }
}
