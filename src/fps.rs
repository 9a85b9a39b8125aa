use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Rolling one-second frame counter.
///
/// The value is a raw count, not a rate: "frames seen in the current window".
/// A stalled loop gets exactly one reset on its next tick, however many
/// windows it missed.
#[derive(Debug)]
pub struct FpsMeter {
    frames: u32,
    window_start: Instant,
}

/// What a tick reports back to the frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FpsReading {
    /// Frames counted in the window so far, including this one.
    pub frames: u32,
    /// True when this tick closed the window; `frames` is then the pre-reset
    /// count and is what the overlay shows.
    pub window_closed: bool,
}

impl FpsMeter {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(window_start: Instant) -> Self {
        Self {
            frames: 0,
            window_start,
        }
    }

    pub fn tick(&mut self) -> FpsReading {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> FpsReading {
        self.frames += 1;
        let frames = self.frames;
        let window_closed = now.saturating_duration_since(self.window_start) >= WINDOW;
        if window_closed {
            self.frames = 0;
            self.window_start = now;
        }
        FpsReading {
            frames,
            window_closed,
        }
    }

    /// Frames counted since the last reset.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    pub fn window_start(&self) -> Instant {
        self.window_start
    }
}

impl Default for FpsMeter {
    fn default() -> Self {
        Self::new()
    }
}
