use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detect::backend::PersonDetector;
use crate::detect::result::{BoundingBox, ScoredBox};
use crate::frame::Frame;

const MAX_WALKERS: usize = 10;
/// Crowd size is re-rolled this often (in `detect` calls).
const CROWD_CHANGE_INTERVAL: u64 = 60;

/// Synthetic backend for demo runs against `stub://` sources.
///
/// Ignores pixel content. Keeps a small crowd of random-walking "people" whose
/// size changes every few seconds, so both alert conditions get exercised.
pub struct SyntheticCrowdDetector {
    rng: StdRng,
    walkers: Vec<Walker>,
    calls: u64,
}

#[derive(Clone, Copy, Debug)]
struct Walker {
    x: f32,
    y: f32,
    w: u32,
    h: u32,
    confidence: f64,
}

impl SyntheticCrowdDetector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            walkers: Vec::new(),
            calls: 0,
        }
    }

    fn spawn(&mut self, width: u32, height: u32) -> Walker {
        let w = self.rng.gen_range(40..=90).min(width.max(1));
        let h = (w * 2).min(height.max(1));
        Walker {
            x: self.rng.gen_range(0.0..=(width - w) as f32),
            y: self.rng.gen_range(0.0..=(height - h) as f32),
            w,
            h,
            confidence: self.rng.gen_range(0.2..1.6),
        }
    }

    fn step(&mut self, width: u32, height: u32) {
        for walker in &mut self.walkers {
            walker.x = (walker.x + self.rng.gen_range(-6.0..=6.0))
                .clamp(0.0, width.saturating_sub(walker.w) as f32);
            walker.y = (walker.y + self.rng.gen_range(-3.0..=3.0))
                .clamp(0.0, height.saturating_sub(walker.h) as f32);
            walker.confidence =
                (walker.confidence + self.rng.gen_range(-0.05..=0.05)).clamp(0.0, 2.0);
        }
    }
}

impl PersonDetector for SyntheticCrowdDetector {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<ScoredBox>> {
        let (width, height) = (frame.width(), frame.height());
        if self.calls % CROWD_CHANGE_INTERVAL == 0 {
            let target = self.rng.gen_range(0..=MAX_WALKERS);
            self.walkers.truncate(target);
            while self.walkers.len() < target {
                let walker = self.spawn(width, height);
                self.walkers.push(walker);
            }
            log::debug!("synthetic detector: crowd size now {}", target);
        }
        self.calls += 1;
        self.step(width, height);

        Ok(self
            .walkers
            .iter()
            .map(|walker| {
                ScoredBox::new(
                    BoundingBox::new(walker.x as i32, walker.y as i32, walker.w, walker.h),
                    walker.confidence,
                )
            })
            .collect())
    }
}
