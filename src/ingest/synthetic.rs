use crate::frame::Frame;

/// Generates synthetic frames for `stub://` sources.
///
/// Simulates a mostly static scene whose pattern shifts every 50 frames.
pub(crate) struct SyntheticFrames {
    width: u32,
    height: u32,
    limit: Option<u64>,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticFrames {
    pub(crate) fn new(width: u32, height: u32, limit: Option<u64>) -> Self {
        Self {
            width,
            height,
            limit,
            frame_count: 0,
            scene_state: 0,
        }
    }

    pub(crate) fn next_frame(&mut self) -> Option<Frame> {
        if self.limit.is_some_and(|limit| self.frame_count >= limit) {
            return None;
        }
        self.frame_count += 1;
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }

        let offset = self.frame_count + self.scene_state as u64;
        let pixel_count = (self.width as usize) * (self.height as usize) * 3;
        let pixels: Vec<u8> = (0..pixel_count)
            .map(|i| ((i as u64 + offset) % 256) as u8)
            .collect();
        Frame::from_rgb(self.width, self.height, pixels).ok()
    }

    pub(crate) fn frames_generated(&self) -> u64 {
        self.frame_count
    }
}
