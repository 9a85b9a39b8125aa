/// Axis-aligned box in frame pixel coordinates. `x`, `y` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl BoundingBox {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.w) * u64::from(self.h)
    }
}

/// Raw detector output: a box plus the detector's confidence weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredBox {
    pub bbox: BoundingBox,
    pub confidence: f64,
}

impl ScoredBox {
    pub const fn new(bbox: BoundingBox, confidence: f64) -> Self {
        Self { bbox, confidence }
    }
}

/// Accepted detections for one frame, in detector output order.
///
/// Only `DetectionFilter` builds these, so every box in a set has already
/// cleared the confidence threshold.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetectionSet {
    boxes: Vec<BoundingBox>,
}

impl DetectionSet {
    pub(crate) fn from_boxes(boxes: Vec<BoundingBox>) -> Self {
        Self { boxes }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BoundingBox> {
        self.boxes.iter()
    }
}

impl<'a> IntoIterator for &'a DetectionSet {
    type Item = &'a BoundingBox;
    type IntoIter = std::slice::Iter<'a, BoundingBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.iter()
    }
}
