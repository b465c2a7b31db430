use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Face bounding box in pixel coordinates of the image it was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FaceRegion {
    /// Left edge x-coordinate
    pub x: u32,
    /// Top edge y-coordinate
    pub y: u32,
    /// Box width
    pub width: u32,
    /// Box height
    pub height: u32,
}

impl FaceRegion {
    /// Create a new face region.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box area in pixels.
    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Grow the box by `ratio * max(width, height)` pixels on every side,
    /// clipped to a `frame_width` x `frame_height` image.
    pub fn expand(&self, ratio: f64, frame_width: u32, frame_height: u32) -> FaceRegion {
        let margin = (self.width.max(self.height) as f64 * ratio.max(0.0)).floor() as u32;

        let x1 = self.x.saturating_sub(margin).min(frame_width);
        let y1 = self.y.saturating_sub(margin).min(frame_height);
        let x2 = self
            .x
            .saturating_add(self.width)
            .saturating_add(margin)
            .min(frame_width);
        let y2 = self
            .y
            .saturating_add(self.height)
            .saturating_add(margin)
            .min(frame_height);

        FaceRegion {
            x: x1,
            y: y1,
            width: x2.saturating_sub(x1),
            height: y2.saturating_sub(y1),
        }
    }

    /// Largest region by area. Earlier regions win ties.
    pub fn largest(regions: &[FaceRegion]) -> Option<FaceRegion> {
        regions.iter().fold(None, |best: Option<FaceRegion>, r| match best {
            Some(b) if b.area() >= r.area() => Some(b),
            _ => Some(*r),
        })
    }
}
