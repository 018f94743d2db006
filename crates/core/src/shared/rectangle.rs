use serde::{Deserialize, Serialize};

/// Axis-aligned face bounding box in source-image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rectangle {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rectangle {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a rectangle from `(x1, y1, x2, y2)` corners, clamped to a
    /// `frame_width` × `frame_height` image.
    ///
    /// Returns `None` when nothing of the box lies inside the image.
    pub fn from_corners_clamped(
        corners: (f64, f64, f64, f64),
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        let (x1, y1, x2, y2) = corners;
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        let left = x1.max(0.0).min(fw).floor() as i32;
        let top = y1.max(0.0).min(fh).floor() as i32;
        let right = x2.max(0.0).min(fw).ceil() as i32;
        let bottom = y2.max(0.0).min(fh).ceil() as i32;
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self::new(left, top, right - left, bottom - top))
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn iou(&self, other: &Rectangle) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.right().min(other.right());
        let iy2 = self.bottom().min(other.bottom());

        let inter = (ix2 - ix1).max(0) as f64 * (iy2 - iy1).max(0) as f64;
        if inter == 0.0 {
            return 0.0;
        }

        let area_a = self.area() as f64;
        let area_b = other.area() as f64;
        inter / (area_a + area_b - inter)
    }

    /// Sorts rectangles left-to-right; equal x falls back to top-to-bottom.
    pub fn reading_order(a: &Rectangle, b: &Rectangle) -> std::cmp::Ordering {
        a.x.cmp(&b.x).then(a.y.cmp(&b.y))
    }
}
