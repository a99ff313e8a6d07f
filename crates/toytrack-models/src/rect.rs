use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A point in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when the point lies inside the unit square (edges included).
    pub fn is_in_view(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// A normalized, optionally rotated rectangle described by its center.
///
/// Coordinates are relative to the image: `(0.0, 0.0)` is the top-left
/// corner and `(1.0, 1.0)` the bottom-right one. Values outside that range
/// are legal and describe boxes that are partially or fully out of view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NormalizedRect {
    /// Center x-coordinate
    pub x_center: f64,
    /// Center y-coordinate
    pub y_center: f64,
    /// Box width
    pub width: f64,
    /// Box height
    pub height: f64,
    /// Clockwise rotation around the center, in radians
    #[serde(default)]
    pub rotation: f64,
}

impl NormalizedRect {
    /// Create a new axis-aligned rectangle.
    pub fn new(x_center: f64, y_center: f64, width: f64, height: f64) -> Self {
        Self {
            x_center,
            y_center,
            width,
            height,
            rotation: 0.0,
        }
    }

    /// Return a copy rotated by `rotation` radians.
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    /// Left edge of the unrotated box.
    #[inline]
    pub fn x_min(&self) -> f64 {
        self.x_center - self.width / 2.0
    }

    /// Right edge of the unrotated box.
    #[inline]
    pub fn x_max(&self) -> f64 {
        self.x_center + self.width / 2.0
    }

    /// Top edge of the unrotated box.
    #[inline]
    pub fn y_min(&self) -> f64 {
        self.y_center - self.height / 2.0
    }

    /// Bottom edge of the unrotated box.
    #[inline]
    pub fn y_max(&self) -> f64 {
        self.y_center + self.height / 2.0
    }

    /// Box area. Negative extents count as empty.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Area shared with `other`.
    ///
    /// Rotation is ignored: both boxes are compared by their unrotated
    /// extents, which is exact for the axis-aligned boxes detectors emit.
    pub fn intersection_area(&self, other: &NormalizedRect) -> f64 {
        let x1 = self.x_min().max(other.x_min());
        let y1 = self.y_min().max(other.y_min());
        let x2 = self.x_max().min(other.x_max());
        let y2 = self.y_max().min(other.y_max());

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        (x2 - x1) * (y2 - y1)
    }

    /// Compute Intersection over Union with another box.
    pub fn iou(&self, other: &NormalizedRect) -> f64 {
        let intersection = self.intersection_area(other);
        if intersection <= 0.0 {
            return 0.0;
        }

        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// The four corners of the rotated box, clockwise from top-left.
    pub fn corners(&self) -> [Point2; 4] {
        let half_width = self.width / 2.0;
        let half_height = self.height / 2.0;
        let (sin, cos) = self.rotation.sin_cos();

        [
            (-half_width, -half_height),
            (half_width, -half_height),
            (half_width, half_height),
            (-half_width, half_height),
        ]
        .map(|(dx, dy)| {
            Point2::new(
                self.x_center + dx * cos - dy * sin,
                self.y_center + dx * sin + dy * cos,
            )
        })
    }

    /// True when every corner lies outside the unit square.
    pub fn is_out_of_view(&self) -> bool {
        self.corners().iter().all(|corner| !corner.is_in_view())
    }

    /// Squared distance from the box center to the image center.
    pub fn distance_to_center_squared(&self) -> f64 {
        let dx = self.x_center - 0.5;
        let dy = self.y_center - 0.5;
        dx * dx + dy * dy
    }

    /// Convert to a top-left anchored pixel rectangle for a frame size.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> PixelRect {
        let frame_width = frame_width as f64;
        let frame_height = frame_height as f64;
        PixelRect {
            x: (self.x_min() * frame_width).round() as i32,
            y: (self.y_min() * frame_height).round() as i32,
            width: (self.width * frame_width).round() as i32,
            height: (self.height * frame_height).round() as i32,
        }
    }
}

/// Rectangle in pixel coordinates, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_partial_overlap() {
        let a = NormalizedRect::new(0.25, 0.25, 0.5, 0.5);
        let b = NormalizedRect::new(0.5, 0.5, 0.5, 0.5);

        // Intersection: 0.25 x 0.25 = 0.0625
        // Union: 0.25 + 0.25 - 0.0625 = 0.4375
        let iou = a.iou(&b);
        assert!((iou - 0.142857).abs() < 1e-4);
    }

    #[test]
    fn test_iou_zero_area_is_zero() {
        let a = NormalizedRect::new(0.5, 0.5, 0.0, 0.2);
        let b = NormalizedRect::new(0.5, 0.5, 0.2, 0.2);

        assert_eq!(a.iou(&b), 0.0);
        assert_eq!(b.iou(&a), 0.0);
    }

    #[test]
    fn test_corners_axis_aligned() {
        let rect = NormalizedRect::new(0.5, 0.5, 0.2, 0.4);
        let corners = rect.corners();

        assert!((corners[0].x - 0.4).abs() < 1e-9);
        assert!((corners[0].y - 0.3).abs() < 1e-9);
        assert!((corners[2].x - 0.6).abs() < 1e-9);
        assert!((corners[2].y - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_corners_rotated_quarter_turn() {
        let rect = NormalizedRect::new(0.5, 0.5, 0.2, 0.4).with_rotation(std::f64::consts::FRAC_PI_2);
        let corners = rect.corners();

        // Width and height swap after a quarter turn.
        let xs: Vec<f64> = corners.iter().map(|c| c.x).collect();
        let min_x = xs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_x = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!((max_x - min_x - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_view() {
        assert!(NormalizedRect::new(1.5, 0.5, 0.1, 0.1).is_out_of_view());
        assert!(!NormalizedRect::new(0.5, 0.5, 0.1, 0.1).is_out_of_view());
        // Straddling the right edge keeps two corners in view.
        assert!(!NormalizedRect::new(1.0, 0.5, 0.2, 0.2).is_out_of_view());
    }

    #[test]
    fn test_to_pixels() {
        let rect = NormalizedRect::new(0.5, 0.5, 0.25, 0.5);
        let pixels = rect.to_pixels(640, 480);

        assert_eq!(pixels, PixelRect { x: 240, y: 120, width: 160, height: 240 });
    }

    #[test]
    fn test_rotation_defaults_when_missing() {
        let rect: NormalizedRect =
            serde_json::from_str(r#"{"x_center":0.5,"y_center":0.5,"width":0.1,"height":0.1}"#)
                .unwrap();
        assert_eq!(rect.rotation, 0.0);
    }
}
