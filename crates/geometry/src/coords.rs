//! Canvas and logical coordinate spaces
//!
//! Canvas pixel space has its origin at the top-left corner with Y growing
//! downward. Logical space is Cartesian: origin at a chosen canvas point
//! (normally the surface centre), Y growing upward, one unit per `scale`
//! canvas pixels.

use serde::{Deserialize, Serialize};

/// A 2D point in either canvas or logical space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin (0, 0)
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    /// Calculate distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        pixel_distance_between(*self, *other)
    }

    /// Midpoint between this point and another
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two points, in the points' own units
pub fn pixel_distance_between(p1: Point, p2: Point) -> f64 {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    (dx * dx + dy * dy).sqrt()
}

/// Map a canvas pixel position into logical coordinates
///
/// The Y axis is flipped so that positive logical Y points up the screen,
/// which gives the conventional quadrant layout (I top-right, II top-left,
/// III bottom-left, IV bottom-right).
pub fn canvas_to_logical(point: Point, origin: Point, scale: f64) -> Point {
    Point::new((point.x - origin.x) / scale, (origin.y - point.y) / scale)
}

/// Inverse of [`canvas_to_logical`]
pub fn logical_to_canvas(point: Point, origin: Point, scale: f64) -> Point {
    Point::new(origin.x + point.x * scale, origin.y - point.y * scale)
}

/// Cartesian quadrant of a logical point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    /// x > 0, y > 0 (top-right)
    I,
    /// x < 0, y > 0 (top-left)
    II,
    /// x < 0, y < 0 (bottom-left)
    III,
    /// x > 0, y < 0 (bottom-right)
    IV,
}

impl Quadrant {
    /// Classify a logical point; points on either axis have no quadrant
    pub fn of(point: Point) -> Option<Quadrant> {
        if point.x == 0.0 || point.y == 0.0 {
            return None;
        }
        match (point.x > 0.0, point.y > 0.0) {
            (true, true) => Some(Quadrant::I),
            (false, true) => Some(Quadrant::II),
            (false, false) => Some(Quadrant::III),
            (true, false) => Some(Quadrant::IV),
        }
    }

    /// Roman-numeral label shown next to a marker
    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::I => "I",
            Quadrant::II => "II",
            Quadrant::III => "III",
            Quadrant::IV => "IV",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_distance_scenario() {
        let start = Point::new(10.0, 10.0);
        let end = Point::new(50.0, 80.0);
        let distance = pixel_distance_between(start, end);
        assert!((distance - (40.0f64 * 40.0 + 70.0 * 70.0).sqrt()).abs() < 1e-12);
        assert!((distance - 80.62).abs() < 0.01);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Point::new(-3.0, 7.5);
        let b = Point::new(12.0, -1.0);
        assert_eq!(pixel_distance_between(a, b), pixel_distance_between(b, a));
        assert_eq!(a.distance_to(&a), 0.0);
    }

    #[test]
    fn test_canvas_to_logical_flips_y() {
        let origin = Point::new(400.0, 300.0);

        let above_right = canvas_to_logical(Point::new(450.0, 250.0), origin, 1.0);
        assert_eq!(above_right, Point::new(50.0, 50.0));

        let below_left = canvas_to_logical(Point::new(300.0, 400.0), origin, 2.0);
        assert_eq!(below_left, Point::new(-50.0, -50.0));
    }

    #[test]
    fn test_origin_maps_to_zero_for_any_scale() {
        let origin = Point::new(400.0, 300.0);
        for scale in [0.1, 0.5, 1.0, 2.5, 5.0] {
            assert_eq!(canvas_to_logical(origin, origin, scale), Point::ORIGIN);
        }
    }

    #[test]
    fn test_logical_to_canvas_inverts() {
        let origin = Point::new(320.0, 240.0);
        let canvas = Point::new(17.0, 401.0);
        let logical = canvas_to_logical(canvas, origin, 1.5);
        let back = logical_to_canvas(logical, origin, 1.5);
        assert!((back.x - canvas.x).abs() < 1e-9);
        assert!((back.y - canvas.y).abs() < 1e-9);
    }

    #[test]
    fn test_quadrants() {
        assert_eq!(Quadrant::of(Point::new(1.0, 1.0)), Some(Quadrant::I));
        assert_eq!(Quadrant::of(Point::new(-1.0, 1.0)), Some(Quadrant::II));
        assert_eq!(Quadrant::of(Point::new(-1.0, -1.0)), Some(Quadrant::III));
        assert_eq!(Quadrant::of(Point::new(1.0, -1.0)), Some(Quadrant::IV));
        assert_eq!(Quadrant::of(Point::new(0.0, 5.0)), None);
        assert_eq!(Quadrant::of(Point::new(5.0, 0.0)), None);
    }

    #[test]
    fn test_midpoint() {
        let mid = Point::new(0.0, 0.0).midpoint(&Point::new(100.0, 50.0));
        assert_eq!(mid, Point::new(50.0, 25.0));
    }
}
