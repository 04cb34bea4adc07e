//! # Field geometry
//!
//! Points, distances and polygon tests in the field (image) frame. The field frame has its origin
//! in the top left corner, X to the right and Y downwards, all units in pixels.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// A point in the field frame.
pub type Point = Point2<f64>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Size of the playing field as seen by the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldDims {
    /// Units: pixels
    pub width: f64,

    /// Units: pixels
    pub height: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FieldDims {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// The centre of the field.
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Unweighted mean of the given points, `None` if there are no points.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }

    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc: Vector2<f64>, p| acc + p.coords);

    Some(Point::from(sum / points.len() as f64))
}

/// Straight line distance between two points.
pub fn euclid(a: &Point, b: &Point) -> f64 {
    nalgebra::distance(a, b)
}

/// Signed distance from `point` to the closed polygon `poly`.
///
/// The magnitude is the shortest distance to any edge of the polygon. The sign is positive when
/// the point is strictly inside, negative when outside, and the distance is zero on an edge.
/// Polygons with fewer than 3 vertices have no inside so always give a non-positive result.
pub fn signed_poly_dist(poly: &[Point], point: &Point) -> f64 {
    if poly.is_empty() {
        return f64::NEG_INFINITY;
    }

    let mut min_dist = f64::INFINITY;
    let mut inside = false;

    for i in 0..poly.len() {
        let a = &poly[i];
        let b = &poly[(i + 1) % poly.len()];

        min_dist = min_dist.min(segment_dist(a, b, point));

        // Crossing number, count the edges a ray along +X from the point crosses
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
    }

    if min_dist == 0.0 {
        0.0
    }
    else if inside && poly.len() >= 3 {
        min_dist
    }
    else {
        -min_dist
    }
}

/// Returns true if the point is strictly inside the axis aligned rectangle with corners
/// `(x1, y1)` and `(x2, y2)`, where `x1 < x2` and `y1 < y2`.
pub fn inside_rect(point: &Point, x1: f64, y1: f64, x2: f64, y2: f64) -> bool {
    point.x > x1 && point.x < x2 && point.y > y1 && point.y < y2
}

/// Shortest distance from `point` to the segment `a`-`b`.
fn segment_dist(a: &Point, b: &Point, point: &Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();

    // Degenerate segment
    if len_sq == 0.0 {
        return euclid(a, point);
    }

    let t = ((point - a).dot(&ab) / len_sq).max(0.0).min(1.0);

    euclid(&(a + ab * t), point)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    #[test]
    fn test_centroid() {
        assert_eq!(centroid(&[]), None);
        assert_eq!(centroid(&square()), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_signed_poly_dist() {
        let sq = square();

        assert_eq!(signed_poly_dist(&sq, &Point::new(5.0, 5.0)), 5.0);
        assert_eq!(signed_poly_dist(&sq, &Point::new(2.0, 5.0)), 2.0);
        assert_eq!(signed_poly_dist(&sq, &Point::new(10.0, 5.0)), 0.0);
        assert_eq!(signed_poly_dist(&sq, &Point::new(13.0, 5.0)), -3.0);
        assert_eq!(signed_poly_dist(&sq, &Point::new(13.0, 14.0)), -5.0);

        // Same result whichever way round the polygon is wound
        let rev: Vec<Point> = sq.iter().rev().cloned().collect();
        assert_eq!(signed_poly_dist(&rev, &Point::new(2.0, 5.0)), 2.0);
        assert_eq!(signed_poly_dist(&rev, &Point::new(13.0, 5.0)), -3.0);
    }

    #[test]
    fn test_signed_poly_dist_triangle() {
        let tri = vec![Point::new(0.0, 0.0), Point::new(20.0, 0.0), Point::new(0.0, 20.0)];

        assert!(signed_poly_dist(&tri, &Point::new(2.0, 2.0)) > 0.0);
        assert!(signed_poly_dist(&tri, &Point::new(15.0, 15.0)) < 0.0);
    }

    #[test]
    fn test_inside_rect_is_strict() {
        assert!(inside_rect(&Point::new(5.0, 5.0), 0.0, 0.0, 10.0, 10.0));
        assert!(!inside_rect(&Point::new(0.0, 5.0), 0.0, 0.0, 10.0, 10.0));
        assert!(!inside_rect(&Point::new(5.0, 10.0), 0.0, 0.0, 10.0, 10.0));
    }
}
