//! Planar geometry predicates for street placement.
//!
//! Two streets may meet only at a shared location. The crossing test below
//! is the classic orientation test with collinear special cases; segments
//! that share an endpoint are never reported as crossing.

use township_types::Point;

/// Tolerance for treating three points as collinear.
const EPSILON: f64 = 1e-9;

/// Turn direction of the ordered triple `(a, b, c)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The three points lie on one line.
    Collinear,
    /// `c` lies clockwise of `a -> b`.
    Clockwise,
    /// `c` lies counter-clockwise of `a -> b`.
    CounterClockwise,
}

/// Orientation of the triple `(a, b, c)`.
pub fn orientation(a: Point, b: Point, c: Point) -> Orientation {
    let cross = (b.y - a.y).mul_add(c.x - b.x, -((b.x - a.x) * (c.y - b.y)));
    if cross.abs() < EPSILON {
        Orientation::Collinear
    } else if cross > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Whether `q` lies within the bounding box of segment `p -> r`.
///
/// Only meaningful when the three points are already known to be collinear.
pub fn on_segment(p: Point, q: Point, r: Point) -> bool {
    q.x <= p.x.max(r.x) + EPSILON
        && q.x >= p.x.min(r.x) - EPSILON
        && q.y <= p.y.max(r.y) + EPSILON
        && q.y >= p.y.min(r.y) - EPSILON
}

fn same_point(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON
}

/// Whether segments `p1 -> q1` and `p2 -> q2` intersect anywhere other than
/// at a shared endpoint.
pub fn segments_cross(p1: Point, q1: Point, p2: Point, q2: Point) -> bool {
    if same_point(p1, p2) || same_point(p1, q2) || same_point(q1, p2) || same_point(q1, q2) {
        return false;
    }

    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Collinear && on_segment(p1, p2, q1))
        || (o2 == Orientation::Collinear && on_segment(p1, q2, q1))
        || (o3 == Orientation::Collinear && on_segment(p2, p1, q2))
        || (o4 == Orientation::Collinear && on_segment(p2, q1, q2))
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn orientation_of_simple_triples() {
        assert_eq!(orientation(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)), Orientation::Collinear);
        assert_ne!(
            orientation(p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)),
            orientation(p(0.0, 0.0), p(1.0, 0.0), p(1.0, -1.0))
        );
    }

    #[test]
    fn x_shape_crosses() {
        assert!(segments_cross(p(0.0, 0.0), p(2.0, 2.0), p(0.0, 2.0), p(2.0, 0.0)));
    }

    #[test]
    fn disjoint_segments_do_not_cross() {
        assert!(!segments_cross(p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(1.0, 1.0)));
        assert!(!segments_cross(p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0), p(3.0, 3.0)));
    }

    #[test]
    fn shared_endpoint_is_not_a_crossing() {
        assert!(!segments_cross(p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)));
        // Even when collinear and overlapping only at the shared end.
        assert!(!segments_cross(p(0.0, 0.0), p(1.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)));
    }

    #[test]
    fn touching_without_shared_endpoint_counts() {
        // T-junction: the end of one segment lies in the middle of the other.
        assert!(segments_cross(p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)));
        // Collinear overlap.
        assert!(segments_cross(p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.0), p(3.0, 0.0)));
    }
}
