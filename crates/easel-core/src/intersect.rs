//! Point containment and convex-quad overlap tests.
//!
//! Containment uses a horizontal ray-crossing count over the four edges.
//! Overlap is pairwise segment intersection plus mutual containment, and
//! feeds the overlap-aware z-order operations.

use crate::geom::Point;

/// Outcome of intersecting two line segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentIntersection {
    /// Segments cross at exactly this point.
    Point(Point),
    /// Segments lie on the same line.
    Coincident,
    /// Segments are parallel and never meet.
    Parallel,
    /// Segments are not parallel but miss each other.
    None,
}

/// Intersect segment `a1→a2` with `b1→b2`.
pub fn intersect_segments(a1: Point, a2: Point, b1: Point, b2: Point) -> SegmentIntersection {
    let ua_num = (b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x);
    let ub_num = (a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x);
    let denom = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);

    if denom != 0.0 {
        let ua = ua_num / denom;
        let ub = ub_num / denom;
        if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
            SegmentIntersection::Point(a1.lerp(a2, ua))
        } else {
            SegmentIntersection::None
        }
    } else if ua_num == 0.0 || ub_num == 0.0 {
        SegmentIntersection::Coincident
    } else {
        SegmentIntersection::Parallel
    }
}

/// Ray-crossing containment: cast a horizontal ray to +x from `point` and
/// count edge crossings at or beyond it. Odd count means inside. Points
/// exactly on an edge count as inside.
pub fn polygon_contains(corners: &[Point], point: Point) -> bool {
    let n = corners.len();
    if n < 3 {
        return false;
    }
    let mut crossings = 0u32;
    for i in 0..n {
        let p1 = corners[i];
        let p2 = corners[(i + 1) % n];
        // Only edges straddling the ray's y can cross it.
        if (p1.y > point.y) == (p2.y > point.y) {
            continue;
        }
        let xi = p1.x + (point.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y);
        if xi >= point.x {
            crossings += 1;
        }
    }
    crossings % 2 == 1
}

/// True when any edge of `a` meets any edge of `b`, or either polygon is
/// entirely inside the other. Both inputs are convex corner loops.
pub fn polygons_overlap(a: &[Point], b: &[Point]) -> bool {
    for i in 0..a.len() {
        let a1 = a[i];
        let a2 = a[(i + 1) % a.len()];
        for j in 0..b.len() {
            let b1 = b[j];
            let b2 = b[(j + 1) % b.len()];
            match intersect_segments(a1, a2, b1, b2) {
                SegmentIntersection::Point(_) | SegmentIntersection::Coincident => return true,
                _ => {}
            }
        }
    }
    // No edge contact: overlap is possible only by full containment.
    polygon_contains(b, a[0]) || polygon_contains(a, b[0])
}

/// Overlap of a convex corner loop with an axis-aligned rectangle.
pub fn polygon_overlaps_rect(corners: &[Point], min: Point, max: Point) -> bool {
    let rect = [
        min,
        Point::new(max.x, min.y),
        max,
        Point::new(min.x, max.y),
    ];
    polygons_overlap(corners, &rect)
}

/// Axis-aligned bounds of a point set as (min, max).
pub fn bounds_of(points: &[Point]) -> (Point, Point) {
    let mut min = Point::new(f64::MAX, f64::MAX);
    let mut max = Point::new(f64::MIN, f64::MIN);
    for &p in points {
        min = min.min(p);
        max = max.max(p);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> [Point; 4] {
        [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ]
    }

    #[test]
    fn segments_crossing() {
        let r = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
            Point::new(2.0, 0.0),
        );
        match r {
            SegmentIntersection::Point(p) => {
                assert!((p.x - 1.0).abs() < 1e-9 && (p.y - 1.0).abs() < 1e-9);
            }
            other => panic!("expected a crossing, got {other:?}"),
        }
    }

    #[test]
    fn segments_parallel_and_coincident() {
        let r = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
        );
        assert_eq!(r, SegmentIntersection::Parallel);

        let r = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(3.0, 0.0),
        );
        assert_eq!(r, SegmentIntersection::Coincident);
    }

    #[test]
    fn segments_skew_but_missing() {
        let r = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 5.0),
        );
        assert_eq!(r, SegmentIntersection::None);
    }

    #[test]
    fn containment_basic() {
        let sq = unit_square();
        assert!(polygon_contains(&sq, Point::new(0.5, 0.5)));
        assert!(!polygon_contains(&sq, Point::new(1.5, 0.5)));
        assert!(!polygon_contains(&sq, Point::new(-0.1, 0.5)));
    }

    #[test]
    fn containment_rotated_quad() {
        // Diamond centered at origin.
        let diamond = [
            Point::new(0.0, -1.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(-1.0, 0.0),
        ];
        assert!(polygon_contains(&diamond, Point::new(0.0, 0.0)));
        assert!(polygon_contains(&diamond, Point::new(0.4, 0.4)));
        // Inside the bounding box but outside the diamond.
        assert!(!polygon_contains(&diamond, Point::new(0.9, 0.9)));
    }

    #[test]
    fn overlap_edge_cross_and_containment() {
        let sq = unit_square();
        let shifted: Vec<Point> = sq.iter().map(|p| *p + Point::new(0.5, 0.5)).collect();
        assert!(polygons_overlap(&sq, &shifted));

        let inner: Vec<Point> = sq
            .iter()
            .map(|p| Point::new(0.25 + p.x * 0.5, 0.25 + p.y * 0.5))
            .collect();
        assert!(polygons_overlap(&sq, &inner), "containment counts as overlap");

        let far: Vec<Point> = sq.iter().map(|p| *p + Point::new(5.0, 0.0)).collect();
        assert!(!polygons_overlap(&sq, &far));
    }

    #[test]
    fn rect_overlap() {
        let sq = unit_square();
        assert!(polygon_overlaps_rect(
            &sq,
            Point::new(0.9, 0.9),
            Point::new(2.0, 2.0)
        ));
        assert!(!polygon_overlaps_rect(
            &sq,
            Point::new(1.1, 1.1),
            Point::new(2.0, 2.0)
        ));
    }
}
