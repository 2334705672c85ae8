use glam::DVec2;

/// A directed line segment in the generation plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: DVec2,
    pub end: DVec2,
}

impl Segment {
    pub fn new(start: DVec2, end: DVec2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    pub fn midpoint(&self) -> DVec2 {
        (self.start + self.end) * 0.5
    }

    /// Unit direction from `start` to `end`, or zero for a degenerate segment.
    pub fn direction(&self) -> DVec2 {
        (self.end - self.start).normalize_or_zero()
    }

    pub fn reversed(&self) -> Self {
        Self::new(self.end, self.start)
    }

    pub fn translated(&self, offset: DVec2) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }

    pub fn intersection(&self, other: &Segment) -> Option<DVec2> {
        segment_intersection(self.start, self.end, other.start, other.end)
    }

    pub fn distance_to(&self, p: DVec2) -> f64 {
        point_segment_distance(p, self.start, self.end)
    }

    pub fn project(&self, p: DVec2) -> Projection {
        point_segment_projection(p, self.start, self.end)
    }
}

/// Intersection point of segments `a0-a1` and `b0-b1`.
///
/// Endpoints count as intersecting. Parallel and collinear pairs (zero denominator)
/// report no intersection, including overlapping collinear segments.
pub fn segment_intersection(a0: DVec2, a1: DVec2, b0: DVec2, b1: DVec2) -> Option<DVec2> {
    let da = a1 - a0;
    let db = b1 - b0;
    let denom = db.y * da.x - db.x * da.y;
    if denom == 0.0 {
        return None;
    }

    let offset = a0 - b0;
    let ua = (db.x * offset.y - db.y * offset.x) / denom;
    let ub = (da.x * offset.y - da.y * offset.x) / denom;

    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(a0 + da * ua)
    } else {
        None
    }
}

/// Intersection of the infinite lines through `a0-a1` and `b0-b1`, `None` when they are
/// parallel or either is degenerate.
pub fn line_intersection(a0: DVec2, a1: DVec2, b0: DVec2, b1: DVec2) -> Option<DVec2> {
    let da = a1 - a0;
    let db = b1 - b0;
    let denom = da.perp_dot(db);
    if denom.abs() <= 1e-12 * da.length() * db.length() {
        return None;
    }
    let t = (b0 - a0).perp_dot(db) / denom;
    Some(a0 + da * t)
}

/// Result of projecting a point onto the line through a segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Unclamped line parameter; 0 at the segment start, 1 at its end.
    pub t: f64,
    /// Projected point on the infinite line.
    pub point: DVec2,
    /// Whether `t` lies within `[0, 1]`.
    pub within: bool,
}

/// Project `p` onto the line through `a` and `b`.
///
/// A zero-length segment projects onto `a` and is never `within`.
pub fn point_segment_projection(p: DVec2, a: DVec2, b: DVec2) -> Projection {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return Projection {
            t: 0.0,
            point: a,
            within: false,
        };
    }
    let t = (p - a).dot(ab) / len2;
    Projection {
        t,
        point: a + ab * t,
        within: (0.0..=1.0).contains(&t),
    }
}

/// Distance from `p` to the closest point of segment `a-b`.
pub fn point_segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    #[test]
    fn test_crossing_segments_intersect() {
        let hit = segment_intersection(v(0.0, 0.0), v(10.0, 10.0), v(0.0, 10.0), v(10.0, 0.0));
        let p = hit.expect("diagonals must cross");
        assert!((p - v(5.0, 5.0)).length() < 1e-12, "got {p}");
    }

    #[test]
    fn test_disjoint_segments_do_not_intersect() {
        let hit = segment_intersection(v(0.0, 0.0), v(1.0, 0.0), v(2.0, -1.0), v(2.0, 1.0));
        assert!(hit.is_none());
    }

    #[test]
    fn test_shared_endpoint_counts() {
        let hit = segment_intersection(v(0.0, 0.0), v(5.0, 0.0), v(5.0, 0.0), v(5.0, 5.0));
        assert_eq!(hit, Some(v(5.0, 0.0)));
    }

    #[test]
    fn test_parallel_segments_report_none() {
        let hit = segment_intersection(v(0.0, 0.0), v(10.0, 0.0), v(0.0, 1.0), v(10.0, 1.0));
        assert!(hit.is_none());
    }

    #[test]
    fn test_collinear_overlap_is_not_detected() {
        let hit = segment_intersection(v(0.0, 0.0), v(10.0, 0.0), v(5.0, 0.0), v(15.0, 0.0));
        assert!(hit.is_none(), "collinear overlap is reported as no intersection");
    }

    #[test]
    fn test_distance_clamps_to_endpoints() {
        let d = point_segment_distance(v(-3.0, 4.0), v(0.0, 0.0), v(10.0, 0.0));
        assert!((d - 5.0).abs() < 1e-12, "got {d}");
        let d = point_segment_distance(v(5.0, 2.0), v(0.0, 0.0), v(10.0, 0.0));
        assert!((d - 2.0).abs() < 1e-12, "got {d}");
    }

    #[test]
    fn test_projection_reports_range() {
        let inside = point_segment_projection(v(3.0, 7.0), v(0.0, 0.0), v(10.0, 0.0));
        assert!(inside.within);
        assert!((inside.point - v(3.0, 0.0)).length() < 1e-12);

        let outside = point_segment_projection(v(12.0, 1.0), v(0.0, 0.0), v(10.0, 0.0));
        assert!(!outside.within);
        assert!((outside.t - 1.2).abs() < 1e-12);
        assert!((outside.point - v(12.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_degenerate_projection_is_outside() {
        let proj = point_segment_projection(v(1.0, 1.0), v(2.0, 2.0), v(2.0, 2.0));
        assert!(!proj.within);
        assert_eq!(proj.point, v(2.0, 2.0));
    }

    #[test]
    fn test_line_intersection_beyond_segments() {
        // The segments stop short of each other; their lines still meet.
        let p = line_intersection(v(0.0, 0.0), v(1.0, 0.0), v(3.0, 2.0), v(3.0, 1.0)).unwrap();
        assert!((p - v(3.0, 0.0)).length() < 1e-12, "got {p}");
    }

    #[test]
    fn test_line_intersection_parallel() {
        assert!(line_intersection(v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0), v(5.0, 1.0)).is_none());
        assert!(line_intersection(v(0.0, 0.0), v(0.0, 0.0), v(0.0, 1.0), v(5.0, 1.0)).is_none());
    }
}
