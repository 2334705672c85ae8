use glam::DVec2;

use crate::segment::Segment;

/// Arithmetic mean of a point set.
pub fn mean_point(points: &[DVec2]) -> Option<DVec2> {
    if points.is_empty() {
        return None;
    }
    let sum: DVec2 = points.iter().copied().sum();
    Some(sum / points.len() as f64)
}

/// Area centroid of a simple polygon given in boundary order.
///
/// Degenerate polygons (zero area) fall back to the vertex mean.
pub fn polygon_centroid(points: &[DVec2]) -> Option<DVec2> {
    let n = points.len();
    if n < 3 {
        return mean_point(points);
    }

    let mut twice_area = 0.0;
    let mut acc = DVec2::ZERO;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        let cross = p.perp_dot(q);
        twice_area += cross;
        acc += (p + q) * cross;
    }

    if twice_area.abs() < 1e-12 {
        return mean_point(points);
    }
    Some(acc / (3.0 * twice_area))
}

/// Sort points counter-clockwise by their angle around `center`.
pub fn sort_by_angle(center: DVec2, points: &mut [DVec2]) {
    points.sort_by(|a, b| {
        let ta = (a.y - center.y).atan2(a.x - center.x);
        let tb = (b.y - center.y).atan2(b.x - center.x);
        ta.total_cmp(&tb)
    });
}

/// Even-odd containment of `p` in the region outlined by `edges`.
///
/// Casts a ray from `p` towards +x and counts the edges it crosses. Edges may form any
/// number of closed rings in any order, so holes are handled. Each edge owns its lower
/// endpoint only, which keeps a ray through a shared vertex from counting twice.
pub fn polygon_contains<'a>(edges: impl IntoIterator<Item = &'a Segment>, p: DVec2) -> bool {
    let mut inside = false;
    for edge in edges {
        let (a, b) = (edge.start, edge.end);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < x {
                inside = !inside;
            }
        }
    }
    inside
}

/// Join segments that share endpoints (within `tolerance`) into rings.
///
/// Each ring lists its corners in walking order with the closing corner implied. A chain
/// that never returns to its start is closed by a straight side. Chains of fewer than
/// three corners are dropped.
pub fn chain_rings(segments: &[Segment], tolerance: f64) -> Vec<Vec<DVec2>> {
    let tol2 = tolerance * tolerance;
    let mut used = vec![false; segments.len()];
    let mut rings = Vec::new();

    for first in 0..segments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let start = segments[first].start;
        let mut ring = vec![start];
        let mut cursor = segments[first].end;

        while cursor.distance_squared(start) > tol2 {
            let next = segments.iter().enumerate().find_map(|(i, s)| {
                if used[i] {
                    None
                } else if s.start.distance_squared(cursor) <= tol2 {
                    Some((i, s.end))
                } else if s.end.distance_squared(cursor) <= tol2 {
                    Some((i, s.start))
                } else {
                    None
                }
            });
            let Some((i, far)) = next else {
                break;
            };
            used[i] = true;
            ring.push(cursor);
            cursor = far;
        }
        if cursor.distance_squared(start) > tol2 {
            ring.push(cursor);
        }
        if ring.len() >= 3 {
            rings.push(ring);
        }
    }
    rings
}

/// Whether the segment `from-to` reaches `to` without crossing any wall.
///
/// With `from` inside a convex region bounded by `walls`, this is the containment test
/// for `to`.
pub fn crosses_none<'a>(
    from: DVec2,
    to: DVec2,
    walls: impl IntoIterator<Item = &'a Segment>,
) -> bool {
    let ray = Segment::new(from, to);
    walls
        .into_iter()
        .all(|wall| ray.intersection(wall).is_none())
}
