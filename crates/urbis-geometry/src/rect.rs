use glam::DVec2;

use crate::segment::Segment;

/// Axis-aligned rectangle in the generation plane.
///
/// Invariant: `min.x <= max.x` and `min.y <= max.y`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: DVec2,
    pub max: DVec2,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
    Bottom,
    Top,
}

impl Rect {
    /// Create a rectangle from two corners, sorting components.
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// The rectangle `[0, size.x] x [0, size.y]`.
    pub fn from_size(size: DVec2) -> Self {
        Self::new(DVec2::ZERO, size)
    }

    /// Smallest rectangle enclosing every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = DVec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self { min, max })
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn diagonal(&self) -> f64 {
        self.size().length()
    }

    /// Corners in counter-clockwise order starting at `min`.
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ]
    }

    pub fn translated(&self, offset: DVec2) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Half-open containment: `[min, max)` on both axes.
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    /// Closed containment: `[min, max]` on both axes.
    pub fn contains_closed(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether any coordinate of `p` lies exactly on a side of the rectangle.
    pub fn on_boundary(&self, p: DVec2) -> bool {
        p.x == self.min.x || p.x == self.max.x || p.y == self.min.y || p.y == self.max.y
    }

    pub fn clamp(&self, p: DVec2) -> DVec2 {
        p.clamp(self.min, self.max)
    }

    /// Clip segment `a-b` to the rectangle (Liang-Barsky).
    ///
    /// Endpoints produced by clipping are placed exactly on the side they were clipped
    /// against, so [`on_boundary`](Self::on_boundary) recognises them. Segments that miss
    /// the rectangle or collapse to a point return `None`.
    pub fn clip_segment(&self, a: DVec2, b: DVec2) -> Option<Segment> {
        let d = b - a;
        let mut t0 = 0.0_f64;
        let mut t1 = 1.0_f64;
        let mut entered: Option<Side> = None;
        let mut exited: Option<Side> = None;

        let checks = [
            (-d.x, a.x - self.min.x, Side::Left),
            (d.x, self.max.x - a.x, Side::Right),
            (-d.y, a.y - self.min.y, Side::Bottom),
            (d.y, self.max.y - a.y, Side::Top),
        ];

        for (p, q, side) in checks {
            if p == 0.0 {
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                    entered = Some(side);
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                    exited = Some(side);
                }
            }
        }

        let mut start = a + d * t0;
        let mut end = a + d * t1;
        if let Some(side) = entered {
            start = self.snap(start, side);
        }
        if let Some(side) = exited {
            end = self.snap(end, side);
        }

        if start == end {
            return None;
        }
        Some(Segment::new(start, end))
    }

    fn snap(&self, p: DVec2, side: Side) -> DVec2 {
        let p = self.clamp(p);
        match side {
            Side::Left => DVec2::new(self.min.x, p.y),
            Side::Right => DVec2::new(self.max.x, p.y),
            Side::Bottom => DVec2::new(p.x, self.min.y),
            Side::Top => DVec2::new(p.x, self.max.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Rect {
        Rect::from_size(DVec2::new(100.0, 100.0))
    }

    #[test]
    fn test_new_sorts_corners() {
        let r = Rect::new(DVec2::new(5.0, -1.0), DVec2::new(-3.0, 4.0));
        assert_eq!(r.min, DVec2::new(-3.0, -1.0));
        assert_eq!(r.max, DVec2::new(5.0, 4.0));
    }

    #[test]
    fn test_contains_is_half_open() {
        let r = unit();
        assert!(r.contains(DVec2::ZERO));
        assert!(!r.contains(DVec2::new(100.0, 50.0)));
        assert!(r.contains_closed(DVec2::new(100.0, 50.0)));
    }

    #[test]
    fn test_from_points() {
        let r = Rect::from_points([
            DVec2::new(3.0, 7.0),
            DVec2::new(-2.0, 1.0),
            DVec2::new(5.0, 0.0),
        ])
        .unwrap();
        assert_eq!(r.min, DVec2::new(-2.0, 0.0));
        assert_eq!(r.max, DVec2::new(5.0, 7.0));
        assert!(Rect::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_clip_inside_is_unchanged() {
        let s = unit()
            .clip_segment(DVec2::new(10.0, 10.0), DVec2::new(20.0, 30.0))
            .unwrap();
        assert_eq!(s.start, DVec2::new(10.0, 10.0));
        assert_eq!(s.end, DVec2::new(20.0, 30.0));
    }

    #[test]
    fn test_clip_snaps_to_boundary() {
        let r = unit();
        let s = r
            .clip_segment(DVec2::new(50.0, 50.0), DVec2::new(250.0, 83.3))
            .unwrap();
        assert_eq!(s.end.x, 100.0, "clipped end must sit exactly on the right side");
        assert!(r.on_boundary(s.end));
        assert!(!r.on_boundary(s.start));
    }

    #[test]
    fn test_clip_crossing_both_sides() {
        let r = unit();
        let s = r
            .clip_segment(DVec2::new(-50.0, 40.0), DVec2::new(150.0, 60.0))
            .unwrap();
        assert_eq!(s.start.x, 0.0);
        assert_eq!(s.end.x, 100.0);
        assert!((s.start.y - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_outside_returns_none() {
        let r = unit();
        assert!(r
            .clip_segment(DVec2::new(-10.0, -10.0), DVec2::new(-5.0, 200.0))
            .is_none());
        assert!(r
            .clip_segment(DVec2::new(150.0, -10.0), DVec2::new(300.0, 50.0))
            .is_none());
    }
}
