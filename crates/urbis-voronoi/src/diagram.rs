use glam::DVec2;
use hashbrown::HashMap;
use spade::handles::VertexHandle;
use spade::{DelaunayTriangulation, Point2, Triangulation};
use urbis_geometry::{Rect, Segment, crosses_none, sort_by_angle};

use crate::error::VoronoiError;
use crate::relax;

/// Index of a site within its [`VoronoiDiagram`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(pub usize);

/// Index of an edge within its [`VoronoiDiagram`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

/// A Voronoi generator point and the edges bounding its region.
#[derive(Clone, Debug, PartialEq)]
pub struct Site {
    pub position: DVec2,
    /// Bounding edges, ordered counter-clockwise by the direction of the neighbour site.
    pub edges: Vec<EdgeId>,
}

/// Boundary between two neighbouring sites.
#[derive(Clone, Debug, PartialEq)]
pub struct VoronoiEdge {
    pub left: SiteId,
    pub right: SiteId,
    /// The edge clipped to the diagram bounds, `None` when nothing of it lies inside.
    pub clipped: Option<Segment>,
}

impl VoronoiEdge {
    /// The site on the other side of this edge.
    pub fn neighbor(&self, site: SiteId) -> Option<SiteId> {
        if self.left == site {
            Some(self.right)
        } else if self.right == site {
            Some(self.left)
        } else {
            None
        }
    }
}

type PointKey = (i64, i64);

fn point_key(p: DVec2) -> PointKey {
    ((p.x * 1e6).round() as i64, (p.y * 1e6).round() as i64)
}

fn to_dvec(p: Point2<f64>) -> DVec2 {
    DVec2::new(p.x, p.y)
}

/// Edges shorter than this between two inner faces come from co-circular input and are
/// dropped.
const DEGENERATE_EDGE: f64 = 1e-9;

/// A Voronoi diagram clipped to an axis-aligned rectangle.
#[derive(Clone, Debug)]
pub struct VoronoiDiagram {
    bounds: Rect,
    sites: Vec<Site>,
    edges: Vec<VoronoiEdge>,
    lookup: HashMap<PointKey, SiteId>,
    corner_owners: [Option<SiteId>; 4],
}

impl VoronoiDiagram {
    /// Build the diagram of `points` over `[0, region_size]`, relaxing the points
    /// `lloyd_iterations` times first.
    pub fn build(
        points: &[DVec2],
        region_size: DVec2,
        lloyd_iterations: u32,
    ) -> Result<Self, VoronoiError> {
        Self::build_in(points, Rect::from_size(region_size), lloyd_iterations)
    }

    /// Like [`build`](Self::build) with explicit bounds.
    pub fn build_in(
        points: &[DVec2],
        bounds: Rect,
        lloyd_iterations: u32,
    ) -> Result<Self, VoronoiError> {
        let mut diagram = Self::construct(points, bounds)?;
        for iteration in 0..lloyd_iterations {
            let relaxed = relax::relaxed_positions(&diagram);
            diagram = Self::construct(&relaxed, bounds)?;
            tracing::trace!(iteration, sites = diagram.sites.len(), "lloyd iteration");
        }
        tracing::debug!(
            sites = diagram.sites.len(),
            edges = diagram.edges.len(),
            lloyd_iterations,
            "voronoi diagram built"
        );
        Ok(diagram)
    }

    fn construct(points: &[DVec2], bounds: Rect) -> Result<Self, VoronoiError> {
        if points.is_empty() {
            return Err(VoronoiError::TooFewSites { count: 0 });
        }

        let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
        let mut vertex_sites: Vec<Option<SiteId>> = Vec::with_capacity(points.len());
        let mut sites: Vec<Site> = Vec::with_capacity(points.len());

        for &p in points {
            let handle = triangulation
                .insert(Point2::new(p.x, p.y))
                .map_err(|reason| VoronoiError::Insertion {
                    x: p.x,
                    y: p.y,
                    reason,
                })?;
            let index = handle.index();
            if vertex_sites.len() <= index {
                vertex_sites.resize(index + 1, None);
            }
            if vertex_sites[index].is_some() {
                tracing::debug!(x = p.x, y = p.y, "duplicate voronoi input point skipped");
                continue;
            }
            vertex_sites[index] = Some(SiteId(sites.len()));
            sites.push(Site {
                position: p,
                edges: Vec::new(),
            });
        }

        let site_of = |v: VertexHandle<'_, Point2<f64>>| {
            vertex_sites.get(v.fix().index()).copied().flatten()
        };

        let center = bounds.center();
        let reach = bounds.diagonal();
        let mut edges: Vec<VoronoiEdge> = Vec::new();

        for undirected in triangulation.undirected_edges() {
            let edge = undirected.as_directed();
            let (Some(left), Some(right)) = (site_of(edge.from()), site_of(edge.to())) else {
                continue;
            };

            let from = to_dvec(edge.from().position());
            let to = to_dvec(edge.to().position());
            let dir = to - from;
            let left_face = edge.face().as_inner().map(|f| to_dvec(f.circumcenter()));
            let right_face = edge.rev().face().as_inner().map(|f| to_dvec(f.circumcenter()));

            let ray = |origin: DVec2, normal: DVec2| {
                let length = (reach + origin.distance(center)) * 2.0;
                origin + normal.normalize_or_zero() * length
            };

            let (start, end) = match (left_face, right_face) {
                (Some(a), Some(b)) => {
                    if a.distance(b) <= DEGENERATE_EDGE {
                        continue;
                    }
                    (a, b)
                }
                // Hull edge: the region opens towards the outer face.
                (None, Some(c)) => (c, ray(c, DVec2::new(-dir.y, dir.x))),
                (Some(c), None) => (c, ray(c, DVec2::new(dir.y, -dir.x))),
                // Collinear input: the bisector is unbounded on both sides.
                (None, None) => {
                    let mid = (from + to) * 0.5;
                    let normal = DVec2::new(-dir.y, dir.x);
                    (ray(mid, -normal), ray(mid, normal))
                }
            };

            let id = EdgeId(edges.len());
            edges.push(VoronoiEdge {
                left,
                right,
                clipped: bounds.clip_segment(start, end),
            });
            sites[left.0].edges.push(id);
            sites[right.0].edges.push(id);
        }

        for i in 0..sites.len() {
            let origin = sites[i].position;
            let mut ids = std::mem::take(&mut sites[i].edges);
            let angle = |id: &EdgeId| {
                let other = edges[id.0].neighbor(SiteId(i)).map_or(origin, |n| sites[n.0].position);
                (other.y - origin.y).atan2(other.x - origin.x)
            };
            ids.sort_by(|a, b| angle(a).total_cmp(&angle(b)));
            sites[i].edges = ids;
        }

        let lookup = sites
            .iter()
            .enumerate()
            .map(|(i, s)| (point_key(s.position), SiteId(i)))
            .collect();

        let mut diagram = Self {
            bounds,
            sites,
            edges,
            lookup,
            corner_owners: [None; 4],
        };
        let corners = bounds.corners();
        for (owner, corner) in diagram.corner_owners.iter_mut().zip(corners) {
            *owner = nearest(&diagram.sites, corner);
        }
        Ok(diagram)
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn edges(&self) -> &[VoronoiEdge] {
        &self.edges
    }

    pub fn site_ids(&self) -> impl Iterator<Item = SiteId> + '_ {
        (0..self.sites.len()).map(SiteId)
    }

    /// Site by id. Ids from another diagram return `None`.
    pub fn get_site(&self, id: SiteId) -> Option<&Site> {
        self.sites.get(id.0)
    }

    /// Edge by id. Ids from another diagram return `None`.
    pub fn get_edge(&self, id: EdgeId) -> Option<&VoronoiEdge> {
        self.edges.get(id.0)
    }

    /// Like [`get_site`](Self::get_site) for ids taken from this diagram.
    ///
    /// Panics if `id` does not belong to this diagram.
    pub fn site(&self, id: SiteId) -> &Site {
        &self.sites[id.0]
    }

    /// Like [`get_edge`](Self::get_edge) for ids taken from this diagram.
    ///
    /// Panics if `id` does not belong to this diagram.
    pub fn edge(&self, id: EdgeId) -> &VoronoiEdge {
        &self.edges[id.0]
    }

    /// Site whose generator lies at `p` (to within a micro-unit).
    pub fn site_at(&self, p: DVec2) -> Option<SiteId> {
        self.lookup.get(&point_key(p)).copied()
    }

    /// Site whose generator is closest to `p`.
    pub fn nearest_site(&self, p: DVec2) -> Option<SiteId> {
        nearest(&self.sites, p)
    }

    /// Whether an edge touches the diagram bounds: it was clipped away entirely or one
    /// of its clipped endpoints lies exactly on a side of the bounds.
    pub fn is_boundary_edge(&self, id: EdgeId) -> bool {
        match self.edges[id.0].clipped {
            None => true,
            Some(seg) => self.bounds.on_boundary(seg.start) || self.bounds.on_boundary(seg.end),
        }
    }

    /// Whether `p` lies in the region of `site`: the segment from the generator to `p`
    /// crosses none of the site's edges.
    pub fn site_contains(&self, site: SiteId, p: DVec2) -> bool {
        let s = &self.sites[site.0];
        let walls = s.edges.iter().filter_map(|e| self.edges[e.0].clipped.as_ref());
        crosses_none(s.position, p, walls)
    }

    /// Outline of a site's region, counter-clockwise, including the bounds corners the
    /// site owns.
    pub fn site_polygon(&self, site: SiteId) -> Vec<DVec2> {
        let s = &self.sites[site.0];
        let mut points: Vec<DVec2> = s
            .edges
            .iter()
            .filter_map(|e| self.edges[e.0].clipped)
            .flat_map(|seg| [seg.start, seg.end])
            .collect();
        points.extend(
            self.bounds
                .corners()
                .into_iter()
                .zip(self.corner_owners)
                .filter(|(_, owner)| *owner == Some(site))
                .map(|(corner, _)| corner),
        );
        sort_by_angle(s.position, &mut points);
        points.dedup_by(|a, b| a.distance_squared(*b) < 1e-18);
        points
    }

    /// Shift every site, edge and the bounds by `offset`.
    pub fn translate(&mut self, offset: DVec2) {
        self.bounds = self.bounds.translated(offset);
        for site in &mut self.sites {
            site.position += offset;
        }
        for edge in &mut self.edges {
            edge.clipped = edge.clipped.map(|seg| seg.translated(offset));
        }
        self.lookup = self
            .sites
            .iter()
            .enumerate()
            .map(|(i, s)| (point_key(s.position), SiteId(i)))
            .collect();
    }
}

fn nearest(sites: &[Site], p: DVec2) -> Option<SiteId> {
    sites
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            a.position
                .distance_squared(p)
                .total_cmp(&b.position.distance_squared(p))
        })
        .map(|(i, _)| SiteId(i))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A centre point ringed by six neighbours: the centre site is fully enclosed.
    fn hexagon() -> (Vec<DVec2>, VoronoiDiagram) {
        let center = DVec2::splat(100.0);
        let mut points = vec![center];
        for k in 0..6 {
            let a = std::f64::consts::FRAC_PI_3 * k as f64;
            points.push(center + DVec2::new(a.cos(), a.sin()) * 40.0);
        }
        let diagram = VoronoiDiagram::build(&points, DVec2::splat(200.0), 0).unwrap();
        (points, diagram)
    }

    #[test]
    fn test_every_point_maps_to_one_site() {
        let (points, diagram) = hexagon();
        assert_eq!(diagram.sites().len(), points.len());
        for p in &points {
            let id = diagram.site_at(*p).expect("every input point must be a site");
            assert_eq!(diagram.site(id).position, *p);
        }
    }

    #[test]
    fn test_enclosed_site_has_no_boundary_edges() {
        let (_, diagram) = hexagon();
        let center = diagram.site_at(DVec2::splat(100.0)).unwrap();
        let site = diagram.site(center);
        assert_eq!(site.edges.len(), 6, "hexagonal cell expected");
        for &e in &site.edges {
            assert!(!diagram.is_boundary_edge(e), "edge {e:?} of the centre touches the bounds");
        }
    }

    #[test]
    fn test_ring_sites_reach_the_bounds() {
        let (points, diagram) = hexagon();
        for p in &points[1..] {
            let id = diagram.site_at(*p).unwrap();
            let touches = diagram
                .site(id)
                .edges
                .iter()
                .any(|&e| diagram.is_boundary_edge(e));
            assert!(touches, "ring site at {p} should be on the bounds");
        }
    }

    #[test]
    fn test_site_contains() {
        let (_, diagram) = hexagon();
        let center = diagram.site_at(DVec2::splat(100.0)).unwrap();
        assert!(diagram.site_contains(center, DVec2::new(100.0, 115.0)));
        assert!(!diagram.site_contains(center, DVec2::new(100.0, 130.0)));
    }

    #[test]
    fn test_site_polygon_of_corner_site() {
        let points = [
            DVec2::new(25.0, 25.0),
            DVec2::new(75.0, 25.0),
            DVec2::new(75.0, 75.0),
            DVec2::new(25.0, 75.0),
        ];
        let diagram = VoronoiDiagram::build(&points, DVec2::splat(100.0), 0).unwrap();
        let id = diagram.site_at(points[0]).unwrap();
        let polygon = diagram.site_polygon(id);
        assert!(polygon.contains(&DVec2::ZERO), "corner must be owned: {polygon:?}");
        let c = urbis_geometry::polygon_centroid(&polygon).unwrap();
        assert!((c - points[0]).length() < 1e-6, "centroid {c}");
    }

    #[test]
    fn test_neighbor_lookup() {
        let edge = VoronoiEdge {
            left: SiteId(1),
            right: SiteId(4),
            clipped: None,
        };
        assert_eq!(edge.neighbor(SiteId(1)), Some(SiteId(4)));
        assert_eq!(edge.neighbor(SiteId(4)), Some(SiteId(1)));
        assert_eq!(edge.neighbor(SiteId(2)), None);
    }

    #[test]
    fn test_translate_keeps_boundary_classification() {
        let (_, mut diagram) = hexagon();
        let before: Vec<bool> = (0..diagram.edges().len())
            .map(|i| diagram.is_boundary_edge(EdgeId(i)))
            .collect();

        diagram.translate(DVec2::new(10.0, -5.0));
        let after: Vec<bool> = (0..diagram.edges().len())
            .map(|i| diagram.is_boundary_edge(EdgeId(i)))
            .collect();
        assert_eq!(before, after);
        assert!(diagram.site_at(DVec2::new(110.0, 95.0)).is_some());
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let result = VoronoiDiagram::build(&[], DVec2::splat(10.0), 0);
        assert!(matches!(result, Err(VoronoiError::TooFewSites { count: 0 })));
    }

    #[test]
    fn test_foreign_ids_are_not_found() {
        let (points, diagram) = hexagon();
        assert!(diagram.get_site(SiteId(points.len())).is_none());
        assert!(diagram.get_edge(EdgeId(diagram.edges().len())).is_none());
        let first = diagram.get_site(SiteId(0)).unwrap();
        assert_eq!(first, diagram.site(SiteId(0)));
    }
}
