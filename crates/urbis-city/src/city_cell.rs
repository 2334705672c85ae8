//! City cells: groups of inner Voronoi sites that receive one secondary road network.

use glam::DVec2;
use urbis_config::CellConfig;
use urbis_geometry::{Rect, Segment, chain_rings, line_intersection, mean_point, polygon_contains};
use urbis_voronoi::{EdgeId, SiteId, VoronoiDiagram};

/// Index of a city cell in the generator's cell list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CityCellId(pub usize);

/// A group of inner sites and the Voronoi edges separating it from everything else.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CityCell {
    pub sites: Vec<SiteId>,
    /// Edges whose neighbour on the far side is not a member of this cell. Empty until
    /// the cell is refined.
    pub boundary_edges: Vec<EdgeId>,
}

impl CityCell {
    pub fn new(sites: Vec<SiteId>) -> Self {
        Self {
            sites,
            boundary_edges: Vec::new(),
        }
    }

    pub fn contains_site(&self, site: SiteId) -> bool {
        self.sites.contains(&site)
    }
}

/// A boundary edge with its clipped geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundarySegment {
    pub edge: EdgeId,
    pub segment: Segment,
}

/// Boundary corners closer than this are the same corner when the outline is chained.
const RING_TOLERANCE: f64 = 1e-6;

/// Containment geometry of a city cell.
///
/// The boundary segments are chained into closed rings and every side is pushed away
/// from the cell by `probe_offset`. Neighbouring pushed sides are joined where their
/// lines meet, or bevelled when that point lies further than `miter_limit` offsets from
/// the corner, so the outline has no gaps. A point is inside when it lies within the
/// outline by the even-odd rule and, when a region is set, inside the region.
#[derive(Clone, Debug, PartialEq)]
pub struct CellGeometry {
    centroid: DVec2,
    boundary: Vec<BoundarySegment>,
    walls: Vec<Segment>,
    region: Option<Rect>,
}

impl CellGeometry {
    /// Build the geometry from raw boundary segments.
    ///
    /// `is_inside` tells which side of a segment faces the cell interior.
    pub fn new(
        centroid: DVec2,
        boundary: Vec<BoundarySegment>,
        config: &CellConfig,
        is_inside: impl Fn(DVec2) -> bool,
    ) -> Self {
        let probe = config.probe_offset.abs().max(1.0);
        let outward = |a: DVec2, b: DVec2| {
            let dir = (b - a).normalize_or_zero();
            let normal = DVec2::new(-dir.y, dir.x);
            if is_inside((a + b) * 0.5 + normal * probe) {
                -normal
            } else {
                normal
            }
        };

        let segments: Vec<Segment> = boundary.iter().map(|b| b.segment).collect();
        let walls = chain_rings(&segments, RING_TOLERANCE)
            .iter()
            .flat_map(|ring| offset_ring(ring, config.probe_offset, config.miter_limit, &outward))
            .collect();

        Self {
            centroid,
            boundary,
            walls,
            region: None,
        }
    }

    /// Also reject every point outside `region`.
    pub fn with_region(mut self, region: Rect) -> Self {
        self.region = Some(region);
        self
    }

    /// Geometry of a refined cell, limited to the diagram bounds. The centroid is the
    /// mean of the member sites.
    pub fn from_cell(cell: &CityCell, diagram: &VoronoiDiagram, config: &CellConfig) -> Self {
        let positions: Vec<DVec2> = cell
            .sites
            .iter()
            .filter_map(|&s| diagram.get_site(s))
            .map(|site| site.position)
            .collect();
        let centroid = mean_point(&positions).unwrap_or(DVec2::ZERO);
        let boundary = cell
            .boundary_edges
            .iter()
            .filter_map(|&edge| {
                diagram
                    .get_edge(edge)?
                    .clipped
                    .map(|segment| BoundarySegment { edge, segment })
            })
            .collect();

        Self::new(centroid, boundary, config, |p| {
            cell.sites.iter().any(|&s| diagram.site_contains(s, p))
        })
        .with_region(diagram.bounds())
    }

    pub fn centroid(&self) -> DVec2 {
        self.centroid
    }

    pub fn boundary(&self) -> &[BoundarySegment] {
        &self.boundary
    }

    /// Sides of the pushed outline.
    pub fn walls(&self) -> &[Segment] {
        &self.walls
    }

    pub fn region(&self) -> Option<Rect> {
        self.region
    }

    pub fn contains(&self, p: DVec2) -> bool {
        self.region.is_none_or(|r| r.contains(p)) && polygon_contains(&self.walls, p)
    }
}

/// Push every side of `ring` along `outward` by `offset` and join the pushed sides into
/// a closed outline.
fn offset_ring(
    ring: &[DVec2],
    offset: f64,
    miter_limit: f64,
    outward: impl Fn(DVec2, DVec2) -> DVec2,
) -> Vec<Segment> {
    let n = ring.len();
    let sides: Vec<Segment> = (0..n)
        .map(|i| {
            let (a, b) = (ring[i], ring[(i + 1) % n]);
            Segment::new(a, b).translated(outward(a, b) * offset)
        })
        .collect();

    let limit = miter_limit * offset.abs();
    let mut outline = Vec::with_capacity(2 * n);
    for (i, &corner) in ring.iter().enumerate() {
        let before = sides[(i + n - 1) % n];
        let after = sides[i];
        match line_intersection(before.start, before.end, after.start, after.end) {
            Some(joint) if joint.distance(corner) <= limit => outline.push(joint),
            _ => {
                outline.push(before.end);
                outline.push(after.start);
            }
        }
    }

    let m = outline.len();
    (0..m)
        .map(|i| Segment::new(outline[i], outline[(i + 1) % m]))
        .filter(|s| s.length() > 0.0)
        .collect()
}
