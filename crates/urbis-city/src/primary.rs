//! Primary roads: the outer ring of the diagram, the city-cell partition and the
//! deduplicated primary road graph.

use rand::Rng;
use urbis_config::Config;
use urbis_geometry::Rect;
use urbis_voronoi::{EdgeId, PoissonSampler, SiteId, VoronoiDiagram};

use crate::city_cell::CityCell;
use crate::error::GenerationError;
use crate::graph::RoadGraph;

/// Vertices closer than this collapse into one primary road vertex.
pub const PRIMARY_VERTEX_EPSILON: f64 = 0.01;

/// Outer/inner split of the diagram's sites.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SiteClassification {
    pub outer: Vec<SiteId>,
    pub inner: Vec<SiteId>,
    is_outer: Vec<bool>,
}

impl SiteClassification {
    pub fn is_outer(&self, site: SiteId) -> bool {
        self.is_outer.get(site.0).copied().unwrap_or(false)
    }
}

/// A site is outer when any of its edges touches the region boundary.
pub fn classify_boundary_sites(diagram: &VoronoiDiagram) -> SiteClassification {
    let mut classification = SiteClassification::default();
    for id in diagram.site_ids() {
        let outer = diagram
            .site(id)
            .edges
            .iter()
            .any(|&e| diagram.is_boundary_edge(e));
        classification.is_outer.push(outer);
        if outer {
            classification.outer.push(id);
        } else {
            classification.inner.push(id);
        }
    }
    classification
}

/// Edges between an outer site and an inner neighbour: the inward face of the outer ring.
pub fn extract_outer_roads(
    diagram: &VoronoiDiagram,
    classification: &SiteClassification,
) -> Vec<EdgeId> {
    let mut roads = Vec::new();
    for &site in &classification.outer {
        for &e in &diagram.site(site).edges {
            let edge = diagram.edge(e);
            if edge.clipped.is_none() {
                continue;
            }
            let inward = edge
                .neighbor(site)
                .is_some_and(|n| !classification.is_outer(n));
            if inward && !roads.contains(&e) {
                roads.push(e);
            }
        }
    }
    roads
}

/// Coarse Voronoi partition over the bounding box of the given primary roads.
///
/// The sample radius is the main radius scaled by `divider.radius_scale`. The diagram is
/// built at the origin and shifted onto the bounding box.
pub fn build_divider<R: Rng>(
    rng: &mut R,
    diagram: &VoronoiDiagram,
    roads: &[EdgeId],
    config: &Config,
) -> Result<VoronoiDiagram, GenerationError> {
    let endpoints = roads
        .iter()
        .filter_map(|&e| diagram.edge(e).clipped)
        .flat_map(|seg| [seg.start, seg.end]);
    let bounds = Rect::from_points(endpoints).ok_or(GenerationError::NoCityCells)?;

    let sampler = PoissonSampler::new(
        config.sampling.radius * config.divider.radius_scale,
        bounds.size(),
        config.divider.samples_before_rejection,
    );
    let sample = sampler.sample(rng)?;
    let mut divider =
        VoronoiDiagram::build(&sample.points, bounds.size(), config.divider.lloyd_iterations)?;
    divider.translate(bounds.min);

    tracing::debug!(
        sites = divider.sites().len(),
        min_x = bounds.min.x,
        min_y = bounds.min.y,
        "divider diagram built"
    );
    Ok(divider)
}

/// Group inner sites by the divider region containing them.
///
/// A site outside every divider region joins the region with the nearest generator.
/// Regions that receive no site produce no cell.
pub fn group_into_city_cells(
    diagram: &VoronoiDiagram,
    classification: &SiteClassification,
    divider: &VoronoiDiagram,
) -> Vec<CityCell> {
    let mut groups: Vec<Vec<SiteId>> = vec![Vec::new(); divider.sites().len()];

    for &site in &classification.inner {
        let position = diagram.site(site).position;
        let region = divider
            .site_ids()
            .find(|&d| divider.site_contains(d, position))
            .or_else(|| {
                tracing::debug!(site = site.0, "inner site outside every divider region");
                divider.nearest_site(position)
            });
        if let Some(region) = region {
            groups[region.0].push(site);
        }
    }

    groups
        .into_iter()
        .filter(|g| !g.is_empty())
        .map(CityCell::new)
        .collect()
}

/// Edges of `cell`'s sites whose far-side neighbour is not in the cell.
pub fn cell_boundary_edges(diagram: &VoronoiDiagram, cell: &CityCell) -> Vec<EdgeId> {
    let mut boundary = Vec::new();
    for &site in &cell.sites {
        for &e in &diagram.site(site).edges {
            let edge = diagram.edge(e);
            if edge.clipped.is_none() {
                continue;
            }
            let shared = edge.neighbor(site).is_some_and(|n| cell.contains_site(n));
            if !shared && !boundary.contains(&e) {
                boundary.push(e);
            }
        }
    }
    boundary
}

/// Append every cell's boundary edges to `roads`, skipping edges already present.
pub fn extend_with_cell_boundaries(
    diagram: &VoronoiDiagram,
    cells: &[CityCell],
    roads: &mut Vec<EdgeId>,
) {
    for cell in cells {
        for e in cell_boundary_edges(diagram, cell) {
            if !roads.contains(&e) {
                roads.push(e);
            }
        }
    }
}

/// Fix each cell's boundary edge list.
pub fn refine_city_cells(diagram: &VoronoiDiagram, cells: &mut [CityCell]) {
    for cell in cells.iter_mut() {
        cell.boundary_edges = cell_boundary_edges(diagram, cell);
    }
}

/// Primary road graph over the boundary edges of every refined cell.
///
/// Endpoints within [`PRIMARY_VERTEX_EPSILON`] share a vertex, so an edge bordering two
/// cells appears once.
pub fn build_primary_graph(
    diagram: &VoronoiDiagram,
    cells: &[CityCell],
) -> Result<RoadGraph, GenerationError> {
    let mut graph = RoadGraph::new();
    for cell in cells {
        for &e in &cell.boundary_edges {
            let Some(seg) = diagram.edge(e).clipped else {
                continue;
            };
            let a = graph.insert_vertex_dedup(seg.start, PRIMARY_VERTEX_EPSILON);
            let b = graph.insert_vertex_dedup(seg.end, PRIMARY_VERTEX_EPSILON);
            if a != b {
                graph.add_edge(a, b)?;
            }
        }
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn diagram(seed: u64) -> VoronoiDiagram {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let sample = PoissonSampler::new(60.0, DVec2::splat(720.0), 30)
            .sample(&mut rng)
            .unwrap();
        VoronoiDiagram::build(&sample.points, DVec2::splat(720.0), 2).unwrap()
    }

    #[test]
    fn test_classification_partitions_sites() {
        let d = diagram(1);
        let c = classify_boundary_sites(&d);
        assert_eq!(c.outer.len() + c.inner.len(), d.sites().len());
        assert!(!c.outer.is_empty() && !c.inner.is_empty());
        for &s in &c.outer {
            assert!(c.is_outer(s));
        }
        for &s in &c.inner {
            assert!(!c.is_outer(s));
            for &e in &d.site(s).edges {
                assert!(!d.is_boundary_edge(e), "inner site {s:?} has a boundary edge");
            }
        }
    }

    #[test]
    fn test_outer_roads_face_inward() {
        let d = diagram(2);
        let c = classify_boundary_sites(&d);
        let roads = extract_outer_roads(&d, &c);
        assert!(!roads.is_empty());
        for &e in &roads {
            let edge = d.edge(e);
            assert!(edge.clipped.is_some());
            assert_ne!(
                c.is_outer(edge.left),
                c.is_outer(edge.right),
                "outer road {e:?} must separate the ring from the interior"
            );
        }
    }

    #[test]
    fn test_every_inner_site_in_exactly_one_cell() {
        let d = diagram(3);
        let c = classify_boundary_sites(&d);
        let roads = extract_outer_roads(&d, &c);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let divider = build_divider(&mut rng, &d, &roads, &Config::default()).unwrap();
        let cells = group_into_city_cells(&d, &c, &divider);

        for &site in &c.inner {
            let owners = cells.iter().filter(|cell| cell.contains_site(site)).count();
            assert_eq!(owners, 1, "inner site {site:?} belongs to {owners} cells");
        }
        let grouped: usize = cells.iter().map(|cell| cell.sites.len()).sum();
        assert_eq!(grouped, c.inner.len());
    }

    #[test]
    fn test_primary_graph_is_deduplicated() {
        let d = diagram(4);
        let c = classify_boundary_sites(&d);
        let roads = extract_outer_roads(&d, &c);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let divider = build_divider(&mut rng, &d, &roads, &Config::default()).unwrap();
        let mut cells = group_into_city_cells(&d, &c, &divider);
        refine_city_cells(&d, &mut cells);
        let graph = build_primary_graph(&d, &cells).unwrap();

        let vertices = graph.vertices();
        for (i, a) in vertices.iter().enumerate() {
            for b in &vertices[i + 1..] {
                assert!(a.position.distance(b.position) > PRIMARY_VERTEX_EPSILON);
            }
        }
        let edges = graph.edges();
        for (i, a) in edges.iter().enumerate() {
            assert!(!edges[i + 1..].contains(a), "duplicate edge {a:?}");
        }
    }

    #[test]
    fn test_cell_boundary_contains_outer_roads() {
        let d = diagram(5);
        let c = classify_boundary_sites(&d);
        let roads = extract_outer_roads(&d, &c);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let divider = build_divider(&mut rng, &d, &roads, &Config::default()).unwrap();
        let mut cells = group_into_city_cells(&d, &c, &divider);
        refine_city_cells(&d, &mut cells);

        for &e in &roads {
            assert!(
                cells.iter().any(|cell| cell.boundary_edges.contains(&e)),
                "outer road {e:?} is not on any cell boundary"
            );
        }
    }
}
