//! End-to-end checks of the generation pipeline on small regions.

use urbis_city::{CityGenerator, CityLayout, GenerationError, GenerationStage, RoadGraph};
use urbis_config::Config;
use urbis_geometry::segment_intersection;

const SEEDS: [u64; 3] = [7, 21, 1234];

fn config(seed: u64) -> Config {
    let mut config = Config {
        seed,
        ..Config::default()
    };
    config.sampling.region_width = 900.0;
    config.sampling.region_height = 900.0;
    config.voronoi.lloyd_iterations = 3;
    config.growth.depth = 6;
    config
}

fn generate(seed: u64) -> (CityGenerator, CityLayout) {
    let mut generator = CityGenerator::new(config(seed)).expect("valid config");
    generator.run_all().expect("pipeline runs");
    let layout = generator.layout().expect("all stages ran");
    (generator, layout)
}

fn assert_planar(graph: &RoadGraph, context: &str) {
    let edges = graph.edges();
    for (i, a) in edges.iter().enumerate() {
        for b in &edges[i + 1..] {
            if a.touches(b.v1) || a.touches(b.v2) {
                continue;
            }
            let hit = segment_intersection(
                graph.position(a.v1).unwrap(),
                graph.position(a.v2).unwrap(),
                graph.position(b.v1).unwrap(),
                graph.position(b.v2).unwrap(),
            );
            assert!(hit.is_none(), "{context}: edges {a:?} and {b:?} cross at {hit:?}");
        }
    }
}

#[test]
fn test_every_inner_site_in_one_cell() {
    for seed in SEEDS {
        let (generator, layout) = generate(seed);
        let diagram = generator.diagram().unwrap();
        let classification = generator.classification();
        assert_eq!(
            classification.outer.len() + classification.inner.len(),
            diagram.sites().len()
        );
        for &site in &classification.inner {
            let owners = layout.cells.iter().filter(|c| c.contains_site(site)).count();
            assert_eq!(owners, 1, "seed {seed}: site {site:?} in {owners} cells");
        }
        for &site in &classification.outer {
            assert!(
                layout.cells.iter().all(|c| !c.contains_site(site)),
                "seed {seed}: outer site {site:?} was grouped"
            );
        }
    }
}

#[test]
fn test_primary_graph_has_no_duplicates() {
    for seed in SEEDS {
        let (_, layout) = generate(seed);
        let graph = &layout.primary_graph;
        assert!(graph.edge_count() > 0);

        let vertices = graph.vertices();
        for (i, a) in vertices.iter().enumerate() {
            for b in &vertices[i + 1..] {
                assert!(
                    a.position.distance(b.position) > 0.01,
                    "seed {seed}: vertices {} and {} coincide",
                    a.position,
                    b.position
                );
            }
        }
        let edges = graph.edges();
        for (i, a) in edges.iter().enumerate() {
            assert!(!edges[i + 1..].contains(a), "seed {seed}: duplicate edge {a:?}");
        }
        for (v, vertex) in vertices.iter().enumerate() {
            for &e in &vertex.connected_edges {
                assert!(edges[e].touches(v), "seed {seed}: stale incidence on {v}");
            }
        }
    }
}

#[test]
fn test_secondary_graphs_are_planar() {
    for seed in SEEDS {
        let (_, layout) = generate(seed);
        for (cell, graph) in layout.secondary_graphs.iter().enumerate() {
            assert_planar(graph, &format!("seed {seed}, cell {cell}"));
        }
    }
}

#[test]
fn test_secondary_degree_bound() {
    for seed in SEEDS {
        let (_, layout) = generate(seed);
        for graph in &layout.secondary_graphs {
            for v in 0..graph.vertex_count() {
                let degree = graph.degree(v).unwrap();
                assert!(degree <= 4, "seed {seed}: vertex {v} has degree {degree}");
            }
        }
    }
}

#[test]
fn test_secondary_vertices_stay_in_their_cell() {
    for seed in SEEDS {
        let (generator, layout) = generate(seed);
        let region = generator.diagram().unwrap().bounds();
        for (cell, graph) in layout.secondary_graphs.iter().enumerate() {
            let geometry = &layout.geometries[cell];
            for (v, vertex) in graph.vertices().iter().enumerate() {
                assert!(
                    geometry.contains(vertex.position),
                    "seed {seed}: vertex {v} at {} escaped cell {cell}",
                    vertex.position
                );
                assert!(region.contains(vertex.position));
            }
        }
    }
}

#[test]
fn test_cell_geometry_contains_member_sites() {
    for seed in SEEDS {
        let (generator, layout) = generate(seed);
        let diagram = generator.diagram().unwrap();
        for (cell, geometry) in layout.cells.iter().zip(&layout.geometries) {
            for &site in &cell.sites {
                let position = diagram.site(site).position;
                assert!(geometry.contains(position), "seed {seed}: site {site:?} refused");
                for corner in diagram.site_polygon(site) {
                    let p = position.lerp(corner, 0.8);
                    assert!(geometry.contains(p), "seed {seed}: {p} of site {site:?} refused");
                }
            }
        }
    }
}

#[test]
fn test_every_boundary_edge_is_seeded() {
    let (_, layout) = generate(SEEDS[0]);
    for (cell, seeds) in layout.seeds.iter().enumerate() {
        assert_eq!(seeds.len(), layout.geometries[cell].boundary().len());
    }
}

#[test]
fn test_connectors_reference_existing_edges() {
    for seed in SEEDS {
        let (_, layout) = generate(seed);
        assert!(!layout.connectors.is_empty(), "seed {seed}: no connectors");
        for info in &layout.connectors {
            let graph = layout.secondary_graph(info.cell).unwrap();
            assert!(
                graph
                    .find_edge(info.secondary_edge.start, info.secondary_edge.end)
                    .is_some(),
                "seed {seed}: connector {info:?} lost its secondary edge"
            );
            assert!(
                layout.cells[info.cell.0]
                    .boundary_edges
                    .contains(&info.primary_edge),
                "seed {seed}: connector {info:?} is not on its cell boundary"
            );
            if let Some(e) = info.primary_graph_edge {
                assert!(e < layout.primary_graph.edge_count());
            }
        }
        let resolved = layout
            .connectors
            .iter()
            .filter(|c| c.primary_graph_edge.is_some())
            .count();
        assert!(resolved > 0, "seed {seed}: no connector was resolved");
    }
}

#[test]
fn test_same_seed_same_city() {
    let (_, a) = generate(99);
    let (_, b) = generate(99);
    assert_eq!(a.primary_graph, b.primary_graph);
    assert_eq!(a.secondary_graphs, b.secondary_graphs);
    assert_eq!(a.connectors, b.connectors);
}

#[test]
fn test_world_mapping_keeps_topology() {
    let (_, layout) = generate(SEEDS[1]);
    let world = layout.primary_graph.to_world(&layout.transform);
    assert_eq!(world.edges(), layout.primary_graph.edges());
    for (planar, mapped) in layout.primary_graph.vertices().iter().zip(world.vertices()) {
        let back = layout.transform.to_plane(mapped.position);
        assert!((back - planar.position).length() < 1e-6);
    }
}

#[test]
fn test_chains_cover_primary_graph() {
    let (_, layout) = generate(SEEDS[2]);
    let chains = layout.primary_graph.chains();
    let covered: usize = chains.iter().map(|c| c.edges.len()).sum();
    assert_eq!(covered, layout.primary_graph.edge_count());
}

#[test]
fn test_stage_order_is_enforced() {
    let mut generator = CityGenerator::new(config(1)).unwrap();
    match generator.generate_secondary_roads() {
        Err(GenerationError::StageOrder { stage, requires }) => {
            assert_eq!(stage, GenerationStage::SecondaryRoads);
            assert_eq!(requires, GenerationStage::RefinedCells);
        }
        other => panic!("expected a stage order error, got {other:?}"),
    }
}
