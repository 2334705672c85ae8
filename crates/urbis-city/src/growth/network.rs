//! The growing secondary road network of one city cell.

use glam::DVec2;
use urbis_voronoi::EdgeId;

use crate::error::GraphError;
use crate::graph::{IndexedEdge, RoadGraph};

/// The two vertices placed on a boundary edge before growth starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedVertices {
    pub edge: EdgeId,
    /// Midpoint of the boundary edge; growth starts here.
    pub seed: usize,
    /// Start of the boundary edge; only fixes the initial heading.
    pub anchor: usize,
}

/// Vertex and directed edge lists of a secondary network under construction.
///
/// Degrees are tracked alongside the edges so validation does not rescan the edge list.
#[derive(Clone, Debug, Default)]
pub struct SecondaryNetwork {
    vertices: Vec<DVec2>,
    edges: Vec<IndexedEdge>,
    degree: Vec<usize>,
    seeds: Vec<SeedVertices>,
}

impl SecondaryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vertex(&mut self, position: DVec2) -> usize {
        self.vertices.push(position);
        self.degree.push(0);
        self.vertices.len() - 1
    }

    pub(crate) fn add_seed(&mut self, seed: SeedVertices) {
        self.seeds.push(seed);
    }

    pub fn position(&self, index: usize) -> Result<DVec2, GraphError> {
        self.vertices
            .get(index)
            .copied()
            .ok_or(GraphError::VertexOutOfRange {
                index,
                len: self.vertices.len(),
            })
    }

    pub fn add_edge(&mut self, start: usize, end: usize) -> Result<IndexedEdge, GraphError> {
        self.position(start)?;
        self.position(end)?;
        if start == end {
            return Err(GraphError::SelfLoop { vertex: start });
        }
        let edge = IndexedEdge::new(start, end);
        self.edges.push(edge);
        self.degree[start] += 1;
        self.degree[end] += 1;
        Ok(edge)
    }

    /// Remove `edge`, matching either direction. The order of the other edges is kept.
    pub fn remove_edge(&mut self, edge: IndexedEdge) -> Result<(), GraphError> {
        let index = self
            .edges
            .iter()
            .position(|e| e.same_endpoints(&edge))
            .ok_or(GraphError::MissingEdge {
                start: edge.start,
                end: edge.end,
            })?;
        let removed = self.edges.remove(index);
        self.degree[removed.start] -= 1;
        self.degree[removed.end] -= 1;
        Ok(())
    }

    /// Number of edges touching `index`; zero for unknown vertices.
    pub fn degree(&self, index: usize) -> usize {
        self.degree.get(index).copied().unwrap_or(0)
    }

    pub fn connected(&self, a: usize, b: usize) -> bool {
        let pair = IndexedEdge::new(a, b);
        self.edges.iter().any(|e| e.same_endpoints(&pair))
    }

    pub fn vertices(&self) -> &[DVec2] {
        &self.vertices
    }

    pub fn edges(&self) -> &[IndexedEdge] {
        &self.edges
    }

    pub fn seeds(&self) -> &[SeedVertices] {
        &self.seeds
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Freeze into a [`RoadGraph`]. Vertex indices are preserved.
    pub fn to_graph(&self) -> Result<RoadGraph, GraphError> {
        RoadGraph::from_indexed(
            self.vertices.clone(),
            self.edges.iter().map(|e| (e.start, e.end)),
        )
    }
}
