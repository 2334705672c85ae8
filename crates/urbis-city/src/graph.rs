//! Index-based road graph shared by the primary and secondary stages.

use std::hash::{Hash, Hasher};

use glam::{DVec2, DVec3};
use hashbrown::HashMap;
use urbis_geometry::{PlaneTransform, Segment};

use crate::error::GraphError;

/// Directed vertex pair used while a network is still growing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexedEdge {
    pub start: usize,
    pub end: usize,
}

impl IndexedEdge {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn touches(&self, vertex: usize) -> bool {
        self.start == vertex || self.end == vertex
    }

    /// Same endpoints in either order.
    pub fn same_endpoints(&self, other: &IndexedEdge) -> bool {
        self.unordered() == other.unordered()
    }

    pub fn unordered(&self) -> UIndexedEdge {
        UIndexedEdge::new(self.start, self.end)
    }
}

/// Undirected edge: `(a, b)` equals `(b, a)`.
#[derive(Clone, Copy, Debug, Eq)]
pub struct UIndexedEdge {
    pub v1: usize,
    pub v2: usize,
}

impl UIndexedEdge {
    pub fn new(v1: usize, v2: usize) -> Self {
        Self { v1, v2 }
    }

    pub fn touches(&self, vertex: usize) -> bool {
        self.v1 == vertex || self.v2 == vertex
    }

    /// The endpoint opposite `vertex`, if `vertex` is an endpoint.
    pub fn other(&self, vertex: usize) -> Option<usize> {
        if self.v1 == vertex {
            Some(self.v2)
        } else if self.v2 == vertex {
            Some(self.v1)
        } else {
            None
        }
    }

    fn key(&self) -> (usize, usize) {
        (self.v1.min(self.v2), self.v1.max(self.v2))
    }
}

impl PartialEq for UIndexedEdge {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Hash for UIndexedEdge {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// A graph vertex with back-references to its incident edges.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex<P> {
    pub position: P,
    pub connected_edges: Vec<usize>,
}

/// Vertex and edge lists with index-based topology.
///
/// Every edge references two distinct, valid vertex indices; no two edges share the same
/// unordered endpoint pair; each vertex's `connected_edges` lists exactly the edges that
/// reference it.
#[derive(Clone, Debug)]
pub struct RoadGraph<P = DVec2> {
    vertices: Vec<Vertex<P>>,
    edges: Vec<UIndexedEdge>,
    edge_index: HashMap<UIndexedEdge, usize>,
}

impl<P> Default for RoadGraph<P> {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            edge_index: HashMap::new(),
        }
    }
}

impl<P: PartialEq> PartialEq for RoadGraph<P> {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices && self.edges == other.edges
    }
}

impl<P> RoadGraph<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from positions and vertex pairs.
    ///
    /// Self-loops and repeated pairs are dropped; incidence lists are rebuilt from the
    /// surviving edges.
    pub fn from_indexed(
        positions: Vec<P>,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self {
            vertices: positions
                .into_iter()
                .map(|position| Vertex {
                    position,
                    connected_edges: Vec::new(),
                })
                .collect(),
            edges: Vec::new(),
            edge_index: HashMap::new(),
        };
        for (a, b) in pairs {
            graph.check_vertex(a)?;
            graph.check_vertex(b)?;
            if a == b {
                continue;
            }
            graph.add_edge(a, b)?;
        }
        Ok(graph)
    }

    pub fn vertices(&self) -> &[Vertex<P>] {
        &self.vertices
    }

    pub fn edges(&self) -> &[UIndexedEdge] {
        &self.edges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn check_vertex(&self, index: usize) -> Result<(), GraphError> {
        if index < self.vertices.len() {
            Ok(())
        } else {
            Err(GraphError::VertexOutOfRange {
                index,
                len: self.vertices.len(),
            })
        }
    }

    pub fn vertex(&self, index: usize) -> Result<&Vertex<P>, GraphError> {
        self.vertices.get(index).ok_or(GraphError::VertexOutOfRange {
            index,
            len: self.vertices.len(),
        })
    }

    pub fn edge(&self, index: usize) -> Result<UIndexedEdge, GraphError> {
        self.edges
            .get(index)
            .copied()
            .ok_or(GraphError::EdgeOutOfRange {
                index,
                len: self.edges.len(),
            })
    }

    pub fn degree(&self, index: usize) -> Result<usize, GraphError> {
        Ok(self.vertex(index)?.connected_edges.len())
    }

    /// Append a vertex without any proximity check.
    pub fn push_vertex(&mut self, position: P) -> usize {
        self.vertices.push(Vertex {
            position,
            connected_edges: Vec::new(),
        });
        self.vertices.len() - 1
    }

    /// Connect two vertices, returning the index of the new or already existing edge.
    pub fn add_edge(&mut self, a: usize, b: usize) -> Result<usize, GraphError> {
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        if a == b {
            return Err(GraphError::SelfLoop { vertex: a });
        }
        let edge = UIndexedEdge::new(a, b);
        if let Some(&existing) = self.edge_index.get(&edge) {
            return Ok(existing);
        }
        let index = self.edges.len();
        self.edges.push(edge);
        self.edge_index.insert(edge, index);
        self.vertices[a].connected_edges.push(index);
        self.vertices[b].connected_edges.push(index);
        Ok(index)
    }

    /// Index of the edge joining `a` and `b`, in either order.
    pub fn find_edge(&self, a: usize, b: usize) -> Option<usize> {
        self.edge_index.get(&UIndexedEdge::new(a, b)).copied()
    }

    /// Vertices adjacent to `index`.
    pub fn neighbors(&self, index: usize) -> Result<Vec<usize>, GraphError> {
        let vertex = self.vertex(index)?;
        Ok(vertex
            .connected_edges
            .iter()
            .filter_map(|&e| self.edges[e].other(index))
            .collect())
    }

    /// Rebuild every incidence list from the edge list.
    pub fn recompute_incidence(&mut self) {
        for vertex in &mut self.vertices {
            vertex.connected_edges.clear();
        }
        for (i, edge) in self.edges.iter().enumerate() {
            self.vertices[edge.v1].connected_edges.push(i);
            self.vertices[edge.v2].connected_edges.push(i);
        }
    }

    /// Same topology with every position mapped through `f`.
    pub fn map_positions<Q>(&self, mut f: impl FnMut(&P) -> Q) -> RoadGraph<Q> {
        RoadGraph {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex {
                    position: f(&v.position),
                    connected_edges: v.connected_edges.clone(),
                })
                .collect(),
            edges: self.edges.clone(),
            edge_index: self.edge_index.clone(),
        }
    }
}

impl RoadGraph<DVec2> {
    /// First vertex within `eps` of `p`.
    pub fn find_vertex_near(&self, p: DVec2, eps: f64) -> Option<usize> {
        self.vertices
            .iter()
            .position(|v| v.position.distance(p) <= eps)
    }

    /// Reuse a vertex within `eps` of `p`, or append a new one.
    pub fn insert_vertex_dedup(&mut self, p: DVec2, eps: f64) -> usize {
        match self.find_vertex_near(p, eps) {
            Some(index) => index,
            None => self.push_vertex(p),
        }
    }

    /// Edge whose endpoints lie within `eps` of `a` and `b`, in either order.
    pub fn find_edge_near(&self, a: DVec2, b: DVec2, eps: f64) -> Option<usize> {
        let va = self.find_vertex_near(a, eps)?;
        let vb = self.find_vertex_near(b, eps)?;
        self.find_edge(va, vb)
    }

    pub fn position(&self, index: usize) -> Result<DVec2, GraphError> {
        Ok(self.vertex(index)?.position)
    }

    pub fn segment(&self, edge: usize) -> Result<Segment, GraphError> {
        let e = self.edge(edge)?;
        Ok(Segment::new(
            self.vertices[e.v1].position,
            self.vertices[e.v2].position,
        ))
    }

    /// Map the graph into the renderer's world space.
    pub fn to_world(&self, transform: &PlaneTransform) -> RoadGraph<DVec3> {
        self.map_positions(|p| transform.to_world(*p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashbrown::HashSet;

    fn v(x: f64, y: f64) -> DVec2 {
        DVec2::new(x, y)
    }

    #[test]
    fn test_unordered_edge_equality() {
        assert_eq!(UIndexedEdge::new(3, 7), UIndexedEdge::new(7, 3));
        assert_ne!(UIndexedEdge::new(3, 7), UIndexedEdge::new(3, 8));

        let set: HashSet<UIndexedEdge> =
            [UIndexedEdge::new(1, 2), UIndexedEdge::new(2, 1)].into_iter().collect();
        assert_eq!(set.len(), 1, "reversed pairs must hash together");
    }

    #[test]
    fn test_add_edge_dedups_and_tracks_incidence() {
        let mut graph = RoadGraph::new();
        let a = graph.push_vertex(v(0.0, 0.0));
        let b = graph.push_vertex(v(1.0, 0.0));
        let c = graph.push_vertex(v(0.0, 1.0));

        let ab = graph.add_edge(a, b).unwrap();
        assert_eq!(graph.add_edge(b, a).unwrap(), ab);
        graph.add_edge(a, c).unwrap();

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.degree(a).unwrap(), 2);
        assert_eq!(graph.degree(b).unwrap(), 1);
        assert_eq!(graph.neighbors(a).unwrap(), vec![b, c]);
    }

    #[test]
    fn test_out_of_range_vertex_fails_fast() {
        let mut graph: RoadGraph = RoadGraph::new();
        graph.push_vertex(v(0.0, 0.0));
        assert_eq!(
            graph.vertex(5).unwrap_err(),
            GraphError::VertexOutOfRange { index: 5, len: 1 }
        );
        assert!(graph.add_edge(0, 5).is_err());
        assert_eq!(graph.add_edge(0, 0), Err(GraphError::SelfLoop { vertex: 0 }));
    }

    #[test]
    fn test_insert_vertex_dedup() {
        let mut graph = RoadGraph::new();
        let a = graph.insert_vertex_dedup(v(10.0, 10.0), 0.01);
        let b = graph.insert_vertex_dedup(v(10.005, 10.0), 0.01);
        let c = graph.insert_vertex_dedup(v(10.5, 10.0), 0.01);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(graph.vertex_count(), 2);
    }

    #[test]
    fn test_from_indexed_drops_loops_and_duplicates() {
        let graph = RoadGraph::from_indexed(
            vec![v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0)],
            [(0, 1), (1, 0), (1, 1), (1, 2)],
        )
        .unwrap();
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.degree(1).unwrap(), 2);

        let bad = RoadGraph::from_indexed(vec![v(0.0, 0.0)], [(0, 3)]);
        assert!(matches!(bad, Err(GraphError::VertexOutOfRange { index: 3, .. })));
    }

    #[test]
    fn test_find_edge_near() {
        let mut graph = RoadGraph::new();
        let a = graph.push_vertex(v(0.0, 0.0));
        let b = graph.push_vertex(v(5.0, 5.0));
        let e = graph.add_edge(a, b).unwrap();
        assert_eq!(graph.find_edge_near(v(5.001, 5.0), v(0.0, 0.002), 0.01), Some(e));
        assert_eq!(graph.find_edge_near(v(5.0, 5.0), v(9.0, 9.0), 0.01), None);
    }

    #[test]
    fn test_recompute_incidence_matches_incremental() {
        let mut graph = RoadGraph::from_indexed(
            vec![v(0.0, 0.0), v(1.0, 0.0), v(1.0, 1.0), v(0.0, 1.0)],
            [(0, 1), (1, 2), (2, 3), (3, 0)],
        )
        .unwrap();
        let before = graph.clone();
        graph.recompute_incidence();
        assert_eq!(graph, before);
    }

    #[test]
    fn test_to_world_keeps_topology() {
        let graph = RoadGraph::from_indexed(vec![v(0.0, 0.0), v(675.0, 675.0)], [(0, 1)]).unwrap();
        let world = graph.to_world(&PlaneTransform::new(10.0, 1350.0));
        assert_eq!(world.edges(), graph.edges());
        assert!(world.vertex(1).unwrap().position.length() < 1e-9);
    }
}
