//! Decomposition of a road graph into polylines for spline fitting.

use crate::graph::RoadGraph;

/// A maximal run of edges whose interior vertices all have degree 2.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoadChain {
    /// Vertex indices in walk order. A closed chain repeats its first vertex at the end.
    pub vertices: Vec<usize>,
    /// Edge indices in walk order.
    pub edges: Vec<usize>,
}

impl RoadChain {
    pub fn is_closed(&self) -> bool {
        self.vertices.len() > 2 && self.vertices.first() == self.vertices.last()
    }
}

impl<P> RoadGraph<P> {
    /// Vertices where three or more roads meet.
    pub fn junctions(&self) -> Vec<usize> {
        self.vertices()
            .iter()
            .enumerate()
            .filter(|(_, v)| v.connected_edges.len() >= 3)
            .map(|(i, _)| i)
            .collect()
    }

    /// Split the graph into chains that start and end at junctions or dead ends, plus
    /// closed loops made only of degree-2 vertices. Every edge belongs to exactly one chain.
    pub fn chains(&self) -> Vec<RoadChain> {
        let mut visited = vec![false; self.edge_count()];
        let mut chains = Vec::new();

        let is_anchor = |v: usize| self.vertices()[v].connected_edges.len() != 2;

        for start in (0..self.vertex_count()).filter(|&v| is_anchor(v)) {
            for &first in &self.vertices()[start].connected_edges {
                if !visited[first] {
                    chains.push(self.walk(start, first, &mut visited, is_anchor));
                }
            }
        }

        // What is left are loops without any anchor vertex.
        for first in 0..self.edge_count() {
            if !visited[first] {
                let start = self.edges()[first].v1;
                chains.push(self.walk(start, first, &mut visited, is_anchor));
            }
        }

        chains
    }

    fn walk(
        &self,
        start: usize,
        first: usize,
        visited: &mut [bool],
        is_anchor: impl Fn(usize) -> bool,
    ) -> RoadChain {
        let mut chain = RoadChain {
            vertices: vec![start],
            edges: Vec::new(),
        };
        let mut current = start;
        let mut edge = first;

        loop {
            visited[edge] = true;
            chain.edges.push(edge);
            let Some(next) = self.edges()[edge].other(current) else {
                break;
            };
            chain.vertices.push(next);
            if next == start || is_anchor(next) {
                break;
            }
            let onward = self.vertices()[next]
                .connected_edges
                .iter()
                .copied()
                .find(|&e| e != edge && !visited[e]);
            match onward {
                Some(e) => {
                    current = next;
                    edge = e;
                }
                None => break,
            }
        }

        chain
    }
}
