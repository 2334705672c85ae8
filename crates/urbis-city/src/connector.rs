//! Links between secondary road networks and the primary roads they grow from.

use urbis_voronoi::{EdgeId, VoronoiDiagram};

use crate::city_cell::CityCellId;
use crate::graph::{IndexedEdge, RoadGraph};
use crate::primary::PRIMARY_VERTEX_EPSILON;

/// Where a secondary network attaches to the primary network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectorInfo {
    /// The Voronoi edge the seed was placed on.
    pub primary_edge: EdgeId,
    /// The first secondary edge grown from the seed. `start` is the seed vertex.
    pub secondary_edge: IndexedEdge,
    pub cell: CityCellId,
    /// Index of `primary_edge` in the primary road graph, once resolved.
    pub primary_graph_edge: Option<usize>,
}

/// Connector records accumulated during secondary growth.
#[derive(Clone, Debug, Default)]
pub struct ConnectorTracker {
    records: Vec<ConnectorInfo>,
}

impl ConnectorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, cell: CityCellId, primary_edge: EdgeId, secondary_edge: IndexedEdge) {
        tracing::trace!(
            cell = cell.0,
            primary_edge = primary_edge.0,
            start = secondary_edge.start,
            end = secondary_edge.end,
            "connector recorded"
        );
        self.records.push(ConnectorInfo {
            primary_edge,
            secondary_edge,
            cell,
            primary_graph_edge: None,
        });
    }

    /// Follow a split of `old` at vertex `split`.
    ///
    /// The half that keeps the seed vertex replaces the recorded edge.
    pub fn redirect(&mut self, cell: CityCellId, old: IndexedEdge, split: usize) {
        for info in self
            .records
            .iter_mut()
            .filter(|info| info.cell == cell && info.secondary_edge.same_endpoints(&old))
        {
            info.secondary_edge.end = split;
        }
    }

    /// Look up every record's primary edge in the primary road graph.
    ///
    /// Returns how many records could not be matched.
    pub fn resolve_primary(&mut self, diagram: &VoronoiDiagram, primary: &RoadGraph) -> usize {
        let mut unresolved = 0;
        for info in &mut self.records {
            info.primary_graph_edge = diagram
                .get_edge(info.primary_edge)
                .and_then(|edge| edge.clipped)
                .and_then(|seg| primary.find_edge_near(seg.start, seg.end, PRIMARY_VERTEX_EPSILON));
            if info.primary_graph_edge.is_none() {
                unresolved += 1;
            }
        }
        unresolved
    }

    pub fn records(&self) -> &[ConnectorInfo] {
        &self.records
    }

    pub fn for_cell(&self, cell: CityCellId) -> impl Iterator<Item = &ConnectorInfo> + '_ {
        self.records.iter().filter(move |info| info.cell == cell)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
