//! Snapping rules that decide what a growth candidate does to the network.

use glam::DVec2;
use urbis_config::GridGrowthBoundary;
use urbis_geometry::{point_segment_distance, point_segment_projection, segment_intersection};

use crate::city_cell::CellGeometry;
use crate::error::GraphError;
use crate::graph::IndexedEdge;

use super::network::SecondaryNetwork;

/// Highest degree a secondary vertex may reach.
pub const MAX_DEGREE: usize = 4;

/// Why a candidate was discarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DestroyReason {
    /// The candidate lies outside the city cell.
    OutsideCell,
    /// The source vertex already has the maximum degree.
    SourceSaturated,
    /// The merge target already has the maximum degree.
    TargetSaturated,
    /// The merge target is the source or already adjacent to it.
    AlreadyConnected,
    /// The road to the merge target crosses another road.
    MergeBlocked,
    /// Too close to an existing vertex to stand alone, too far to merge.
    TooClose,
    /// The projection onto the nearest edge is unusable.
    DivideOutOfRange,
    /// The road to the split point crosses another road.
    DivideBlocked,
    /// A single crossing that could not be turned into a junction.
    Crossing,
    MultipleCrossings,
}

/// What to do with a candidate position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VertexSnapAction {
    /// Add a vertex at `position` and connect it to the source.
    New { position: DVec2 },
    /// Split `edge` at `position` and connect the split vertex to the source.
    DivideTargetEdge { edge: IndexedEdge, position: DVec2 },
    /// Route through the existing vertex `via`, then continue to a new vertex at `end`.
    DivideSourceEdge { via: usize, end: DVec2 },
    /// Split `edge` at the crossing, route through it, then continue to a new vertex at `end`.
    DivideSourceEdgeNew {
        edge: IndexedEdge,
        crossing: DVec2,
        end: DVec2,
    },
    /// Connect the source to the existing vertex `target`.
    MergeVertex { target: usize },
    Destroy(DestroyReason),
}

impl VertexSnapAction {
    pub fn is_destroy(&self) -> bool {
        matches!(self, VertexSnapAction::Destroy(_))
    }
}

/// Resolves candidates against one network and cell.
pub struct SnapRules<'a> {
    pub network: &'a SecondaryNetwork,
    pub geometry: &'a CellGeometry,
    pub bounds: &'a GridGrowthBoundary,
}

impl SnapRules<'_> {
    /// Classify a candidate `p` grown from vertex `from`.
    ///
    /// Rules are tried in order: containment, source degree, vertex merge, vertex
    /// proximity, edge split, then crossings along the new road.
    pub fn resolve(&self, from: usize, p: DVec2) -> Result<VertexSnapAction, GraphError> {
        use DestroyReason::*;
        use VertexSnapAction::*;

        let net = self.network;
        let origin = net.position(from)?;

        if !self.geometry.contains(p) {
            return Ok(Destroy(OutsideCell));
        }
        if net.degree(from) >= MAX_DEGREE {
            return Ok(Destroy(SourceSaturated));
        }

        if let Some((target, distance)) = self.closest_vertex(p)? {
            if distance < self.bounds.vertex_merge {
                if net.degree(target) >= MAX_DEGREE {
                    return Ok(Destroy(TargetSaturated));
                }
                if target == from || net.connected(from, target) {
                    return Ok(Destroy(AlreadyConnected));
                }
                let target_pos = net.position(target)?;
                let blocked = self.crosses(origin, target_pos, |e| e.touches(from) || e.touches(target))?;
                return Ok(if blocked {
                    Destroy(MergeBlocked)
                } else {
                    MergeVertex { target }
                });
            }
            if distance < self.bounds.vertex_destroy {
                return Ok(Destroy(TooClose));
            }
        }

        if let Some((edge, distance)) = self.closest_edge(p)?
            && distance <= self.bounds.edge_divide
        {
            if edge.touches(from) {
                return Ok(Destroy(DivideOutOfRange));
            }
            let projection =
                point_segment_projection(p, net.position(edge.start)?, net.position(edge.end)?);
            if !projection.within || !self.geometry.contains(projection.point) {
                return Ok(Destroy(DivideOutOfRange));
            }
            let blocked = self.crosses(origin, projection.point, |e| {
                e.touches(from) || e.same_endpoints(&edge)
            })?;
            return Ok(if blocked {
                Destroy(DivideBlocked)
            } else {
                DivideTargetEdge {
                    edge,
                    position: projection.point,
                }
            });
        }

        let crossings = self.crossings(origin, p, |e| e.touches(from))?;
        match crossings.as_slice() {
            [] => Ok(New { position: p }),
            [(edge, x)] => self.resolve_single_crossing(from, origin, p, *edge, *x),
            _ => Ok(Destroy(MultipleCrossings)),
        }
    }

    fn resolve_single_crossing(
        &self,
        from: usize,
        origin: DVec2,
        p: DVec2,
        edge: IndexedEdge,
        x: DVec2,
    ) -> Result<VertexSnapAction, GraphError> {
        let net = self.network;
        let bounds = self.bounds;
        let a = net.position(edge.start)?;
        let b = net.position(edge.end)?;

        let (via, via_pos) = if x.distance(a) <= x.distance(b) {
            (edge.start, a)
        } else {
            (edge.end, b)
        };
        if x.distance(via_pos) <= bounds.intersect_merge
            && net.degree(via) <= MAX_DEGREE - 2
            && !net.connected(from, via)
            && !self.crosses(origin, via_pos, |e| e.touches(from) || e.touches(via))?
            && !self.crosses(via_pos, p, |e| e.touches(via))?
        {
            return Ok(VertexSnapAction::DivideSourceEdge { via, end: p });
        }

        let spacing = bounds.vertex_merge;
        if x.distance(origin) >= spacing
            && p.distance(x) >= spacing
            && x.distance(a) >= spacing
            && x.distance(b) >= spacing
            && self.geometry.contains(x)
        {
            return Ok(VertexSnapAction::DivideSourceEdgeNew {
                edge,
                crossing: x,
                end: p,
            });
        }

        Ok(VertexSnapAction::Destroy(DestroyReason::Crossing))
    }

    /// Nearest vertex that is an endpoint of some edge.
    fn closest_vertex(&self, p: DVec2) -> Result<Option<(usize, f64)>, GraphError> {
        let mut best: Option<(usize, f64)> = None;
        for edge in self.network.edges() {
            for v in [edge.start, edge.end] {
                let d = self.network.position(v)?.distance(p);
                if best.is_none_or(|(_, bd)| d < bd) {
                    best = Some((v, d));
                }
            }
        }
        Ok(best)
    }

    fn closest_edge(&self, p: DVec2) -> Result<Option<(IndexedEdge, f64)>, GraphError> {
        let mut best: Option<(IndexedEdge, f64)> = None;
        for &edge in self.network.edges() {
            let d = point_segment_distance(
                p,
                self.network.position(edge.start)?,
                self.network.position(edge.end)?,
            );
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((edge, d));
            }
        }
        Ok(best)
    }

    fn crossings(
        &self,
        a: DVec2,
        b: DVec2,
        skip: impl Fn(&IndexedEdge) -> bool,
    ) -> Result<Vec<(IndexedEdge, DVec2)>, GraphError> {
        let mut hits = Vec::new();
        for &edge in self.network.edges() {
            if skip(&edge) {
                continue;
            }
            let s = self.network.position(edge.start)?;
            let e = self.network.position(edge.end)?;
            if let Some(x) = segment_intersection(a, b, s, e) {
                hits.push((edge, x));
            }
        }
        Ok(hits)
    }

    fn crosses(
        &self,
        a: DVec2,
        b: DVec2,
        skip: impl Fn(&IndexedEdge) -> bool,
    ) -> Result<bool, GraphError> {
        Ok(!self.crossings(a, b, skip)?.is_empty())
    }
}
