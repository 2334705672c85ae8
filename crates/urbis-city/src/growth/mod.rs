//! Stochastic grid growth of secondary roads inside a city cell.
//!
//! Every boundary edge of the cell gets a seed at its midpoint. From each seed a
//! depth-first walk proposes candidate positions ([`proposal`]), classifies them against
//! the network built so far ([`validate`]) and applies the result before moving on. The
//! walk runs on an explicit stack, so growth depth is bounded by configuration only.

mod network;
mod proposal;
mod validate;

pub use network::{SecondaryNetwork, SeedVertices};
pub use proposal::{Direction, Proposal, StepLength, propose};
pub use validate::{DestroyReason, MAX_DEGREE, SnapRules, VertexSnapAction};

use rand::Rng;
use urbis_config::{GridGrowthBoundary, GridGrowthProp, Probability};
use urbis_voronoi::EdgeId;

use crate::city_cell::{CellGeometry, CityCellId};
use crate::connector::ConnectorTracker;
use crate::error::{GenerationError, GraphError};
use crate::graph::IndexedEdge;
use crate::observer::{GenerationObserver, GrowthEvent};

/// One pending growth step.
#[derive(Clone, Debug)]
struct GrowthTask {
    from: usize,
    prev: usize,
    depth: u32,
    /// Probability override; `None` uses the configured default.
    prob: Option<Probability>,
    /// Boundary edge the walk was seeded on, while still growing from the seed vertex.
    boundary: Option<EdgeId>,
}

/// Network changes produced by one applied action.
struct Applied {
    /// The new edge leaving the source vertex.
    from_edge: IndexedEdge,
    /// A fresh vertex to keep growing from.
    child: Option<usize>,
}

/// Grows secondary road networks with fixed growth parameters.
#[derive(Clone, Debug)]
pub struct SecondaryRoadGrower {
    growth: GridGrowthProp,
    boundary: GridGrowthBoundary,
    lengths: StepLength,
}

impl SecondaryRoadGrower {
    pub fn new(
        growth: &GridGrowthProp,
        boundary: &GridGrowthBoundary,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            growth: growth.clone(),
            boundary: boundary.clone(),
            lengths: StepLength::new(growth)?,
        })
    }

    /// Grow the secondary network of one cell.
    ///
    /// Boundary edges are seeded shortest first; each seed walk runs to completion before
    /// the next edge is seeded. Connector records go to `connectors`.
    pub fn grow_cell<R, O>(
        &self,
        rng: &mut R,
        cell: CityCellId,
        geometry: &CellGeometry,
        connectors: &mut ConnectorTracker,
        observer: &mut O,
    ) -> Result<SecondaryNetwork, GenerationError>
    where
        R: Rng,
        O: GenerationObserver + ?Sized,
    {
        let mut network = SecondaryNetwork::new();

        let mut boundary = geometry.boundary().to_vec();
        boundary.sort_by(|a, b| a.segment.length().total_cmp(&b.segment.length()));

        for side in &boundary {
            let seed = network.add_vertex(side.segment.midpoint());
            let anchor = network.add_vertex(side.segment.start);
            network.add_seed(SeedVertices {
                edge: side.edge,
                seed,
                anchor,
            });

            let mut stack = vec![GrowthTask {
                from: seed,
                prev: anchor,
                depth: 1,
                prob: Some(Probability::BOUNDARY_SEED),
                boundary: Some(side.edge),
            }];
            while let Some(task) = stack.pop() {
                if task.depth > self.growth.depth {
                    continue;
                }
                self.step(rng, cell, geometry, &mut network, connectors, observer, task, &mut stack)?;
            }
        }

        tracing::debug!(
            cell = cell.0,
            seeds = network.seeds().len(),
            vertices = network.vertex_count(),
            edges = network.edge_count(),
            "secondary network grown"
        );
        Ok(network)
    }

    #[allow(clippy::too_many_arguments)]
    fn step<R, O>(
        &self,
        rng: &mut R,
        cell: CityCellId,
        geometry: &CellGeometry,
        network: &mut SecondaryNetwork,
        connectors: &mut ConnectorTracker,
        observer: &mut O,
        task: GrowthTask,
        stack: &mut Vec<GrowthTask>,
    ) -> Result<(), GenerationError>
    where
        R: Rng,
        O: GenerationObserver + ?Sized,
    {
        let from_pos = network.position(task.from)?;
        let prev_pos = network.position(task.prev)?;
        let prob = task.prob.as_ref().unwrap_or(&self.growth.default_prob);
        let proposals = propose(rng, from_pos, prev_pos, prob, &self.growth, &self.lengths);

        let mut children = Vec::new();
        let mut applied = 0;
        for proposal in &proposals {
            let action = SnapRules {
                network: &*network,
                geometry,
                bounds: &self.boundary,
            }
            .resolve(task.from, proposal.position)?;
            tracing::trace!(
                cell = cell.0,
                from = task.from,
                depth = task.depth,
                direction = ?proposal.direction,
                ?action,
                "growth candidate"
            );

            let Some(outcome) = apply(network, connectors, cell, task.from, action)? else {
                continue;
            };
            applied += 1;
            if let Some(edge) = task.boundary {
                connectors.record(cell, edge, outcome.from_edge);
            }
            children.extend(outcome.child);
        }

        observer.on_growth_step(&GrowthEvent {
            cell,
            from: task.from,
            depth: task.depth,
            proposals: proposals.len(),
            applied,
        });

        if applied == 0 {
            stack.push(GrowthTask {
                depth: task.depth + 1,
                prob: None,
                ..task
            });
        } else {
            // Reversed so the first child is grown first.
            stack.extend(children.into_iter().rev().map(|child| GrowthTask {
                from: child,
                prev: task.from,
                depth: task.depth + 1,
                prob: None,
                boundary: None,
            }));
        }
        Ok(())
    }
}

/// Mutate the network according to `action`. Returns `None` for discarded candidates.
fn apply(
    network: &mut SecondaryNetwork,
    connectors: &mut ConnectorTracker,
    cell: CityCellId,
    from: usize,
    action: VertexSnapAction,
) -> Result<Option<Applied>, GraphError> {
    let applied = match action {
        VertexSnapAction::New { position } => {
            let v = network.add_vertex(position);
            Applied {
                from_edge: network.add_edge(from, v)?,
                child: Some(v),
            }
        }
        VertexSnapAction::DivideTargetEdge { edge, position } => {
            let m = network.add_vertex(position);
            split_edge(network, connectors, cell, edge, m)?;
            Applied {
                from_edge: network.add_edge(from, m)?,
                child: None,
            }
        }
        VertexSnapAction::DivideSourceEdge { via, end } => {
            let v = network.add_vertex(end);
            let from_edge = network.add_edge(from, via)?;
            network.add_edge(via, v)?;
            Applied {
                from_edge,
                child: None,
            }
        }
        VertexSnapAction::DivideSourceEdgeNew {
            edge,
            crossing,
            end,
        } => {
            let x = network.add_vertex(crossing);
            let v = network.add_vertex(end);
            let from_edge = network.add_edge(from, x)?;
            network.add_edge(x, v)?;
            split_edge(network, connectors, cell, edge, x)?;
            Applied {
                from_edge,
                child: None,
            }
        }
        VertexSnapAction::MergeVertex { target } => Applied {
            from_edge: network.add_edge(from, target)?,
            child: None,
        },
        VertexSnapAction::Destroy(_) => return Ok(None),
    };
    Ok(Some(applied))
}

/// Replace `edge` by two halves meeting at `m`, keeping connector records valid.
fn split_edge(
    network: &mut SecondaryNetwork,
    connectors: &mut ConnectorTracker,
    cell: CityCellId,
    edge: IndexedEdge,
    m: usize,
) -> Result<(), GraphError> {
    network.remove_edge(edge)?;
    network.add_edge(edge.start, m)?;
    network.add_edge(m, edge.end)?;
    connectors.redirect(cell, edge, m);
    Ok(())
}
