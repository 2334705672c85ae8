//! Progress reporting hooks for step-by-step visualisation.

use std::fmt;

use crate::city_cell::CityCellId;

/// Pipeline stages in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GenerationStage {
    InitialPoints,
    Voronoi,
    BoundaryRoads,
    CityCells,
    CellBoundaryRoads,
    RefinedCells,
    SecondaryRoads,
    SecondaryGraphs,
    Connectors,
}

impl GenerationStage {
    pub const ALL: [GenerationStage; 9] = [
        GenerationStage::InitialPoints,
        GenerationStage::Voronoi,
        GenerationStage::BoundaryRoads,
        GenerationStage::CityCells,
        GenerationStage::CellBoundaryRoads,
        GenerationStage::RefinedCells,
        GenerationStage::SecondaryRoads,
        GenerationStage::SecondaryGraphs,
        GenerationStage::Connectors,
    ];

    /// The stage that must have completed before this one can run.
    pub fn prerequisite(self) -> Option<GenerationStage> {
        let index = Self::ALL.iter().position(|&s| s == self)?;
        index.checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn name(self) -> &'static str {
        match self {
            GenerationStage::InitialPoints => "generate_initial_points",
            GenerationStage::Voronoi => "generate_voronoi",
            GenerationStage::BoundaryRoads => "set_boundary_as_primary_road",
            GenerationStage::CityCells => "group_into_city_cells",
            GenerationStage::CellBoundaryRoads => "set_city_cell_boundary_as_primary_road",
            GenerationStage::RefinedCells => "refine_city_cells",
            GenerationStage::SecondaryRoads => "generate_secondary_roads",
            GenerationStage::SecondaryGraphs => "generate_secondary_road_graphs",
            GenerationStage::Connectors => "resolve_connectors",
        }
    }
}

impl fmt::Display for GenerationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One growth event of the secondary road grower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrowthEvent {
    pub cell: CityCellId,
    /// Vertex the event grew from.
    pub from: usize,
    pub depth: u32,
    /// Candidates proposed by this event.
    pub proposals: usize,
    /// Candidates that changed the network.
    pub applied: usize,
}

/// Receives progress callbacks while the pipeline runs.
///
/// Both methods default to doing nothing. `()` is the no-op observer.
pub trait GenerationObserver {
    /// Called after a stage completes.
    fn on_stage(&mut self, _stage: GenerationStage) {}

    /// Called after every growth event of the secondary road grower.
    fn on_growth_step(&mut self, _event: &GrowthEvent) {}
}

impl GenerationObserver for () {}
