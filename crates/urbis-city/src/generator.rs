//! The step-wise generation pipeline.

use glam::DVec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use urbis_config::Config;
use urbis_geometry::PlaneTransform;
use urbis_voronoi::{EdgeId, PoissonSampler, VoronoiDiagram};

use crate::city_cell::{CellGeometry, CityCell, CityCellId};
use crate::connector::{ConnectorInfo, ConnectorTracker};
use crate::error::GenerationError;
use crate::graph::RoadGraph;
use crate::growth::{SecondaryNetwork, SecondaryRoadGrower, SeedVertices};
use crate::observer::{GenerationObserver, GenerationStage};
use crate::primary::{self, SiteClassification};

/// Everything a consumer needs to render a generated city.
#[derive(Clone, Debug)]
pub struct CityLayout {
    pub primary_graph: RoadGraph,
    /// One graph per city cell, indexed by [`CityCellId`].
    pub secondary_graphs: Vec<RoadGraph>,
    pub cells: Vec<CityCell>,
    pub geometries: Vec<CellGeometry>,
    pub connectors: Vec<ConnectorInfo>,
    /// Boundary seed vertices per cell, indexing into the matching secondary graph.
    pub seeds: Vec<Vec<SeedVertices>>,
    pub transform: PlaneTransform,
}

impl CityLayout {
    pub fn secondary_graph(&self, cell: CityCellId) -> Option<&RoadGraph> {
        self.secondary_graphs.get(cell.0)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn secondary_edge_count(&self) -> usize {
        self.secondary_graphs.iter().map(RoadGraph::edge_count).sum()
    }
}

/// Procedural city road generator.
///
/// Stages run in a fixed order; each one checks that its prerequisite has completed.
/// All randomness comes from one ChaCha stream seeded with `config.seed`, so a given
/// configuration always produces the same city.
pub struct CityGenerator {
    config: Config,
    rng: ChaCha8Rng,
    progress: Option<GenerationStage>,

    points: Vec<DVec2>,
    diagram: Option<VoronoiDiagram>,
    classification: SiteClassification,
    outer_roads: Vec<EdgeId>,
    primary_roads: Vec<EdgeId>,
    divider: Option<VoronoiDiagram>,
    cells: Vec<CityCell>,
    geometries: Vec<CellGeometry>,
    primary_graph: RoadGraph,
    networks: Vec<SecondaryNetwork>,
    secondary_graphs: Vec<RoadGraph>,
    connectors: ConnectorTracker,
}

impl CityGenerator {
    pub fn new(config: Config) -> Result<Self, GenerationError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            rng,
            progress: None,
            points: Vec::new(),
            diagram: None,
            classification: SiteClassification::default(),
            outer_roads: Vec::new(),
            primary_roads: Vec::new(),
            divider: None,
            cells: Vec::new(),
            geometries: Vec::new(),
            primary_graph: RoadGraph::new(),
            networks: Vec::new(),
            secondary_graphs: Vec::new(),
            connectors: ConnectorTracker::new(),
        })
    }

    /// Drop all generated data and restart the random stream.
    pub fn clear(&mut self) {
        tracing::debug!(seed = self.config.seed, "generator cleared");
        self.rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.progress = None;
        self.points.clear();
        self.diagram = None;
        self.classification = SiteClassification::default();
        self.outer_roads.clear();
        self.primary_roads.clear();
        self.divider = None;
        self.cells.clear();
        self.geometries.clear();
        self.primary_graph = RoadGraph::new();
        self.networks.clear();
        self.secondary_graphs.clear();
        self.connectors.clear();
    }

    /// Run every stage from a clean state.
    pub fn run_all(&mut self) -> Result<(), GenerationError> {
        self.run_all_observed(&mut ())
    }

    /// Run every stage from a clean state, reporting progress to `observer`.
    pub fn run_all_observed<O>(&mut self, observer: &mut O) -> Result<(), GenerationError>
    where
        O: GenerationObserver + ?Sized,
    {
        self.clear();
        for stage in GenerationStage::ALL {
            match stage {
                GenerationStage::InitialPoints => self.generate_initial_points()?,
                GenerationStage::Voronoi => self.generate_voronoi()?,
                GenerationStage::BoundaryRoads => self.set_boundary_as_primary_road()?,
                GenerationStage::CityCells => self.group_into_city_cells()?,
                GenerationStage::CellBoundaryRoads => {
                    self.set_city_cell_boundary_as_primary_road()?
                }
                GenerationStage::RefinedCells => self.refine_city_cells()?,
                GenerationStage::SecondaryRoads => self.generate_secondary_roads_observed(observer)?,
                GenerationStage::SecondaryGraphs => self.generate_secondary_road_graphs()?,
                GenerationStage::Connectors => self.resolve_connectors()?,
            }
            observer.on_stage(stage);
        }
        Ok(())
    }

    /// Check the prerequisite of `stage` and drop whatever `stage` and the stages after it
    /// produced, so a re-run never mixes results of two passes.
    fn begin(&mut self, stage: GenerationStage) -> Result<(), GenerationError> {
        if let Some(requires) = stage.prerequisite()
            && self.progress.is_none_or(|done| done < requires)
        {
            return Err(GenerationError::StageOrder { stage, requires });
        }
        if self.progress.is_some_and(|done| done >= stage) {
            tracing::debug!(%stage, "re-running stage, later results discarded");
        }
        self.discard_from(stage);
        Ok(())
    }

    fn discard_from(&mut self, stage: GenerationStage) {
        use GenerationStage::*;

        if stage <= InitialPoints {
            self.points.clear();
        }
        if stage <= Voronoi {
            self.diagram = None;
        }
        if stage <= BoundaryRoads {
            self.classification = SiteClassification::default();
            self.outer_roads.clear();
        }
        if stage <= CityCells {
            self.divider = None;
            self.cells.clear();
        }
        if stage <= CellBoundaryRoads {
            self.primary_roads = self.outer_roads.clone();
        }
        if stage <= RefinedCells {
            self.geometries.clear();
            self.primary_graph = RoadGraph::new();
        }
        if stage <= SecondaryRoads {
            self.networks.clear();
            self.connectors.clear();
        }
        if stage <= SecondaryGraphs {
            self.secondary_graphs.clear();
        }
        self.progress = self.progress.min(stage.prerequisite());
    }

    fn missing(stage: GenerationStage, requires: GenerationStage) -> GenerationError {
        GenerationError::StageOrder { stage, requires }
    }

    pub fn generate_initial_points(&mut self) -> Result<(), GenerationError> {
        let stage = GenerationStage::InitialPoints;
        self.begin(stage)?;
        let sampling = &self.config.sampling;
        let sampler = PoissonSampler::new(
            sampling.radius,
            DVec2::new(sampling.region_width, sampling.region_height),
            sampling.samples_before_rejection,
        );
        self.points = sampler.sample(&mut self.rng)?.points;
        tracing::info!(points = self.points.len(), "initial points generated");
        self.progress = Some(stage);
        Ok(())
    }

    pub fn generate_voronoi(&mut self) -> Result<(), GenerationError> {
        let stage = GenerationStage::Voronoi;
        self.begin(stage)?;
        let iterations = if self.config.voronoi.lloyd_enabled {
            self.config.voronoi.lloyd_iterations
        } else {
            0
        };
        let size = DVec2::new(
            self.config.sampling.region_width,
            self.config.sampling.region_height,
        );
        let diagram = VoronoiDiagram::build(&self.points, size, iterations)?;
        tracing::info!(
            sites = diagram.sites().len(),
            edges = diagram.edges().len(),
            lloyd_iterations = iterations,
            "voronoi diagram generated"
        );
        self.diagram = Some(diagram);
        self.progress = Some(stage);
        Ok(())
    }

    pub fn set_boundary_as_primary_road(&mut self) -> Result<(), GenerationError> {
        let stage = GenerationStage::BoundaryRoads;
        self.begin(stage)?;
        let diagram = self
            .diagram
            .as_ref()
            .ok_or_else(|| Self::missing(stage, GenerationStage::Voronoi))?;
        self.classification = primary::classify_boundary_sites(diagram);
        self.outer_roads = primary::extract_outer_roads(diagram, &self.classification);
        self.primary_roads = self.outer_roads.clone();
        tracing::info!(
            outer = self.classification.outer.len(),
            inner = self.classification.inner.len(),
            roads = self.primary_roads.len(),
            "boundary set as primary road"
        );
        self.progress = Some(stage);
        Ok(())
    }

    pub fn group_into_city_cells(&mut self) -> Result<(), GenerationError> {
        let stage = GenerationStage::CityCells;
        self.begin(stage)?;
        let diagram = self
            .diagram
            .as_ref()
            .ok_or_else(|| Self::missing(stage, GenerationStage::Voronoi))?;
        if self.classification.inner.is_empty() {
            return Err(GenerationError::NoCityCells);
        }
        let divider =
            primary::build_divider(&mut self.rng, diagram, &self.primary_roads, &self.config)?;
        let cells = primary::group_into_city_cells(diagram, &self.classification, &divider);
        if cells.is_empty() {
            return Err(GenerationError::NoCityCells);
        }
        tracing::info!(
            cells = cells.len(),
            divider_sites = divider.sites().len(),
            "sites grouped into city cells"
        );
        self.divider = Some(divider);
        self.cells = cells;
        self.progress = Some(stage);
        Ok(())
    }

    pub fn set_city_cell_boundary_as_primary_road(&mut self) -> Result<(), GenerationError> {
        let stage = GenerationStage::CellBoundaryRoads;
        self.begin(stage)?;
        let diagram = self
            .diagram
            .as_ref()
            .ok_or_else(|| Self::missing(stage, GenerationStage::Voronoi))?;
        let before = self.primary_roads.len();
        primary::extend_with_cell_boundaries(diagram, &self.cells, &mut self.primary_roads);
        tracing::info!(
            added = self.primary_roads.len() - before,
            roads = self.primary_roads.len(),
            "city cell boundaries set as primary road"
        );
        self.progress = Some(stage);
        Ok(())
    }

    /// Fix cell boundaries and build the containment geometry and the primary road graph.
    pub fn refine_city_cells(&mut self) -> Result<(), GenerationError> {
        let stage = GenerationStage::RefinedCells;
        self.begin(stage)?;
        let diagram = self
            .diagram
            .as_ref()
            .ok_or_else(|| Self::missing(stage, GenerationStage::Voronoi))?;
        primary::refine_city_cells(diagram, &mut self.cells);
        self.geometries = self
            .cells
            .iter()
            .map(|cell| CellGeometry::from_cell(cell, diagram, &self.config.cell))
            .collect();
        self.primary_graph = primary::build_primary_graph(diagram, &self.cells)?;
        tracing::info!(
            cells = self.cells.len(),
            primary_vertices = self.primary_graph.vertex_count(),
            primary_edges = self.primary_graph.edge_count(),
            "city cells refined"
        );
        self.progress = Some(stage);
        Ok(())
    }

    pub fn generate_secondary_roads(&mut self) -> Result<(), GenerationError> {
        self.generate_secondary_roads_observed(&mut ())
    }

    /// Grow every cell's secondary network, reporting each growth step to `observer`.
    pub fn generate_secondary_roads_observed<O>(
        &mut self,
        observer: &mut O,
    ) -> Result<(), GenerationError>
    where
        O: GenerationObserver + ?Sized,
    {
        let stage = GenerationStage::SecondaryRoads;
        self.begin(stage)?;
        let grower = SecondaryRoadGrower::new(&self.config.growth, &self.config.boundary)?;
        for (i, geometry) in self.geometries.iter().enumerate() {
            let network = grower.grow_cell(
                &mut self.rng,
                CityCellId(i),
                geometry,
                &mut self.connectors,
                observer,
            )?;
            self.networks.push(network);
        }
        tracing::info!(
            cells = self.networks.len(),
            edges = self.networks.iter().map(SecondaryNetwork::edge_count).sum::<usize>(),
            connectors = self.connectors.len(),
            "secondary roads generated"
        );
        self.progress = Some(stage);
        Ok(())
    }

    pub fn generate_secondary_road_graphs(&mut self) -> Result<(), GenerationError> {
        let stage = GenerationStage::SecondaryGraphs;
        self.begin(stage)?;
        self.secondary_graphs = self
            .networks
            .iter()
            .map(SecondaryNetwork::to_graph)
            .collect::<Result<_, _>>()?;
        tracing::info!(graphs = self.secondary_graphs.len(), "secondary road graphs built");
        self.progress = Some(stage);
        Ok(())
    }

    /// Match every connector to its edge in the primary road graph.
    pub fn resolve_connectors(&mut self) -> Result<(), GenerationError> {
        let stage = GenerationStage::Connectors;
        self.begin(stage)?;
        let diagram = self
            .diagram
            .as_ref()
            .ok_or_else(|| Self::missing(stage, GenerationStage::Voronoi))?;
        let unresolved = self.connectors.resolve_primary(diagram, &self.primary_graph);
        if unresolved > 0 {
            tracing::warn!(
                unresolved,
                total = self.connectors.len(),
                "connectors without a primary edge"
            );
        }
        tracing::info!(connectors = self.connectors.len(), "connectors resolved");
        self.progress = Some(stage);
        Ok(())
    }

    /// Snapshot of the finished city. Requires every stage to have run.
    pub fn layout(&self) -> Result<CityLayout, GenerationError> {
        if self.progress < Some(GenerationStage::Connectors) {
            return Err(GenerationError::StageOrder {
                stage: GenerationStage::Connectors,
                requires: GenerationStage::Connectors,
            });
        }
        Ok(CityLayout {
            primary_graph: self.primary_graph.clone(),
            secondary_graphs: self.secondary_graphs.clone(),
            cells: self.cells.clone(),
            geometries: self.geometries.clone(),
            connectors: self.connectors.records().to_vec(),
            seeds: self.networks.iter().map(|n| n.seeds().to_vec()).collect(),
            transform: self.transform(),
        })
    }

    pub fn transform(&self) -> PlaneTransform {
        PlaneTransform::new(self.config.plane.scale, self.config.sampling.region_width)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The last completed stage.
    pub fn progress(&self) -> Option<GenerationStage> {
        self.progress
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    pub fn diagram(&self) -> Option<&VoronoiDiagram> {
        self.diagram.as_ref()
    }

    pub fn divider(&self) -> Option<&VoronoiDiagram> {
        self.divider.as_ref()
    }

    pub fn classification(&self) -> &SiteClassification {
        &self.classification
    }

    pub fn primary_roads(&self) -> &[EdgeId] {
        &self.primary_roads
    }

    pub fn cells(&self) -> &[CityCell] {
        &self.cells
    }

    pub fn cell_geometries(&self) -> &[CellGeometry] {
        &self.geometries
    }

    pub fn primary_graph(&self) -> &RoadGraph {
        &self.primary_graph
    }

    pub fn secondary_networks(&self) -> &[SecondaryNetwork] {
        &self.networks
    }

    pub fn secondary_graphs(&self) -> &[RoadGraph] {
        &self.secondary_graphs
    }

    pub fn connectors(&self) -> &ConnectorTracker {
        &self.connectors
    }
}
