//! Procedural city road network generation.
//!
//! The pipeline scatters blue-noise points, builds a Voronoi diagram and turns its outer
//! ring and a coarse partition of the interior into primary roads. Each resulting city
//! cell then grows a planar secondary road network from seeds on its boundary.
//!
//! [`CityGenerator`] drives the stages; [`CityLayout`] is the finished result.

mod chains;
mod city_cell;
mod connector;
mod error;
mod generator;
mod graph;
pub mod growth;
mod observer;
pub mod primary;

pub use chains::RoadChain;
pub use city_cell::{BoundarySegment, CellGeometry, CityCell, CityCellId};
pub use connector::{ConnectorInfo, ConnectorTracker};
pub use error::{GenerationError, GraphError};
pub use generator::{CityGenerator, CityLayout};
pub use graph::{IndexedEdge, RoadGraph, UIndexedEdge, Vertex};
pub use growth::{SecondaryNetwork, SecondaryRoadGrower, SeedVertices};
pub use observer::{GenerationObserver, GenerationStage, GrowthEvent};
