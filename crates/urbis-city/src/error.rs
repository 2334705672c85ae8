//! Generation error types.

use urbis_config::ConfigError;
use urbis_voronoi::VoronoiError;

use crate::observer::GenerationStage;

/// Contract violations on a [`RoadGraph`](crate::RoadGraph) or a growing network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A vertex index that was never returned by an insertion.
    #[error("vertex index {index} out of range ({len} vertices)")]
    VertexOutOfRange { index: usize, len: usize },

    /// An edge index that was never returned by an insertion.
    #[error("edge index {index} out of range ({len} edges)")]
    EdgeOutOfRange { index: usize, len: usize },

    /// An edge from a vertex to itself.
    #[error("self-loop on vertex {vertex}")]
    SelfLoop { vertex: usize },

    /// An edge expected in a growing network is missing.
    #[error("edge ({start}, {end}) is not part of the network")]
    MissingEdge { start: usize, end: usize },
}

/// Errors that can occur while running the generation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Voronoi(#[from] VoronoiError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A pipeline stage was invoked before the stage it depends on.
    #[error("stage `{stage}` requires `{requires}` to run first")]
    StageOrder {
        stage: GenerationStage,
        requires: GenerationStage,
    },

    /// Every site touched the region boundary, or no inner site could be grouped.
    #[error("no city cells could be formed")]
    NoCityCells,

    /// A distribution parameter was rejected.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}
