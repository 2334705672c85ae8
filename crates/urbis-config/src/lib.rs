//! Configuration system for the urbis city generator.
//!
//! Every tunable of the generation pipeline lives here: Poisson sampling, Voronoi
//! relaxation, the divider partition, grid-growth proportions and snapping thresholds.
//! Settings persist to disk as RON, accept CLI overrides via clap and are range-checked
//! before a run.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CellConfig, Config, DebugConfig, DividerConfig, GridGrowthBoundary, GridGrowthProp,
    PlaneConfig, Probability, SamplingConfig, VoronoiConfig,
};
pub use error::ConfigError;
