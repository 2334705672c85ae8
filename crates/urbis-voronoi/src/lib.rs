//! Blue-noise sampling and clipped Voronoi diagrams.
//!
//! [`PoissonSampler`] scatters seed points with a guaranteed minimum spacing and
//! [`VoronoiDiagram`] turns them into sites and edges clipped to the sample region,
//! optionally smoothed with Lloyd relaxation.

mod diagram;
mod error;
mod poisson;
mod relax;

pub use diagram::{EdgeId, Site, SiteId, VoronoiDiagram, VoronoiEdge};
pub use error::VoronoiError;
pub use poisson::{PoissonSample, PoissonSampler};
