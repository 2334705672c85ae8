//! Voronoi and sampling error types.

/// Errors produced while sampling points or building a diagram.
#[derive(Debug, thiserror::Error)]
pub enum VoronoiError {
    /// The sampling radius is not a positive finite number.
    #[error("sampling radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    /// The region has a non-positive or non-finite side.
    #[error("region size must be positive and finite, got {width}x{height}")]
    InvalidRegion { width: f64, height: f64 },

    /// Zero candidates per active point would never place a sample.
    #[error("rejection limit must be at least 1")]
    InvalidRejectionLimit,

    /// A diagram needs at least one site.
    #[error("cannot build a diagram from {count} points")]
    TooFewSites { count: usize },

    /// The triangulation rejected a point (NaN or out of the representable range).
    #[error("failed to insert point ({x}, {y}) into the triangulation: {reason:?}")]
    Insertion {
        x: f64,
        y: f64,
        reason: spade::InsertionError,
    },
}
