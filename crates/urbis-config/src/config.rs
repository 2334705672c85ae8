//! Configuration structs with generator defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Seed for every random decision of a run. Same seed, same city.
    pub seed: u64,
    /// Poisson-disk sampling of the Voronoi seeds.
    pub sampling: SamplingConfig,
    /// Voronoi construction settings.
    pub voronoi: VoronoiConfig,
    /// Coarse partition used to group sites into city cells.
    pub divider: DividerConfig,
    /// Secondary road grid-growth proportions.
    pub growth: GridGrowthProp,
    /// Secondary road snapping thresholds.
    pub boundary: GridGrowthBoundary,
    /// City cell containment probe.
    pub cell: CellConfig,
    /// Planar to world-space mapping.
    pub plane: PlaneConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Poisson-disk sampling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingConfig {
    /// Minimum distance between two samples.
    pub radius: f64,
    /// Width of the sampled region.
    pub region_width: f64,
    /// Height of the sampled region.
    pub region_height: f64,
    /// Candidates tried around an active point before it is retired.
    pub samples_before_rejection: u32,
}

/// Voronoi configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VoronoiConfig {
    /// Run Lloyd relaxation on the sample points.
    pub lloyd_enabled: bool,
    /// Number of Lloyd iterations when enabled.
    pub lloyd_iterations: u32,
}

/// Divider partition configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DividerConfig {
    /// Multiplier applied to `sampling.radius` for the coarse sampling pass.
    pub radius_scale: f64,
    /// Rejection limit of the coarse sampling pass.
    pub samples_before_rejection: u32,
    /// Lloyd iterations of the coarse diagram.
    pub lloyd_iterations: u32,
}

/// Integer weights for the stochastic choices of one growth event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Probability {
    /// Weights for growing 1, 2 or 3 branches.
    pub count: [u32; 3],
    /// Weights for the forward, left and right direction classes.
    pub direction: [u32; 3],
}

impl Probability {
    /// The override used for the first step of a boundary seed: two branches, left and right.
    pub const BOUNDARY_SEED: Probability = Probability {
        count: [0, 1, 0],
        direction: [0, 1, 1],
    };
}

/// Grid-growth proportions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridGrowthProp {
    /// Shortest segment a growth step may produce.
    pub min_len: f64,
    /// Longest segment a growth step may produce.
    pub max_len: f64,
    /// Angular offset bounds in degrees, one `[start, end]` row per direction class
    /// (forward, left, right).
    pub growth_offset_range: [[f64; 2]; 3],
    /// Maximum growth depth of a seed walk.
    pub depth: u32,
    /// Weights used by every step except the first step of a boundary seed.
    pub default_prob: Probability,
    /// Scale of the step-length distribution.
    pub length_scale: f64,
    /// Skew of the step-length distribution, in `(-1, 1)`.
    pub length_skew: f64,
    /// Degrees of freedom of the step-length distribution (lower is heavier tailed).
    pub length_dof: f64,
}

/// Snapping thresholds of the secondary road validity rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridGrowthBoundary {
    /// Candidates closer than this to a vertex are merged into it.
    pub vertex_merge: f64,
    /// Candidates in `[vertex_merge, vertex_destroy)` of a vertex are discarded.
    pub vertex_destroy: f64,
    /// Candidates within this distance of an edge split that edge.
    pub edge_divide: f64,
    /// Crossings within this distance of an edge endpoint are routed through the endpoint.
    pub intersect_merge: f64,
}

/// City cell containment probe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CellConfig {
    /// Distance each boundary edge is pushed outward before the containment test.
    /// Negative values pull the edges inside the cell instead.
    pub probe_offset: f64,
    /// Farthest a joined corner of the pushed outline may sit from the original corner,
    /// in multiples of `probe_offset`. Sharper corners are bevelled.
    pub miter_limit: f64,
}

/// Planar to world-space mapping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaneConfig {
    /// Scale of the ground plane the city is laid on.
    pub scale: f64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 42,
            sampling: SamplingConfig::default(),
            voronoi: VoronoiConfig::default(),
            divider: DividerConfig::default(),
            growth: GridGrowthProp::default(),
            boundary: GridGrowthBoundary::default(),
            cell: CellConfig::default(),
            plane: PlaneConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            radius: 90.0,
            region_width: 1350.0,
            region_height: 1350.0,
            samples_before_rejection: 30,
        }
    }
}

impl Default for VoronoiConfig {
    fn default() -> Self {
        Self {
            lloyd_enabled: true,
            lloyd_iterations: 5,
        }
    }
}

impl Default for DividerConfig {
    fn default() -> Self {
        Self {
            radius_scale: 3.0,
            samples_before_rejection: 30,
            lloyd_iterations: 1,
        }
    }
}

impl Default for Probability {
    fn default() -> Self {
        Self {
            count: [30, 30, 40],
            direction: [30, 35, 35],
        }
    }
}

impl Default for GridGrowthProp {
    fn default() -> Self {
        Self {
            min_len: 35.5,
            max_len: 65.5,
            growth_offset_range: [[-2.5, 2.5], [0.0, 2.5], [0.0, 2.5]],
            depth: 8,
            default_prob: Probability::default(),
            length_scale: 5.0,
            length_skew: 0.2,
            length_dof: 5.0,
        }
    }
}

impl Default for GridGrowthBoundary {
    fn default() -> Self {
        Self {
            vertex_merge: 14.4,
            vertex_destroy: 22.5,
            edge_divide: 17.52,
            intersect_merge: 17.52,
        }
    }
}

impl Default for CellConfig {
    fn default() -> Self {
        Self {
            probe_offset: 20.0,
            miter_limit: 4.0,
        }
    }
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self { scale: 10.0 }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Validation ---

fn require(condition: bool, message: impl FnOnce() -> String) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message()))
    }
}

impl Config {
    /// Check every value against its documented range.
    ///
    /// The implied ordering `vertex_merge <= vertex_destroy <= edge_divide` is not enforced.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sampling;
        require(s.radius > 0.0, || format!("sampling.radius must be > 0, got {}", s.radius))?;
        require(s.region_width > 0.0 && s.region_height > 0.0, || {
            format!(
                "sampling region must be positive, got {}x{}",
                s.region_width, s.region_height
            )
        })?;
        require(s.samples_before_rejection >= 1, || {
            "sampling.samples_before_rejection must be >= 1".to_string()
        })?;

        let d = &self.divider;
        require(d.radius_scale > 0.0, || {
            format!("divider.radius_scale must be > 0, got {}", d.radius_scale)
        })?;
        require(d.samples_before_rejection >= 1, || {
            "divider.samples_before_rejection must be >= 1".to_string()
        })?;

        let g = &self.growth;
        require(g.min_len > 0.0 && g.max_len > 0.0, || {
            format!("growth lengths must be > 0, got [{}, {}]", g.min_len, g.max_len)
        })?;
        require(g.min_len <= g.max_len, || {
            format!("growth.min_len {} exceeds max_len {}", g.min_len, g.max_len)
        })?;
        for (class, [start, end]) in g.growth_offset_range.iter().enumerate() {
            require(start <= end, || {
                format!("growth_offset_range row {class} is reversed: [{start}, {end}]")
            })?;
        }
        require(g.default_prob.count.iter().any(|&w| w > 0), || {
            "growth.default_prob.count weights are all zero".to_string()
        })?;
        require(g.default_prob.direction.iter().any(|&w| w > 0), || {
            "growth.default_prob.direction weights are all zero".to_string()
        })?;
        require(g.length_scale > 0.0 && g.length_dof > 0.0, || {
            "growth length distribution needs positive scale and dof".to_string()
        })?;
        require(g.length_skew > -1.0 && g.length_skew < 1.0, || {
            format!("growth.length_skew must be in (-1, 1), got {}", g.length_skew)
        })?;

        let b = &self.boundary;
        require(
            b.vertex_merge > 0.0
                && b.vertex_destroy > 0.0
                && b.edge_divide > 0.0
                && b.intersect_merge > 0.0,
            || "boundary thresholds must all be > 0".to_string(),
        )?;

        require(self.cell.probe_offset.is_finite(), || {
            format!("cell.probe_offset must be finite, got {}", self.cell.probe_offset)
        })?;
        require(self.cell.miter_limit >= 1.0, || {
            format!("cell.miter_limit must be >= 1, got {}", self.cell.miter_limit)
        })?;
        require(self.plane.scale > 0.0, || {
            format!("plane.scale must be > 0, got {}", self.plane.scale)
        })?;
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}
