//! Command-line argument parsing for the city generator.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Urbis command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "urbis", about = "Procedural city road network generator")]
pub struct CliArgs {
    /// Seed for every random decision of the run.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Poisson sampling radius.
    #[arg(long)]
    pub radius: Option<f64>,

    /// Region width.
    #[arg(long)]
    pub width: Option<f64>,

    /// Region height.
    #[arg(long)]
    pub height: Option<f64>,

    /// Secondary road growth depth.
    #[arg(long)]
    pub depth: Option<u32>,

    /// Lloyd relaxation iterations (0 disables relaxation).
    #[arg(long)]
    pub lloyd_iterations: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(seed) = args.seed {
            self.seed = seed;
        }
        if let Some(r) = args.radius {
            self.sampling.radius = r;
        }
        if let Some(w) = args.width {
            self.sampling.region_width = w;
        }
        if let Some(h) = args.height {
            self.sampling.region_height = h;
        }
        if let Some(depth) = args.depth {
            self.growth.depth = depth;
        }
        if let Some(iterations) = args.lloyd_iterations {
            self.voronoi.lloyd_enabled = iterations > 0;
            self.voronoi.lloyd_iterations = iterations;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs {
            seed: None,
            radius: None,
            width: None,
            height: None,
            depth: None,
            lloyd_iterations: None,
            log_level: None,
            config: None,
        }
    }

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            seed: Some(99),
            width: Some(800.0),
            depth: Some(4),
            ..empty_args()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.seed, 99);
        assert_eq!(config.sampling.region_width, 800.0);
        assert_eq!(config.growth.depth, 4);
        // Non-overridden fields retain defaults
        assert_eq!(config.sampling.region_height, 1350.0);
        assert_eq!(config.sampling.radius, 90.0);
    }

    #[test]
    fn test_cli_zero_lloyd_disables_relaxation() {
        let mut config = Config::default();
        let args = CliArgs {
            lloyd_iterations: Some(0),
            ..empty_args()
        };
        config.apply_cli_overrides(&args);
        assert!(!config.voronoi.lloyd_enabled);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&empty_args());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["urbis", "--seed", "7", "--radius", "45.5"]);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.radius, Some(45.5));
        assert!(args.config.is_none());
    }
}
