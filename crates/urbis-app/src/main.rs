//! The `urbis` command-line generator.
//!
//! Loads `config.ron` (creating it with defaults on first run), applies CLI overrides,
//! runs the full pipeline and prints a summary of the generated road network.

mod platform;

use clap::Parser;
use urbis_city::{CityGenerator, CityLayout};
use urbis_config::{CliArgs, Config};

use platform::PlatformDirs;

fn main() {
    let args = CliArgs::parse();

    let dirs = match &args.config {
        Some(dir) => Ok(PlatformDirs::from_config_dir(dir)),
        None => PlatformDirs::resolve(),
    };
    let dirs = match dirs.and_then(|dirs| dirs.create_dirs().map(|()| dirs)) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to initialize directories: {e}");
            std::process::exit(1);
        }
    };

    let mut config = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {e}");
            Config::default()
        }
    };
    config.apply_cli_overrides(&args);

    urbis_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    tracing::info!(
        seed = config.seed,
        config_dir = %dirs.config_dir.display(),
        "urbis starting"
    );

    let layout = match generate(config) {
        Ok(layout) => layout,
        Err(e) => {
            tracing::error!(error = %e, "generation failed");
            eprintln!("Generation failed: {e}");
            std::process::exit(1);
        }
    };
    print_summary(&layout);
}

fn generate(config: Config) -> Result<CityLayout, urbis_city::GenerationError> {
    let mut generator = CityGenerator::new(config)?;
    generator.run_all()?;
    generator.layout()
}

fn print_summary(layout: &CityLayout) {
    let primary = &layout.primary_graph;
    let resolved = layout
        .connectors
        .iter()
        .filter(|c| c.primary_graph_edge.is_some())
        .count();

    println!("Urbis city");
    println!("  city cells:        {}", layout.cell_count());
    println!(
        "  primary roads:     {} vertices, {} edges, {} chains",
        primary.vertex_count(),
        primary.edge_count(),
        primary.chains().len()
    );
    println!(
        "  secondary roads:   {} edges, {} junctions",
        layout.secondary_edge_count(),
        layout
            .secondary_graphs
            .iter()
            .map(|g| g.junctions().len())
            .sum::<usize>()
    );
    println!(
        "  connectors:        {} ({} resolved)",
        layout.connectors.len(),
        resolved
    );
    println!("  ground plane:      {} units", layout.transform.plane_width());
}
