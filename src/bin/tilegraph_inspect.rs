//! Tile library inspector
//!
//! Loads a TOML tile library, builds its grid and tile model, resolves the
//! scene constraints against a recording propagator and prints a JSON
//! summary.

use std::path::PathBuf;

use clap::Parser;
use glam::IVec3;
use serde::Serialize;

use tilegraph::constraints::{ConstraintResolver, MirrorGrid, RecordingPropagator};
use tilegraph::core::error::{Result, TileGraphError, Warnings};
use tilegraph::core::types::LatticeKind;
use tilegraph::grid::{CubeGrid, HexPrismGrid, MeshGridBuilder, SquareGrid, TrianglePrismGrid};
use tilegraph::lattice::{CubeCellType, TrianglePrismCellType};
use tilegraph::model::{AdjacencyModel, TileLibrary};
use tilegraph::Generator;

#[derive(Parser, Debug)]
#[command(name = "tilegraph-inspect")]
#[command(about = "Summarise the tile model and constraints of a tile library")]
struct Args {
    /// Tile library (TOML)
    library: PathBuf,

    /// Override the library's seed
    #[arg(long)]
    seed: Option<u64>,

    /// Also run the generator with the recording propagator
    #[arg(long)]
    run: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[derive(Serialize)]
struct RunSummary {
    success: bool,
    retries: u32,
    seed: u64,
    tiles_placed: usize,
    contradiction_location: Option<IVec3>,
}

#[derive(Serialize)]
struct Summary {
    lattice: LatticeKind,
    cells: usize,
    tiles: usize,
    canonical_states: usize,
    adjacency_form: &'static str,
    adjacencies: usize,
    edge_labels: Option<usize>,
    constraints: usize,
    masked_cells: usize,
    selects: usize,
    selected_cells: usize,
    warnings: Warnings,
    run: Option<RunSummary>,
}

fn inspect<G: MirrorGrid>(library: &TileLibrary, grid: G, run: bool) -> Result<Summary> {
    let generator = Generator::from_library(library, grid)?;
    let model = generator.prepare()?;

    let mut propagator =
        RecordingPropagator::new(model.topology.clone(), model.info.all_tiles(), generator.config().seed);
    let mut resolver = ConstraintResolver::new(generator.grid(), &model.info, generator.palette());
    resolver.apply_all(&mut propagator, &model.constraints)?;
    if let Some(skybox) = &model.skybox {
        resolver.apply_skybox(&mut propagator, skybox);
    }
    let mut warnings = model.warnings.clone();
    warnings.extend(resolver.warnings);

    let (adjacency_form, edge_labels) = match &model.adjacency {
        AdjacencyModel::Directional(_) => ("directional", None),
        AdjacencyModel::Graph { label_count, .. } => ("graph", Some(*label_count)),
    };
    let masked_cells = model
        .topology
        .mask()
        .map_or(0, |m| m.iter().filter(|keep| !**keep).count());

    let run = if run {
        let completion = generator.generate(|m, seed| {
            RecordingPropagator::new(m.topology.clone(), m.info.all_tiles(), seed)
        })?;
        Some(RunSummary {
            success: completion.success,
            retries: completion.retries,
            seed: completion.seed,
            tiles_placed: completion.tile_instances.len(),
            contradiction_location: completion.contradiction_location,
        })
    } else {
        None
    };

    Ok(Summary {
        lattice: library.generator.lattice,
        cells: model.topology.index_count(),
        tiles: model.info.tiles().len(),
        canonical_states: model.info.all_tiles().len(),
        adjacency_form,
        adjacencies: model.adjacency.len(),
        edge_labels,
        constraints: model.constraints.len(),
        masked_cells,
        selects: propagator.selects.len(),
        selected_cells: propagator.selected_indices().len(),
        warnings,
        run,
    })
}

fn summarise(library: &TileLibrary, run: bool) -> Result<Summary> {
    let config = &library.generator;
    let (origin, size, tile_size) = (config.origin, config.size, config.tile_size);
    match (&config.surface, &library.mesh) {
        (Some(surface), Some(mesh)) => match config.lattice {
            LatticeKind::Cube => {
                let grid = MeshGridBuilder::new(CubeCellType::new(), tile_size).build(mesh.clone(), surface)?;
                inspect(library, grid, run)
            }
            LatticeKind::TrianglePrism => {
                let grid = MeshGridBuilder::new(TrianglePrismCellType::new(), tile_size)
                    .build(mesh.clone(), surface)?;
                inspect(library, grid, run)
            }
            other => Err(TileGraphError::InvalidConfig(format!(
                "{} tiles cannot be laid on a mesh surface",
                other
            ))),
        },
        (Some(_), None) => Err(TileGraphError::InvalidConfig(
            "surface generation needs a [mesh] section".into(),
        )),
        (None, _) => match config.lattice {
            LatticeKind::Square => inspect(library, SquareGrid::new(origin, size, tile_size), run),
            LatticeKind::Cube => inspect(library, CubeGrid::new(origin, size, tile_size), run),
            LatticeKind::HexPrism => inspect(library, HexPrismGrid::new(origin, size, tile_size), run),
            LatticeKind::TrianglePrism => {
                inspect(library, TrianglePrismGrid::new(origin, size, tile_size), run)
            }
        },
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tilegraph=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut library = TileLibrary::load(&args.library)?;
    if let Some(seed) = args.seed {
        library.generator.seed = seed;
    }

    let summary = summarise(&library, args.run)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&summary)?
    } else {
        serde_json::to_string(&summary)?
    };
    println!("{}", json);
    Ok(())
}
