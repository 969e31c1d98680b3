//! Generation pipeline
//!
//! Each attempt rebuilds the tile model and the constraint list from the
//! authored inputs, primes a fresh propagator with them and runs it. A
//! contradiction restarts with the next derived seed until the retries run
//! out.

pub mod completion;
pub mod decode;

use ahash::AHashSet;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::constraints::{
    border_constraints, get_mask, submesh_filters, ConstraintBuilder, ConstraintResolver,
    InitialConstraint, MirrorGrid, Propagator, Resolution, SceneObject, SymmetryMap,
};
use crate::core::config::GeneratorConfig;
use crate::core::error::{Result, TileGraphError, WarningKind, Warnings};
use crate::core::types::{LatticeKind, ModelType, RotationGroupType};
use crate::grid::{FaceDirOf, Grid, RotationOf, Topology};
use crate::lattice::CellType;
use crate::model::{
    build_adjacency_model, convert_sample, observed_adjacencies, AdjacencyModel,
    DirectionalAdjacency, Palette, Sample, SampleDef, Tile, TileEntry, TileLibrary, TileModelInfo,
};

pub use completion::Completion;
pub use decode::{align, grow_big_tile, to_tile_instances, TileInstance};

/// Everything one attempt hands to a propagator
pub struct PreparedModel<G: Grid> {
    pub info: TileModelInfo<G::Cell>,
    pub adjacency: AdjacencyModel<FaceDirOf<G>, RotationOf<G>>,
    /// Sample copies under every bounds symmetry, for sample-driven models
    pub samples: Vec<Sample<RotationOf<G>>>,
    pub constraints: Vec<InitialConstraint<FaceDirOf<G>, RotationOf<G>>>,
    /// Grid topology with the solver mask applied
    pub topology: Topology<FaceDirOf<G>, RotationOf<G>>,
    pub mirror: Option<SymmetryMap<RotationOf<G>>>,
    pub skybox: Option<Tile<FaceDirOf<G>>>,
    pub warnings: Warnings,
}

pub struct Generator<G: MirrorGrid> {
    config: GeneratorConfig,
    grid: G,
    tiles: Vec<TileEntry<FaceDirOf<G>>>,
    palette: Palette,
    scene: Vec<SceneObject>,
    samples: Vec<SampleDef>,
}

impl<G: MirrorGrid> Generator<G> {
    pub fn new(config: GeneratorConfig, grid: G, tiles: Vec<TileEntry<FaceDirOf<G>>>) -> Self {
        Self {
            config,
            grid,
            tiles,
            palette: Palette::default(),
            scene: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Tiles, palette, scene and samples all come from the library
    pub fn from_library(library: &TileLibrary, grid: G) -> Result<Self> {
        let tiles = library.tile_entries(grid.cell_type())?;
        Ok(Self::new(library.generator.clone(), grid, tiles)
            .with_palette(library.palette()?)
            .with_scene(library.scene.clone())
            .with_samples(library.samples.clone()))
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn with_scene(mut self, scene: Vec<SceneObject>) -> Self {
        self.scene = scene;
        self
    }

    pub fn with_samples(mut self, samples: Vec<SampleDef>) -> Self {
        self.samples = samples;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Fatal checks first, then everything worth a warning
    pub fn validate(&self) -> Result<Warnings> {
        self.config.validate().map_err(TileGraphError::InvalidConfig)?;
        if self.tiles.is_empty() {
            return Err(TileGraphError::ZeroTiles);
        }
        let kind = self.grid.cell_type().kind();
        if let Some(other) = self.tiles.iter().find(|e| e.tile.lattice != kind) {
            return Err(TileGraphError::MixedCellTypes(format!(
                "{} ({}) and {}",
                other.tile.name, other.tile.lattice, kind
            )));
        }
        if self.config.model_type != ModelType::AdjacentPaint
            && !matches!(kind, LatticeKind::Square | LatticeKind::Cube)
        {
            return Err(TileGraphError::UnsupportedModel {
                model: self.config.model_type.to_string(),
                lattice: kind.to_string(),
            });
        }

        let mut warnings = Warnings::new();
        if self.config.surface.is_none() {
            let expected = self.config.tile_size;
            for entry in &self.tiles {
                let size = entry.tile.tile_size;
                // Flat lattices do not care about depth
                let same = match kind {
                    LatticeKind::Square | LatticeKind::HexPrism => {
                        size.truncate().abs_diff_eq(expected.truncate(), 1e-4)
                    }
                    _ => size.abs_diff_eq(expected, 1e-4),
                };
                if !same {
                    warnings.push(
                        WarningKind::MissizedTile,
                        format!(
                            "tile {} has size {} but the generator uses {}",
                            entry.tile.name, size, expected
                        ),
                    );
                }
            }
        }
        for entry in &self.tiles {
            if let Some(p) = &entry.tile.palette {
                if *p != self.palette.name {
                    warnings.push(
                        WarningKind::PaletteMismatch,
                        format!(
                            "tile {} is painted with palette {} but the generator uses {}",
                            entry.tile.name, p, self.palette.name
                        ),
                    );
                }
            }
        }
        Ok(warnings)
    }

    /// Builds the model, constraints, mask and mirror for one attempt
    pub fn prepare(&self) -> Result<PreparedModel<G>> {
        let mut warnings = self.validate()?;
        let ct = self.grid.cell_type().clone();

        let (info, samples, adjacency) = match self.config.model_type {
            ModelType::AdjacentPaint => {
                let info = TileModelInfo::build(ct, &self.tiles)?;
                let adjacency = build_adjacency_model(&info, &self.grid, &self.palette);
                (info, Vec::new(), adjacency)
            }
            model_type => {
                let info = self.sample_model_info(ct)?;
                let samples = self.convert_samples(&info, model_type)?;
                let adjacency = if model_type == ModelType::Adjacent {
                    AdjacencyModel::Directional(self.sample_adjacencies(&samples)?)
                } else {
                    AdjacencyModel::Directional(Vec::new())
                };
                (info, samples, adjacency)
            }
        };
        warnings.extend(info.warnings.clone());

        let mut builder = ConstraintBuilder::new(&self.grid, &info);
        let mut constraints = builder.build(&self.scene)?;
        warnings.extend(builder.warnings);
        if let Some(surface) = &self.config.surface {
            constraints.extend(
                submesh_filters(&self.grid, surface, &mut warnings)
                    .into_iter()
                    .map(InitialConstraint::Volume),
            );
        }
        constraints.extend(
            border_constraints(&self.grid, &self.config.borders)?
                .into_iter()
                .map(InitialConstraint::Volume),
        );

        let base = Topology::from_grid(&self.grid);
        let mask = get_mask(&self.grid, &base, &info, &constraints, self.config.mask_pins);
        let topology = base.with_mask(mask);

        let mirror = match self.config.mirror {
            Some(axis) => Some(self.grid.mirror(axis)?.symmetry_map(&topology, &info)),
            None => None,
        };
        let skybox = match &self.config.skybox {
            Some(name) => {
                let tile = info
                    .tile_id(name)
                    .and_then(|id| info.tile(id))
                    .ok_or_else(|| TileGraphError::UnknownTile(name.clone()))?;
                Some(tile.clone())
            }
            None => None,
        };

        info!(
            states = info.all_tiles().len(),
            adjacencies = adjacency.len(),
            constraints = constraints.len(),
            "prepared model"
        );
        Ok(PreparedModel {
            info,
            adjacency,
            samples,
            constraints,
            topology,
            mirror,
            skybox,
            warnings,
        })
    }

    /// Sample models use only the tiles that occur in a sample, all weighted
    /// equally
    fn sample_model_info(&self, ct: G::Cell) -> Result<TileModelInfo<G::Cell>> {
        if self.samples.is_empty() {
            return Err(TileGraphError::InvalidConfig("no samples specified".into()));
        }
        let used: AHashSet<&str> = self
            .samples
            .iter()
            .flat_map(|s| s.cells.iter())
            .filter(|c| !c.is_empty())
            .map(String::as_str)
            .collect();
        let entries: Vec<_> = self
            .tiles
            .iter()
            .filter(|e| used.contains(e.tile.name.as_str()))
            .map(|e| TileEntry::new(e.tile.clone(), 1.0))
            .collect();
        if let Some(missing) = used
            .iter()
            .find(|name| !entries.iter().any(|e| e.tile.name == **name))
        {
            return Err(TileGraphError::UnknownTile(missing.to_string()));
        }
        if entries.is_empty() {
            return Err(TileGraphError::InvalidConfig("no tiles found in the samples".into()));
        }
        TileModelInfo::build(ct, &entries)
    }

    fn convert_samples(
        &self,
        info: &TileModelInfo<G::Cell>,
        model_type: ModelType,
    ) -> Result<Vec<Sample<RotationOf<G>>>> {
        let mut out = Vec::new();
        for def in &self.samples {
            let sample = def.to_sample(info)?;
            let sample_grid = self.sample_grid(def, model_type)?;
            out.extend(convert_sample(
                info,
                &sample_grid,
                &sample,
                model_type,
                true,
                true,
                RotationGroupType::All,
            )?);
        }
        debug!(samples = self.samples.len(), copies = out.len(), "converted samples");
        Ok(out)
    }

    fn sample_grid(&self, def: &SampleDef, model_type: ModelType) -> Result<G> {
        self.grid
            .resized(def.size)
            .ok_or_else(|| TileGraphError::UnsupportedModel {
                model: model_type.to_string(),
                lattice: self.grid.cell_type().kind().to_string(),
            })
    }

    fn sample_adjacencies(
        &self,
        samples: &[Sample<RotationOf<G>>],
    ) -> Result<Vec<DirectionalAdjacency<FaceDirOf<G>, RotationOf<G>>>> {
        let mut seen = AHashSet::new();
        let mut out = Vec::new();
        for sample in samples {
            let sample_grid = self
                .grid
                .resized(sample.size)
                .ok_or_else(|| TileGraphError::UnsupportedModel {
                    model: ModelType::Adjacent.to_string(),
                    lattice: self.grid.cell_type().kind().to_string(),
                })?;
            for adjacency in observed_adjacencies(&sample_grid, sample) {
                if seen.insert(adjacency) {
                    out.push(adjacency);
                }
            }
        }
        Ok(out)
    }

    /// Runs up to `retries` attempts
    ///
    /// `make_propagator` receives the attempt's prepared model and seed and
    /// returns a fresh solver for it.
    pub fn generate<P, F>(&self, mut make_propagator: F) -> Result<Completion<RotationOf<G>>>
    where
        P: Propagator<FaceDirOf<G>, RotationOf<G>>,
        F: FnMut(&PreparedModel<G>, u64) -> P,
    {
        let base_seed = if self.config.seed == 0 {
            rand::random()
        } else {
            self.config.seed
        };
        let mut seeds = ChaCha8Rng::seed_from_u64(base_seed);
        let attempts = self.config.retries.max(1);
        let mut retry = 0;
        loop {
            let model = self.prepare()?;
            let seed = seeds.next_u64();
            let mut propagator = make_propagator(&model, seed);

            let mut resolver = ConstraintResolver::new(&self.grid, &model.info, &self.palette);
            resolver.apply_all(&mut propagator, &model.constraints)?;
            if let Some(skybox) = &model.skybox {
                resolver.apply_skybox(&mut propagator, skybox);
            }
            if let Some(symmetry) = &model.mirror {
                propagator.add_symmetry(symmetry);
            }

            let status = propagator.run();
            if status == Resolution::Contradiction && retry + 1 < attempts {
                warn!(retry, seed, "contradiction, retrying");
                retry += 1;
                continue;
            }

            let mut completion = Completion::from_values(&self.grid, &propagator.values());
            completion.success = status == Resolution::Decided && completion.success;
            completion.retries = retry;
            completion.backtrack_count = propagator.backtrack_count();
            completion.seed = base_seed;
            completion.tile_instances = to_tile_instances(&self.grid, &model.info, &completion.tile_data);
            let mut warnings = model.warnings;
            warnings.extend(resolver.warnings);
            completion.warnings = warnings;
            info!(
                success = completion.success,
                retries = retry,
                tiles = completion.tile_instances.len(),
                "generation finished"
            );
            completion.log_error();
            return Ok(completion);
        }
    }
}
