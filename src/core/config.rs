//! Generator configuration with documented defaults
//!
//! A generator run is fully described by one `GeneratorConfig` plus a tile
//! library. Nothing here is global; callers pass the config explicitly.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use super::types::{LatticeKind, MirrorAxis, ModelType};

/// One side of the generation volume forced to a particular tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorderItemConfig {
    /// Face direction name, as understood by the lattice (e.g. "Left", "ForwardRight")
    pub dir: String,
    /// Tile that every boundary cell on that side must use
    pub tile: String,
}

/// Settings for generating on the surface of a mesh instead of a box
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Number of cell layers stacked along each face normal
    pub layers: u32,

    /// Height of one layer (world units)
    pub tile_height: f32,

    /// Distance from the surface to the bottom of the first layer
    ///
    /// Negative values sink the first layer into the surface.
    pub surface_offset: f32,

    /// Per-submesh tile whitelists; index `i` applies to submesh `i`
    ///
    /// Only used when `filter_submesh_tiles` is set.
    pub submesh_tiles: Vec<Vec<String>>,

    /// Restrict each submesh to the tiles listed in `submesh_tiles`
    pub filter_submesh_tiles: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            layers: 1,
            tile_height: 1.0,
            surface_offset: 0.0,
            submesh_tiles: Vec::new(),
            filter_submesh_tiles: false,
        }
    }
}

/// Configuration for one generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    // === GRID ===
    /// Lattice family all tiles and the grid must share
    pub lattice: LatticeKind,

    /// Number of cells along each axis
    ///
    /// Square grids live in the XY plane and must have `size.z == 1`.
    /// Hex and triangle prisms use x/z for the plane and y for layers.
    pub size: IVec3,

    /// World size of a single cell
    ///
    /// For hex prisms `tile_size.x` is the distance between opposite sides;
    /// for triangle prisms it is the side length.
    pub tile_size: Vec3,

    /// World position of the center of cell (0, 0, 0)
    pub origin: Vec3,

    /// Generate on a mesh surface instead of a box. Requires a mesh at runtime.
    pub surface: Option<SurfaceConfig>,

    // === MODEL ===
    /// How adjacency is learned. Sample models are only valid on square and cube lattices.
    pub model_type: ModelType,

    /// Exclude cells covered by pins from the solver entirely
    ///
    /// When false, pins are enforced with `select` calls instead, which lets
    /// the solver report contradictions involving them.
    pub mask_pins: bool,

    // === CONSTRAINTS ===
    /// Tiles forced onto the boundary cells of the volume
    pub borders: Vec<BorderItemConfig>,

    /// Tile whose painted faces constrain every outward-facing boundary face
    pub skybox: Option<String>,

    /// Make the output symmetric under a reflection
    pub mirror: Option<MirrorAxis>,

    // === RUN ===
    /// Attempts before giving up on a contradiction
    ///
    /// Each retry rebuilds the model and constraints from scratch with a
    /// fresh seed derived from the base seed.
    pub retries: u32,

    /// Base seed; 0 picks a random seed per run
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            lattice: LatticeKind::Cube,
            size: IVec3::new(10, 1, 10),
            tile_size: Vec3::ONE,
            origin: Vec3::ZERO,
            surface: None,

            model_type: ModelType::AdjacentPaint,
            mask_pins: false,

            borders: Vec::new(),
            skybox: None,
            mirror: None,

            retries: 5,
            seed: 0,
        }
    }
}

impl GeneratorConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text, then validate it
    pub fn from_toml_str(text: &str) -> crate::core::error::Result<Self> {
        let config: GeneratorConfig = toml::from_str(text)?;
        config
            .validate()
            .map_err(crate::core::error::TileGraphError::InvalidConfig)?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.size.min_element() < 1 {
            return Err(format!("size ({}) must be at least 1 on every axis", self.size));
        }

        if self.tile_size.min_element() <= 0.0 {
            return Err(format!("tile_size ({}) must be positive", self.tile_size));
        }

        if self.lattice == LatticeKind::Square && self.size.z != 1 && self.surface.is_none() {
            return Err(format!(
                "square grids are planar, size.z ({}) must be 1",
                self.size.z
            ));
        }

        if self.retries == 0 {
            return Err("retries must be at least 1".into());
        }

        if let Some(surface) = &self.surface {
            if surface.layers == 0 {
                return Err("surface.layers must be at least 1".into());
            }
            if surface.tile_height <= 0.0 {
                return Err("surface.tile_height must be positive".into());
            }
            if !matches!(self.lattice, LatticeKind::Cube | LatticeKind::TrianglePrism) {
                return Err(format!(
                    "surface meshes need cube or triangle prism tiles, not {}",
                    self.lattice
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_square_must_be_planar() {
        let config = GeneratorConfig {
            lattice: LatticeKind::Square,
            size: IVec3::new(3, 3, 2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let text = r#"
lattice = "HexPrism"
size = [3, 1, 3]
tile_size = [1.0, 1.0, 1.0]
retries = 3
seed = 42
mirror = "X"

[[borders]]
dir = "Left"
tile = "wall"
"#;
        let config = GeneratorConfig::from_toml_str(text).unwrap();
        assert_eq!(config.lattice, LatticeKind::HexPrism);
        assert_eq!(config.size, IVec3::new(3, 1, 3));
        assert_eq!(config.seed, 42);
        assert_eq!(config.mirror, Some(MirrorAxis::X));
        assert_eq!(config.borders.len(), 1);
        assert_eq!(config.borders[0].tile, "wall");
    }

    #[test]
    fn test_surface_rejects_hex() {
        let config = GeneratorConfig {
            lattice: LatticeKind::HexPrism,
            surface: Some(SurfaceConfig::default()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
