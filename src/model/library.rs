//! TOML tile libraries
//!
//! A library file carries everything one generator run needs: the generator
//! config, the tiles, an optional palette, scene objects, samples and a
//! surface mesh.

use std::path::Path;

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::palette::{Palette, PaletteEntry};
use super::samples::Sample;
use super::tile::{Tile, TileEntry};
use super::tile_model_info::TileModelInfo;
use crate::constraints::SceneObject;
use crate::core::config::GeneratorConfig;
use crate::core::error::{Result, TileGraphError};
use crate::core::types::{LatticeKind, RotationGroupType};
use crate::grid::MeshData;
use crate::lattice::{CellType, FaceDetails, FaceShape};

fn yes() -> bool {
    true
}

fn unit_weight() -> f32 {
    1.0
}

fn origin_offset() -> Vec<IVec3> {
    vec![IVec3::ZERO]
}

/// Paint on one face of one offset
///
/// Either `paint` colors the whole face, or `center` and `rim` give the
/// slots explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaintDef {
    #[serde(default)]
    pub offset: IVec3,
    pub dir: String,
    #[serde(default)]
    pub paint: Option<u32>,
    #[serde(default)]
    pub center: Option<u32>,
    #[serde(default)]
    pub rim: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDef {
    pub name: String,
    /// Defaults to the generator's lattice
    #[serde(default)]
    pub lattice: Option<LatticeKind>,
    #[serde(default = "origin_offset")]
    pub offsets: Vec<IVec3>,
    #[serde(default)]
    pub paint: Vec<PaintDef>,
    #[serde(default = "yes")]
    pub rotatable: bool,
    #[serde(default = "yes")]
    pub reflectable: bool,
    #[serde(default)]
    pub rotation_group: RotationGroupType,
    #[serde(default = "yes")]
    pub symmetric: bool,
    #[serde(default = "unit_weight")]
    pub weight: f32,
    #[serde(default)]
    pub center: Vec3,
    #[serde(default)]
    pub tile_size: Option<Vec3>,
    #[serde(default)]
    pub palette: Option<String>,
}

/// Named colors and the pairs of distinct colors allowed to touch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteDef {
    #[serde(default)]
    pub name: String,
    pub colors: Vec<PaletteEntry>,
    #[serde(default)]
    pub matches: Vec<[String; 2]>,
    #[serde(default)]
    pub wildcard: Option<String>,
}

/// An authored sample; an empty string leaves a cell unfilled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleDef {
    pub name: String,
    pub size: IVec3,
    pub cells: Vec<String>,
}

impl SampleDef {
    pub fn cell_names(&self) -> Vec<Option<String>> {
        self.cells
            .iter()
            .map(|c| (!c.is_empty()).then(|| c.clone()))
            .collect()
    }

    pub fn to_sample<C: CellType>(&self, info: &TileModelInfo<C>) -> Result<Sample<C::Rotation>> {
        super::samples::sample_from_names(info, self.size, &self.cell_names())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileLibrary {
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub tiles: Vec<TileDef>,
    #[serde(default)]
    pub palette: Option<PaletteDef>,
    #[serde(default)]
    pub scene: Vec<SceneObject>,
    #[serde(default)]
    pub samples: Vec<SampleDef>,
    #[serde(default)]
    pub mesh: Option<MeshData>,
}

impl TileLibrary {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let library: TileLibrary = toml::from_str(text)?;
        library
            .generator
            .validate()
            .map_err(TileGraphError::InvalidConfig)?;
        Ok(library)
    }

    /// Load a library file, naming the file in parse errors
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let library: TileLibrary = toml::from_str(&content)
            .map_err(|e| TileGraphError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        library
            .generator
            .validate()
            .map_err(|e| TileGraphError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), tiles = library.tiles.len(), "loaded tile library");
        Ok(library)
    }

    pub fn tile_names(&self) -> Vec<&str> {
        self.tiles.iter().map(|t| t.name.as_str()).collect()
    }

    /// Tiles for one lattice. Every tile must belong to the cell type's lattice.
    pub fn tile_entries<C: CellType>(&self, cell_type: &C) -> Result<Vec<TileEntry<C::FaceDir>>> {
        let kind = cell_type.kind();
        self.tiles
            .iter()
            .map(|def| {
                let lattice = def.lattice.unwrap_or(self.generator.lattice);
                if lattice != kind {
                    return Err(TileGraphError::MixedCellTypes(format!(
                        "{} ({}) on a {} generator",
                        def.name, lattice, kind
                    )));
                }
                Ok(TileEntry::new(self.build_tile(cell_type, def)?, def.weight))
            })
            .collect()
    }

    fn build_tile<C: CellType>(&self, cell_type: &C, def: &TileDef) -> Result<Tile<C::FaceDir>> {
        let mut tile = Tile::new(def.name.clone(), cell_type.kind()).with_offsets(def.offsets.iter().copied());
        tile.rotatable = def.rotatable;
        tile.reflectable = def.reflectable;
        tile.rotation_group = def.rotation_group;
        tile.symmetric = def.symmetric;
        tile.center = def.center;
        tile.tile_size = def.tile_size.unwrap_or(self.generator.tile_size);
        tile.palette = def.palette.clone();
        for p in &def.paint {
            let dir = cell_type.parse_dir(&p.dir).ok_or_else(|| {
                TileGraphError::InvalidConfig(format!(
                    "tile {}: {} is not a face of {} cells",
                    def.name,
                    p.dir,
                    cell_type.kind()
                ))
            })?;
            if !tile.contains(p.offset) {
                return Err(TileGraphError::InvalidConfig(format!(
                    "tile {}: paint on offset {} which the tile does not occupy",
                    def.name, p.offset
                )));
            }
            tile.set_paint(p.offset, dir, paint_details(cell_type.face_shape(dir), p, &def.name)?);
        }
        Ok(tile)
    }

    /// The library's palette, or a default one
    pub fn palette(&self) -> Result<Palette> {
        let Some(def) = &self.palette else {
            return Ok(Palette::default());
        };
        let mut palette = Palette::from_entries(def.name.clone(), def.colors.clone());
        let index = |name: &str| {
            palette
                .index_of(name)
                .ok_or_else(|| TileGraphError::InvalidConfig(format!("unknown palette color {}", name)))
        };
        let pairs = def
            .matches
            .iter()
            .map(|[a, b]| Ok((index(a)?, index(b)?)))
            .collect::<Result<Vec<_>>>()?;
        let wildcard = def.wildcard.as_deref().map(index).transpose()?;
        for (a, b) in pairs {
            palette.set_match(a, b, true);
        }
        if let Some(w) = wildcard {
            palette = palette.with_wildcard(w);
        }
        Ok(palette)
    }
}

fn paint_details(shape: FaceShape, p: &PaintDef, tile: &str) -> Result<FaceDetails> {
    if p.rim.is_empty() {
        return Ok(FaceDetails::uniform(shape, p.paint.unwrap_or(0)));
    }
    if p.rim.len() != shape.rim_len() {
        return Err(TileGraphError::InvalidConfig(format!(
            "tile {}: {} face needs {} rim slots, got {}",
            tile,
            p.dir,
            shape.rim_len(),
            p.rim.len()
        )));
    }
    Ok(FaceDetails::new(
        p.center.or(p.paint).unwrap_or(0),
        p.rim.clone(),
    ))
}
