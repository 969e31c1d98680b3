//! Tiles, canonical solver states and the adjacency model built from them

pub mod adjacency;
pub mod library;
pub mod palette;
pub mod samples;
pub mod tile;
pub mod tile_model_info;

pub use adjacency::{build_adjacency_model, AdjacencyModel, DirectionalAdjacency, GraphAdjacency};
pub use library::{PaintDef, PaletteDef, SampleDef, TileDef, TileLibrary};
pub use palette::{Palette, PaletteEntry};
pub use samples::{convert_sample, observed_adjacencies, sample_from_names, Sample};
pub use tile::{ModelTile, Tile, TileEntry, TileId};
pub use tile_model_info::{InternalAdjacency, TileModelInfo};
