//! From solver values back to placed tiles

use ahash::{AHashMap, AHashSet};
use glam::{IVec3, Mat4};
use serde::Serialize;

use crate::core::types::Trs;
use crate::grid::{Grid, RotationOf};
use crate::lattice::CellType;
use crate::model::{ModelTile, TileId, TileModelInfo};

/// One big or small tile placed in the output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileInstance<R> {
    pub tile: TileId,
    pub name: String,
    /// Grid-local transform of the tile's own space
    pub trs: Trs,
    /// Cell holding the tile's first offset
    pub cell: IVec3,
    /// Cells covered, in the tile's sorted offset order
    pub cells: Vec<IVec3>,
    pub rotation: R,
    /// Frame of each covered cell; differs from `rotation` only on meshes
    pub cell_rotations: Vec<R>,
}

/// Grid-local transform that puts `tile` into `cell`
///
/// The tile's own offset `tile.offset` lands on the cell's center.
pub fn align<G: Grid>(
    grid: &G,
    info: &TileModelInfo<G::Cell>,
    cell: IVec3,
    tile: &ModelTile<RotationOf<G>>,
) -> Option<Trs> {
    let t = info.tile(tile.tile)?;
    let ct = grid.cell_type();
    let local = grid.trs(cell)
        * ct.matrix(tile.rotation)
        * Mat4::from_translation(-ct.cell_center(tile.offset, t.center, t.tile_size));
    Some(Trs::from_matrix(&local))
}

/// Expands a state decided at `cell` into the whole tile it is part of
///
/// Returns `None` if some offset has no cell, which happens at mesh edges.
pub fn grow_big_tile<G: Grid>(
    grid: &G,
    info: &TileModelInfo<G::Cell>,
    cell: IVec3,
    tile: &ModelTile<RotationOf<G>>,
) -> Option<TileInstance<RotationOf<G>>> {
    let t = info.tile(tile.tile)?;
    let mut cells = Vec::with_capacity(t.offset_count());
    let mut cell_rotations = Vec::with_capacity(t.offset_count());
    for offset in t.sorted_offsets() {
        let (c, r) = grid.try_move_by_offset(cell, tile.offset, offset, tile.rotation)?;
        cells.push(c);
        cell_rotations.push(r);
    }
    Some(TileInstance {
        tile: tile.tile,
        name: t.name.clone(),
        trs: align(grid, info, cell, tile)?,
        cell: *cells.first()?,
        cells,
        rotation: tile.rotation,
        cell_rotations,
    })
}

/// One instance per placed tile. Cells already covered by a grown big tile
/// are not decoded again.
pub fn to_tile_instances<G: Grid>(
    grid: &G,
    info: &TileModelInfo<G::Cell>,
    tile_data: &[(IVec3, ModelTile<RotationOf<G>>)],
) -> Vec<TileInstance<RotationOf<G>>> {
    let by_cell: AHashMap<IVec3, ModelTile<RotationOf<G>>> = tile_data.iter().copied().collect();
    let mut covered = AHashSet::new();
    let mut out = Vec::new();
    for cell in grid.cells() {
        if covered.contains(&cell) {
            continue;
        }
        let Some(mt) = by_cell.get(&cell) else {
            continue;
        };
        if let Some(instance) = grow_big_tile(grid, info, cell, mt) {
            covered.extend(instance.cells.iter().copied());
            out.push(instance);
        }
    }
    out
}
