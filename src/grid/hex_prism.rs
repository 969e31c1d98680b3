//! Hexagonal prism grid, laid out as a rhombus in axial coordinates

use glam::{IVec3, Vec3};

use super::{range, BoxIndexer, FaceDirOf, Grid, Move, RotationOf};
use crate::core::types::Bounds;
use crate::lattice::hex_prism::{from_cube, hex_center, round_cube, SQRT3_2};
use crate::lattice::{CellType, HexPrismCellType, HexRotation};

#[derive(Debug, Clone)]
pub struct HexPrismGrid {
    cell_type: HexPrismCellType,
    /// Center of cell (0, 0, 0)
    origin: Vec3,
    indexer: BoxIndexer,
    /// x is the distance between opposite sides, y the layer height
    tile_size: Vec3,
}

impl HexPrismGrid {
    pub fn new(origin: Vec3, size: IVec3, tile_size: Vec3) -> Self {
        Self {
            cell_type: HexPrismCellType::new(),
            origin,
            indexer: BoxIndexer::new(size),
            tile_size,
        }
    }

    /// Fractional axial coordinates (x, z) of a local position
    fn axial(&self, local: Vec3) -> (f32, f32) {
        let w = self.tile_size.x;
        let z = local.z / (w * SQRT3_2);
        (local.x / w + z * 0.5, z)
    }
}

impl Grid for HexPrismGrid {
    type Cell = HexPrismCellType;

    fn cell_type(&self) -> &HexPrismCellType {
        &self.cell_type
    }

    fn size(&self) -> IVec3 {
        self.indexer.size
    }

    fn index_count(&self) -> usize {
        self.indexer.count()
    }

    fn get_index(&self, cell: IVec3) -> Option<usize> {
        self.indexer.index(cell)
    }

    fn get_cell(&self, index: usize) -> Option<IVec3> {
        self.indexer.cell(index)
    }

    fn in_bounds(&self, cell: IVec3) -> bool {
        self.indexer.contains(cell)
    }

    fn try_move(
        &self,
        cell: IVec3,
        dir: FaceDirOf<Self>,
    ) -> Option<Move<FaceDirOf<Self>, RotationOf<Self>>> {
        Some(Move {
            dest: cell + dir.forward(),
            inverse_dir: self.cell_type.invert_dir(dir),
            rotation: HexRotation::IDENTITY,
        })
    }

    fn try_move_by_offset(
        &self,
        start_cell: IVec3,
        start_offset: IVec3,
        dest_offset: IVec3,
        start_rotation: HexRotation,
    ) -> Option<(IVec3, HexRotation)> {
        let dest = self.cell_type.try_move_by_offset(
            start_cell,
            start_offset,
            dest_offset,
            start_rotation,
        )?;
        Some((dest, start_rotation))
    }

    fn cell_center(&self, cell: IVec3) -> Vec3 {
        self.origin + hex_center(cell, self.tile_size.x, self.tile_size.y)
    }

    fn find_cell(&self, position: Vec3) -> Option<IVec3> {
        let local = position - self.origin;
        let (x, z) = self.axial(local);
        let cube = round_cube(x, -z, z - x);
        let y = (local.y / self.tile_size.y).round() as i32;
        Some(from_cube(cube, y))
    }

    fn cells_intersecting_approx(&self, bounds: &Bounds, use_bounds: bool) -> Vec<IVec3> {
        let lo = bounds.min - self.origin;
        let hi = bounds.max - self.origin;
        let (_, z_lo) = self.axial(lo);
        let (_, z_hi) = self.axial(hi);
        // x depends on both axes; one cell of slack covers the pointy ends
        let x_lo = lo.x / self.tile_size.x + z_lo * 0.5;
        let x_hi = hi.x / self.tile_size.x + z_hi * 0.5;
        let min = IVec3::new(
            x_lo.floor() as i32 - 1,
            (lo.y / self.tile_size.y).round() as i32,
            z_lo.floor() as i32 - 1,
        );
        let max = IVec3::new(
            x_hi.ceil() as i32 + 1,
            (hi.y / self.tile_size.y).round() as i32,
            z_hi.ceil() as i32 + 1,
        );
        if use_bounds {
            self.indexer.clamped_range(min, max)
        } else {
            range(min, max)
        }
    }
}
