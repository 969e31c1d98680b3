//! Triangular prism grid, laid out as a rhombus of up/down triangle pairs

use glam::{IVec3, Vec3};

use super::{range, BoxIndexer, FaceDirOf, Grid, Move, RotationOf};
use crate::core::types::Bounds;
use crate::lattice::hex_prism::SQRT3_2;
use crate::lattice::triangle_prism::{locate, points_up, tri_center};
use crate::lattice::{CellType, TrianglePrismCellType, TrianglePrismFaceDir, TriangleRotation};

#[derive(Debug, Clone)]
pub struct TrianglePrismGrid {
    cell_type: TrianglePrismCellType,
    /// Center of cell (0, 0, 0), an up triangle
    origin: Vec3,
    indexer: BoxIndexer,
    /// x is the side length, y the layer height
    tile_size: Vec3,
}

impl TrianglePrismGrid {
    pub fn new(origin: Vec3, size: IVec3, tile_size: Vec3) -> Self {
        Self {
            cell_type: TrianglePrismCellType::new(),
            origin,
            indexer: BoxIndexer::new(size),
            tile_size,
        }
    }

    /// Rhombus coordinates (u, v) of a local position, measured from the
    /// corner of rhombus (0, 0)
    fn rhombus(&self, local: Vec3) -> (f32, f32) {
        let w = self.tile_size.x;
        let hr = w * SQRT3_2;
        let px = local.x + w * 0.5;
        let pz = local.z + hr / 3.0;
        let v = pz / hr;
        (px / w - v * 0.5, v)
    }
}

impl Grid for TrianglePrismGrid {
    type Cell = TrianglePrismCellType;

    fn cell_type(&self) -> &TrianglePrismCellType {
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
            dest: self.cell_type.try_move(cell, dir)?,
            inverse_dir: self.cell_type.invert_dir(dir),
            rotation: TriangleRotation::IDENTITY,
        })
    }

    fn try_move_by_offset(
        &self,
        start_cell: IVec3,
        start_offset: IVec3,
        dest_offset: IVec3,
        start_rotation: TriangleRotation,
    ) -> Option<(IVec3, TriangleRotation)> {
        let dest = self.cell_type.try_move_by_offset(
            start_cell,
            start_offset,
            dest_offset,
            start_rotation,
        )?;
        Some((dest, start_rotation))
    }

    fn valid_face_dirs(&self, cell: IVec3) -> Vec<TrianglePrismFaceDir> {
        let mut dirs = TrianglePrismFaceDir::sides_for(points_up(cell)).to_vec();
        dirs.extend([TrianglePrismFaceDir::Up, TrianglePrismFaceDir::Down]);
        dirs
    }

    fn cell_center(&self, cell: IVec3) -> Vec3 {
        self.origin + tri_center(cell, self.tile_size.x, self.tile_size.y)
    }

    fn find_cell(&self, position: Vec3) -> Option<IVec3> {
        Some(locate(position - self.origin, self.tile_size.x, self.tile_size.y))
    }

    fn cells_intersecting_approx(&self, bounds: &Bounds, use_bounds: bool) -> Vec<IVec3> {
        let lo = bounds.min - self.origin;
        let hi = bounds.max - self.origin;
        let (_, v_lo) = self.rhombus(lo);
        let (_, v_hi) = self.rhombus(hi);
        let w = self.tile_size.x;
        let u_lo = (lo.x + w * 0.5) / w - v_hi * 0.5;
        let u_hi = (hi.x + w * 0.5) / w - v_lo * 0.5;
        let min = IVec3::new(
            2 * (u_lo.floor() as i32 - 1),
            (lo.y / self.tile_size.y).round() as i32,
            v_lo.floor() as i32 - 1,
        );
        let max = IVec3::new(
            2 * (u_hi.floor() as i32 + 1) + 1,
            (hi.y / self.tile_size.y).round() as i32,
            v_hi.floor() as i32 + 1,
        );
        if use_bounds {
            self.indexer.clamped_range(min, max)
        } else {
            range(min, max)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TrianglePrismGrid {
        TrianglePrismGrid::new(Vec3::new(0.5, 0.0, 1.0), IVec3::new(6, 2, 3), Vec3::new(2.0, 1.0, 2.0))
    }

    #[test]
    fn test_find_cell_inverts_center() {
        let g = grid();
        for cell in g.cells() {
            assert_eq!(g.find_cell(g.cell_center(cell)), Some(cell), "{:?}", cell);
        }
    }

    #[test]
    fn test_invalid_directions_do_not_move() {
        let g = grid();
        assert!(g.try_move(IVec3::ZERO, TrianglePrismFaceDir::Forward).is_none());
        assert!(g.try_move(IVec3::X, TrianglePrismFaceDir::Back).is_none());
        for cell in g.cells() {
            for dir in g.valid_face_dirs(cell) {
                assert!(g.try_move(cell, dir).is_some());
            }
        }
    }

    #[test]
    fn test_neighbors_share_an_edge() {
        let g = grid();
        let w = 2.0;
        // Centroids of edge-adjacent triangles are w / sqrt(3) apart
        let expected = w / 3f32.sqrt();
        for cell in g.cells() {
            for dir in TrianglePrismFaceDir::sides_for(points_up(cell)) {
                let m = g.try_move(cell, dir).unwrap();
                let d = g.cell_center(m.dest).distance(g.cell_center(cell));
                assert!((d - expected).abs() < 1e-4, "{:?} {:?}", cell, dir);
            }
        }
    }

    #[test]
    fn test_intersection_covers_cell_centers() {
        let g = grid();
        let b = Bounds::new(Vec3::new(1.0, 0.0, 1.5), Vec3::new(4.0, 1.0, 3.5));
        let found = g.cells_intersecting_approx(&b, true);
        for cell in g.cells() {
            if b.contains(g.cell_center(cell)) {
                assert!(found.contains(&cell), "{:?}", cell);
            }
        }
    }
}
