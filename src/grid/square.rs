//! Square grid in the XY plane

use glam::{IVec3, Vec3};

use super::{range, BoxIndexer, FaceDirOf, Grid, GridSymmetry, Move, RotationOf};
use crate::core::types::{Bounds, RotationGroupType};
use crate::lattice::square::rotate_vector;
use crate::lattice::{CellType, SquareCellType, SquareRotation};

#[derive(Debug, Clone)]
pub struct SquareGrid {
    cell_type: SquareCellType,
    /// Center of cell (0, 0)
    origin: Vec3,
    indexer: BoxIndexer,
    tile_size: Vec3,
}

impl SquareGrid {
    /// `size.z` is ignored; square grids are one cell deep
    pub fn new(origin: Vec3, size: IVec3, tile_size: Vec3) -> Self {
        Self {
            cell_type: SquareCellType::new(),
            origin,
            indexer: BoxIndexer::new(IVec3::new(size.x, size.y, 1)),
            tile_size,
        }
    }
}

impl Grid for SquareGrid {
    type Cell = SquareCellType;

    fn cell_type(&self) -> &SquareCellType {
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
            rotation: SquareRotation::IDENTITY,
        })
    }

    fn try_move_by_offset(
        &self,
        start_cell: IVec3,
        start_offset: IVec3,
        dest_offset: IVec3,
        start_rotation: SquareRotation,
    ) -> Option<(IVec3, SquareRotation)> {
        let dest = start_cell + rotate_vector(start_rotation, dest_offset - start_offset);
        Some((dest, start_rotation))
    }

    fn cell_center(&self, cell: IVec3) -> Vec3 {
        self.origin + Vec3::new(cell.x as f32, cell.y as f32, 0.0) * self.tile_size
    }

    fn find_cell(&self, position: Vec3) -> Option<IVec3> {
        let local = (position - self.origin) / self.tile_size;
        Some(IVec3::new(local.x.round() as i32, local.y.round() as i32, 0))
    }

    fn cells_intersecting_approx(&self, bounds: &Bounds, use_bounds: bool) -> Vec<IVec3> {
        let (Some(min), Some(max)) = (self.find_cell(bounds.min), self.find_cell(bounds.max)) else {
            return Vec::new();
        };
        if use_bounds {
            self.indexer.clamped_range(min, max)
        } else {
            range(min, max)
        }
    }

    fn bounds_symmetries(
        &self,
        rotatable: bool,
        reflectable: bool,
        group: RotationGroupType,
    ) -> Vec<(GridSymmetry<SquareRotation>, IVec3)> {
        let last = self.indexer.size - IVec3::ONE;
        self.cell_type
            .rotations(rotatable, reflectable, group)
            .iter()
            .map(|&r| {
                let corner = rotate_vector(r, last);
                let min = corner.min(IVec3::ZERO);
                let size = rotate_vector(r, self.indexer.size).abs();
                (
                    GridSymmetry {
                        rotation: r,
                        translation: -min,
                    },
                    IVec3::new(size.x, size.y, 1),
                )
            })
            .collect()
    }

    fn try_apply_symmetry(
        &self,
        symmetry: &GridSymmetry<SquareRotation>,
        cell: IVec3,
    ) -> Option<(IVec3, SquareRotation)> {
        Some((
            symmetry.translation + rotate_vector(symmetry.rotation, cell),
            symmetry.rotation,
        ))
    }

    fn resized(&self, size: IVec3) -> Option<Self> {
        Some(Self::new(self.origin, size, self.tile_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::SquareFaceDir;

    fn grid() -> SquareGrid {
        SquareGrid::new(Vec3::ZERO, IVec3::new(3, 2, 1), Vec3::ONE)
    }

    #[test]
    fn test_index_order_is_x_fastest() {
        let g = grid();
        assert_eq!(g.index_count(), 6);
        assert_eq!(g.get_cell(4), Some(IVec3::new(1, 1, 0)));
        assert_eq!(g.get_index(IVec3::new(2, 1, 0)), Some(5));
    }

    #[test]
    fn test_move_can_leave_bounds() {
        let g = grid();
        let m = g.try_move(IVec3::new(2, 0, 0), SquareFaceDir::Right).unwrap();
        assert_eq!(m.dest, IVec3::new(3, 0, 0));
        assert_eq!(m.inverse_dir, SquareFaceDir::Left);
        assert!(!g.in_bounds(m.dest));
    }

    #[test]
    fn test_find_cell_rounds_to_nearest() {
        let g = grid();
        assert_eq!(g.find_cell(Vec3::new(1.4, 0.6, 0.2)), Some(IVec3::new(1, 1, 0)));
        assert_eq!(g.find_cell(Vec3::new(-3.0, 0.0, 0.0)), Some(IVec3::new(-3, 0, 0)));
    }

    #[test]
    fn test_bounds_symmetries_map_onto_new_box() {
        let g = grid();
        let syms = g.bounds_symmetries(true, true, RotationGroupType::XY);
        assert_eq!(syms.len(), 8);
        for (s, size) in syms {
            let target = BoxIndexer::new(size);
            for cell in g.cells() {
                let (dest, _) = g.try_apply_symmetry(&s, cell).unwrap();
                assert!(target.contains(dest), "{:?} {:?}", s, dest);
            }
        }
    }

    #[test]
    fn test_intersection_is_clamped() {
        let g = grid();
        let b = Bounds::new(Vec3::splat(-5.0), Vec3::splat(0.2));
        assert_eq!(g.cells_intersecting_approx(&b, true), vec![IVec3::ZERO]);
        assert_eq!(g.cells_intersecting_approx(&b, false).len(), 36);
    }
}
