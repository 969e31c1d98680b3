//! Cube grid

use glam::{IVec3, Vec3};

use super::{range, BoxIndexer, FaceDirOf, Grid, GridSymmetry, Move, RotationOf};
use crate::core::types::{Bounds, RotationGroupType};
use crate::lattice::{CellType, CubeCellType, CubeRotation};

#[derive(Debug, Clone)]
pub struct CubeGrid {
    cell_type: CubeCellType,
    /// Center of cell (0, 0, 0)
    origin: Vec3,
    indexer: BoxIndexer,
    tile_size: Vec3,
}

impl CubeGrid {
    pub fn new(origin: Vec3, size: IVec3, tile_size: Vec3) -> Self {
        Self {
            cell_type: CubeCellType::new(),
            origin,
            indexer: BoxIndexer::new(size),
            tile_size,
        }
    }
}

impl Grid for CubeGrid {
    type Cell = CubeCellType;

    fn cell_type(&self) -> &CubeCellType {
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
            rotation: CubeRotation::IDENTITY,
        })
    }

    fn try_move_by_offset(
        &self,
        start_cell: IVec3,
        start_offset: IVec3,
        dest_offset: IVec3,
        start_rotation: CubeRotation,
    ) -> Option<(IVec3, CubeRotation)> {
        Some((
            start_cell + start_rotation.apply(dest_offset - start_offset),
            start_rotation,
        ))
    }

    fn cell_center(&self, cell: IVec3) -> Vec3 {
        self.origin + cell.as_vec3() * self.tile_size
    }

    fn find_cell(&self, position: Vec3) -> Option<IVec3> {
        Some(((position - self.origin) / self.tile_size).round().as_ivec3())
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
    ) -> Vec<(GridSymmetry<CubeRotation>, IVec3)> {
        let last = self.indexer.size - IVec3::ONE;
        self.cell_type
            .rotations(rotatable, reflectable, group)
            .iter()
            .map(|&r| {
                let min = r.apply(last).min(IVec3::ZERO);
                (
                    GridSymmetry {
                        rotation: r,
                        translation: -min,
                    },
                    r.apply(self.indexer.size).abs(),
                )
            })
            .collect()
    }

    fn try_apply_symmetry(
        &self,
        symmetry: &GridSymmetry<CubeRotation>,
        cell: IVec3,
    ) -> Option<(IVec3, CubeRotation)> {
        Some((
            symmetry.translation + symmetry.rotation.apply(cell),
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
    use crate::lattice::CubeFaceDir;

    #[test]
    fn test_find_cell_oriented_reads_rotation() {
        let g = CubeGrid::new(Vec3::ZERO, IVec3::splat(4), Vec3::splat(2.0));
        let m = glam::Mat4::from_translation(Vec3::new(4.0, 2.0, 0.0))
            * glam::Mat4::from_rotation_y(-std::f32::consts::FRAC_PI_2);
        let (cell, rotation) = g.find_cell_oriented(Vec3::ZERO, m).unwrap();
        assert_eq!(cell, IVec3::new(2, 1, 0));
        assert_eq!(
            g.cell_type().rotate(CubeFaceDir::Right, rotation),
            CubeFaceDir::Forward
        );
    }

    #[test]
    fn test_offset_move_applies_rotation() {
        let g = CubeGrid::new(Vec3::ZERO, IVec3::splat(4), Vec3::ONE);
        let (dest, r) = g
            .try_move_by_offset(IVec3::ONE, IVec3::ZERO, IVec3::X, CubeRotation::ROTATE_XZ)
            .unwrap();
        assert_eq!(dest, IVec3::new(1, 1, 2));
        assert_eq!(r, CubeRotation::ROTATE_XZ);
    }

    #[test]
    fn test_bounds_symmetries_of_flat_box() {
        let g = CubeGrid::new(Vec3::ZERO, IVec3::new(4, 1, 2), Vec3::ONE);
        let syms = g.bounds_symmetries(true, false, RotationGroupType::XZ);
        assert_eq!(syms.len(), 4);
        assert_eq!(syms[1].1, IVec3::new(2, 1, 4));
        for (s, size) in syms {
            let target = BoxIndexer::new(size);
            assert!(g
                .cells()
                .into_iter()
                .all(|c| target.contains(g.try_apply_symmetry(&s, c).unwrap().0)));
        }
    }
}
