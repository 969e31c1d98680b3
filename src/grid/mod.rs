//! Generation grids: dense cell indexing, navigation and spatial queries
//!
//! A grid maps between three spaces: dense indices `0..index_count`, integer
//! cells, and local world positions. Regular grids index a box of
//! `size.x * size.y * size.z` cells; mesh grids pack the faces of a surface.

pub mod cube;
pub mod hex_prism;
pub mod mesh;
pub mod mesh_builder;
pub mod spatial_hash;
pub mod square;
pub mod topology;
pub mod triangle_prism;

use glam::{IVec3, Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::types::{Bounds, RotationGroupType};
use crate::lattice::CellType;

pub use cube::CubeGrid;
pub use hex_prism::HexPrismGrid;
pub use mesh::{MeshData, MeshGrid, SubMesh};
pub use mesh_builder::{MeshCellType, MeshGridBuilder};
pub use spatial_hash::SpatialHash;
pub use square::SquareGrid;
pub use topology::{EdgeLabels, Topology, TopologyEdge};
pub use triangle_prism::TrianglePrismGrid;

pub type FaceDirOf<G> = <<G as Grid>::Cell as CellType>::FaceDir;
pub type RotationOf<G> = <<G as Grid>::Cell as CellType>::Rotation;

/// Result of stepping out of a cell through one face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move<D, R> {
    pub dest: IVec3,
    /// The face of `dest` the step arrived through, in `dest`'s frame
    pub inverse_dir: D,
    /// Change of frame from the source cell to `dest`
    pub rotation: R,
}

/// A rotation plus translation mapping a grid's cells onto another grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSymmetry<R> {
    pub rotation: R,
    pub translation: IVec3,
}

pub trait Grid: std::fmt::Debug + Send + Sync {
    type Cell: CellType;

    fn cell_type(&self) -> &Self::Cell;

    /// Extent of the cell coordinates (width, height, depth)
    fn size(&self) -> IVec3;

    fn index_count(&self) -> usize;

    /// Dense index of an in-bounds cell
    fn get_index(&self, cell: IVec3) -> Option<usize>;

    fn get_cell(&self, index: usize) -> Option<IVec3>;

    fn in_bounds(&self, cell: IVec3) -> bool;

    /// Every in-bounds cell, in index order
    fn cells(&self) -> Vec<IVec3> {
        (0..self.index_count())
            .filter_map(|i| self.get_cell(i))
            .collect()
    }

    /// One step through a face. Regular grids may return a destination
    /// outside the bounds, so callers check `in_bounds`.
    fn try_move(
        &self,
        cell: IVec3,
        dir: FaceDirOf<Self>,
    ) -> Option<Move<FaceDirOf<Self>, RotationOf<Self>>>;

    /// Finds the cell that `dest_offset` of a tile occupies when its
    /// `start_offset` sits at `start_cell` with orientation `start_rotation`
    fn try_move_by_offset(
        &self,
        start_cell: IVec3,
        start_offset: IVec3,
        dest_offset: IVec3,
        start_rotation: RotationOf<Self>,
    ) -> Option<(IVec3, RotationOf<Self>)> {
        if start_offset == dest_offset {
            return Some((start_cell, start_rotation));
        }
        let ct = self.cell_type();
        let mut cell = start_cell;
        let mut rotation = start_rotation;
        for step in ct.find_path(start_offset, dest_offset) {
            let m = self.try_move(cell, ct.rotate(step, rotation))?;
            cell = m.dest;
            rotation = ct.multiply(m.rotation, rotation);
        }
        Some((cell, rotation))
    }

    /// Directions `try_move` may succeed in from `cell`
    fn valid_face_dirs(&self, _cell: IVec3) -> Vec<FaceDirOf<Self>> {
        self.cell_type().face_dirs().to_vec()
    }

    /// Every rotation `try_move` can report
    fn move_rotations(&self) -> Vec<RotationOf<Self>> {
        vec![self.cell_type().identity()]
    }

    fn cell_center(&self, cell: IVec3) -> Vec3;

    /// Local frame of a cell, translating to its center. Tile rotation is
    /// applied before this.
    fn trs(&self, cell: IVec3) -> Mat4 {
        Mat4::from_translation(self.cell_center(cell))
    }

    /// Cell containing a position. Regular grids answer for positions
    /// outside their bounds too.
    fn find_cell(&self, position: Vec3) -> Option<IVec3>;

    /// Cell and orientation of a tile whose offset zero is centered at
    /// `tile_center` in tile space, placed with `tile_to_grid`
    fn find_cell_oriented(
        &self,
        tile_center: Vec3,
        tile_to_grid: Mat4,
    ) -> Option<(IVec3, RotationOf<Self>)> {
        let rotation = self
            .cell_type()
            .rotation_from_matrix(Mat3::from_mat4(tile_to_grid))?;
        let cell = self.find_cell(tile_to_grid.transform_point3(tile_center))?;
        Some((cell, rotation))
    }

    /// A superset of the cells overlapping `bounds`. With `use_bounds`,
    /// out-of-bounds cells are left out.
    fn cells_intersecting_approx(&self, bounds: &Bounds, use_bounds: bool) -> Vec<IVec3>;

    /// Rotations under which the grid's box maps onto another box, with the
    /// size of that box
    fn bounds_symmetries(
        &self,
        _rotatable: bool,
        _reflectable: bool,
        _group: RotationGroupType,
    ) -> Vec<(GridSymmetry<RotationOf<Self>>, IVec3)> {
        Vec::new()
    }

    fn try_apply_symmetry(
        &self,
        _symmetry: &GridSymmetry<RotationOf<Self>>,
        _cell: IVec3,
    ) -> Option<(IVec3, RotationOf<Self>)> {
        None
    }

    /// Same lattice and spacing over a box of a different size. Only box
    /// grids with bounds symmetries support this.
    fn resized(&self, _size: IVec3) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }
}

/// Row-major indexing of a box of cells, x fastest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxIndexer {
    pub size: IVec3,
}

impl BoxIndexer {
    pub fn new(size: IVec3) -> Self {
        Self { size }
    }

    pub fn count(&self) -> usize {
        (self.size.x.max(0) * self.size.y.max(0) * self.size.z.max(0)) as usize
    }

    pub fn contains(&self, cell: IVec3) -> bool {
        cell.cmpge(IVec3::ZERO).all() && cell.cmplt(self.size).all()
    }

    pub fn index(&self, cell: IVec3) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        Some((cell.x + cell.y * self.size.x + cell.z * self.size.x * self.size.y) as usize)
    }

    pub fn cell(&self, index: usize) -> Option<IVec3> {
        if index >= self.count() {
            return None;
        }
        let i = index as i32;
        let x = i % self.size.x;
        let rest = i / self.size.x;
        Some(IVec3::new(x, rest % self.size.y, rest / self.size.y))
    }

    /// Cells of the box between two corners, clamped to the box
    pub fn clamped_range(&self, min: IVec3, max: IVec3) -> Vec<IVec3> {
        let lo = min.max(IVec3::ZERO);
        let hi = max.min(self.size - IVec3::ONE);
        range(lo, hi)
    }
}

/// Every cell between two corners, inclusive
pub(crate) fn range(lo: IVec3, hi: IVec3) -> Vec<IVec3> {
    let mut out = Vec::new();
    for z in lo.z..=hi.z {
        for y in lo.y..=hi.y {
            for x in lo.x..=hi.x {
                out.push(IVec3::new(x, y, z));
            }
        }
    }
    out
}
