//! Cube lattice

use ahash::{AHashMap, AHashSet};
use glam::{IVec3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::cell_type::{realign_by_coords, CellType, RotationTable};
use super::face_details::{FaceDetails, FaceShape};
use super::rotation::CubeRotation;
use crate::core::types::{LatticeKind, RotationGroupType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CubeFaceDir {
    Left,
    Right,
    Up,
    Down,
    Forward,
    Back,
}

impl CubeFaceDir {
    pub const ALL: [CubeFaceDir; 6] = [
        CubeFaceDir::Right,
        CubeFaceDir::Left,
        CubeFaceDir::Up,
        CubeFaceDir::Down,
        CubeFaceDir::Forward,
        CubeFaceDir::Back,
    ];

    pub fn forward(self) -> IVec3 {
        match self {
            CubeFaceDir::Left => IVec3::NEG_X,
            CubeFaceDir::Right => IVec3::X,
            CubeFaceDir::Up => IVec3::Y,
            CubeFaceDir::Down => IVec3::NEG_Y,
            CubeFaceDir::Forward => IVec3::Z,
            CubeFaceDir::Back => IVec3::NEG_Z,
        }
    }

    pub fn from_normal(n: IVec3) -> Option<CubeFaceDir> {
        CubeFaceDir::ALL.into_iter().find(|d| d.forward() == n)
    }

    /// Paint frame of the face: (u, v), with u × v pointing out of the cell
    pub fn frame(self) -> (IVec3, IVec3) {
        match self {
            CubeFaceDir::Right => (IVec3::NEG_Z, IVec3::Y),
            CubeFaceDir::Left => (IVec3::Z, IVec3::Y),
            CubeFaceDir::Up => (IVec3::NEG_X, IVec3::Z),
            CubeFaceDir::Down => (IVec3::X, IVec3::Z),
            CubeFaceDir::Forward => (IVec3::X, IVec3::Y),
            CubeFaceDir::Back => (IVec3::NEG_X, IVec3::Y),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CubeCellType {
    all: Vec<CubeRotation>,
    table: RotationTable<CubeRotation>,
}

impl CubeCellType {
    pub fn new() -> Self {
        let all = CubeRotation::all();
        let groups = vec![
            (
                RotationGroupType::None,
                vec![CubeRotation::IDENTITY, CubeRotation::REFLECT_X],
            ),
            (RotationGroupType::XZ, CubeRotation::about_axis(CubeRotation::ROTATE_XZ)),
            (RotationGroupType::XY, CubeRotation::about_axis(CubeRotation::ROTATE_XY)),
            (RotationGroupType::YZ, CubeRotation::about_axis(CubeRotation::ROTATE_YZ)),
            (RotationGroupType::All, all.clone()),
        ];
        Self {
            table: RotationTable::new(groups, CubeRotation::REFLECT_X),
            all,
        }
    }
}

impl Default for CubeCellType {
    fn default() -> Self {
        Self::new()
    }
}

impl CellType for CubeCellType {
    type FaceDir = CubeFaceDir;
    type Rotation = CubeRotation;

    fn kind(&self) -> LatticeKind {
        LatticeKind::Cube
    }

    fn face_dirs(&self) -> &[CubeFaceDir] {
        &CubeFaceDir::ALL
    }

    fn invert_dir(&self, dir: CubeFaceDir) -> CubeFaceDir {
        match dir {
            CubeFaceDir::Left => CubeFaceDir::Right,
            CubeFaceDir::Right => CubeFaceDir::Left,
            CubeFaceDir::Up => CubeFaceDir::Down,
            CubeFaceDir::Down => CubeFaceDir::Up,
            CubeFaceDir::Forward => CubeFaceDir::Back,
            CubeFaceDir::Back => CubeFaceDir::Forward,
        }
    }

    fn face_shape(&self, _dir: CubeFaceDir) -> FaceShape {
        FaceShape::Square
    }

    fn all_rotations(&self) -> &[CubeRotation] {
        &self.all
    }

    fn rotations(
        &self,
        rotatable: bool,
        reflectable: bool,
        group: RotationGroupType,
    ) -> &[CubeRotation] {
        self.table.select(rotatable, reflectable, group)
    }

    fn rotate(&self, dir: CubeFaceDir, rotation: CubeRotation) -> CubeFaceDir {
        CubeFaceDir::from_normal(rotation.apply(dir.forward())).unwrap_or(dir)
    }

    fn rotate_by(
        &self,
        dir: CubeFaceDir,
        details: &FaceDetails,
        rotation: CubeRotation,
    ) -> (CubeFaceDir, FaceDetails) {
        let new_dir = self.rotate(dir, rotation);
        let (u, v) = dir.frame();
        let (mu, mv) = (rotation.apply(u), rotation.apply(v));
        let (nu, nv) = new_dir.frame();
        // Old (u, v) coordinates expressed in the new face's frame
        let t = [[mu.dot(nu), mv.dot(nu)], [mu.dot(nv), mv.dot(nv)]];
        (new_dir, details.transform(t))
    }

    fn try_move(&self, offset: IVec3, dir: CubeFaceDir) -> Option<IVec3> {
        Some(offset + dir.forward())
    }

    fn find_path(&self, start: IVec3, end: IVec3) -> Vec<CubeFaceDir> {
        let delta = end - start;
        let axis = |d: i32, pos: CubeFaceDir, neg: CubeFaceDir| {
            std::iter::repeat(if d > 0 { pos } else { neg }).take(d.unsigned_abs() as usize)
        };
        axis(delta.x, CubeFaceDir::Right, CubeFaceDir::Left)
            .chain(axis(delta.y, CubeFaceDir::Up, CubeFaceDir::Down))
            .chain(axis(delta.z, CubeFaceDir::Forward, CubeFaceDir::Back))
            .collect()
    }

    fn try_move_by_offset(
        &self,
        start: IVec3,
        start_offset: IVec3,
        dest_offset: IVec3,
        rotation: CubeRotation,
    ) -> Option<IVec3> {
        Some(start + rotation.apply(dest_offset - start_offset))
    }

    fn realign(
        &self,
        shape: &AHashSet<IVec3>,
        rotation: CubeRotation,
    ) -> Option<AHashMap<IVec3, IVec3>> {
        realign_by_coords(
            shape,
            |v| v.to_array(),
            |c| rotation.apply(IVec3::from_array(c)).to_array(),
        )
    }

    fn matrix(&self, rotation: CubeRotation) -> Mat4 {
        Mat4::from_mat3(rotation.mat3())
    }

    fn cell_center(&self, offset: IVec3, center: Vec3, tile_size: Vec3) -> Vec3 {
        center + offset.as_vec3() * tile_size
    }
}
