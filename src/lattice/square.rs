//! Square lattice in the XY plane

use ahash::{AHashMap, AHashSet};
use glam::{IVec3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::cell_type::{mirror_x, realign_by_coords, CellType, RotationTable};
use super::face_details::{FaceDetails, FaceShape};
use super::rotation::{LatticeRotation, SquareRotation};
use crate::core::types::{LatticeKind, RotationGroupType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SquareFaceDir {
    Right,
    Left,
    Up,
    Down,
}

impl SquareFaceDir {
    pub const ALL: [SquareFaceDir; 4] = [
        SquareFaceDir::Right,
        SquareFaceDir::Left,
        SquareFaceDir::Up,
        SquareFaceDir::Down,
    ];

    /// Counter-clockwise index starting at Right
    pub fn ccw_index(self) -> u8 {
        match self {
            SquareFaceDir::Right => 0,
            SquareFaceDir::Up => 1,
            SquareFaceDir::Left => 2,
            SquareFaceDir::Down => 3,
        }
    }

    pub fn from_ccw_index(i: u8) -> Self {
        match i % 4 {
            0 => SquareFaceDir::Right,
            1 => SquareFaceDir::Up,
            2 => SquareFaceDir::Left,
            _ => SquareFaceDir::Down,
        }
    }

    pub fn forward(self) -> IVec3 {
        match self {
            SquareFaceDir::Right => IVec3::X,
            SquareFaceDir::Left => IVec3::NEG_X,
            SquareFaceDir::Up => IVec3::Y,
            SquareFaceDir::Down => IVec3::NEG_Y,
        }
    }
}

/// Applies a square rotation to the x/y part of a vector
pub fn rotate_vector(rotation: SquareRotation, v: IVec3) -> IVec3 {
    let mut x = if rotation.reflect() { -v.x } else { v.x };
    let mut y = v.y;
    for _ in 0..rotation.turns() {
        (x, y) = (-y, x);
    }
    IVec3::new(x, y, v.z)
}

#[derive(Debug, Clone)]
pub struct SquareCellType {
    all: Vec<SquareRotation>,
    table: RotationTable<SquareRotation>,
}

impl SquareCellType {
    pub fn new() -> Self {
        let all = SquareRotation::all();
        let groups = vec![
            (
                RotationGroupType::None,
                vec![SquareRotation::IDENTITY, SquareRotation::REFLECT_X],
            ),
            (RotationGroupType::XY, all.clone()),
            (RotationGroupType::XZ, all.clone()),
            (RotationGroupType::YZ, all.clone()),
            (RotationGroupType::All, all.clone()),
        ];
        Self {
            table: RotationTable::new(groups, SquareRotation::REFLECT_X),
            all,
        }
    }

    pub fn reflect_y() -> SquareRotation {
        SquareRotation::reflection(2)
    }
}

impl Default for SquareCellType {
    fn default() -> Self {
        Self::new()
    }
}

impl CellType for SquareCellType {
    type FaceDir = SquareFaceDir;
    type Rotation = SquareRotation;

    fn kind(&self) -> LatticeKind {
        LatticeKind::Square
    }

    fn face_dirs(&self) -> &[SquareFaceDir] {
        &SquareFaceDir::ALL
    }

    fn invert_dir(&self, dir: SquareFaceDir) -> SquareFaceDir {
        match dir {
            SquareFaceDir::Right => SquareFaceDir::Left,
            SquareFaceDir::Left => SquareFaceDir::Right,
            SquareFaceDir::Up => SquareFaceDir::Down,
            SquareFaceDir::Down => SquareFaceDir::Up,
        }
    }

    fn face_shape(&self, _dir: SquareFaceDir) -> FaceShape {
        FaceShape::Square
    }

    fn all_rotations(&self) -> &[SquareRotation] {
        &self.all
    }

    fn rotations(
        &self,
        rotatable: bool,
        reflectable: bool,
        group: RotationGroupType,
    ) -> &[SquareRotation] {
        self.table.select(rotatable, reflectable, group)
    }

    fn rotate(&self, dir: SquareFaceDir, rotation: SquareRotation) -> SquareFaceDir {
        SquareFaceDir::from_ccw_index(rotation.apply_index(dir.ccw_index(), 2))
    }

    fn rotate_by(
        &self,
        dir: SquareFaceDir,
        details: &FaceDetails,
        rotation: SquareRotation,
    ) -> (SquareFaceDir, FaceDetails) {
        // Edge frames turn with the cell; only mirroring changes the paint
        let details = if rotation.is_reflection() {
            details.reflect_x()
        } else {
            details.clone()
        };
        (self.rotate(dir, rotation), details)
    }

    fn try_move(&self, offset: IVec3, dir: SquareFaceDir) -> Option<IVec3> {
        Some(offset + dir.forward())
    }

    fn find_path(&self, start: IVec3, end: IVec3) -> Vec<SquareFaceDir> {
        let delta = end - start;
        let x_dir = if delta.x > 0 {
            SquareFaceDir::Right
        } else {
            SquareFaceDir::Left
        };
        let y_dir = if delta.y > 0 {
            SquareFaceDir::Up
        } else {
            SquareFaceDir::Down
        };
        std::iter::repeat(x_dir)
            .take(delta.x.unsigned_abs() as usize)
            .chain(std::iter::repeat(y_dir).take(delta.y.unsigned_abs() as usize))
            .collect()
    }

    fn try_move_by_offset(
        &self,
        start: IVec3,
        start_offset: IVec3,
        dest_offset: IVec3,
        rotation: SquareRotation,
    ) -> Option<IVec3> {
        Some(start + rotate_vector(rotation, dest_offset - start_offset))
    }

    fn realign(
        &self,
        shape: &AHashSet<IVec3>,
        rotation: SquareRotation,
    ) -> Option<AHashMap<IVec3, IVec3>> {
        realign_by_coords(
            shape,
            |v| [v.x, v.y, v.z],
            |[x, y, z]| rotate_vector(rotation, IVec3::new(x, y, z)).to_array(),
        )
    }

    fn matrix(&self, rotation: SquareRotation) -> Mat4 {
        let turn = Mat4::from_rotation_z(rotation.angle());
        if rotation.is_reflection() {
            turn * mirror_x()
        } else {
            turn
        }
    }

    fn cell_center(&self, offset: IVec3, center: Vec3, tile_size: Vec3) -> Vec3 {
        center + offset.as_vec3() * tile_size
    }
}
