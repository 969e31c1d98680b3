//! Hexagonal prism lattice
//!
//! Offsets use axial coordinates in the XZ plane: x runs along the Right
//! side, z along the ForwardLeft side (120° from x). y counts layers.
//! Rotation and reflection are easiest in cube coordinates
//! `(a, b, c) = (x, -z, z - x)`, which always sum to zero.

use ahash::{AHashMap, AHashSet};
use glam::{IVec3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::cell_type::{mirror_x, realign_by_coords, CellType, RotationTable};
use super::face_details::{FaceDetails, FaceShape};
use super::rotation::{HexRotation, LatticeRotation};
use crate::core::types::{LatticeKind, RotationGroupType};

pub(crate) const SQRT3_2: f32 = 0.866_025_4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HexPrismFaceDir {
    Left,
    Right,
    Up,
    Down,
    ForwardLeft,
    ForwardRight,
    BackLeft,
    BackRight,
}

/// Sides in counter-clockwise order starting at Right
const SIDES: [HexPrismFaceDir; 6] = [
    HexPrismFaceDir::Right,
    HexPrismFaceDir::ForwardRight,
    HexPrismFaceDir::ForwardLeft,
    HexPrismFaceDir::Left,
    HexPrismFaceDir::BackLeft,
    HexPrismFaceDir::BackRight,
];

impl HexPrismFaceDir {
    pub const ALL: [HexPrismFaceDir; 8] = [
        HexPrismFaceDir::Right,
        HexPrismFaceDir::Left,
        HexPrismFaceDir::Up,
        HexPrismFaceDir::Down,
        HexPrismFaceDir::ForwardLeft,
        HexPrismFaceDir::BackRight,
        HexPrismFaceDir::ForwardRight,
        HexPrismFaceDir::BackLeft,
    ];

    pub fn is_side(self) -> bool {
        !matches!(self, HexPrismFaceDir::Up | HexPrismFaceDir::Down)
    }

    pub fn side_index(self) -> Option<u8> {
        SIDES.iter().position(|&d| d == self).map(|i| i as u8)
    }

    pub fn from_side_index(i: u8) -> Self {
        SIDES[(i % 6) as usize]
    }

    pub fn forward(self) -> IVec3 {
        match self {
            HexPrismFaceDir::Right => IVec3::new(1, 0, 0),
            HexPrismFaceDir::Left => IVec3::new(-1, 0, 0),
            HexPrismFaceDir::Up => IVec3::new(0, 1, 0),
            HexPrismFaceDir::Down => IVec3::new(0, -1, 0),
            HexPrismFaceDir::ForwardLeft => IVec3::new(0, 0, 1),
            HexPrismFaceDir::ForwardRight => IVec3::new(1, 0, 1),
            HexPrismFaceDir::BackLeft => IVec3::new(-1, 0, -1),
            HexPrismFaceDir::BackRight => IVec3::new(0, 0, -1),
        }
    }
}

/// Cube coordinates of the planar part of an offset
pub fn to_cube(v: IVec3) -> [i32; 3] {
    [v.x, -v.z, v.z - v.x]
}

/// Inverse of `to_cube`, given the layer
pub fn from_cube([a, b, _]: [i32; 3], y: i32) -> IVec3 {
    IVec3::new(a, y, -b)
}

/// Applies a hex rotation to cube coordinates
pub fn rotate_cube(rotation: HexRotation, c: [i32; 3]) -> [i32; 3] {
    let [mut a, mut b, mut cc] = c;
    if rotation.reflect() {
        (a, cc) = (cc, a);
    }
    for _ in 0..rotation.turns() {
        (a, b, cc) = (-cc, -a, -b);
    }
    [a, b, cc]
}

/// Round fractional cube coordinates to the nearest hex
pub fn round_cube(a: f32, b: f32, c: f32) -> [i32; 3] {
    let mut ra = a.round();
    let mut rb = b.round();
    let rc = c.round();

    let a_diff = (ra - a).abs();
    let b_diff = (rb - b).abs();
    let c_diff = (rc - c).abs();

    if a_diff > b_diff && a_diff > c_diff {
        ra = -rb - rc;
    } else if b_diff > c_diff {
        rb = -ra - rc;
    }
    let rc = -ra - rb;

    [ra as i32, rb as i32, rc as i32]
}

/// Center of an offset, for a hex whose opposite sides are `w` apart and
/// whose layers are `h` tall
pub fn hex_center(v: IVec3, w: f32, h: f32) -> Vec3 {
    Vec3::new(
        (v.x as f32 - v.z as f32 * 0.5) * w,
        v.y as f32 * h,
        v.z as f32 * w * SQRT3_2,
    )
}

#[derive(Debug, Clone)]
pub struct HexPrismCellType {
    all: Vec<HexRotation>,
    table: RotationTable<HexRotation>,
}

impl HexPrismCellType {
    pub fn new() -> Self {
        let all = HexRotation::all();
        let fixed = vec![HexRotation::IDENTITY, HexRotation::REFLECT_X];
        let groups = vec![
            (RotationGroupType::None, fixed.clone()),
            (RotationGroupType::XZ, all.clone()),
            (RotationGroupType::All, all.clone()),
            (RotationGroupType::XY, fixed.clone()),
            (RotationGroupType::YZ, fixed),
        ];
        Self {
            table: RotationTable::new(groups, HexRotation::REFLECT_X),
            all,
        }
    }

    /// Mirror image swapping ForwardRight and BackLeft
    pub fn reflect_forward_right() -> HexRotation {
        HexRotation::reflection(2)
    }

    /// Mirror image swapping ForwardLeft and BackRight
    pub fn reflect_forward_left() -> HexRotation {
        HexRotation::reflection(4)
    }
}

impl Default for HexPrismCellType {
    fn default() -> Self {
        Self::new()
    }
}

impl CellType for HexPrismCellType {
    type FaceDir = HexPrismFaceDir;
    type Rotation = HexRotation;

    fn kind(&self) -> LatticeKind {
        LatticeKind::HexPrism
    }

    fn face_dirs(&self) -> &[HexPrismFaceDir] {
        &HexPrismFaceDir::ALL
    }

    fn invert_dir(&self, dir: HexPrismFaceDir) -> HexPrismFaceDir {
        match dir {
            HexPrismFaceDir::Up => HexPrismFaceDir::Down,
            HexPrismFaceDir::Down => HexPrismFaceDir::Up,
            side => HexPrismFaceDir::from_side_index(side.side_index().unwrap_or(0) + 3),
        }
    }

    fn face_shape(&self, dir: HexPrismFaceDir) -> FaceShape {
        if dir.is_side() {
            FaceShape::Square
        } else {
            FaceShape::Hexagon
        }
    }

    fn all_rotations(&self) -> &[HexRotation] {
        &self.all
    }

    fn rotations(
        &self,
        rotatable: bool,
        reflectable: bool,
        group: RotationGroupType,
    ) -> &[HexRotation] {
        self.table.select(rotatable, reflectable, group)
    }

    fn rotate(&self, dir: HexPrismFaceDir, rotation: HexRotation) -> HexPrismFaceDir {
        match dir.side_index() {
            Some(i) => HexPrismFaceDir::from_side_index(rotation.apply_index(i, 3)),
            None => dir,
        }
    }

    fn rotate_by(
        &self,
        dir: HexPrismFaceDir,
        details: &FaceDetails,
        rotation: HexRotation,
    ) -> (HexPrismFaceDir, FaceDetails) {
        let mirrored = if rotation.is_reflection() {
            details.reflect_x()
        } else {
            details.clone()
        };
        let turns = rotation.turns() as i32;
        let details = match dir {
            // The top cap is seen with u = -x, so world turns run backwards
            HexPrismFaceDir::Up => mirrored.rotate_rim(-2 * turns),
            HexPrismFaceDir::Down => mirrored.rotate_rim(2 * turns),
            _ => mirrored,
        };
        (self.rotate(dir, rotation), details)
    }

    fn try_move(&self, offset: IVec3, dir: HexPrismFaceDir) -> Option<IVec3> {
        Some(offset + dir.forward())
    }

    fn find_path(&self, start: IVec3, end: IVec3) -> Vec<HexPrismFaceDir> {
        let mut path = Vec::new();
        let delta = end - start;
        let (mut dx, dy, mut dz) = (delta.x, delta.y, delta.z);
        let vertical = if dy > 0 {
            HexPrismFaceDir::Up
        } else {
            HexPrismFaceDir::Down
        };
        path.extend(std::iter::repeat(vertical).take(dy.unsigned_abs() as usize));
        while dx > 0 && dz > 0 {
            path.push(HexPrismFaceDir::ForwardRight);
            dx -= 1;
            dz -= 1;
        }
        while dx < 0 && dz < 0 {
            path.push(HexPrismFaceDir::BackLeft);
            dx += 1;
            dz += 1;
        }
        let horizontal = if dx > 0 {
            HexPrismFaceDir::Right
        } else {
            HexPrismFaceDir::Left
        };
        path.extend(std::iter::repeat(horizontal).take(dx.unsigned_abs() as usize));
        let depth = if dz > 0 {
            HexPrismFaceDir::ForwardLeft
        } else {
            HexPrismFaceDir::BackRight
        };
        path.extend(std::iter::repeat(depth).take(dz.unsigned_abs() as usize));
        path
    }

    fn try_move_by_offset(
        &self,
        start: IVec3,
        start_offset: IVec3,
        dest_offset: IVec3,
        rotation: HexRotation,
    ) -> Option<IVec3> {
        let from = to_cube(start_offset);
        let to = to_cube(dest_offset);
        let delta = rotate_cube(rotation, [to[0] - from[0], to[1] - from[1], to[2] - from[2]]);
        let s = to_cube(start);
        Some(from_cube(
            [s[0] + delta[0], s[1] + delta[1], s[2] + delta[2]],
            start.y + dest_offset.y - start_offset.y,
        ))
    }

    fn realign(
        &self,
        shape: &AHashSet<IVec3>,
        rotation: HexRotation,
    ) -> Option<AHashMap<IVec3, IVec3>> {
        realign_by_coords(
            shape,
            |v| {
                let [a, b, c] = to_cube(v);
                [a, b, c, v.y]
            },
            |[a, b, c, y]| {
                let [a, b, c] = rotate_cube(rotation, [a, b, c]);
                [a, b, c, y]
            },
        )
    }

    fn matrix(&self, rotation: HexRotation) -> Mat4 {
        // Positive turns carry +x towards +z, which is a negative angle about y
        let turn = Mat4::from_rotation_y(-rotation.angle());
        if rotation.is_reflection() {
            turn * mirror_x()
        } else {
            turn
        }
    }

    fn cell_center(&self, offset: IVec3, center: Vec3, tile_size: Vec3) -> Vec3 {
        center + hex_center(offset, tile_size.x, tile_size.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::cell_type::realign_by_search;

    #[test]
    fn test_sides_rotate_counter_clockwise() {
        let ct = HexPrismCellType::new();
        let r = HexRotation::rotation(1);
        assert_eq!(ct.rotate(HexPrismFaceDir::Right, r), HexPrismFaceDir::ForwardRight);
        assert_eq!(ct.rotate(HexPrismFaceDir::BackRight, r), HexPrismFaceDir::Right);
        assert_eq!(ct.rotate(HexPrismFaceDir::Up, r), HexPrismFaceDir::Up);
    }

    #[test]
    fn test_cube_rotation_matches_directions() {
        let ct = HexPrismCellType::new();
        for &r in ct.all_rotations() {
            for dir in SIDES {
                let moved = from_cube(rotate_cube(r, to_cube(dir.forward())), 0);
                assert_eq!(moved, ct.rotate(dir, r).forward(), "{:?} {:?}", r, dir);
            }
        }
    }

    #[test]
    fn test_matrix_matches_directions() {
        let ct = HexPrismCellType::new();
        for &r in ct.all_rotations() {
            for dir in SIDES {
                let moved = ct.matrix(r).transform_vector3(hex_center(dir.forward(), 1.0, 1.0));
                let expected = hex_center(ct.rotate(dir, r).forward(), 1.0, 1.0);
                assert!(moved.abs_diff_eq(expected, 1e-4), "{:?} {:?}", r, dir);
            }
        }
    }

    #[test]
    fn test_named_reflections() {
        let ct = HexPrismCellType::new();
        let fr = HexPrismCellType::reflect_forward_right();
        assert_eq!(ct.rotate(HexPrismFaceDir::ForwardRight, fr), HexPrismFaceDir::BackLeft);
        assert_eq!(ct.rotate(HexPrismFaceDir::Right, fr), HexPrismFaceDir::BackRight);
        assert_eq!(ct.rotate(HexPrismFaceDir::ForwardLeft, fr), HexPrismFaceDir::Left);
        let fl = HexPrismCellType::reflect_forward_left();
        assert_eq!(ct.rotate(HexPrismFaceDir::ForwardLeft, fl), HexPrismFaceDir::BackRight);
        assert_eq!(ct.rotate(HexPrismFaceDir::Right, fl), HexPrismFaceDir::ForwardRight);
    }

    #[test]
    fn test_find_path_reaches_end() {
        let ct = HexPrismCellType::new();
        let start = IVec3::new(1, 0, -2);
        let end = IVec3::new(-2, 1, 3);
        let mut p = start;
        for dir in ct.find_path(start, end) {
            p = ct.try_move(p, dir).unwrap();
        }
        assert_eq!(p, end);
    }

    #[test]
    fn test_closed_form_move_matches_stepping() {
        let ct = HexPrismCellType::new();
        let start_offset = IVec3::new(0, 0, 0);
        let dest_offset = IVec3::new(2, 1, 1);
        for &r in ct.all_rotations() {
            let mut p = IVec3::new(3, 0, 3);
            for step in ct.find_path(start_offset, dest_offset) {
                p = ct.try_move(p, ct.rotate(step, r)).unwrap();
            }
            assert_eq!(
                ct.try_move_by_offset(IVec3::new(3, 0, 3), start_offset, dest_offset, r),
                Some(p)
            );
        }
    }

    #[test]
    fn test_closed_form_realign_matches_search() {
        let ct = HexPrismCellType::new();
        let shape: AHashSet<IVec3> =
            [IVec3::ZERO, IVec3::X, IVec3::new(1, 0, 1)].into_iter().collect();
        for &r in ct.all_rotations() {
            assert_eq!(ct.realign(&shape, r), realign_by_search(&ct, &shape, r));
        }
    }

    #[test]
    fn test_cap_paint_follows_rotation() {
        let ct = HexPrismCellType::new();
        // Up cap slot 0 points at the Left side (u = -x)
        let mut cap = FaceDetails::uniform(FaceShape::Hexagon, 0);
        cap.rim[0] = 7;
        let (_, rotated) = ct.rotate_by(HexPrismFaceDir::Up, &cap, HexRotation::rotation(1));
        // Left turns to BackLeft, at world angle 240°, which is slot 180 - 240 = -60° -> 10
        assert_eq!(rotated.rim[10], 7);
    }

    #[test]
    fn test_round_cube() {
        assert_eq!(round_cube(0.1, -0.2, 0.1), [0, 0, 0]);
        assert_eq!(round_cube(0.9, -0.1, -0.8), [1, 0, -1]);
    }
}
