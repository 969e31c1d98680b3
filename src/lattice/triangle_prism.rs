//! Triangular prism lattice
//!
//! Two triangles share each rhombus of a skewed grid. Offset x packs the
//! rhombus column and which half: even x points Forward ("up" triangles),
//! odd x points Back. z is the rhombus row, y counts layers.
//!
//! Rotations act linearly on the triangle coordinates
//! `(a, b, c) = (x div 2, z, -(x div 2) - z - (x mod 2))`, whose sum is 0 for
//! up triangles and -1 for down ones.

use ahash::{AHashMap, AHashSet};
use glam::{IVec3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::cell_type::{mirror_x, realign_by_coords, CellType, RotationTable};
use super::face_details::{FaceDetails, FaceShape};
use super::hex_prism::SQRT3_2;
use super::rotation::{LatticeRotation, TriangleRotation};
use crate::core::types::{LatticeKind, RotationGroupType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrianglePrismFaceDir {
    Forward,
    Back,
    Up,
    Down,
    ForwardRight,
    ForwardLeft,
    BackRight,
    BackLeft,
}

/// Sides in counter-clockwise order starting at 30°
const SIDES: [TrianglePrismFaceDir; 6] = [
    TrianglePrismFaceDir::ForwardRight,
    TrianglePrismFaceDir::Forward,
    TrianglePrismFaceDir::ForwardLeft,
    TrianglePrismFaceDir::BackLeft,
    TrianglePrismFaceDir::Back,
    TrianglePrismFaceDir::BackRight,
];

impl TrianglePrismFaceDir {
    pub const ALL: [TrianglePrismFaceDir; 8] = [
        TrianglePrismFaceDir::Back,
        TrianglePrismFaceDir::Forward,
        TrianglePrismFaceDir::Up,
        TrianglePrismFaceDir::Down,
        TrianglePrismFaceDir::ForwardRight,
        TrianglePrismFaceDir::BackLeft,
        TrianglePrismFaceDir::BackRight,
        TrianglePrismFaceDir::ForwardLeft,
    ];

    pub fn is_side(self) -> bool {
        !matches!(self, TrianglePrismFaceDir::Up | TrianglePrismFaceDir::Down)
    }

    pub fn side_index(self) -> Option<u8> {
        SIDES.iter().position(|&d| d == self).map(|i| i as u8)
    }

    pub fn from_side_index(i: u8) -> Self {
        SIDES[(i % 6) as usize]
    }

    /// Sides present on a triangle of the given orientation
    pub fn sides_for(points_up: bool) -> [TrianglePrismFaceDir; 3] {
        if points_up {
            [
                TrianglePrismFaceDir::Back,
                TrianglePrismFaceDir::ForwardRight,
                TrianglePrismFaceDir::ForwardLeft,
            ]
        } else {
            [
                TrianglePrismFaceDir::Forward,
                TrianglePrismFaceDir::BackLeft,
                TrianglePrismFaceDir::BackRight,
            ]
        }
    }
}

pub fn points_up(v: IVec3) -> bool {
    v.x.rem_euclid(2) == 0
}

/// Triangle coordinates of the planar part of an offset
pub fn to_tri(v: IVec3) -> [i32; 3] {
    let i = v.x.div_euclid(2);
    let k = v.x.rem_euclid(2);
    [i, v.z, -i - v.z - k]
}

/// Inverse of `to_tri`; `None` if the coordinates name no triangle
pub fn from_tri([a, b, c]: [i32; 3], y: i32) -> Option<IVec3> {
    match a + b + c {
        0 => Some(IVec3::new(2 * a, y, b)),
        -1 => Some(IVec3::new(2 * a + 1, y, b)),
        _ => None,
    }
}

/// Linear part of a rotation acting on triangle coordinate differences
pub fn rotate_tri(rotation: TriangleRotation, d: [i32; 3]) -> [i32; 3] {
    let [mut a, mut b, mut c] = d;
    if rotation.reflect() {
        (a, c) = (c, a);
    }
    for _ in 0..rotation.turns() {
        (a, b, c) = (-b, -c, -a);
    }
    [a, b, c]
}

/// Offset of a triangle's centroid from the centroid of triangle (0, 0, 0),
/// for side length `w` and layer height `h`
pub fn tri_center(v: IVec3, w: f32, h: f32) -> Vec3 {
    let k = v.x.rem_euclid(2) as f32;
    Vec3::new(
        (v.x + v.z) as f32 * 0.5 * w,
        v.y as f32 * h,
        (v.z as f32 + k / 3.0) * w * SQRT3_2,
    )
}

/// Offset whose prism contains a point given relative to the centroid of
/// offset zero
pub fn locate(local: Vec3, w: f32, h: f32) -> IVec3 {
    let hr = w * SQRT3_2;
    let v = (local.z + hr / 3.0) / hr;
    let u = (local.x + w * 0.5) / w - v * 0.5;
    let (i, z) = (u.floor(), v.floor());
    let down = (u - i) + (v - z) >= 1.0;
    IVec3::new(2 * i as i32 + down as i32, (local.y / h).round() as i32, z as i32)
}

fn sub(a: [i32; 3], b: [i32; 3]) -> [i32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn add(a: [i32; 3], b: [i32; 3]) -> [i32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[derive(Debug, Clone)]
pub struct TrianglePrismCellType {
    all: Vec<TriangleRotation>,
    table: RotationTable<TriangleRotation>,
}

impl TrianglePrismCellType {
    pub fn new() -> Self {
        let all = TriangleRotation::all();
        let fixed = vec![TriangleRotation::IDENTITY, TriangleRotation::REFLECT_X];
        let groups = vec![
            (RotationGroupType::None, fixed.clone()),
            (RotationGroupType::XZ, all.clone()),
            (RotationGroupType::All, all.clone()),
            (RotationGroupType::XY, fixed.clone()),
            (RotationGroupType::YZ, fixed),
        ];
        Self {
            table: RotationTable::new(groups, TriangleRotation::REFLECT_X),
            all,
        }
    }
}

impl Default for TrianglePrismCellType {
    fn default() -> Self {
        Self::new()
    }
}

impl CellType for TrianglePrismCellType {
    type FaceDir = TrianglePrismFaceDir;
    type Rotation = TriangleRotation;

    fn kind(&self) -> LatticeKind {
        LatticeKind::TrianglePrism
    }

    fn face_dirs(&self) -> &[TrianglePrismFaceDir] {
        &TrianglePrismFaceDir::ALL
    }

    fn invert_dir(&self, dir: TrianglePrismFaceDir) -> TrianglePrismFaceDir {
        match dir {
            TrianglePrismFaceDir::Up => TrianglePrismFaceDir::Down,
            TrianglePrismFaceDir::Down => TrianglePrismFaceDir::Up,
            side => TrianglePrismFaceDir::from_side_index(side.side_index().unwrap_or(0) + 3),
        }
    }

    fn face_shape(&self, dir: TrianglePrismFaceDir) -> FaceShape {
        if dir.is_side() {
            FaceShape::Square
        } else {
            FaceShape::Triangle
        }
    }

    fn all_rotations(&self) -> &[TriangleRotation] {
        &self.all
    }

    fn rotations(
        &self,
        rotatable: bool,
        reflectable: bool,
        group: RotationGroupType,
    ) -> &[TriangleRotation] {
        self.table.select(rotatable, reflectable, group)
    }

    fn rotate(&self, dir: TrianglePrismFaceDir, rotation: TriangleRotation) -> TrianglePrismFaceDir {
        match dir.side_index() {
            Some(i) => TrianglePrismFaceDir::from_side_index(rotation.apply_index(i, 2)),
            None => dir,
        }
    }

    fn rotate_by(
        &self,
        dir: TrianglePrismFaceDir,
        details: &FaceDetails,
        rotation: TriangleRotation,
    ) -> (TrianglePrismFaceDir, FaceDetails) {
        let mirrored = if rotation.is_reflection() {
            details.reflect_x()
        } else {
            details.clone()
        };
        let turns = rotation.turns() as i32;
        let details = match dir {
            TrianglePrismFaceDir::Up => mirrored.rotate_rim(-turns),
            TrianglePrismFaceDir::Down => mirrored.rotate_rim(turns),
            _ => mirrored,
        };
        (self.rotate(dir, rotation), details)
    }

    fn try_move(&self, offset: IVec3, dir: TrianglePrismFaceDir) -> Option<IVec3> {
        use TrianglePrismFaceDir::*;
        let delta = match (dir, points_up(offset)) {
            (Up, _) => IVec3::new(0, 1, 0),
            (Down, _) => IVec3::new(0, -1, 0),
            (Back, true) => IVec3::new(1, 0, -1),
            (ForwardRight, true) => IVec3::new(1, 0, 0),
            (ForwardLeft, true) => IVec3::new(-1, 0, 0),
            (Forward, false) => IVec3::new(-1, 0, 1),
            (BackRight, false) => IVec3::new(1, 0, 0),
            (BackLeft, false) => IVec3::new(-1, 0, 0),
            _ => return None,
        };
        Some(offset + delta)
    }

    fn find_path(&self, start: IVec3, end: IVec3) -> Vec<TrianglePrismFaceDir> {
        use TrianglePrismFaceDir::*;
        let dy = end.y - start.y;
        let vertical = if dy > 0 { Up } else { Down };
        let mut path: Vec<_> = std::iter::repeat(vertical)
            .take(dy.unsigned_abs() as usize)
            .collect();

        // Up triangles can only lower one coordinate, down ones only raise
        // one, so each greedy step shrinks the coordinate distance by one.
        let target = to_tri(end);
        let mut current = IVec3::new(start.x, end.y, start.z);
        loop {
            let c = to_tri(current);
            if c == target {
                break;
            }
            let up = points_up(current);
            let axis = (0..3).find(|&j| if up { c[j] > target[j] } else { c[j] < target[j] });
            let dir = match (up, axis) {
                (true, Some(0)) => ForwardLeft,
                (true, Some(1)) => Back,
                (true, Some(_)) => ForwardRight,
                (false, Some(0)) => BackRight,
                (false, Some(1)) => Forward,
                (false, Some(_)) => BackLeft,
                (_, None) => break,
            };
            match self.try_move(current, dir) {
                Some(next) => {
                    path.push(dir);
                    current = next;
                }
                None => break,
            }
        }
        path
    }

    fn try_move_by_offset(
        &self,
        start: IVec3,
        start_offset: IVec3,
        dest_offset: IVec3,
        rotation: TriangleRotation,
    ) -> Option<IVec3> {
        let odd = rotation.turns() % 2 == 1;
        if points_up(start) != (points_up(start_offset) ^ odd) {
            return None;
        }
        let delta = rotate_tri(rotation, sub(to_tri(dest_offset), to_tri(start_offset)));
        from_tri(
            add(to_tri(start), delta),
            start.y + dest_offset.y - start_offset.y,
        )
    }

    fn realign(
        &self,
        shape: &AHashSet<IVec3>,
        rotation: TriangleRotation,
    ) -> Option<AHashMap<IVec3, IVec3>> {
        let mapping = realign_by_coords(
            shape,
            |v| {
                let [a, b, c] = to_tri(v);
                [a, b, c, v.y]
            },
            |[a, b, c, y]| {
                let [a, b, c] = rotate_tri(rotation, [a, b, c]);
                [a, b, c, y]
            },
        )?;
        // Odd turns swap up and down triangles, which needs a translation
        // summing to -1; everything else must sum to 0
        let (&from, &to) = mapping.iter().next()?;
        let translation = sub(to_tri(to), rotate_tri(rotation, to_tri(from)));
        let expected = if rotation.turns() % 2 == 1 { -1 } else { 0 };
        if translation.iter().sum::<i32>() == expected {
            Some(mapping)
        } else {
            None
        }
    }

    fn matrix(&self, rotation: TriangleRotation) -> Mat4 {
        let turn = Mat4::from_rotation_y(-rotation.angle());
        if rotation.is_reflection() {
            turn * mirror_x()
        } else {
            turn
        }
    }

    fn cell_center(&self, offset: IVec3, center: Vec3, tile_size: Vec3) -> Vec3 {
        center + tri_center(offset, tile_size.x, tile_size.y)
    }
}
