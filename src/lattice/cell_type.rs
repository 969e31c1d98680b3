//! The capability interface every lattice implements

use ahash::{AHashMap, AHashSet};
use glam::{IVec3, Mat3, Mat4, Vec3};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::hash::Hash;

use super::face_details::{FaceDetails, FaceShape};
use super::rotation::LatticeRotation;
use crate::core::types::{LatticeKind, RotationGroupType};

/// A face direction of one lattice
pub trait FaceDirection:
    Copy + Eq + Hash + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
}

impl<T> FaceDirection for T where
    T: Copy + Eq + Hash + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
}

/// Directions, rotations and tile-local geometry of one lattice family
///
/// Offsets passed to these methods are tile-local; they never refer to a
/// generation grid.
pub trait CellType: Clone + Debug + Send + Sync + 'static {
    type FaceDir: FaceDirection;
    type Rotation: LatticeRotation;

    fn kind(&self) -> LatticeKind;

    /// All face directions, in solver direction order. Inverse pairs are adjacent.
    fn face_dirs(&self) -> &[Self::FaceDir];

    /// Each face with its inverse, listed once
    fn face_dir_pairs(&self) -> Vec<(Self::FaceDir, Self::FaceDir)> {
        self.face_dirs()
            .chunks(2)
            .filter_map(|pair| match pair {
                [a, b] => Some((*a, *b)),
                _ => None,
            })
            .collect()
    }

    fn invert_dir(&self, dir: Self::FaceDir) -> Self::FaceDir;

    fn face_shape(&self, dir: Self::FaceDir) -> FaceShape;

    /// Position of `dir` in `face_dirs()`
    fn direction_index(&self, dir: Self::FaceDir) -> usize {
        self.face_dirs()
            .iter()
            .position(|&d| d == dir)
            .unwrap_or_default()
    }

    /// Face direction to solver direction index, for every face
    fn direction_mapping(&self) -> AHashMap<Self::FaceDir, usize> {
        self.face_dirs()
            .iter()
            .enumerate()
            .map(|(i, &d)| (d, i))
            .collect()
    }

    fn dir_name(&self, dir: Self::FaceDir) -> String {
        format!("{:?}", dir)
    }

    fn parse_dir(&self, name: &str) -> Option<Self::FaceDir> {
        self.face_dirs()
            .iter()
            .copied()
            .find(|&d| self.dir_name(d).eq_ignore_ascii_case(name))
    }

    fn all_rotations(&self) -> &[Self::Rotation];

    /// Orientations a tile may take. The non-reflecting half comes first.
    fn rotations(
        &self,
        rotatable: bool,
        reflectable: bool,
        group: RotationGroupType,
    ) -> &[Self::Rotation];

    fn identity(&self) -> Self::Rotation {
        Self::Rotation::identity()
    }

    fn multiply(&self, a: Self::Rotation, b: Self::Rotation) -> Self::Rotation {
        a.multiply(b)
    }

    fn invert(&self, r: Self::Rotation) -> Self::Rotation {
        r.invert()
    }

    fn rotate(&self, dir: Self::FaceDir, rotation: Self::Rotation) -> Self::FaceDir;

    /// Rotates a face direction together with its paint
    fn rotate_by(
        &self,
        dir: Self::FaceDir,
        details: &FaceDetails,
        rotation: Self::Rotation,
    ) -> (Self::FaceDir, FaceDetails);

    /// One step in tile-local offset space
    fn try_move(&self, offset: IVec3, dir: Self::FaceDir) -> Option<IVec3>;

    /// Steps leading from `start` to `end`, in tile-local offset space
    fn find_path(&self, start: IVec3, end: IVec3) -> Vec<Self::FaceDir>;

    /// Where `dest_offset` lands if a tile rotated by `rotation` has its
    /// `start_offset` placed at `start`
    fn try_move_by_offset(
        &self,
        start: IVec3,
        start_offset: IVec3,
        dest_offset: IVec3,
        rotation: Self::Rotation,
    ) -> Option<IVec3> {
        let mut current = start;
        for step in self.find_path(start_offset, dest_offset) {
            current = self.try_move(current, self.rotate(step, rotation))?;
        }
        Some(current)
    }

    /// Finds the translation taking the rotated shape back onto itself, and
    /// returns the induced offset permutation
    fn realign(
        &self,
        shape: &AHashSet<IVec3>,
        rotation: Self::Rotation,
    ) -> Option<AHashMap<IVec3, IVec3>> {
        realign_by_search(self, shape, rotation)
    }

    /// Local transform of a rotation
    fn matrix(&self, rotation: Self::Rotation) -> Mat4;

    /// Center of a tile offset, relative to the tile's own origin
    fn cell_center(&self, offset: IVec3, center: Vec3, tile_size: Vec3) -> Vec3;

    /// Nearest group element to an arbitrary rotation matrix
    ///
    /// Columns are normalized first, so uniform or non-uniform scale is
    /// ignored. Returns `None` when nothing is within a few degrees.
    fn rotation_from_matrix(&self, m: Mat3) -> Option<Self::Rotation> {
        let cols = [m.x_axis, m.y_axis, m.z_axis].map(|c| c.normalize_or_zero());
        let mut best = None;
        let mut best_score = f32::MIN;
        for &r in self.all_rotations() {
            let rm = Mat3::from_mat4(self.matrix(r));
            let score = cols[0].dot(rm.x_axis) + cols[1].dot(rm.y_axis) + cols[2].dot(rm.z_axis);
            if score > best_score {
                best_score = score;
                best = Some(r);
            }
        }
        if best_score > 2.95 {
            best
        } else {
            None
        }
    }
}

/// Rotation subsets precomputed for every group type
#[derive(Debug, Clone)]
pub struct RotationTable<R> {
    groups: Vec<(RotationGroupType, Vec<R>)>,
    fixed: Vec<R>,
}

impl<R: LatticeRotation> RotationTable<R> {
    /// `fixed` is `[identity, reflection]`, used for tiles that cannot rotate
    pub fn new(groups: Vec<(RotationGroupType, Vec<R>)>, reflection: R) -> Self {
        Self {
            groups,
            fixed: vec![R::identity(), reflection],
        }
    }

    pub fn select(&self, rotatable: bool, reflectable: bool, group: RotationGroupType) -> &[R] {
        if !rotatable {
            return if reflectable {
                &self.fixed
            } else {
                &self.fixed[..1]
            };
        }
        let rotations = self
            .groups
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, rs)| rs.as_slice())
            .unwrap_or(&self.fixed);
        if reflectable {
            rotations
        } else {
            &rotations[..rotations.len() / 2]
        }
    }
}

/// Brute-force realignment: tries each offset of the shape, in sorted order,
/// as the image of the smallest offset and keeps the first that works
pub fn realign_by_search<C: CellType + ?Sized>(
    cell_type: &C,
    shape: &AHashSet<IVec3>,
    rotation: C::Rotation,
) -> Option<AHashMap<IVec3, IVec3>> {
    let sorted = sorted_offsets(shape);
    let anchor = *sorted.first()?;
    'candidates: for &start in &sorted {
        let mut mapping = AHashMap::with_capacity(sorted.len());
        for &offset in &sorted {
            match cell_type.try_move_by_offset(start, anchor, offset, rotation) {
                Some(dest) if shape.contains(&dest) => {
                    mapping.insert(offset, dest);
                }
                _ => continue 'candidates,
            }
        }
        return Some(mapping);
    }
    None
}

/// Closed-form realignment for lattices where rotation is linear in some
/// integer coordinate system
///
/// The translation must carry the componentwise minimum of the rotated
/// coordinates onto that of the original ones.
pub fn realign_by_coords<const N: usize>(
    shape: &AHashSet<IVec3>,
    to_coords: impl Fn(IVec3) -> [i32; N],
    rotate: impl Fn([i32; N]) -> [i32; N],
) -> Option<AHashMap<IVec3, IVec3>> {
    if shape.is_empty() {
        return None;
    }
    let mut by_coords = AHashMap::with_capacity(shape.len());
    let mut min = [i32::MAX; N];
    let mut rotated_min = [i32::MAX; N];
    let mut rotated = Vec::with_capacity(shape.len());
    for &offset in shape {
        let c = to_coords(offset);
        let rc = rotate(c);
        for i in 0..N {
            min[i] = min[i].min(c[i]);
            rotated_min[i] = rotated_min[i].min(rc[i]);
        }
        by_coords.insert(c, offset);
        rotated.push((offset, rc));
    }
    let mut mapping = AHashMap::with_capacity(shape.len());
    for (offset, rc) in rotated {
        let mut target = rc;
        for i in 0..N {
            target[i] += min[i] - rotated_min[i];
        }
        mapping.insert(offset, *by_coords.get(&target)?);
    }
    Some(mapping)
}

/// Offsets sorted by (x, y, z), for deterministic iteration
pub fn sorted_offsets(shape: &AHashSet<IVec3>) -> Vec<IVec3> {
    let mut sorted: Vec<IVec3> = shape.iter().copied().collect();
    sorted.sort_by_key(|v| (v.x, v.y, v.z));
    sorted
}

/// Reflection through the plane x = 0, as a matrix
pub(crate) fn mirror_x() -> Mat4 {
    Mat4::from_scale(Vec3::new(-1.0, 1.0, 1.0))
}
