//! Rotation groups for the regular lattices
//!
//! Every group is finite and ordered so that the proper rotations come first
//! and the reflections second. Callers rely on that ordering to drop
//! reflections by taking the first half.

use glam::{IVec3, Mat3, Vec3};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;

/// An element of a lattice's rotation/reflection group
///
/// `multiply(a, b)` composes like matrices: `b` is applied first.
pub trait LatticeRotation:
    Copy + Eq + Hash + Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
    fn identity() -> Self;

    fn multiply(self, other: Self) -> Self;

    fn invert(self) -> Self;

    fn is_reflection(self) -> bool;
}

/// Dihedral group of a regular `N`-gon: `turns` steps of `360/N` degrees after an
/// optional reflection in the x axis
///
/// Used with `N = 4` for squares and `N = 6` for hexagons and triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dihedral<const N: u8> {
    turns: u8,
    reflect: bool,
}

pub type SquareRotation = Dihedral<4>;
pub type HexRotation = Dihedral<6>;
pub type TriangleRotation = Dihedral<6>;

impl<const N: u8> Dihedral<N> {
    pub const IDENTITY: Self = Self {
        turns: 0,
        reflect: false,
    };

    /// Mirror image across the plane x = 0
    pub const REFLECT_X: Self = Self {
        turns: 0,
        reflect: true,
    };

    pub fn new(turns: i32, reflect: bool) -> Self {
        Self {
            turns: turns.rem_euclid(N as i32) as u8,
            reflect,
        }
    }

    pub fn rotation(turns: i32) -> Self {
        Self::new(turns, false)
    }

    /// `rotation(turns)` applied after `REFLECT_X`
    pub fn reflection(turns: i32) -> Self {
        Self::new(turns, true)
    }

    pub fn turns(self) -> u8 {
        self.turns
    }

    pub fn reflect(self) -> bool {
        self.reflect
    }

    /// Every element: the `N` rotations, then the `N` reflections
    pub fn all() -> Vec<Self> {
        (0..N as i32)
            .map(Self::rotation)
            .chain((0..N as i32).map(Self::reflection))
            .collect()
    }

    /// Acts on a counter-clockwise side index
    ///
    /// `mirror` is the index sum that `REFLECT_X` preserves, e.g. for hexagon
    /// sides Right=0 and Left=3 swap, so `mirror = 3`.
    pub fn apply_index(self, index: u8, mirror: u8) -> u8 {
        let n = N as i32;
        let i = index as i32;
        let reflected = if self.reflect { mirror as i32 - i } else { i };
        (reflected + self.turns as i32).rem_euclid(n) as u8
    }

    /// Rotation angle in radians, counter-clockwise in the lattice plane
    pub fn angle(self) -> f32 {
        self.turns as f32 * std::f32::consts::TAU / N as f32
    }
}

impl<const N: u8> Default for Dihedral<N> {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl<const N: u8> LatticeRotation for Dihedral<N> {
    fn identity() -> Self {
        Self::IDENTITY
    }

    fn multiply(self, other: Self) -> Self {
        // Reflection conjugates a rotation into its inverse
        let other_turns = if self.reflect {
            -(other.turns as i32)
        } else {
            other.turns as i32
        };
        Self::new(self.turns as i32 + other_turns, self.reflect ^ other.reflect)
    }

    fn invert(self) -> Self {
        if self.reflect {
            self
        } else {
            Self::new(-(self.turns as i32), false)
        }
    }

    fn is_reflection(self) -> bool {
        self.reflect
    }
}

impl<const N: u8> std::ops::Mul for Dihedral<N> {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        self.multiply(rhs)
    }
}

/// Element of the 48-element symmetry group of the cube, stored as a signed
/// permutation matrix (one column per image of x, y and z)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CubeRotation {
    cols: [IVec3; 3],
}

impl CubeRotation {
    pub const IDENTITY: Self = Self {
        cols: [IVec3::X, IVec3::Y, IVec3::Z],
    };

    pub const REFLECT_X: Self = Self {
        cols: [IVec3::NEG_X, IVec3::Y, IVec3::Z],
    };

    pub const REFLECT_Y: Self = Self {
        cols: [IVec3::X, IVec3::NEG_Y, IVec3::Z],
    };

    pub const REFLECT_Z: Self = Self {
        cols: [IVec3::X, IVec3::Y, IVec3::NEG_Z],
    };

    /// Quarter turn about y taking +x to +z
    pub const ROTATE_XZ: Self = Self {
        cols: [IVec3::Z, IVec3::Y, IVec3::NEG_X],
    };

    /// Quarter turn about z taking +x to +y
    pub const ROTATE_XY: Self = Self {
        cols: [IVec3::Y, IVec3::NEG_X, IVec3::Z],
    };

    /// Quarter turn about x taking +y to +z
    pub const ROTATE_YZ: Self = Self {
        cols: [IVec3::X, IVec3::Z, IVec3::NEG_Y],
    };

    /// Builds from column images; returns `None` unless they form a signed permutation
    pub fn from_cols(x: IVec3, y: IVec3, z: IVec3) -> Option<Self> {
        let cols = [x, y, z];
        let unit = |v: IVec3| v.abs().dot(IVec3::ONE) == 1;
        if !cols.iter().all(|&c| unit(c)) {
            return None;
        }
        let axes = cols.map(|c| c.abs());
        if axes[0] == axes[1] || axes[1] == axes[2] || axes[0] == axes[2] {
            return None;
        }
        Some(Self { cols })
    }

    pub fn cols(&self) -> [IVec3; 3] {
        self.cols
    }

    pub fn apply(&self, v: IVec3) -> IVec3 {
        self.cols[0] * v.x + self.cols[1] * v.y + self.cols[2] * v.z
    }

    pub fn apply_f(&self, v: Vec3) -> Vec3 {
        self.mat3() * v
    }

    pub fn mat3(&self) -> Mat3 {
        Mat3::from_cols(
            self.cols[0].as_vec3(),
            self.cols[1].as_vec3(),
            self.cols[2].as_vec3(),
        )
    }

    pub fn determinant(&self) -> i32 {
        let [a, b, c] = self.cols;
        a.x * (b.y * c.z - b.z * c.y) - b.x * (a.y * c.z - a.z * c.y)
            + c.x * (a.y * b.z - a.z * b.y)
    }

    /// `self` applied `n` times
    pub fn pow(self, n: u32) -> Self {
        (0..n).fold(Self::IDENTITY, |acc, _| self.multiply(acc))
    }

    /// All 48 elements: 24 proper rotations, then `REFLECT_X` times each of them
    pub fn all() -> Vec<Self> {
        const PERMS: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let axes = [IVec3::X, IVec3::Y, IVec3::Z];
        let mut proper = Vec::with_capacity(24);
        for perm in PERMS {
            for signs in 0..8 {
                let sign = |bit: i32| if signs & (1 << bit) == 0 { 1 } else { -1 };
                let cols = [
                    axes[perm[0]] * sign(0),
                    axes[perm[1]] * sign(1),
                    axes[perm[2]] * sign(2),
                ];
                let r = Self { cols };
                if r.determinant() == 1 {
                    proper.push(r);
                }
            }
        }
        // Identity leads
        proper.sort_by_key(|r| r != &Self::IDENTITY);
        let reflected: Vec<Self> = proper
            .iter()
            .map(|&r| Self::REFLECT_X.multiply(r))
            .collect();
        proper.into_iter().chain(reflected).collect()
    }

    /// The four quarter turns about one axis, then the same four after `REFLECT_X`
    pub fn about_axis(quarter_turn: Self) -> Vec<Self> {
        let turns: Vec<Self> = (0..4).map(|n| quarter_turn.pow(n)).collect();
        let reflected: Vec<Self> = turns
            .iter()
            .map(|&r| r.multiply(Self::REFLECT_X))
            .collect();
        turns.into_iter().chain(reflected).collect()
    }
}

impl Default for CubeRotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl LatticeRotation for CubeRotation {
    fn identity() -> Self {
        Self::IDENTITY
    }

    fn multiply(self, other: Self) -> Self {
        Self {
            cols: other.cols.map(|c| self.apply(c)),
        }
    }

    fn invert(self) -> Self {
        // Orthogonal, so the inverse is the transpose
        let [a, b, c] = self.cols;
        Self {
            cols: [
                IVec3::new(a.x, b.x, c.x),
                IVec3::new(a.y, b.y, c.y),
                IVec3::new(a.z, b.z, c.z),
            ],
        }
    }

    fn is_reflection(self) -> bool {
        self.determinant() < 0
    }
}

impl std::ops::Mul for CubeRotation {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        self.multiply(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dihedral_reflection_is_involution() {
        for r in HexRotation::all() {
            if r.is_reflection() {
                assert_eq!(r * r, HexRotation::IDENTITY);
            }
        }
    }

    #[test]
    fn test_dihedral_inverse() {
        for r in SquareRotation::all() {
            assert_eq!(r.invert() * r, SquareRotation::IDENTITY);
            assert_eq!(r * r.invert(), SquareRotation::IDENTITY);
        }
    }

    #[test]
    fn test_dihedral_ordering() {
        let all = HexRotation::all();
        assert_eq!(all.len(), 12);
        assert_eq!(all[0], HexRotation::IDENTITY);
        assert!(all[..6].iter().all(|r| !r.is_reflection()));
        assert!(all[6..].iter().all(|r| r.is_reflection()));
    }

    #[test]
    fn test_apply_index_hex() {
        // Right reflects to Left, ForwardRight to ForwardLeft
        assert_eq!(HexRotation::REFLECT_X.apply_index(0, 3), 3);
        assert_eq!(HexRotation::REFLECT_X.apply_index(1, 3), 2);
        assert_eq!(HexRotation::rotation(1).apply_index(5, 3), 0);
    }

    #[test]
    fn test_cube_group_size() {
        let all = CubeRotation::all();
        assert_eq!(all.len(), 48);
        assert_eq!(all[0], CubeRotation::IDENTITY);
        assert!(all[..24].iter().all(|r| !r.is_reflection()));
        assert!(all[24..].iter().all(|r| r.is_reflection()));
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), 48);
    }

    #[test]
    fn test_rotate_xz_maps_x_to_z() {
        assert_eq!(CubeRotation::ROTATE_XZ.apply(IVec3::X), IVec3::Z);
        assert_eq!(CubeRotation::ROTATE_XZ.apply(IVec3::Z), IVec3::NEG_X);
        assert_eq!(CubeRotation::ROTATE_XZ.pow(4), CubeRotation::IDENTITY);
    }

    #[test]
    fn test_cube_invert_is_transpose() {
        for r in CubeRotation::all() {
            assert_eq!(r.invert() * r, CubeRotation::IDENTITY);
        }
    }

    #[test]
    fn test_from_cols_rejects_non_permutation() {
        assert!(CubeRotation::from_cols(IVec3::X, IVec3::X, IVec3::Z).is_none());
        assert!(CubeRotation::from_cols(IVec3::new(1, 1, 0), IVec3::Y, IVec3::Z).is_none());
        assert!(CubeRotation::from_cols(IVec3::new(1, -1, 0), IVec3::Y, IVec3::Z).is_none());
        assert!(CubeRotation::from_cols(IVec3::ZERO, IVec3::Y, IVec3::Z).is_none());
        assert_eq!(
            CubeRotation::from_cols(IVec3::NEG_X, IVec3::Y, IVec3::Z),
            Some(CubeRotation::REFLECT_X)
        );
        assert_eq!(
            CubeRotation::from_cols(IVec3::Z, IVec3::Y, IVec3::NEG_X),
            Some(CubeRotation::ROTATE_XZ)
        );
    }
}
