//! Core type definitions used throughout the codebase

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Which axes a tile may be rotated about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RotationGroupType {
    /// No rotation, only the optional reflection
    None,
    /// Rotation about the y axis (yaw)
    #[default]
    XZ,
    /// Rotation about the z axis
    XY,
    /// Rotation about the x axis
    YZ,
    /// Every rotation the lattice supports
    All,
}

/// The lattice family a tile or grid belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LatticeKind {
    Square,
    Cube,
    HexPrism,
    TrianglePrism,
}

impl std::fmt::Display for LatticeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LatticeKind::Square => "Square",
            LatticeKind::Cube => "Cube",
            LatticeKind::HexPrism => "HexPrism",
            LatticeKind::TrianglePrism => "TrianglePrism",
        };
        f.write_str(name)
    }
}

/// How adjacency rules are learned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ModelType {
    /// Adjacency comes from matching face paint
    #[default]
    AdjacentPaint,
    /// Overlapping patterns extracted from samples
    Overlapping,
    /// Adjacency pairs observed in samples
    Adjacent,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ModelType::AdjacentPaint => "AdjacentPaint",
            ModelType::Overlapping => "Overlapping",
            ModelType::Adjacent => "Adjacent",
        };
        f.write_str(name)
    }
}

/// Reflection axis for a mirror constraint. The meaning of `W` depends on the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MirrorAxis {
    X,
    Y,
    Z,
    W,
}

/// Axis-aligned bounding box in grid-local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min.cmple(other.max).all() && other.min.cmple(self.max).all()
    }

    pub fn encapsulate(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Bounds of the eight transformed corners
    pub fn transformed(&self, m: &Mat4) -> Bounds {
        let mut out = Bounds::new(m.transform_point3(self.min), m.transform_point3(self.min));
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out.encapsulate(m.transform_point3(corner));
        }
        out
    }
}

/// Decomposed transform: position, rotation, scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trs {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Trs {
    pub const IDENTITY: Trs = Trs {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Decomposes an affine matrix. Reflections come out as a negative x scale.
    pub fn from_matrix(m: &Mat4) -> Self {
        let (scale, rotation, position) = m.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Trs {
    fn default() -> Self {
        Self::IDENTITY
    }
}
