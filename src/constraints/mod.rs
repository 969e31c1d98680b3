//! Initial constraints: restrictions placed on cells before the solver runs
//!
//! Scene content is first turned into `InitialConstraint` values (see
//! `builder`), then a `ConstraintResolver` turns those into propagator
//! `select` calls and a solver mask.

pub mod border;
pub mod builder;
pub mod mirror;
pub mod propagator;
pub mod resolver;

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::lattice::FaceDetails;

pub use border::border_constraints;
pub use builder::{submesh_filters, ConstraintBuilder, Placement, SceneObject, VolumeShape};
pub use mirror::{Mirror, MirrorGrid, SymmetryMap};
pub use propagator::{CellValue, Propagator, RecordingPropagator, Resolution, SelectCall};
pub use resolver::{get_mask, ConstraintResolver};

/// What a volume does to the cells it covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VolumeType {
    /// Restrict the cells to the volume's tiles
    #[default]
    TilesetFilter,
    /// Remove the cells from the solve
    MaskOut,
}

/// How strongly a pinned tile is enforced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PinType {
    /// The tile itself is selected at its cell
    #[default]
    Pin,
    /// Only the tile's outer faces constrain their neighbours
    FacesOnly,
    /// The faces constrain their neighbours and the tile's cells are masked out
    FacesAndInterior,
}

/// A placed tile whose painted faces constrain the cells around it
#[derive(Debug, Clone, PartialEq)]
pub struct FaceConstraint<D, R> {
    pub name: String,
    /// Exposed faces in tile space
    pub faces: Vec<(IVec3, D, FaceDetails)>,
    /// Offsets whose cells are removed from the solve
    pub offsets: Vec<IVec3>,
    /// Cell holding offset zero
    pub cell: IVec3,
    pub rotation: R,
}

/// A tile forced into place at a cell
#[derive(Debug, Clone, PartialEq)]
pub struct PinConstraint<R> {
    pub name: String,
    pub tile: String,
    /// Cell holding offset zero
    pub cell: IVec3,
    pub rotation: R,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeFilter {
    pub name: String,
    pub tiles: Vec<String>,
    pub cells: Vec<IVec3>,
    pub volume_type: VolumeType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InitialConstraint<D, R> {
    Face(FaceConstraint<D, R>),
    Pin(PinConstraint<R>),
    Volume(VolumeFilter),
}

impl<D, R> InitialConstraint<D, R> {
    pub fn name(&self) -> &str {
        match self {
            InitialConstraint::Face(c) => &c.name,
            InitialConstraint::Pin(c) => &c.name,
            InitialConstraint::Volume(c) => &c.name,
        }
    }
}
