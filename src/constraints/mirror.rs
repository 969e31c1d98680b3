//! Mirror symmetry of the whole output
//!
//! A mirror pairs each cell with its reflection across the middle of the
//! grid's bounds, and each solver state with its reflected, canonicalized
//! counterpart. Placed constraints are not mirrored.

use ahash::AHashMap;
use glam::IVec3;

use crate::core::error::{Result, TileGraphError};
use crate::core::types::MirrorAxis;
use crate::grid::{
    CubeGrid, Grid, HexPrismGrid, MeshCellType, MeshGrid, RotationOf, SquareGrid, Topology,
    TrianglePrismGrid,
};
use crate::lattice::{
    CellType, CubeRotation, FaceDirection, HexRotation, LatticeRotation, SquareRotation,
    TriangleRotation,
};
use crate::model::{ModelTile, TileModelInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reflection {
    X,
    Y,
    Z,
    HexX,
    HexForwardLeft,
    HexForwardRight,
    Triangle,
}

/// A reflection of one grid onto itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mirror<R> {
    pub rotation: R,
    reflection: Reflection,
    size: IVec3,
}

/// Grids that support mirror constraints
pub trait MirrorGrid: Grid {
    fn mirror(&self, axis: MirrorAxis) -> Result<Mirror<RotationOf<Self>>>;
}

impl MirrorGrid for CubeGrid {
    fn mirror(&self, axis: MirrorAxis) -> Result<Mirror<CubeRotation>> {
        let (rotation, reflection) = match axis {
            MirrorAxis::X => (CubeRotation::REFLECT_X, Reflection::X),
            MirrorAxis::Y => (CubeRotation::REFLECT_Y, Reflection::Y),
            MirrorAxis::Z | MirrorAxis::W => (CubeRotation::REFLECT_Z, Reflection::Z),
        };
        Ok(Mirror {
            rotation,
            reflection,
            size: self.size(),
        })
    }
}

impl MirrorGrid for SquareGrid {
    fn mirror(&self, axis: MirrorAxis) -> Result<Mirror<SquareRotation>> {
        let (rotation, reflection) = match axis {
            MirrorAxis::X => (SquareRotation::REFLECT_X, Reflection::X),
            _ => (SquareRotation::reflection(2), Reflection::Y),
        };
        Ok(Mirror {
            rotation,
            reflection,
            size: self.size(),
        })
    }
}

impl MirrorGrid for HexPrismGrid {
    fn mirror(&self, axis: MirrorAxis) -> Result<Mirror<HexRotation>> {
        let (rotation, reflection) = match axis {
            MirrorAxis::X => (HexRotation::REFLECT_X, Reflection::HexX),
            MirrorAxis::Y => {
                return Err(TileGraphError::MirrorUnsupported(
                    "hex prisms cannot be mirrored in the vertical axis".into(),
                ))
            }
            MirrorAxis::Z => (HexRotation::reflection(4), Reflection::HexForwardLeft),
            MirrorAxis::W => (HexRotation::reflection(2), Reflection::HexForwardRight),
        };
        Ok(Mirror {
            rotation,
            reflection,
            size: self.size(),
        })
    }
}

impl MirrorGrid for TrianglePrismGrid {
    /// Triangle prisms only reflect in x
    fn mirror(&self, _axis: MirrorAxis) -> Result<Mirror<TriangleRotation>> {
        Ok(Mirror {
            rotation: TriangleRotation::REFLECT_X,
            reflection: Reflection::Triangle,
            size: self.size(),
        })
    }
}

impl<C: MeshCellType> MirrorGrid for MeshGrid<C> {
    fn mirror(&self, _axis: MirrorAxis) -> Result<Mirror<C::Rotation>> {
        Err(TileGraphError::MirrorUnsupported(
            "mirror constraints are not supported on surface meshes".into(),
        ))
    }
}

impl<R: LatticeRotation> Mirror<R> {
    /// Reflected cell, or `None` if it falls outside the bounds
    pub fn map_cell(&self, cell: IVec3) -> Option<IVec3> {
        let (w, h, d) = (self.size.x, self.size.y, self.size.z);
        let IVec3 { x, y, z } = cell;
        let mapped = match self.reflection {
            Reflection::X => IVec3::new(w - 1 - x, y, z),
            Reflection::Y => IVec3::new(x, h - 1 - y, z),
            Reflection::Z => IVec3::new(x, y, d - 1 - z),
            Reflection::HexX => IVec3::new(z - x + (2 * w - d - 1).div_euclid(2), y, z),
            Reflection::HexForwardLeft => {
                IVec3::new(x, y, x - z + (2 * d - w - 1).div_euclid(2))
            }
            Reflection::HexForwardRight => {
                let s = (w + d - 2).div_euclid(2);
                IVec3::new(s - z, y, s - x)
            }
            Reflection::Triangle => {
                // Keeps the up/down parity of x
                let k = (w + d - 2).div_euclid(2) * 2;
                IVec3::new(k - x - 2 * z, y, z)
            }
        };
        let inside = mapped.cmpge(IVec3::ZERO).all() && mapped.cmplt(self.size).all();
        inside.then_some(mapped)
    }

    /// Reflected index, or `None` if it is out of bounds or masked
    pub fn map_index<D: FaceDirection>(&self, topology: &Topology<D, R>, index: usize) -> Option<usize> {
        let cell = topology.get_coord(index)?;
        let mapped = topology.get_index(self.map_cell(cell)?)?;
        topology.contains_index(mapped).then_some(mapped)
    }

    /// Reflected solver state, if the tile allows that orientation
    pub fn map_tile<C>(&self, info: &TileModelInfo<C>, tile: &ModelTile<R>) -> Option<ModelTile<R>>
    where
        C: CellType<Rotation = R>,
    {
        let rotation = info.cell_type().multiply(self.rotation, tile.rotation);
        info.canonicalize(&ModelTile::new(tile.tile, rotation, tile.offset))
    }

    /// Precomputed index and state maps for a propagator
    pub fn symmetry_map<C, D>(&self, topology: &Topology<D, R>, info: &TileModelInfo<C>) -> SymmetryMap<R>
    where
        C: CellType<FaceDir = D, Rotation = R>,
        D: FaceDirection,
    {
        let indices = (0..topology.index_count())
            .map(|i| {
                if topology.contains_index(i) {
                    self.map_index(topology, i)
                } else {
                    None
                }
            })
            .collect();
        let tiles = info
            .all_tiles()
            .iter()
            .filter_map(|(mt, _)| self.map_tile(info, mt).map(|m| (*mt, m)))
            .collect();
        SymmetryMap { indices, tiles }
    }
}

/// A symmetry in solver terms: which index mirrors which, and which state
/// mirrors which
#[derive(Debug, Clone)]
pub struct SymmetryMap<R> {
    pub indices: Vec<Option<usize>>,
    pub tiles: AHashMap<ModelTile<R>, ModelTile<R>>,
}
