//! Authored example grids for the sample-driven model types
//!
//! A sample is expanded into one copy per symmetry of its bounding box, with
//! every cell's state turned and canonicalized to match.

use ahash::AHashSet;
use glam::IVec3;
use serde::Serialize;
use tracing::debug;

use super::adjacency::DirectionalAdjacency;
use super::tile::ModelTile;
use super::tile_model_info::TileModelInfo;
use crate::core::error::{Result, TileGraphError};
use crate::core::types::{LatticeKind, ModelType, RotationGroupType};
use crate::grid::{BoxIndexer, Grid};
use crate::lattice::CellType;

/// A box of cells, x fastest, each empty or holding one solver state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample<R> {
    pub size: IVec3,
    pub cells: Vec<Option<ModelTile<R>>>,
}

impl<R: Copy> Sample<R> {
    pub fn empty(size: IVec3) -> Self {
        Self {
            size,
            cells: vec![None; BoxIndexer::new(size).count()],
        }
    }

    pub fn get(&self, cell: IVec3) -> Option<ModelTile<R>> {
        let index = BoxIndexer::new(self.size).index(cell)?;
        self.cells.get(index).copied().flatten()
    }

    pub fn set(&mut self, cell: IVec3, value: Option<ModelTile<R>>) {
        if let Some(index) = BoxIndexer::new(self.size).index(cell) {
            self.cells[index] = value;
        }
    }

    /// Cells holding a state
    pub fn filled(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Builds a sample from tile names laid out x fastest. `None` cells stay
/// empty; names are placed unrotated at their first offset.
pub fn sample_from_names<C: CellType>(
    info: &TileModelInfo<C>,
    size: IVec3,
    names: &[Option<String>],
) -> Result<Sample<C::Rotation>> {
    let mut sample = Sample::empty(size);
    if names.len() != sample.cells.len() {
        return Err(TileGraphError::InvalidConfig(format!(
            "sample of size {} needs {} cells, got {}",
            size,
            sample.cells.len(),
            names.len()
        )));
    }
    let identity = info.cell_type().identity();
    for (slot, name) in sample.cells.iter_mut().zip(names) {
        let Some(name) = name else {
            continue;
        };
        let id = info
            .tile_id(name)
            .ok_or_else(|| TileGraphError::UnknownTile(name.clone()))?;
        let offset = info
            .tile(id)
            .and_then(|t| t.sorted_offsets().first().copied())
            .unwrap_or(IVec3::ZERO);
        *slot = info.canonicalize(&ModelTile::new(id, identity, offset));
    }
    Ok(sample)
}

/// Expands a sample under every symmetry of its bounds
///
/// `sample_grid` must be a grid of the sample's own size. Only square and
/// cube lattices have box symmetries; anything else is rejected.
pub fn convert_sample<G: Grid>(
    info: &TileModelInfo<G::Cell>,
    sample_grid: &G,
    sample: &Sample<<G::Cell as CellType>::Rotation>,
    model_type: ModelType,
    rotatable: bool,
    reflectable: bool,
    group: RotationGroupType,
) -> Result<Vec<Sample<<G::Cell as CellType>::Rotation>>> {
    let ct = sample_grid.cell_type();
    let kind = ct.kind();
    if !matches!(kind, LatticeKind::Square | LatticeKind::Cube) {
        return Err(TileGraphError::UnsupportedModel {
            model: model_type.to_string(),
            lattice: kind.to_string(),
        });
    }
    if sample_grid.size() != sample.size {
        return Err(TileGraphError::InvalidConfig(format!(
            "sample grid size {} does not match sample size {}",
            sample_grid.size(),
            sample.size
        )));
    }

    let mut out = Vec::new();
    for (symmetry, size) in sample_grid.bounds_symmetries(rotatable, reflectable, group) {
        let mut converted = Sample::empty(size);
        for (index, value) in sample.cells.iter().enumerate() {
            let (Some(mt), Some(cell)) = (value, sample_grid.get_cell(index)) else {
                continue;
            };
            let Some((dest, cell_rotation)) = sample_grid.try_apply_symmetry(&symmetry, cell) else {
                continue;
            };
            let rotated = ModelTile::new(mt.tile, ct.multiply(cell_rotation, mt.rotation), mt.offset);
            // Orientations the tile forbids leave a hole
            converted.set(dest, info.canonicalize(&rotated));
        }
        out.push(converted);
    }
    debug!(copies = out.len(), filled = sample.filled(), "converted sample");
    Ok(out)
}

/// Every neighbouring pair of filled cells in a sample, in the direction
/// from the first to the second
pub fn observed_adjacencies<G: Grid>(
    sample_grid: &G,
    sample: &Sample<<G::Cell as CellType>::Rotation>,
) -> Vec<DirectionalAdjacency<<G::Cell as CellType>::FaceDir, <G::Cell as CellType>::Rotation>> {
    let mut seen = AHashSet::new();
    let mut out = Vec::new();
    for (index, value) in sample.cells.iter().enumerate() {
        let (Some(src), Some(cell)) = (value, sample_grid.get_cell(index)) else {
            continue;
        };
        for &dir in sample_grid.cell_type().face_dirs() {
            let Some(m) = sample_grid.try_move(cell, dir) else {
                continue;
            };
            let Some(dest) = sample.get(m.dest) else {
                continue;
            };
            let adjacency = DirectionalAdjacency {
                dir,
                src: *src,
                dest,
            };
            if seen.insert(adjacency) {
                out.push(adjacency);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{HexPrismGrid, SquareGrid};
    use crate::lattice::{
        FaceDetails, FaceShape, HexPrismCellType, SquareCellType, SquareFaceDir, SquareRotation,
    };
    use crate::model::tile::{Tile, TileEntry};
    use glam::Vec3;

    fn arrow_model() -> TileModelInfo<SquareCellType> {
        let mut arrow = Tile::new("arrow", LatticeKind::Square).with_paint(
            IVec3::ZERO,
            SquareFaceDir::Right,
            FaceDetails::uniform(FaceShape::Square, 1),
        );
        arrow.rotation_group = RotationGroupType::XY;
        let blank = Tile::new("blank", LatticeKind::Square);
        TileModelInfo::build(
            SquareCellType::new(),
            &[TileEntry::new(arrow, 1.0), TileEntry::new(blank, 1.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_sample_expands_under_box_symmetries() {
        let info = arrow_model();
        let names = vec![Some("arrow".to_string()), None, None, Some("blank".to_string())];
        let size = IVec3::new(2, 2, 1);
        let sample = sample_from_names(&info, size, &names).unwrap();
        assert_eq!(sample.filled(), 2);
        let grid = SquareGrid::new(Vec3::ZERO, size, Vec3::ONE);
        let copies = convert_sample(
            &info,
            &grid,
            &sample,
            ModelType::Overlapping,
            true,
            true,
            RotationGroupType::XY,
        )
        .unwrap();
        assert_eq!(copies.len(), 8);
        let turned = &copies
            .iter()
            .zip(grid.bounds_symmetries(true, true, RotationGroupType::XY))
            .find(|(_, (s, _))| s.rotation == SquareRotation::rotation(1))
            .unwrap()
            .0;
        assert_eq!(turned.filled(), 2);
        let arrow = turned
            .cells
            .iter()
            .flatten()
            .find(|mt| mt.tile == info.tile_id("arrow").unwrap())
            .unwrap();
        assert_eq!(arrow.rotation, SquareRotation::rotation(1));
    }

    #[test]
    fn test_hex_samples_are_rejected() {
        let ct = HexPrismCellType::new();
        let info = TileModelInfo::build(
            ct,
            &[TileEntry::new(Tile::new("h", LatticeKind::HexPrism), 1.0)],
        )
        .unwrap();
        let size = IVec3::new(2, 1, 2);
        let grid = HexPrismGrid::new(Vec3::ZERO, size, Vec3::ONE);
        let sample = Sample::empty(size);
        let err = convert_sample(
            &info,
            &grid,
            &sample,
            ModelType::Overlapping,
            true,
            true,
            RotationGroupType::XZ,
        )
        .unwrap_err();
        assert!(matches!(err, TileGraphError::UnsupportedModel { .. }));
    }

    #[test]
    fn test_unknown_sample_tile() {
        let info = arrow_model();
        let names = vec![Some("ghost".to_string())];
        assert!(matches!(
            sample_from_names(&info, IVec3::ONE, &names),
            Err(TileGraphError::UnknownTile(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_observed_pairs() {
        let info = arrow_model();
        let names = vec![Some("arrow".to_string()), Some("blank".to_string())];
        let size = IVec3::new(2, 1, 1);
        let sample = sample_from_names(&info, size, &names).unwrap();
        let grid = SquareGrid::new(Vec3::ZERO, size, Vec3::ONE);
        let pairs = observed_adjacencies(&grid, &sample);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().any(|a| a.dir == SquareFaceDir::Right));
        assert!(pairs.iter().any(|a| a.dir == SquareFaceDir::Left));
    }
}
