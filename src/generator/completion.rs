use glam::IVec3;
use serde::Serialize;
use tracing::error;

use super::decode::TileInstance;
use crate::constraints::CellValue;
use crate::core::error::Warnings;
use crate::grid::Grid;
use crate::model::ModelTile;

/// Result of one generator run
#[derive(Debug, Clone, Serialize)]
pub struct Completion<R> {
    /// Every unmasked cell was decided
    pub success: bool,
    /// Attempts restarted before this result
    pub retries: u32,
    pub backtrack_count: usize,
    /// Decided cells in grid index order
    pub tile_data: Vec<(IVec3, ModelTile<R>)>,
    pub tile_instances: Vec<TileInstance<R>>,
    /// First contradicting cell when the run failed
    pub contradiction_location: Option<IVec3>,
    /// Base seed the run derived its attempt seeds from
    pub seed: u64,
    pub warnings: Warnings,
}

impl<R: Copy> Completion<R> {
    /// Collects decided cells and the first contradiction from solver values
    pub fn from_values<G>(grid: &G, values: &[CellValue<R>]) -> Self
    where
        G: Grid,
    {
        let mut tile_data = Vec::new();
        let mut contradiction_location = None;
        for (index, value) in values.iter().enumerate() {
            let Some(cell) = grid.get_cell(index) else {
                continue;
            };
            match value {
                CellValue::Decided(mt) => tile_data.push((cell, *mt)),
                CellValue::Contradiction if contradiction_location.is_none() => {
                    contradiction_location = Some(cell);
                }
                _ => {}
            }
        }
        Self {
            success: contradiction_location.is_none(),
            retries: 0,
            backtrack_count: 0,
            tile_data,
            tile_instances: Vec::new(),
            contradiction_location,
            seed: 0,
            warnings: Warnings::new(),
        }
    }

    pub fn tile_at(&self, cell: IVec3) -> Option<&ModelTile<R>> {
        self.tile_data.iter().find(|(c, _)| *c == cell).map(|(_, mt)| mt)
    }

    pub fn log_error(&self) {
        if self.success {
            return;
        }
        match self.contradiction_location {
            Some(cell) => error!(?cell, "failed to complete generation"),
            None => error!("failed to complete generation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SquareGrid;
    use crate::lattice::SquareRotation;
    use crate::model::TileId;
    use glam::Vec3;

    #[test]
    fn test_first_contradiction_is_reported() {
        let grid = SquareGrid::new(Vec3::ZERO, IVec3::new(2, 2, 1), Vec3::ONE);
        let mt = ModelTile::new(TileId(0), SquareRotation::IDENTITY, IVec3::ZERO);
        let values = vec![
            CellValue::Decided(mt),
            CellValue::Undecided,
            CellValue::Contradiction,
            CellValue::Contradiction,
        ];
        let completion = Completion::from_values(&grid, &values);
        assert!(!completion.success);
        assert_eq!(completion.contradiction_location, Some(IVec3::new(0, 1, 0)));
        assert_eq!(completion.tile_at(IVec3::ZERO), Some(&mt));
        assert_eq!(completion.tile_data.len(), 1);
    }
}
