use ahash::AHashSet;
use tracing::debug;

use super::{VolumeFilter, VolumeType};
use crate::core::config::BorderItemConfig;
use crate::core::error::{Result, TileGraphError};
use crate::grid::Grid;
use crate::lattice::CellType;

/// Forces the cells along chosen sides of the grid to particular tiles
///
/// Each cell is claimed by the first border item whose direction leads out
/// of the grid from it, and becomes a single-cell tileset filter.
pub fn border_constraints<G: Grid>(grid: &G, borders: &[BorderItemConfig]) -> Result<Vec<VolumeFilter>> {
    let ct = grid.cell_type();
    let mut constrained = AHashSet::new();
    let mut out = Vec::new();
    for item in borders {
        let dir = ct.parse_dir(&item.dir).ok_or_else(|| {
            TileGraphError::InvalidConfig(format!(
                "border direction {} is not a face of {} cells",
                item.dir,
                ct.kind()
            ))
        })?;
        let display = ct.dir_name(dir);
        for cell in grid.cells() {
            if constrained.contains(&cell) {
                continue;
            }
            let leaves = grid
                .try_move(cell, dir)
                .map_or(true, |m| !grid.in_bounds(m.dest));
            if leaves {
                constrained.insert(cell);
                out.push(VolumeFilter {
                    name: format!("BorderConstraint {} ({}, {}, {})", display, cell.x, cell.y, cell.z),
                    tiles: vec![item.tile.clone()],
                    cells: vec![cell],
                    volume_type: VolumeType::TilesetFilter,
                });
            }
        }
    }
    debug!(volumes = out.len(), "border constraints");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SquareGrid;
    use glam::{IVec3, Vec3};

    fn item(dir: &str, tile: &str) -> BorderItemConfig {
        BorderItemConfig {
            dir: dir.into(),
            tile: tile.into(),
        }
    }

    #[test]
    fn test_first_border_claims_corner() {
        let grid = SquareGrid::new(Vec3::ZERO, IVec3::new(3, 3, 1), Vec3::ONE);
        let volumes =
            border_constraints(&grid, &[item("Left", "wall"), item("Down", "floor")]).unwrap();
        // 3 on the left column, then 2 more along the bottom row
        assert_eq!(volumes.len(), 5);
        let corner = volumes.iter().find(|v| v.cells == vec![IVec3::ZERO]).unwrap();
        assert_eq!(corner.tiles, vec!["wall".to_string()]);
        assert_eq!(corner.name, "BorderConstraint Left (0, 0, 0)");
    }

    #[test]
    fn test_unknown_direction() {
        let grid = SquareGrid::new(Vec3::ZERO, IVec3::new(2, 2, 1), Vec3::ONE);
        assert!(matches!(
            border_constraints(&grid, &[item("Sideways", "wall")]),
            Err(TileGraphError::InvalidConfig(_))
        ));
    }
}
