//! Solver-facing view of a grid
//!
//! The propagator never sees cells or world positions, only dense indices,
//! directions and edge labels. A `Topology` is precomputed once from a grid
//! so the solver can step between indices without calling back into it.

use ahash::AHashMap;
use glam::IVec3;
use serde::Serialize;

use super::{FaceDirOf, Grid, RotationOf};
use crate::lattice::{CellType, FaceDirection, LatticeRotation};

/// A step through `dir` that changes frame by `rotation`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EdgeLabel<D, R> {
    pub dir: D,
    pub rotation: R,
}

/// Every (direction, rotation) pair a grid's moves can produce
///
/// Label `i` is `direction_index * move_rotations.len() + rotation_index`,
/// so grids whose moves never rotate have one label per direction, in
/// direction order.
#[derive(Debug, Clone)]
pub struct EdgeLabels<D, R> {
    labels: Vec<EdgeLabel<D, R>>,
    inverse: Vec<usize>,
    index: AHashMap<(D, R), usize>,
}

impl<D: FaceDirection, R: LatticeRotation> EdgeLabels<D, R> {
    pub fn new<C>(cell_type: &C, move_rotations: &[R]) -> Self
    where
        C: CellType<FaceDir = D, Rotation = R>,
    {
        let mut labels = Vec::with_capacity(cell_type.face_dirs().len() * move_rotations.len());
        for &dir in cell_type.face_dirs() {
            for &rotation in move_rotations {
                labels.push(EdgeLabel { dir, rotation });
            }
        }
        let index: AHashMap<(D, R), usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| ((l.dir, l.rotation), i))
            .collect();
        let inverse = labels
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let dir = cell_type.invert_dir(cell_type.rotate(l.dir, l.rotation));
                let rotation = cell_type.invert(l.rotation);
                index.get(&(dir, rotation)).copied().unwrap_or(i)
            })
            .collect();
        Self {
            labels,
            inverse,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, label: usize) -> Option<&EdgeLabel<D, R>> {
        self.labels.get(label)
    }

    pub fn index_of(&self, dir: D, rotation: R) -> Option<usize> {
        self.index.get(&(dir, rotation)).copied()
    }

    /// Label of the same edge walked backwards
    pub fn inverse(&self, label: usize) -> usize {
        self.inverse.get(label).copied().unwrap_or(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &EdgeLabel<D, R>)> {
        self.labels.iter().enumerate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopologyEdge<D> {
    pub dest: usize,
    pub inverse_dir: D,
    pub label: usize,
}

#[derive(Debug, Clone)]
pub struct Topology<D, R> {
    size: IVec3,
    directions: Vec<D>,
    cells: Vec<IVec3>,
    indices: AHashMap<IVec3, usize>,
    /// `index * directions.len() + direction_index`
    edges: Vec<Option<TopologyEdge<D>>>,
    labels: EdgeLabels<D, R>,
    mask: Option<Vec<bool>>,
}

impl<D: FaceDirection, R: LatticeRotation> Topology<D, R> {
    pub fn from_grid<G>(grid: &G) -> Self
    where
        G: Grid,
        G::Cell: CellType<FaceDir = D, Rotation = R>,
    {
        let ct = grid.cell_type();
        let directions: Vec<D> = ct.face_dirs().to_vec();
        let labels = EdgeLabels::new(ct, &grid.move_rotations());
        let cells = grid.cells();
        let indices = cells.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let mut edges = vec![None; cells.len() * directions.len()];
        for (i, &cell) in cells.iter().enumerate() {
            for (d, &dir) in directions.iter().enumerate() {
                let Some(m) = grid.try_move(cell, dir) else {
                    continue;
                };
                let Some(dest) = grid.get_index(m.dest) else {
                    continue;
                };
                let Some(label) = labels.index_of(dir, m.rotation) else {
                    tracing::warn!(?cell, ?dir, rotation = ?m.rotation, "move rotation has no edge label");
                    continue;
                };
                edges[i * directions.len() + d] = Some(TopologyEdge {
                    dest,
                    inverse_dir: m.inverse_dir,
                    label,
                });
            }
        }
        Self {
            size: grid.size(),
            directions,
            cells,
            indices,
            edges,
            labels,
            mask: None,
        }
    }

    /// Copy of this topology with a solver mask; `mask[i] == false` removes
    /// index `i` from the solve without renumbering anything
    pub fn with_mask(&self, mask: Vec<bool>) -> Self {
        Self {
            mask: Some(mask),
            ..self.clone()
        }
    }

    pub fn mask(&self) -> Option<&[bool]> {
        self.mask.as_deref()
    }

    pub fn width(&self) -> i32 {
        self.size.x
    }

    pub fn height(&self) -> i32 {
        self.size.y
    }

    pub fn depth(&self) -> i32 {
        self.size.z
    }

    pub fn index_count(&self) -> usize {
        self.cells.len()
    }

    pub fn directions(&self) -> &[D] {
        &self.directions
    }

    pub fn labels(&self) -> &EdgeLabels<D, R> {
        &self.labels
    }

    /// True for an index in range that the mask leaves in
    pub fn contains_index(&self, index: usize) -> bool {
        index < self.cells.len() && self.mask.as_ref().map_or(true, |m| m[index])
    }

    pub fn get_index(&self, cell: IVec3) -> Option<usize> {
        self.indices.get(&cell).copied()
    }

    pub fn get_coord(&self, index: usize) -> Option<IVec3> {
        self.cells.get(index).copied()
    }

    /// Step from `index` through `dir`. Masked destinations are still
    /// reported; the solver decides what to do with them.
    pub fn try_move(&self, index: usize, dir: D) -> Option<TopologyEdge<D>> {
        let d = self.directions.iter().position(|&x| x == dir)?;
        self.edges
            .get(index * self.directions.len() + d)
            .copied()
            .flatten()
    }

    /// Every edge leaving `index`
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = (D, TopologyEdge<D>)> + '_ {
        let n = self.directions.len();
        self.directions
            .iter()
            .enumerate()
            .filter_map(move |(d, &dir)| self.edges.get(index * n + d).copied().flatten().map(|e| (dir, e)))
    }
}

/// Topology of a grid, with the grid's own face and rotation types
pub type GridTopology<G> = Topology<FaceDirOf<G>, RotationOf<G>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::mesh::MeshData;
    use crate::grid::{CubeGrid, HexPrismGrid, MeshGridBuilder, SquareGrid};
    use crate::core::config::SurfaceConfig;
    use crate::lattice::{CubeCellType, HexPrismFaceDir, SquareFaceDir};
    use glam::Vec3;

    #[test]
    fn test_square_topology_labels_follow_directions() {
        let g = SquareGrid::new(Vec3::ZERO, IVec3::new(3, 3, 1), Vec3::ONE);
        let t = Topology::from_grid(&g);
        assert_eq!(t.labels().len(), 4);
        assert_eq!((t.width(), t.height(), t.depth()), (3, 3, 1));
        let centre = t.get_index(IVec3::new(1, 1, 0)).unwrap();
        assert_eq!(t.neighbors(centre).count(), 4);
        let corner = t.get_index(IVec3::ZERO).unwrap();
        assert_eq!(t.neighbors(corner).count(), 2);
        let e = t.try_move(corner, SquareFaceDir::Right).unwrap();
        assert_eq!(t.get_coord(e.dest), Some(IVec3::X));
        assert_eq!(e.inverse_dir, SquareFaceDir::Left);
        assert_eq!(e.label, t.labels().index_of(SquareFaceDir::Right, g.cell_type().identity()).unwrap());
    }

    #[test]
    fn test_mask_keeps_indexing() {
        let g = SquareGrid::new(Vec3::ZERO, IVec3::new(3, 3, 1), Vec3::ONE);
        let t = Topology::from_grid(&g);
        let mut mask = vec![true; 9];
        mask[4] = false;
        let masked = t.with_mask(mask);
        assert_eq!(masked.index_count(), 9);
        assert!(!masked.contains_index(4));
        assert!(masked.contains_index(3));
        assert!(!masked.contains_index(9));
        assert!(t.mask().is_none());
    }

    #[test]
    fn test_hex_edge_leaves_topology() {
        let g = HexPrismGrid::new(Vec3::ZERO, IVec3::new(3, 1, 3), Vec3::ONE);
        let t = Topology::from_grid(&g);
        let i = t.get_index(IVec3::new(2, 0, 2)).unwrap();
        assert!(t.try_move(i, HexPrismFaceDir::ForwardRight).is_none());
        assert!(t.try_move(i, HexPrismFaceDir::Left).is_some());
    }

    #[test]
    fn test_inverse_labels_round_trip() {
        let mesh = MeshGridBuilder::new(CubeCellType::new(), Vec3::ONE)
            .build(MeshData::cube_surface(), &SurfaceConfig::default())
            .unwrap();
        let t = Topology::from_grid(&mesh);
        assert_eq!(t.labels().len(), 6 * 4);
        for i in 0..t.index_count() {
            for (_, e) in t.neighbors(i) {
                let back = t.try_move(e.dest, e.inverse_dir).unwrap();
                assert_eq!(back.dest, i);
                assert_eq!(back.label, t.labels().inverse(e.label));
            }
        }
        let cube = Topology::from_grid(&CubeGrid::new(Vec3::ZERO, IVec3::ONE, Vec3::ONE));
        for (l, _) in cube.labels().iter() {
            assert_eq!(cube.labels().inverse(cube.labels().inverse(l)), l);
        }
    }
}
