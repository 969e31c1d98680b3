//! Authored tiles and the solver states derived from them

use ahash::{AHashMap, AHashSet};
use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

use crate::core::types::{LatticeKind, RotationGroupType};
use crate::lattice::cell_type::sorted_offsets;
use crate::lattice::{CellType, FaceDetails};

/// Position of a tile in the list a model was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u32);

impl TileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One tile, in one orientation, anchored at one of its offsets
///
/// This is the unit the solver assigns to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelTile<R> {
    pub tile: TileId,
    pub rotation: R,
    pub offset: IVec3,
}

impl<R> ModelTile<R> {
    pub fn new(tile: TileId, rotation: R, offset: IVec3) -> Self {
        Self {
            tile,
            rotation,
            offset,
        }
    }
}

/// A painted tile occupying one or more offsets
///
/// The offset set is the only record of the tile's shape. Exposed faces are
/// worked out from it when asked for, and paint on faces that end up inside
/// the tile is ignored.
#[derive(Debug, Clone)]
pub struct Tile<D> {
    pub name: String,
    pub lattice: LatticeKind,
    offsets: AHashSet<IVec3>,
    paint: AHashMap<(IVec3, D), FaceDetails>,
    pub rotatable: bool,
    pub reflectable: bool,
    pub rotation_group: RotationGroupType,
    /// Check orientations for paint equivalence and merge the duplicates
    pub symmetric: bool,
    /// Tile-space center of offset zero
    pub center: Vec3,
    pub tile_size: Vec3,
    /// Palette the paint indices refer to
    pub palette: Option<String>,
}

impl<D: Copy + Eq + std::hash::Hash> Tile<D> {
    /// A single-cell tile with unpainted faces
    pub fn new(name: impl Into<String>, lattice: LatticeKind) -> Self {
        let mut offsets = AHashSet::new();
        offsets.insert(IVec3::ZERO);
        Self {
            name: name.into(),
            lattice,
            offsets,
            paint: AHashMap::new(),
            rotatable: true,
            reflectable: true,
            rotation_group: RotationGroupType::XZ,
            symmetric: true,
            center: Vec3::ZERO,
            tile_size: Vec3::ONE,
            palette: None,
        }
    }

    pub fn with_offsets(mut self, offsets: impl IntoIterator<Item = IVec3>) -> Self {
        self.offsets = offsets.into_iter().collect();
        self.paint.retain(|(o, _), _| self.offsets.contains(o));
        self
    }

    pub fn with_paint(mut self, offset: IVec3, dir: D, details: FaceDetails) -> Self {
        self.set_paint(offset, dir, details);
        self
    }

    pub fn set_paint(&mut self, offset: IVec3, dir: D, details: FaceDetails) {
        self.paint.insert((offset, dir), details);
    }

    pub fn add_offset(&mut self, offset: IVec3) {
        self.offsets.insert(offset);
    }

    /// Removes an offset together with any paint recorded on it
    pub fn remove_offset(&mut self, offset: IVec3) {
        self.offsets.remove(&offset);
        self.paint.retain(|(o, _), _| *o != offset);
    }

    pub fn offsets(&self) -> &AHashSet<IVec3> {
        &self.offsets
    }

    pub fn sorted_offsets(&self) -> Vec<IVec3> {
        sorted_offsets(&self.offsets)
    }

    pub fn contains(&self, offset: IVec3) -> bool {
        self.offsets.contains(&offset)
    }

    pub fn offset_count(&self) -> usize {
        self.offsets.len()
    }
}

impl<D: Copy + Eq + std::hash::Hash + std::fmt::Debug> Tile<D> {
    /// Paint recorded on a face, or uniform paint 0 if none was set
    pub fn paint_of<C>(&self, cell_type: &C, offset: IVec3, dir: D) -> FaceDetails
    where
        C: CellType<FaceDir = D>,
    {
        self.paint
            .get(&(offset, dir))
            .cloned()
            .unwrap_or_else(|| FaceDetails::uniform(cell_type.face_shape(dir), 0))
    }

    /// Every face on the outside of the tile with its paint, in offset then
    /// direction order
    pub fn faces<C>(&self, cell_type: &C) -> Vec<(IVec3, D, FaceDetails)>
    where
        C: CellType<FaceDir = D>,
    {
        let mut faces = Vec::new();
        for offset in self.sorted_offsets() {
            for &dir in cell_type.face_dirs() {
                match cell_type.try_move(offset, dir) {
                    Some(next) if !self.offsets.contains(&next) => {
                        faces.push((offset, dir, self.paint_of(cell_type, offset, dir)));
                    }
                    _ => {}
                }
            }
        }
        faces
    }

    /// True when every offset can reach every other through shared faces
    pub fn is_contiguous<C>(&self, cell_type: &C) -> bool
    where
        C: CellType<FaceDir = D>,
    {
        let Some(&start) = self.sorted_offsets().first() else {
            return false;
        };
        let mut seen = AHashSet::with_capacity(self.offsets.len());
        let mut stack = vec![start];
        seen.insert(start);
        while let Some(o) = stack.pop() {
            for &dir in cell_type.face_dirs() {
                if let Some(next) = cell_type.try_move(o, dir) {
                    if self.offsets.contains(&next) && seen.insert(next) {
                        stack.push(next);
                    }
                }
            }
        }
        seen.len() == self.offsets.len()
    }
}

/// A tile and its sampling weight
#[derive(Debug, Clone)]
pub struct TileEntry<D> {
    pub tile: Tile<D>,
    pub weight: f32,
}

impl<D> TileEntry<D> {
    pub fn new(tile: Tile<D>, weight: f32) -> Self {
        Self { tile, weight }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lattice::{CubeCellType, CubeFaceDir, FaceShape, TrianglePrismCellType};

    #[test]
    fn test_single_cell_exposes_every_face() {
        let ct = CubeCellType::new();
        let tile: Tile<CubeFaceDir> = Tile::new("block", LatticeKind::Cube);
        let faces = tile.faces(&ct);
        assert_eq!(faces.len(), 6);
        assert!(faces
            .iter()
            .all(|(_, _, fd)| *fd == FaceDetails::uniform(FaceShape::Square, 0)));
    }

    #[test]
    fn test_domino_hides_shared_faces() {
        let ct = CubeCellType::new();
        let tile = Tile::new("domino", LatticeKind::Cube)
            .with_offsets([IVec3::ZERO, IVec3::X])
            .with_paint(IVec3::ZERO, CubeFaceDir::Right, FaceDetails::uniform(FaceShape::Square, 3));
        let faces = tile.faces(&ct);
        assert_eq!(faces.len(), 10);
        assert!(!faces
            .iter()
            .any(|(o, d, _)| *o == IVec3::ZERO && *d == CubeFaceDir::Right));
    }

    #[test]
    fn test_remove_offset_drops_its_paint() {
        let ct = CubeCellType::new();
        let mut tile = Tile::new("l", LatticeKind::Cube)
            .with_offsets([IVec3::ZERO, IVec3::X])
            .with_paint(IVec3::X, CubeFaceDir::Up, FaceDetails::uniform(FaceShape::Square, 2));
        tile.remove_offset(IVec3::X);
        tile.add_offset(IVec3::X);
        assert_eq!(
            tile.paint_of(&ct, IVec3::X, CubeFaceDir::Up),
            FaceDetails::uniform(FaceShape::Square, 0)
        );
    }

    #[test]
    fn test_contiguity() {
        let ct = CubeCellType::new();
        let split: Tile<CubeFaceDir> =
            Tile::new("split", LatticeKind::Cube).with_offsets([IVec3::ZERO, IVec3::new(2, 0, 0)]);
        assert!(!split.is_contiguous(&ct));
        let bar: Tile<CubeFaceDir> = Tile::new("bar", LatticeKind::Cube)
            .with_offsets([IVec3::ZERO, IVec3::X, IVec3::new(2, 0, 0)]);
        assert!(bar.is_contiguous(&ct));
        let empty: Tile<CubeFaceDir> = Tile::new("empty", LatticeKind::Cube).with_offsets([]);
        assert!(!empty.is_contiguous(&ct));
    }

    #[test]
    fn test_triangle_faces_follow_orientation() {
        let ct = TrianglePrismCellType::new();
        let tile = Tile::new("rhombus", LatticeKind::TrianglePrism)
            .with_offsets([IVec3::ZERO, IVec3::X]);
        // Two prisms: 3 sides each, one shared, plus top and bottom
        assert_eq!(tile.faces(&ct).len(), 4 + 4);
        assert!(tile.is_contiguous(&ct));
    }
}
