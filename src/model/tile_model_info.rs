//! Canonical solver states and the connectivity between them
//!
//! Every orientation of every tile offset is a potential solver state. Tiles
//! marked `symmetric` have orientations that look identical; those collapse
//! onto one canonical state, whose frequency absorbs the duplicates.

use ahash::{AHashMap, AHashSet};
use glam::IVec3;
use tracing::{debug, info};

use super::tile::{ModelTile, Tile, TileEntry, TileId};
use crate::core::error::{Result, TileGraphError, WarningKind, Warnings};
use crate::lattice::{CellType, FaceDetails};

type Dir<C> = <C as CellType>::FaceDir;
type Rot<C> = <C as CellType>::Rotation;

/// Two offsets of one placed big tile that are neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InternalAdjacency<D, R> {
    pub src: ModelTile<R>,
    pub dest: ModelTile<R>,
    /// Step from `src` to `dest` in tile space
    pub offset_dir: D,
    /// The same step once the tile is rotated into the grid
    pub grid_dir: D,
}

#[derive(Debug, Clone)]
pub struct TileModelInfo<C: CellType> {
    cell_type: C,
    tiles: Vec<Tile<C::FaceDir>>,
    weights: Vec<f32>,
    all_tiles: Vec<(ModelTile<C::Rotation>, f32)>,
    internal_adjacencies: Vec<InternalAdjacency<C::FaceDir, C::Rotation>>,
    tiles_by_direction: AHashMap<C::FaceDir, Vec<(FaceDetails, ModelTile<C::Rotation>)>>,
    canonicalization: AHashMap<ModelTile<C::Rotation>, ModelTile<C::Rotation>>,
    uncanonicalization: AHashMap<ModelTile<C::Rotation>, Vec<ModelTile<C::Rotation>>>,
    /// Tiles left out of the model, e.g. for not being contiguous
    skipped: AHashSet<TileId>,
    pub warnings: Warnings,
}

impl<C: CellType> TileModelInfo<C> {
    pub fn build(cell_type: C, entries: &[TileEntry<Dir<C>>]) -> Result<Self> {
        if entries.is_empty() {
            return Err(TileGraphError::ZeroTiles);
        }
        let mut warnings = Warnings::new();
        let mut skipped = AHashSet::new();
        for (i, entry) in entries.iter().enumerate() {
            let tile = &entry.tile;
            if tile.offset_count() == 0 {
                warnings.push(
                    WarningKind::EmptyTile,
                    format!("Cannot use {} as it has no offsets", tile.name),
                );
                skipped.insert(TileId(i as u32));
            } else if !tile.is_contiguous(&cell_type) {
                warnings.push(
                    WarningKind::NonContiguousTile,
                    format!("Cannot use {} as it is not contiguous", tile.name),
                );
                skipped.insert(TileId(i as u32));
            }
        }

        let mut info = Self {
            tiles: entries.iter().map(|e| e.tile.clone()).collect(),
            weights: entries.iter().map(|e| e.weight).collect(),
            cell_type,
            all_tiles: Vec::new(),
            internal_adjacencies: Vec::new(),
            tiles_by_direction: AHashMap::new(),
            canonicalization: AHashMap::new(),
            uncanonicalization: AHashMap::new(),
            skipped,
            warnings,
        };
        for &dir in info.cell_type.face_dirs() {
            info.tiles_by_direction.insert(dir, Vec::new());
        }
        info.canonicalize_all();
        info.collect_states();
        info!(
            tiles = entries.len(),
            skipped = info.skipped.len(),
            states = info.all_tiles.len(),
            internal = info.internal_adjacencies.len(),
            "built tile model"
        );
        Ok(info)
    }

    fn orientations(&self, tile: &Tile<Dir<C>>) -> Vec<Rot<C>> {
        self.cell_type
            .rotations(tile.rotatable, tile.reflectable, tile.rotation_group)
            .to_vec()
    }

    fn canonicalize_all(&mut self) {
        let mut canonical = AHashMap::new();
        for (i, tile) in self.tiles.iter().enumerate() {
            let id = TileId(i as u32);
            if self.skipped.contains(&id) {
                continue;
            }
            let rotations = self.orientations(tile);
            if !tile.symmetric {
                for &rotation in &rotations {
                    for offset in tile.sorted_offsets() {
                        let mt = ModelTile::new(id, rotation, offset);
                        canonical.insert(mt, mt);
                    }
                }
                continue;
            }
            let faces = tile.faces(&self.cell_type);
            let mut done = AHashSet::new();
            for &rot1 in &rotations {
                if done.contains(&rot1) {
                    continue;
                }
                for &rot2 in &rotations {
                    if done.contains(&rot2) {
                        continue;
                    }
                    let Some(mapping) = self.paint_equivalence(tile, &faces, rot1, rot2) else {
                        continue;
                    };
                    // Placing the tile as rot2 anchored at p covers the same
                    // cells, with the same paint, as rot1 anchored at mapping[p]
                    for (&p, &q) in &mapping {
                        canonical.insert(
                            ModelTile::new(id, rot2, p),
                            ModelTile::new(id, rot1, q),
                        );
                    }
                    done.insert(rot2);
                }
            }
            debug!(tile = %tile.name, orientations = rotations.len(), canonical = done.len(), "canonicalized");
        }
        let mut uncanonical: AHashMap<_, Vec<_>> = AHashMap::new();
        for (&from, &to) in &canonical {
            uncanonical.entry(to).or_default().push(from);
        }
        self.canonicalization = canonical;
        self.uncanonicalization = uncanonical;
    }

    /// The offset mapping under which `rot2` reproduces `rot1`, if the tile
    /// looks the same in both
    fn paint_equivalence(
        &self,
        tile: &Tile<Dir<C>>,
        faces: &[(IVec3, Dir<C>, FaceDetails)],
        rot1: Rot<C>,
        rot2: Rot<C>,
    ) -> Option<AHashMap<IVec3, IVec3>> {
        let ct = &self.cell_type;
        let rotation = ct.multiply(ct.invert(rot1), rot2);
        let mapping = ct.realign(tile.offsets(), rotation)?;
        for (offset, dir, details) in faces {
            let target = *mapping.get(offset)?;
            let (dir2, details2) = ct.rotate_by(*dir, details, rotation);
            if !details2.is_equivalent(&tile.paint_of(ct, target, dir2)) {
                return None;
            }
        }
        Some(mapping)
    }

    fn collect_states(&mut self) {
        let ct = &self.cell_type;
        let mut all_tiles = Vec::new();
        let mut internal = Vec::new();
        let mut by_direction = std::mem::take(&mut self.tiles_by_direction);
        for (i, tile) in self.tiles.iter().enumerate() {
            let id = TileId(i as u32);
            if self.skipped.contains(&id) {
                continue;
            }
            let offsets = tile.sorted_offsets();
            let faces = tile.faces(ct);
            for &rotation in ct.rotations(tile.rotatable, tile.reflectable, tile.rotation_group) {
                for &offset in &offsets {
                    let mt = ModelTile::new(id, rotation, offset);
                    let Some(count) = self.uncanonicalization.get(&mt).map(Vec::len) else {
                        continue;
                    };
                    let frequency = self.weights[i] * count as f32 / offsets.len() as f32;
                    all_tiles.push((mt, frequency));

                    for &dir in ct.face_dirs() {
                        let Some(next) = ct.try_move(offset, dir) else {
                            continue;
                        };
                        let dest = ModelTile::new(id, rotation, next);
                        if !tile.contains(next) || !self.uncanonicalization.contains_key(&dest) {
                            continue;
                        }
                        internal.push(InternalAdjacency {
                            src: mt,
                            dest,
                            offset_dir: dir,
                            grid_dir: ct.rotate(dir, rotation),
                        });
                    }
                }

                for (offset, dir, details) in &faces {
                    let mt = ModelTile::new(id, rotation, *offset);
                    if !self.uncanonicalization.contains_key(&mt) {
                        continue;
                    }
                    let (rdir, rdetails) = ct.rotate_by(*dir, details, rotation);
                    by_direction.entry(rdir).or_default().push((rdetails, mt));
                }
            }
        }
        self.all_tiles = all_tiles;
        self.internal_adjacencies = internal;
        self.tiles_by_direction = by_direction;
    }

    pub fn cell_type(&self) -> &C {
        &self.cell_type
    }

    pub fn tiles(&self) -> &[Tile<Dir<C>>] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile<Dir<C>>> {
        self.tiles.get(id.index())
    }

    pub fn tile_id(&self, name: &str) -> Option<TileId> {
        self.tiles
            .iter()
            .position(|t| t.name == name)
            .map(|i| TileId(i as u32))
    }

    /// Whether a tile contributes any solver states
    pub fn includes(&self, id: TileId) -> bool {
        id.index() < self.tiles.len() && !self.skipped.contains(&id)
    }

    /// Canonical states with their frequencies
    pub fn all_tiles(&self) -> &[(ModelTile<Rot<C>>, f32)] {
        &self.all_tiles
    }

    pub fn frequency(&self, mt: &ModelTile<Rot<C>>) -> Option<f32> {
        self.all_tiles
            .iter()
            .find(|(t, _)| t == mt)
            .map(|&(_, f)| f)
    }

    pub fn internal_adjacencies(&self) -> &[InternalAdjacency<Dir<C>, Rot<C>>] {
        &self.internal_adjacencies
    }

    /// Rotated exposed faces pointing in `dir`, with the states that own them
    pub fn tiles_by_direction(&self, dir: Dir<C>) -> &[(FaceDetails, ModelTile<Rot<C>>)] {
        self.tiles_by_direction
            .get(&dir)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Solver direction index of a face direction
    pub fn direction_index(&self, dir: Dir<C>) -> usize {
        self.cell_type.direction_index(dir)
    }

    pub fn direction_mapping(&self) -> AHashMap<Dir<C>, usize> {
        self.cell_type.direction_mapping()
    }

    pub fn direction(&self, index: usize) -> Option<Dir<C>> {
        self.cell_type.face_dirs().get(index).copied()
    }

    /// Canonical representative of a state; `None` if the tile cannot take
    /// that orientation or the offset is not part of it
    pub fn canonicalize(&self, mt: &ModelTile<Rot<C>>) -> Option<ModelTile<Rot<C>>> {
        self.canonicalization.get(mt).copied()
    }

    pub fn is_canonical(&self, mt: &ModelTile<Rot<C>>) -> bool {
        self.uncanonicalization.contains_key(mt)
    }

    /// Every state that canonicalizes to `mt`
    pub fn uncanonicalize(&self, mt: &ModelTile<Rot<C>>) -> &[ModelTile<Rot<C>>] {
        self.uncanonicalization
            .get(mt)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Canonical states belonging to one tile
    pub fn states_of(&self, id: TileId) -> impl Iterator<Item = ModelTile<Rot<C>>> + '_ {
        self.all_tiles
            .iter()
            .filter(move |(mt, _)| mt.tile == id)
            .map(|&(mt, _)| mt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{LatticeKind, RotationGroupType};
    use crate::lattice::{
        CubeCellType, CubeFaceDir, CubeRotation, FaceShape, SquareCellType, SquareFaceDir,
    };

    fn square_tile(name: &str) -> Tile<SquareFaceDir> {
        let mut tile = Tile::new(name, LatticeKind::Square);
        tile.rotation_group = RotationGroupType::XY;
        tile.reflectable = false;
        tile
    }

    #[test]
    fn test_zero_tiles_is_an_error() {
        let entries: Vec<TileEntry<CubeFaceDir>> = Vec::new();
        assert!(matches!(
            TileModelInfo::build(CubeCellType::new(), &entries),
            Err(TileGraphError::ZeroTiles)
        ));
    }

    #[test]
    fn test_asymmetric_paint_keeps_every_rotation() {
        let tile = square_tile("arrow").with_paint(
            IVec3::ZERO,
            SquareFaceDir::Right,
            FaceDetails::uniform(FaceShape::Square, 1),
        );
        let info =
            TileModelInfo::build(SquareCellType::new(), &[TileEntry::new(tile, 1.0)]).unwrap();
        assert_eq!(info.all_tiles().len(), 4);
        assert!(info.all_tiles().iter().all(|&(_, f)| f == 1.0));
        // Each exposed face appears once per orientation
        let faces: usize = SquareCellType::new()
            .face_dirs()
            .iter()
            .map(|&d| info.tiles_by_direction(d).len())
            .sum();
        assert_eq!(faces, 16);
    }

    #[test]
    fn test_unsymmetric_flag_skips_merging() {
        let mut tile = square_tile("plain");
        tile.symmetric = false;
        let info =
            TileModelInfo::build(SquareCellType::new(), &[TileEntry::new(tile, 2.0)]).unwrap();
        assert_eq!(info.all_tiles().len(), 4);
        assert!(info.all_tiles().iter().all(|&(_, f)| f == 2.0));
    }

    #[test]
    fn test_canonicalization_is_a_retraction() {
        let ct = CubeCellType::new();
        let mut tile = Tile::new("corner", LatticeKind::Cube)
            .with_offsets([IVec3::ZERO, IVec3::X])
            .with_paint(IVec3::X, CubeFaceDir::Up, FaceDetails::uniform(FaceShape::Square, 1));
        tile.rotation_group = RotationGroupType::All;
        let info = TileModelInfo::build(ct.clone(), &[TileEntry::new(tile, 1.0)]).unwrap();
        for &r in ct.all_rotations() {
            for o in [IVec3::ZERO, IVec3::X] {
                let mt = ModelTile::new(TileId(0), r, o);
                let c = info.canonicalize(&mt).unwrap();
                assert_eq!(info.canonicalize(&c), Some(c));
                assert!(info.is_canonical(&c));
                assert!(info.uncanonicalize(&c).contains(&mt));
            }
        }
        let total: usize = info
            .all_tiles()
            .iter()
            .map(|(mt, _)| info.uncanonicalize(mt).len())
            .sum();
        assert_eq!(total, 48 * 2);
    }

    #[test]
    fn test_direction_mapping_inverts_direction() {
        let block = Tile::new("block", LatticeKind::Cube);
        let info = TileModelInfo::build(CubeCellType::new(), &[TileEntry::new(block, 1.0)]).unwrap();
        let mapping = info.direction_mapping();
        assert_eq!(mapping.len(), 6);
        for (&dir, &index) in &mapping {
            assert_eq!(info.direction(index), Some(dir));
            assert_eq!(info.direction_index(dir), index);
        }
    }

    #[test]
    fn test_big_tile_internal_adjacency() {
        let ct = CubeCellType::new();
        let mut tile = Tile::new("domino", LatticeKind::Cube).with_offsets([IVec3::ZERO, IVec3::X]);
        tile.symmetric = false;
        tile.reflectable = false;
        let info = TileModelInfo::build(ct.clone(), &[TileEntry::new(tile, 1.0)]).unwrap();
        // 4 yaw rotations, 2 offsets, one edge each way
        assert_eq!(info.internal_adjacencies().len(), 8);
        for ia in info.internal_adjacencies() {
            assert_eq!(ia.grid_dir, ct.rotate(ia.offset_dir, ia.src.rotation));
            assert_eq!(ia.src.rotation, ia.dest.rotation);
        }
        let quarter = info
            .internal_adjacencies()
            .iter()
            .find(|ia| ia.src.rotation == CubeRotation::ROTATE_XZ && ia.src.offset == IVec3::ZERO)
            .unwrap();
        assert_eq!(quarter.grid_dir, CubeFaceDir::Forward);
        // Frequency is spread over the offsets
        assert!(info.all_tiles().iter().all(|&(_, f)| (f - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_non_contiguous_tile_is_skipped() {
        let split = Tile::new("split", LatticeKind::Cube)
            .with_offsets([IVec3::ZERO, IVec3::new(0, 0, 2)]);
        let block = Tile::new("block", LatticeKind::Cube);
        let info = TileModelInfo::build(
            CubeCellType::new(),
            &[TileEntry::new(split, 1.0), TileEntry::new(block, 1.0)],
        )
        .unwrap();
        assert!(!info.includes(TileId(0)));
        assert!(info.includes(TileId(1)));
        assert_eq!(info.warnings.count(WarningKind::NonContiguousTile), 1);
        assert_eq!(info.states_of(TileId(0)).count(), 0);
        assert_eq!(info.tile_id("block"), Some(TileId(1)));
    }
}
