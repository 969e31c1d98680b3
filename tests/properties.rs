//! Property tests for the lattice algebra, grids and tile models

use std::collections::HashSet;

use glam::{IVec3, Vec3};
use proptest::prelude::*;

use tilegraph::core::types::{LatticeKind, RotationGroupType};
use tilegraph::generator::grow_big_tile;
use tilegraph::grid::{CubeGrid, Grid, HexPrismGrid, SquareGrid, TrianglePrismGrid};
use tilegraph::lattice::{
    CellType, CubeCellType, CubeFaceDir, CubeRotation, FaceDetails, FaceShape, HexRotation,
    LatticeRotation,
};
use tilegraph::model::{
    build_adjacency_model, AdjacencyModel, ModelTile, Palette, Tile, TileEntry, TileModelInfo,
};

fn check_index_bijection<G: Grid>(grid: &G) {
    let mut seen = HashSet::new();
    for i in 0..grid.index_count() {
        let cell = grid.get_cell(i).expect("every index has a cell");
        assert!(grid.in_bounds(cell));
        assert_eq!(grid.get_index(cell), Some(i));
        assert!(seen.insert((cell.x, cell.y, cell.z)));
    }
    assert_eq!(grid.cells().len(), grid.index_count());
}

fn check_move_reciprocity<G: Grid>(grid: &G) {
    for cell in grid.cells() {
        for dir in grid.valid_face_dirs(cell) {
            let Some(m) = grid.try_move(cell, dir) else {
                continue;
            };
            if !grid.in_bounds(m.dest) {
                continue;
            }
            let back = grid.try_move(m.dest, m.inverse_dir).expect("moves are reversible");
            assert_eq!(back.dest, cell, "{:?} from {:?}", dir, cell);
            assert_eq!(back.inverse_dir, dir);
        }
    }
}

/// A cube tile with a random paint color on each face
fn painted_cube(paints: &[u32], group: RotationGroupType) -> Tile<CubeFaceDir> {
    let ct = CubeCellType::new();
    let mut tile = Tile::new("painted", LatticeKind::Cube);
    tile.rotation_group = group;
    for (&dir, &paint) in ct.face_dirs().iter().zip(paints) {
        tile.set_paint(IVec3::ZERO, dir, FaceDetails::uniform(FaceShape::Square, paint));
    }
    tile
}

type NamedState = (String, CubeRotation, IVec3);

/// Directional adjacencies keyed by tile name, each pair stated from the
/// first direction of its axis
fn normalized_adjacencies(
    tiles: &[Tile<CubeFaceDir>],
) -> HashSet<(CubeFaceDir, NamedState, NamedState)> {
    let ct = CubeCellType::new();
    let entries: Vec<_> = tiles.iter().cloned().map(|t| TileEntry::new(t, 1.0)).collect();
    let info = TileModelInfo::build(ct.clone(), &entries).unwrap();
    let grid = CubeGrid::new(Vec3::ZERO, IVec3::new(2, 2, 2), Vec3::ONE);
    let AdjacencyModel::Directional(list) = build_adjacency_model(&info, &grid, &Palette::default())
    else {
        panic!("cube grids use directional adjacency");
    };
    let firsts: Vec<CubeFaceDir> = ct.face_dir_pairs().into_iter().map(|(a, _)| a).collect();
    let named = |mt: ModelTile<CubeRotation>| {
        (info.tile(mt.tile).unwrap().name.clone(), mt.rotation, mt.offset)
    };
    list.into_iter()
        .map(|adj| {
            if firsts.contains(&adj.dir) {
                (adj.dir, named(adj.src), named(adj.dest))
            } else {
                (ct.invert_dir(adj.dir), named(adj.dest), named(adj.src))
            }
        })
        .collect()
}

fn group_strategy() -> impl Strategy<Value = RotationGroupType> {
    prop_oneof![
        Just(RotationGroupType::None),
        Just(RotationGroupType::XZ),
        Just(RotationGroupType::XY),
        Just(RotationGroupType::YZ),
        Just(RotationGroupType::All),
    ]
}

proptest! {
    #[test]
    fn cube_group_is_closed_with_inverses(a in 0usize..48, b in 0usize..48) {
        let all = CubeRotation::all();
        let (x, y) = (all[a], all[b]);
        prop_assert!(all.contains(&x.multiply(y)));
        prop_assert_eq!(x.multiply(x.invert()), CubeRotation::identity());
        prop_assert_eq!(x.multiply(y).invert(), y.invert().multiply(x.invert()));
    }

    #[test]
    fn hex_group_is_closed_with_inverses(a in 0usize..12, b in 0usize..12) {
        let all = HexRotation::all();
        let (x, y) = (all[a], all[b]);
        prop_assert!(all.contains(&x.multiply(y)));
        prop_assert_eq!(x.invert().multiply(x), HexRotation::identity());
    }

    #[test]
    fn grid_indices_are_a_bijection(x in 1i32..5, y in 1i32..3, z in 1i32..5) {
        let size = IVec3::new(x, y, z);
        check_index_bijection(&CubeGrid::new(Vec3::ZERO, size, Vec3::ONE));
        check_index_bijection(&SquareGrid::new(Vec3::ZERO, size, Vec3::ONE));
        check_index_bijection(&HexPrismGrid::new(Vec3::ZERO, size, Vec3::ONE));
        check_index_bijection(&TrianglePrismGrid::new(Vec3::ZERO, size, Vec3::ONE));
    }

    #[test]
    fn moves_are_reciprocal(x in 1i32..5, y in 1i32..3, z in 1i32..5) {
        let size = IVec3::new(x, y, z);
        check_move_reciprocity(&CubeGrid::new(Vec3::ZERO, size, Vec3::ONE));
        check_move_reciprocity(&SquareGrid::new(Vec3::ZERO, size, Vec3::ONE));
        check_move_reciprocity(&HexPrismGrid::new(Vec3::ZERO, size, Vec3::ONE));
        check_move_reciprocity(&TrianglePrismGrid::new(Vec3::ZERO, size, Vec3::ONE));
    }

    #[test]
    fn canonicalization_is_a_retraction(
        paints in proptest::collection::vec(0u32..3, 6),
        group in group_strategy(),
    ) {
        let ct = CubeCellType::new();
        let tile = painted_cube(&paints, group);
        let info = TileModelInfo::build(ct.clone(), &[TileEntry::new(tile, 1.0)]).unwrap();
        let id = info.tile_id("painted").unwrap();
        let mut total = 0;
        for &rotation in ct.all_rotations() {
            let mt = ModelTile::new(id, rotation, IVec3::ZERO);
            let Some(c) = info.canonicalize(&mt) else { continue };
            prop_assert!(info.is_canonical(&c));
            prop_assert_eq!(info.canonicalize(&c), Some(c));
            total += 1;
        }
        let uncanonical: usize = info
            .all_tiles()
            .iter()
            .map(|(mt, _)| info.uncanonicalize(mt).len())
            .sum();
        prop_assert_eq!(uncanonical, total);
    }

    #[test]
    fn face_matching_is_symmetric(
        a in proptest::collection::vec(0u32..4, 9),
        b in proptest::collection::vec(0u32..4, 9),
        pairs in proptest::collection::vec((0u32..4, 0u32..4, any::<bool>()), 0..6),
    ) {
        let mut palette = Palette::new("test", 4);
        for (x, y, allowed) in pairs {
            palette.set_match(x, y, allowed);
        }
        let fa = FaceDetails::new(a[0], a[1..].to_vec());
        let fb = FaceDetails::new(b[0], b[1..].to_vec());
        prop_assert_eq!(palette.matches(&fa, &fb), palette.matches(&fb, &fa));
    }

    #[test]
    fn directional_adjacency_ignores_tile_order(
        a in proptest::collection::vec(0u32..2, 6),
        b in proptest::collection::vec(0u32..2, 6),
    ) {
        let first = painted_cube(&a, RotationGroupType::XZ);
        let mut second = painted_cube(&b, RotationGroupType::XZ);
        second.name = "second".into();
        let forward = normalized_adjacencies(&[first.clone(), second.clone()]);
        let backward = normalized_adjacencies(&[second, first]);
        prop_assert!(!forward.is_empty());
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn big_tiles_grow_into_distinct_cells(r in 0usize..48, len in 2i32..4) {
        let ct = CubeCellType::new();
        let offsets: Vec<IVec3> = (0..len).map(|i| IVec3::new(i, 0, 0)).chain([IVec3::new(0, 1, 0)]).collect();
        let mut beam = Tile::new("beam", LatticeKind::Cube).with_offsets(offsets.iter().copied());
        beam.rotation_group = RotationGroupType::All;
        let info = TileModelInfo::build(ct.clone(), &[TileEntry::new(beam, 1.0)]).unwrap();
        let grid = CubeGrid::new(Vec3::ZERO, IVec3::splat(8), Vec3::ONE);
        let rotation = ct.all_rotations()[r];
        let start = IVec3::splat(4);
        for &offset in &offsets {
            let mt = ModelTile::new(info.tile_id("beam").unwrap(), rotation, offset);
            let instance = grow_big_tile(&grid, &info, start, &mt).unwrap();
            let distinct: HashSet<_> = instance.cells.iter().map(|c| (c.x, c.y, c.z)).collect();
            prop_assert_eq!(distinct.len(), offsets.len());
            prop_assert!(instance.cells.contains(&start));
            prop_assert!(instance.cell_rotations.iter().all(|&cr| cr == rotation));
        }
    }
}
