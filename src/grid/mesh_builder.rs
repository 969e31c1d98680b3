//! Builds a `MeshGrid` by stitching mesh faces together along shared edges

use ahash::AHashMap;
use glam::{IVec3, Mat4, Vec3};
use tracing::{debug, info};

use super::mesh::{face_normal, FaceTopology, MeshData, MeshGrid};
use super::spatial_hash::SpatialHash;
use super::{Grid, Move};
use crate::core::config::SurfaceConfig;
use crate::core::error::{Result, TileGraphError, WarningKind, Warnings};
use crate::lattice::hex_prism::SQRT3_2;
use crate::lattice::triangle_prism::locate as locate_triangle;
use crate::lattice::{
    CellType, CubeCellType, CubeFaceDir, CubeRotation, TrianglePrismCellType,
    TrianglePrismFaceDir, TriangleRotation,
};

/// Lattices whose cells can be stretched over one mesh face
///
/// A face's edges are numbered from its first vertex, so edge `e` runs from
/// vertex `e` to vertex `e + 1`.
pub trait MeshCellType: CellType {
    fn face_topology(&self) -> FaceTopology;

    /// Cell face lying over mesh edge `edge`
    fn edge_dir(&self, edge: usize) -> Self::FaceDir;

    /// Change of frame when leaving one face through `exit` and entering
    /// the next through `entry`
    fn edge_rotation(&self, exit: usize, entry: usize) -> Self::Rotation;

    /// Faces pointing along and against the face normal
    fn layer_dirs(&self) -> (Self::FaceDir, Self::FaceDir);

    /// Directions a surface cell can step through
    fn mesh_face_dirs(&self) -> Vec<Self::FaceDir>;

    /// Every rotation a surface step can report
    fn mesh_move_rotations(&self) -> Vec<Self::Rotation>;

    /// The world x and z axes of a unit cell laid over a face, and the
    /// point under its center
    fn face_axes(&self, verts: &[Vec3]) -> (Vec3, Vec3, Vec3);

    /// Offset containing a tile-space point given relative to the center of
    /// offset zero
    fn locate(&self, local: Vec3, tile_size: Vec3) -> IVec3;
}

fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    (a + b) * 0.5
}

impl MeshCellType for CubeCellType {
    fn face_topology(&self) -> FaceTopology {
        FaceTopology::Quads
    }

    fn edge_dir(&self, edge: usize) -> CubeFaceDir {
        match edge % 4 {
            0 => CubeFaceDir::Back,
            1 => CubeFaceDir::Right,
            2 => CubeFaceDir::Forward,
            _ => CubeFaceDir::Left,
        }
    }

    fn edge_rotation(&self, exit: usize, entry: usize) -> CubeRotation {
        // Edge e faces quarter turn (e + 3) from +x; the step must leave
        // through the side opposite `entry`
        CubeRotation::ROTATE_XZ.pow(((entry + 6 - exit % 4) % 4) as u32)
    }

    fn layer_dirs(&self) -> (CubeFaceDir, CubeFaceDir) {
        (CubeFaceDir::Up, CubeFaceDir::Down)
    }

    fn mesh_face_dirs(&self) -> Vec<CubeFaceDir> {
        self.face_dirs().to_vec()
    }

    fn mesh_move_rotations(&self) -> Vec<CubeRotation> {
        (0..4).map(|k| CubeRotation::ROTATE_XZ.pow(k)).collect()
    }

    fn face_axes(&self, verts: &[Vec3]) -> (Vec3, Vec3, Vec3) {
        let [v0, v1, v2, v3] = [verts[0], verts[1], verts[2], verts[3]];
        let x = midpoint(v1, v2) - midpoint(v3, v0);
        let z = midpoint(v2, v3) - midpoint(v0, v1);
        (x, z, (v0 + v1 + v2 + v3) * 0.25)
    }

    fn locate(&self, local: Vec3, tile_size: Vec3) -> IVec3 {
        (local / tile_size).round().as_ivec3()
    }
}

impl MeshCellType for TrianglePrismCellType {
    fn face_topology(&self) -> FaceTopology {
        FaceTopology::Triangles
    }

    fn edge_dir(&self, edge: usize) -> TrianglePrismFaceDir {
        match edge % 3 {
            0 => TrianglePrismFaceDir::Back,
            1 => TrianglePrismFaceDir::ForwardRight,
            _ => TrianglePrismFaceDir::ForwardLeft,
        }
    }

    fn edge_rotation(&self, exit: usize, entry: usize) -> TriangleRotation {
        // Edge e is side 4 + 2e; arriving flips the neighbour by half a turn
        let exit = (exit % 3) as i32;
        let entry = (entry % 3) as i32;
        TriangleRotation::rotation(2 * entry - 2 * exit + 3)
    }

    fn layer_dirs(&self) -> (TrianglePrismFaceDir, TrianglePrismFaceDir) {
        (TrianglePrismFaceDir::Up, TrianglePrismFaceDir::Down)
    }

    fn mesh_face_dirs(&self) -> Vec<TrianglePrismFaceDir> {
        vec![
            TrianglePrismFaceDir::Back,
            TrianglePrismFaceDir::ForwardRight,
            TrianglePrismFaceDir::ForwardLeft,
            TrianglePrismFaceDir::Up,
            TrianglePrismFaceDir::Down,
        ]
    }

    fn mesh_move_rotations(&self) -> Vec<TriangleRotation> {
        [0, 1, 3, 5].into_iter().map(TriangleRotation::rotation).collect()
    }

    fn face_axes(&self, verts: &[Vec3]) -> (Vec3, Vec3, Vec3) {
        let [v0, v1, v2] = [verts[0], verts[1], verts[2]];
        let x = v1 - v0;
        let z = (v2 - midpoint(v0, v1)) / SQRT3_2;
        (x, z, (v0 + v1 + v2) / 3.0)
    }

    fn locate(&self, local: Vec3, tile_size: Vec3) -> IVec3 {
        locate_triangle(local, tile_size.x, tile_size.y)
    }
}

/// Quantized vertex position, so that coincident vertices from different
/// faces or submeshes compare equal
fn vertex_key(v: Vec3) -> IVec3 {
    (v * 1e4).round().as_ivec3()
}

pub struct MeshGridBuilder<C: MeshCellType> {
    cell_type: C,
    tile_size: Vec3,
}

impl<C: MeshCellType> MeshGridBuilder<C> {
    pub fn new(cell_type: C, tile_size: Vec3) -> Self {
        Self {
            cell_type,
            tile_size,
        }
    }

    pub fn build(self, mesh: MeshData, surface: &SurfaceConfig) -> Result<MeshGrid<C>> {
        let topology = self.cell_type.face_topology();
        let per_face = topology.vertices_per_face();
        for (i, sub) in mesh.submeshes.iter().enumerate() {
            if sub.topology != topology {
                return Err(TileGraphError::MeshTopologyMismatch(format!(
                    "submesh {} has {:?} faces but {} tiles need {:?}",
                    i,
                    sub.topology,
                    self.cell_type.kind(),
                    topology
                )));
            }
            if sub.indices.len() % per_face != 0 {
                return Err(TileGraphError::MeshTopologyMismatch(format!(
                    "submesh {} has {} indices, not a multiple of {}",
                    i,
                    sub.indices.len(),
                    per_face
                )));
            }
            if let Some(&bad) = sub.indices.iter().find(|&&v| v as usize >= mesh.vertices.len()) {
                return Err(TileGraphError::MeshTopologyMismatch(format!(
                    "submesh {} references vertex {} but the mesh has {}",
                    i,
                    bad,
                    mesh.vertices.len()
                )));
            }
        }

        let layers = surface.layers.max(1) as i32;
        let face_counts: Vec<usize> = mesh.submeshes.iter().map(|s| s.face_count()).collect();
        let mut starts = Vec::with_capacity(face_counts.len());
        let mut total = 0;
        for &faces in &face_counts {
            starts.push(total);
            total += faces * layers as usize;
        }

        let mut warnings = Warnings::new();
        let planar = self.stitch(&mesh, &mut warnings);
        let mut moves = AHashMap::with_capacity(planar.len() * layers as usize);
        for y in 0..layers {
            for (&((face, sub), dir), &((dest_face, dest_sub), inverse_dir, rotation)) in &planar {
                moves.insert(
                    (IVec3::new(face, y, sub), dir),
                    Move {
                        dest: IVec3::new(dest_face, y, dest_sub),
                        inverse_dir,
                        rotation,
                    },
                );
            }
        }
        let (up, down) = self.cell_type.layer_dirs();
        let identity = self.cell_type.identity();
        for (sub, &faces) in face_counts.iter().enumerate() {
            for face in 0..faces as i32 {
                for y in 0..layers - 1 {
                    let lower = IVec3::new(face, y, sub as i32);
                    let upper = IVec3::new(face, y + 1, sub as i32);
                    moves.insert(
                        (lower, up),
                        Move {
                            dest: upper,
                            inverse_dir: down,
                            rotation: identity,
                        },
                    );
                    moves.insert(
                        (upper, down),
                        Move {
                            dest: lower,
                            inverse_dir: up,
                            rotation: identity,
                        },
                    );
                }
            }
        }

        let mut frames = Vec::with_capacity(total);
        let mut extent = Vec3::ZERO;
        for (sub, &faces) in face_counts.iter().enumerate() {
            let mut base_frames = Vec::with_capacity(faces);
            for face in 0..faces {
                let verts = mesh.face_vertices(sub, face).unwrap_or_default();
                let normal = face_normal(&verts);
                if normal == Vec3::ZERO {
                    return Err(TileGraphError::MeshTopologyMismatch(format!(
                        "face {} of submesh {} is degenerate",
                        face, sub
                    )));
                }
                let (x, z, center) = self.cell_type.face_axes(&verts);
                base_frames.push((x, normal * surface.tile_height, z, center, normal));
            }
            for y in 0..layers {
                for &(x, up_axis, z, center, normal) in &base_frames {
                    let origin = center
                        + normal * (surface.surface_offset + (y as f32 + 0.5) * surface.tile_height);
                    extent = extent.max(x.abs() + up_axis.abs() + z.abs());
                    frames.push(Mat4::from_cols(
                        x.extend(0.0),
                        up_axis.extend(0.0),
                        z.extend(0.0),
                        origin.extend(1.0),
                    ));
                }
            }
        }

        let mut hash = SpatialHash::new(extent);
        let mut grid = MeshGrid {
            cell_type: self.cell_type,
            mesh,
            layers,
            tile_size: self.tile_size,
            face_counts,
            starts,
            index_count: total,
            moves,
            frames,
            hash: SpatialHash::new(Vec3::ONE),
            warnings,
        };
        hash.rebuild(
            (0..total).filter_map(|i| {
                let cell = grid.get_cell(i)?;
                Some((cell, grid.frames[i].w_axis.truncate()))
            }),
        );
        grid.hash = hash;
        info!(
            cells = total,
            submeshes = grid.face_counts.len(),
            layers,
            "built mesh grid"
        );
        Ok(grid)
    }

    /// Planar moves between faces sharing an edge, keyed by (face, submesh)
    ///
    /// A directed edge used by two faces stays with the first one and the
    /// second face is left open on that side.
    #[allow(clippy::type_complexity)]
    fn stitch(
        &self,
        mesh: &MeshData,
        warnings: &mut Warnings,
    ) -> AHashMap<((i32, i32), C::FaceDir), ((i32, i32), C::FaceDir, C::Rotation)> {
        let mut open: AHashMap<(IVec3, IVec3), ((i32, i32), usize)> = AHashMap::new();
        let mut moves = AHashMap::new();
        for (sub, submesh) in mesh.submeshes.iter().enumerate() {
            let n = submesh.topology.vertices_per_face();
            for face in 0..submesh.face_count() {
                let idx = submesh.face(face);
                let here = (face as i32, sub as i32);
                for e in 0..n {
                    let a = vertex_key(mesh.vertices[idx[e] as usize]);
                    let b = vertex_key(mesh.vertices[idx[(e + 1) % n] as usize]);
                    match open.remove(&(b, a)) {
                        Some((other, ie)) => {
                            let rotation = self.cell_type.edge_rotation(e, ie);
                            moves.insert(
                                (here, self.cell_type.edge_dir(e)),
                                (other, self.cell_type.edge_dir(ie), rotation),
                            );
                            moves.insert(
                                (other, self.cell_type.edge_dir(ie)),
                                (here, self.cell_type.edge_dir(e), self.cell_type.invert(rotation)),
                            );
                        }
                        None => {
                            if let Some(&((face0, sub0), _)) = open.get(&(a, b)) {
                                warnings.push(
                                    WarningKind::OverlappingMeshEdge,
                                    format!(
                                        "face {} of submesh {} repeats an edge of face {} of submesh {}; \
                                         mesh is non-manifold or inconsistently wound",
                                        here.0, here.1, face0, sub0
                                    ),
                                );
                            } else {
                                open.insert((a, b), (here, e));
                            }
                        }
                    }
                }
            }
        }
        debug!(links = moves.len() / 2, boundary_edges = open.len(), "stitched mesh");
        moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::mesh::SubMesh;
    use crate::lattice::LatticeRotation;

    fn surface(layers: u32) -> SurfaceConfig {
        SurfaceConfig {
            layers,
            ..Default::default()
        }
    }

    fn cube_grid(mesh: MeshData, layers: u32) -> MeshGrid<CubeCellType> {
        MeshGridBuilder::new(CubeCellType::new(), Vec3::ONE)
            .build(mesh, &surface(layers))
            .unwrap()
    }

    /// Two up-pointing triangles of a flat strip, sharing their slanted edge
    fn triangle_pair() -> MeshData {
        let h = SQRT3_2;
        MeshData {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.5, 0.0, h),
                Vec3::new(1.5, 0.0, h),
            ],
            submeshes: vec![SubMesh {
                topology: FaceTopology::Triangles,
                // Second face lists its Back edge along the top, winding
                // clockwise from above like the first
                indices: vec![0, 1, 2, 3, 2, 1],
            }],
        }
    }

    #[test]
    fn test_flat_plane_moves_without_rotation() {
        let g = cube_grid(MeshData::quad_plane(3, 2), 1);
        assert_eq!(g.index_count(), 6);
        let m = g.try_move(IVec3::new(0, 0, 0), CubeFaceDir::Right).unwrap();
        assert_eq!(m.dest, IVec3::new(1, 0, 0));
        assert_eq!(m.inverse_dir, CubeFaceDir::Left);
        assert_eq!(m.rotation, CubeRotation::IDENTITY);
        let m = g.try_move(IVec3::new(0, 0, 0), CubeFaceDir::Forward).unwrap();
        assert_eq!(m.dest, IVec3::new(3, 0, 0));
        assert!(g.try_move(IVec3::ZERO, CubeFaceDir::Left).is_none());
        assert!(g.try_move(IVec3::ZERO, CubeFaceDir::Up).is_none());
    }

    #[test]
    fn test_cube_surface_moves_are_reciprocal() {
        let g = cube_grid(MeshData::cube_surface(), 2);
        let ct = g.cell_type().clone();
        for cell in g.cells() {
            for dir in g.valid_face_dirs(cell) {
                let Some(m) = g.try_move(cell, dir) else {
                    continue;
                };
                let back = g.try_move(m.dest, m.inverse_dir).unwrap();
                assert_eq!(back.dest, cell);
                assert_eq!(back.inverse_dir, dir);
                assert_eq!(back.rotation, m.rotation.invert());
                // Travel direction seen from the destination leaves through
                // the face opposite the one it entered
                assert_eq!(ct.rotate(dir, m.rotation), ct.invert_dir(m.inverse_dir));
            }
        }
        // Every side of a closed surface has a neighbour
        for cell in g.cells() {
            for dir in [
                CubeFaceDir::Left,
                CubeFaceDir::Right,
                CubeFaceDir::Forward,
                CubeFaceDir::Back,
            ] {
                assert!(g.try_move(cell, dir).is_some());
            }
        }
    }

    #[test]
    fn test_layers_stack_along_normal() {
        let g = cube_grid(MeshData::quad_plane(1, 1), 3);
        assert_eq!(g.size(), IVec3::new(1, 3, 1));
        let c0 = g.cell_center(IVec3::new(0, 0, 0));
        let c1 = g.cell_center(IVec3::new(0, 1, 0));
        assert!((c1 - c0).abs_diff_eq(Vec3::Y, 1e-5));
        assert!(c0.abs_diff_eq(Vec3::new(0.5, 0.5, 0.5), 1e-5));
        let up = g.try_move(IVec3::ZERO, CubeFaceDir::Up).unwrap();
        assert_eq!(up.dest, IVec3::new(0, 1, 0));
        assert!(g.try_move(IVec3::new(0, 2, 0), CubeFaceDir::Up).is_none());
    }

    #[test]
    fn test_find_cell_on_curved_surface() {
        let g = cube_grid(MeshData::cube_surface(), 1);
        for cell in g.cells() {
            assert_eq!(g.find_cell(g.cell_center(cell)), Some(cell), "{:?}", cell);
        }
        assert_eq!(g.find_cell(Vec3::splat(50.0)), None);
    }

    #[test]
    fn test_find_cell_oriented_recovers_identity() {
        let g = cube_grid(MeshData::quad_plane(2, 2), 1);
        let cell = IVec3::new(3, 0, 0);
        let (found, rotation) = g.find_cell_oriented(Vec3::ZERO, g.trs(cell)).unwrap();
        assert_eq!(found, cell);
        assert_eq!(rotation, CubeRotation::IDENTITY);
    }

    #[test]
    fn test_index_bijection_across_submeshes() {
        let mut mesh = MeshData::quad_plane(2, 1);
        let extra = mesh.submeshes[0].clone();
        mesh.submeshes.push(extra);
        let g = cube_grid(mesh, 2);
        assert_eq!(g.index_count(), 8);
        for i in 0..g.index_count() {
            let cell = g.get_cell(i).unwrap();
            assert_eq!(g.get_index(cell), Some(i));
        }
        assert_eq!(g.submesh_cells(1).len(), 4);
    }

    #[test]
    fn test_surface_dirs_and_rotations_come_from_the_cell_type() {
        let g = cube_grid(MeshData::cube_surface(), 2);
        let ct = g.cell_type().clone();
        assert_eq!(g.valid_face_dirs(IVec3::ZERO), ct.mesh_face_dirs());
        let rotations = g.move_rotations();
        assert_eq!(rotations, ct.mesh_move_rotations());
        for cell in g.cells() {
            for dir in g.valid_face_dirs(cell) {
                if let Some(m) = g.try_move(cell, dir) {
                    assert!(rotations.contains(&m.rotation), "{:?}", m.rotation);
                }
            }
        }
    }

    #[test]
    fn test_repeated_edges_are_reported() {
        let mut mesh = MeshData::quad_plane(1, 1);
        let extra = mesh.submeshes[0].clone();
        mesh.submeshes.push(extra);
        let g = cube_grid(mesh, 1);
        assert_eq!(g.warnings().len(), 4);
        assert!(g
            .warnings()
            .iter()
            .all(|w| w.kind == WarningKind::OverlappingMeshEdge));
        // The duplicate face keeps no neighbours across the shared edges
        for dir in [CubeFaceDir::Left, CubeFaceDir::Right, CubeFaceDir::Forward, CubeFaceDir::Back] {
            assert!(g.try_move(IVec3::new(0, 0, 1), dir).is_none());
        }

        let clean = cube_grid(MeshData::quad_plane(2, 2), 1);
        assert!(clean.warnings().is_empty());
    }

    #[test]
    fn test_topology_mismatch_is_rejected() {
        let err = MeshGridBuilder::new(TrianglePrismCellType::new(), Vec3::ONE)
            .build(MeshData::quad_plane(1, 1), &surface(1))
            .unwrap_err();
        assert!(matches!(err, TileGraphError::MeshTopologyMismatch(_)));
    }

    #[test]
    fn test_triangle_neighbours_rotate_by_odd_turns() {
        let g = MeshGridBuilder::new(TrianglePrismCellType::new(), Vec3::ONE)
            .build(triangle_pair(), &surface(1))
            .unwrap();
        let ct = g.cell_type().clone();
        let m = g
            .try_move(IVec3::ZERO, TrianglePrismFaceDir::ForwardRight)
            .unwrap();
        assert_eq!(m.dest, IVec3::new(1, 0, 0));
        assert_eq!(m.inverse_dir, TrianglePrismFaceDir::ForwardRight);
        assert_eq!(m.rotation, TriangleRotation::rotation(3));
        assert_eq!(
            ct.rotate(TrianglePrismFaceDir::ForwardRight, m.rotation),
            ct.invert_dir(m.inverse_dir)
        );
        for cell in g.cells() {
            assert_eq!(g.find_cell(g.cell_center(cell)), Some(cell));
        }
    }
}
