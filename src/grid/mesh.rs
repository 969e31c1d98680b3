//! Grids wrapped around the faces of a mesh
//!
//! Each face of the surface mesh becomes a column of cells stacked along
//! the face normal. Cells are addressed as `(face, layer, submesh)`.
//! Neighbouring faces need not share an orientation, so moves across a mesh
//! edge report the rotation between the two faces' frames.

use ahash::AHashMap;
use glam::{IVec3, Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::mesh_builder::MeshCellType;
use super::spatial_hash::SpatialHash;
use super::{FaceDirOf, Grid, GridSymmetry, Move, RotationOf};
use crate::core::error::Warnings;
use crate::core::types::{Bounds, RotationGroupType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceTopology {
    Quads,
    Triangles,
}

impl FaceTopology {
    pub fn vertices_per_face(self) -> usize {
        match self {
            FaceTopology::Quads => 4,
            FaceTopology::Triangles => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubMesh {
    pub topology: FaceTopology,
    pub indices: Vec<u32>,
}

impl SubMesh {
    pub fn face_count(&self) -> usize {
        self.indices.len() / self.topology.vertices_per_face()
    }

    pub fn face(&self, face: usize) -> &[u32] {
        let n = self.topology.vertices_per_face();
        &self.indices[face * n..(face + 1) * n]
    }
}

/// Vertex positions plus faces grouped into submeshes
///
/// Faces wind clockwise when seen from the side their normal points to.
/// Quads start at their (-x, -z) corner, triangles at the left end of their
/// Back edge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,
    pub submeshes: Vec<SubMesh>,
}

impl MeshData {
    pub fn face_vertices(&self, submesh: usize, face: usize) -> Option<Vec<Vec3>> {
        let sub = self.submeshes.get(submesh)?;
        if face >= sub.face_count() {
            return None;
        }
        sub.face(face)
            .iter()
            .map(|&i| self.vertices.get(i as usize).copied())
            .collect()
    }

    /// A flat `nx` by `nz` sheet of unit quads facing +y
    pub fn quad_plane(nx: u32, nz: u32) -> Self {
        let mut vertices = Vec::new();
        for z in 0..=nz {
            for x in 0..=nx {
                vertices.push(Vec3::new(x as f32, 0.0, z as f32));
            }
        }
        let stride = nx + 1;
        let mut indices = Vec::new();
        for z in 0..nz {
            for x in 0..nx {
                let i = z * stride + x;
                indices.extend([i, i + 1, i + 1 + stride, i + stride]);
            }
        }
        Self {
            vertices,
            submeshes: vec![SubMesh {
                topology: FaceTopology::Quads,
                indices,
            }],
        }
    }

    /// The six outward-facing quads of a unit cube centered on the origin
    pub fn cube_surface() -> Self {
        // (normal, u, w) with u x normal = w, so each face is a proper
        // rotation of the +y face
        let frames = [
            (Vec3::Y, Vec3::X, Vec3::Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::X, Vec3::Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::NEG_Y),
            (Vec3::Z, Vec3::X, Vec3::NEG_Y),
            (Vec3::NEG_Z, Vec3::X, Vec3::Y),
        ];
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for (n, u, w) in frames {
            for (su, sw) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                indices.push(vertices.len() as u32);
                vertices.push((n + u * su + w * sw) * 0.5);
            }
        }
        Self {
            vertices,
            submeshes: vec![SubMesh {
                topology: FaceTopology::Quads,
                indices,
            }],
        }
    }
}

/// Unit normal of a face wound clockwise about it
pub fn face_normal(verts: &[Vec3]) -> Vec3 {
    let center = verts.iter().copied().sum::<Vec3>() / verts.len().max(1) as f32;
    let mut sum = Vec3::ZERO;
    for i in 0..verts.len() {
        let a = verts[i] - center;
        let b = verts[(i + 1) % verts.len()] - center;
        sum += b.cross(a);
    }
    sum.normalize_or_zero()
}

#[derive(Debug, Clone)]
pub struct MeshGrid<C: MeshCellType> {
    pub(crate) cell_type: C,
    pub(crate) mesh: MeshData,
    pub(crate) layers: i32,
    pub(crate) tile_size: Vec3,
    pub(crate) face_counts: Vec<usize>,
    /// First index of each submesh
    pub(crate) starts: Vec<usize>,
    pub(crate) index_count: usize,
    pub(crate) moves: AHashMap<(IVec3, C::FaceDir), Move<C::FaceDir, C::Rotation>>,
    /// Unit cell to world, per index
    pub(crate) frames: Vec<Mat4>,
    pub(crate) hash: SpatialHash,
    /// Problems found while stitching the surface
    pub(crate) warnings: Warnings,
}

impl<C: MeshCellType> MeshGrid<C> {
    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn layers(&self) -> i32 {
        self.layers
    }

    pub fn submesh_count(&self) -> usize {
        self.face_counts.len()
    }

    /// Cells belonging to one submesh, across all layers
    pub fn submesh_cells(&self, submesh: usize) -> Vec<IVec3> {
        let Some(&faces) = self.face_counts.get(submesh) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(faces * self.layers as usize);
        for y in 0..self.layers {
            for x in 0..faces {
                out.push(IVec3::new(x as i32, y, submesh as i32));
            }
        }
        out
    }

    fn frame(&self, cell: IVec3) -> Option<Mat4> {
        self.get_index(cell).map(|i| self.frames[i])
    }

    fn tile_scale(&self) -> Mat4 {
        Mat4::from_scale(self.tile_size.recip())
    }
}

impl<C: MeshCellType> Grid for MeshGrid<C> {
    type Cell = C;

    fn cell_type(&self) -> &C {
        &self.cell_type
    }

    fn size(&self) -> IVec3 {
        let max_faces = self.face_counts.iter().copied().max().unwrap_or(0);
        IVec3::new(max_faces as i32, self.layers, self.face_counts.len() as i32)
    }

    fn index_count(&self) -> usize {
        self.index_count
    }

    fn get_index(&self, cell: IVec3) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        let sub = cell.z as usize;
        Some(self.starts[sub] + cell.y as usize * self.face_counts[sub] + cell.x as usize)
    }

    fn get_cell(&self, index: usize) -> Option<IVec3> {
        if index >= self.index_count {
            return None;
        }
        let sub = self.starts.partition_point(|&s| s <= index) - 1;
        let local = index - self.starts[sub];
        let faces = self.face_counts[sub];
        Some(IVec3::new(
            (local % faces) as i32,
            (local / faces) as i32,
            sub as i32,
        ))
    }

    fn in_bounds(&self, cell: IVec3) -> bool {
        if cell.z < 0 || cell.y < 0 || cell.x < 0 || cell.y >= self.layers {
            return false;
        }
        self.face_counts
            .get(cell.z as usize)
            .is_some_and(|&faces| (cell.x as usize) < faces)
    }

    fn try_move(
        &self,
        cell: IVec3,
        dir: FaceDirOf<Self>,
    ) -> Option<Move<FaceDirOf<Self>, RotationOf<Self>>> {
        self.moves.get(&(cell, dir)).copied()
    }

    fn valid_face_dirs(&self, _cell: IVec3) -> Vec<FaceDirOf<Self>> {
        self.cell_type.mesh_face_dirs()
    }

    fn move_rotations(&self) -> Vec<RotationOf<Self>> {
        self.cell_type.mesh_move_rotations()
    }

    fn cell_center(&self, cell: IVec3) -> Vec3 {
        self.frame(cell)
            .map(|m| m.w_axis.truncate())
            .unwrap_or(Vec3::ZERO)
    }

    /// Maps tile space (in tile units) onto the cell's stretched prism
    fn trs(&self, cell: IVec3) -> Mat4 {
        self.frame(cell).unwrap_or(Mat4::ZERO) * self.tile_scale()
    }

    fn find_cell(&self, position: Vec3) -> Option<IVec3> {
        self.hash.query_neighbors(position).into_iter().find(|&c| {
            let local = self.trs(c).inverse().transform_point3(position);
            self.cell_type.locate(local, self.tile_size) == IVec3::ZERO
        })
    }

    fn find_cell_oriented(
        &self,
        tile_center: Vec3,
        tile_to_grid: Mat4,
    ) -> Option<(IVec3, RotationOf<Self>)> {
        let p = tile_to_grid.transform_point3(tile_center);
        self.hash.query_neighbors(p).into_iter().find_map(|c| {
            let local = self.trs(c).inverse() * tile_to_grid;
            if self.cell_type.locate(local.transform_point3(tile_center), self.tile_size)
                != IVec3::ZERO
            {
                return None;
            }
            let rotation = self.cell_type.rotation_from_matrix(Mat3::from_mat4(local))?;
            Some((c, rotation))
        })
    }

    fn cells_intersecting_approx(&self, bounds: &Bounds, _use_bounds: bool) -> Vec<IVec3> {
        self.hash.query(bounds)
    }

    fn bounds_symmetries(
        &self,
        _rotatable: bool,
        _reflectable: bool,
        _group: RotationGroupType,
    ) -> Vec<(GridSymmetry<RotationOf<Self>>, IVec3)> {
        vec![(
            GridSymmetry {
                rotation: self.cell_type.identity(),
                translation: IVec3::ZERO,
            },
            self.size(),
        )]
    }

    fn try_apply_symmetry(
        &self,
        _symmetry: &GridSymmetry<RotationOf<Self>>,
        cell: IVec3,
    ) -> Option<(IVec3, RotationOf<Self>)> {
        Some((cell, self.cell_type.identity()))
    }
}
