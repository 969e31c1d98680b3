//! Adjacency lists handed to the propagator
//!
//! Regular grids whose moves never change frame get one list per face
//! direction. Triangle and mesh grids get an edge-labelled list instead, with
//! one label per (direction, frame change) pair of the grid's topology.

use serde::Serialize;
use tracing::debug;

use super::palette::Palette;
use super::tile::ModelTile;
use super::tile_model_info::TileModelInfo;
use crate::core::types::LatticeKind;
use crate::grid::{EdgeLabels, Grid};
use crate::lattice::CellType;

/// `dest` may sit one step from `src` in direction `dir`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DirectionalAdjacency<D, R> {
    pub dir: D,
    pub src: ModelTile<R>,
    pub dest: ModelTile<R>,
}

/// `dest` may sit across an edge carrying `label` from `src`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GraphAdjacency<R> {
    pub label: usize,
    pub src: ModelTile<R>,
    pub dest: ModelTile<R>,
}

#[derive(Debug, Clone)]
pub enum AdjacencyModel<D, R> {
    Directional(Vec<DirectionalAdjacency<D, R>>),
    Graph {
        label_count: usize,
        adjacencies: Vec<GraphAdjacency<R>>,
    },
}

impl<D, R> AdjacencyModel<D, R> {
    pub fn len(&self) -> usize {
        match self {
            AdjacencyModel::Directional(a) => a.len(),
            AdjacencyModel::Graph { adjacencies, .. } => adjacencies.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Picks the adjacency form the grid needs
pub fn build_adjacency_model<G>(
    info: &TileModelInfo<G::Cell>,
    grid: &G,
    palette: &Palette,
) -> AdjacencyModel<<G::Cell as CellType>::FaceDir, <G::Cell as CellType>::Rotation>
where
    G: Grid,
{
    let rotations = grid.move_rotations();
    if rotations.len() > 1 || grid.cell_type().kind() == LatticeKind::TrianglePrism {
        let labels = EdgeLabels::new(grid.cell_type(), &rotations);
        AdjacencyModel::Graph {
            label_count: labels.len(),
            adjacencies: graph_adjacencies(info, &labels, palette),
        }
    } else {
        AdjacencyModel::Directional(directional_adjacencies(info, palette))
    }
}

pub fn directional_adjacencies<C: CellType>(
    info: &TileModelInfo<C>,
    palette: &Palette,
) -> Vec<DirectionalAdjacency<C::FaceDir, C::Rotation>> {
    let mut out: Vec<_> = info
        .internal_adjacencies()
        .iter()
        .map(|ia| DirectionalAdjacency {
            dir: ia.grid_dir,
            src: ia.src,
            dest: ia.dest,
        })
        .collect();
    let internal = out.len();

    for (a, b) in info.cell_type().face_dir_pairs() {
        for (fd1, t1) in info.tiles_by_direction(a) {
            for (fd2, t2) in info.tiles_by_direction(b) {
                if palette.matches(fd1, fd2) {
                    out.push(DirectionalAdjacency {
                        dir: a,
                        src: *t1,
                        dest: *t2,
                    });
                }
            }
        }
    }
    debug!(internal, external = out.len() - internal, "directional adjacencies");
    out
}

pub fn graph_adjacencies<C: CellType>(
    info: &TileModelInfo<C>,
    labels: &EdgeLabels<C::FaceDir, C::Rotation>,
    palette: &Palette,
) -> Vec<GraphAdjacency<C::Rotation>> {
    let ct = info.cell_type();
    let mut out = Vec::new();

    for ia in info.internal_adjacencies() {
        for (label, edge) in labels.iter() {
            if edge.dir != ia.grid_dir {
                continue;
            }
            // Seen from the far cell the tile is turned by the edge rotation
            let moved = ModelTile::new(
                ia.dest.tile,
                ct.multiply(edge.rotation, ia.dest.rotation),
                ia.dest.offset,
            );
            if let Some(dest) = info.canonicalize(&moved) {
                out.push(GraphAdjacency {
                    label,
                    src: ia.src,
                    dest,
                });
            }
        }
    }
    let internal = out.len();

    for (label, edge) in labels.iter() {
        let arrival = ct.invert_dir(ct.rotate(edge.dir, edge.rotation));
        for (fd1, t1) in info.tiles_by_direction(edge.dir) {
            for (fd2, t2) in info.tiles_by_direction(arrival) {
                if palette.matches(fd1, fd2) {
                    out.push(GraphAdjacency {
                        label,
                        src: *t1,
                        dest: *t2,
                    });
                }
            }
        }
    }
    debug!(internal, external = out.len() - internal, labels = labels.len(), "graph adjacencies");
    out
}
