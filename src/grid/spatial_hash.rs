//! Sparse spatial hash of cell centers, for grids without arithmetic lookup

use ahash::AHashMap;
use glam::{IVec3, Vec3};

use crate::core::types::Bounds;

/// Buckets cells by the floor of their center divided by `cell_size`
#[derive(Debug, Clone)]
pub struct SpatialHash {
    cell_size: Vec3,
    buckets: AHashMap<IVec3, Vec<IVec3>>,
    /// Inclusive range of occupied buckets
    extent: Option<(IVec3, IVec3)>,
}

impl SpatialHash {
    pub fn new(cell_size: Vec3) -> Self {
        Self {
            cell_size: cell_size.max(Vec3::splat(f32::EPSILON)),
            buckets: AHashMap::new(),
            extent: None,
        }
    }

    #[inline]
    fn bucket(&self, pos: Vec3) -> IVec3 {
        (pos / self.cell_size).floor().as_ivec3()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.extent = None;
    }

    pub fn insert(&mut self, cell: IVec3, center: Vec3) {
        let key = self.bucket(center);
        self.buckets.entry(key).or_default().push(cell);
        self.extent = Some(match self.extent {
            Some((lo, hi)) => (lo.min(key), hi.max(key)),
            None => (key, key),
        });
    }

    /// Cells whose bucket lies within one bucket of `bounds`
    pub fn query(&self, bounds: &Bounds) -> Vec<IVec3> {
        let Some((lo, hi)) = self.extent else {
            return Vec::new();
        };
        let min = (self.bucket(bounds.min) - IVec3::ONE).max(lo);
        let max = (self.bucket(bounds.max) + IVec3::ONE).min(hi);
        let mut out = Vec::new();
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                for z in min.z..=max.z {
                    if let Some(cells) = self.buckets.get(&IVec3::new(x, y, z)) {
                        out.extend_from_slice(cells);
                    }
                }
            }
        }
        out
    }

    /// Cells in the 3x3x3 bucket neighborhood of a point
    pub fn query_neighbors(&self, pos: Vec3) -> Vec<IVec3> {
        self.query(&Bounds::new(pos, pos))
    }

    /// Rebuild from cell centers
    pub fn rebuild(&mut self, cells: impl Iterator<Item = (IVec3, Vec3)>) {
        self.clear();
        for (cell, center) in cells {
            self.insert(cell, center);
        }
    }
}
