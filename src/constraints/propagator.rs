//! Boundary to the external constraint solver

use ahash::AHashMap;
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use super::mirror::SymmetryMap;
use crate::grid::Topology;
use crate::lattice::{FaceDirection, LatticeRotation};
use crate::model::ModelTile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Resolution {
    Decided,
    Undecided,
    Contradiction,
}

/// Final state of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellValue<R> {
    Undecided,
    Decided(ModelTile<R>),
    Contradiction,
}

/// The operations this crate needs from a solver
///
/// Indices are topology indices. Callers never select on indices the
/// topology's mask excludes.
pub trait Propagator<D, R> {
    type TileSet;

    fn topology(&self) -> &Topology<D, R>;

    fn create_tile_set(&self, tiles: &[ModelTile<R>]) -> Self::TileSet;

    /// Restrict a cell to a single state
    fn select(&mut self, index: usize, tile: ModelTile<R>) -> Resolution;

    /// Restrict a cell to a set of states
    fn select_set(&mut self, index: usize, set: &Self::TileSet) -> Resolution;

    /// Require `values()[j] == tiles[values()[i]]` for every `j = indices[i]`
    fn add_symmetry(&mut self, _symmetry: &SymmetryMap<R>) {}

    fn run(&mut self) -> Resolution;

    fn backtrack_count(&self) -> usize;

    fn values(&self) -> Vec<CellValue<R>>;
}

/// One recorded `select` or `select_set` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectCall<R> {
    pub index: usize,
    pub tiles: Vec<ModelTile<R>>,
}

/// Reference propagator that records every call
///
/// It keeps a domain per cell and intersects it on each select, but does no
/// arc consistency. `run` fills each open cell by a frequency-weighted draw
/// from its domain and then checks any symmetry it was given.
#[derive(Debug, Clone)]
pub struct RecordingPropagator<D, R> {
    topology: Topology<D, R>,
    tiles: Vec<(ModelTile<R>, f32)>,
    /// `None` means every tile is still allowed
    domains: Vec<Option<Vec<ModelTile<R>>>>,
    values: Vec<CellValue<R>>,
    symmetries: Vec<SymmetryMap<R>>,
    rng: ChaCha8Rng,
    pub selects: Vec<SelectCall<R>>,
    status: Resolution,
}

impl<D: FaceDirection, R: LatticeRotation> RecordingPropagator<D, R> {
    pub fn new(topology: Topology<D, R>, tiles: &[(ModelTile<R>, f32)], seed: u64) -> Self {
        let n = topology.index_count();
        Self {
            topology,
            tiles: tiles.to_vec(),
            domains: vec![None; n],
            values: vec![CellValue::Undecided; n],
            symmetries: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            selects: Vec::new(),
            status: Resolution::Undecided,
        }
    }

    /// Current allowed states of a cell
    pub fn domain(&self, index: usize) -> Vec<ModelTile<R>> {
        match self.domains.get(index) {
            Some(Some(d)) => d.clone(),
            Some(None) => self.tiles.iter().map(|&(t, _)| t).collect(),
            None => Vec::new(),
        }
    }

    /// Indices touched by at least one select
    pub fn selected_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self.selects.iter().map(|s| s.index).collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    fn restrict(&mut self, index: usize, allowed: &[ModelTile<R>]) -> Resolution {
        self.selects.push(SelectCall {
            index,
            tiles: allowed.to_vec(),
        });
        if !self.topology.contains_index(index) {
            return self.status;
        }
        let current = self.domain(index);
        let narrowed: Vec<_> = current.into_iter().filter(|t| allowed.contains(t)).collect();
        if narrowed.is_empty() {
            self.values[index] = CellValue::Contradiction;
            self.status = Resolution::Contradiction;
        }
        self.domains[index] = Some(narrowed);
        self.status
    }

    fn draw(&mut self, index: usize) -> Option<ModelTile<R>> {
        let domain = self.domain(index);
        let weights: Vec<f32> = domain
            .iter()
            .map(|t| {
                self.tiles
                    .iter()
                    .find(|(x, _)| x == t)
                    .map_or(0.0, |&(_, f)| f.max(0.0))
            })
            .collect();
        match WeightedIndex::new(&weights) {
            Ok(dist) => domain.get(dist.sample(&mut self.rng)).copied(),
            // All weights zero: fall back to the first allowed state
            Err(_) => domain.first().copied(),
        }
    }

    fn check_symmetries(&mut self) {
        for symmetry in &self.symmetries {
            for (i, mapped) in symmetry.indices.iter().enumerate() {
                let Some(j) = *mapped else {
                    continue;
                };
                let CellValue::Decided(a) = self.values[i] else {
                    continue;
                };
                let expected = symmetry.tiles.get(&a).copied();
                match (expected, self.values[j]) {
                    (Some(e), CellValue::Decided(b)) if e == b => {}
                    (Some(e), CellValue::Decided(_)) if j > i => {
                        // Later cells follow earlier ones when their domain allows
                        let allowed = self.domain(j).contains(&e);
                        self.values[j] = if allowed {
                            CellValue::Decided(e)
                        } else {
                            CellValue::Contradiction
                        };
                    }
                    _ => self.values[j] = CellValue::Contradiction,
                }
            }
        }
    }
}

impl<D: FaceDirection, R: LatticeRotation> Propagator<D, R> for RecordingPropagator<D, R> {
    type TileSet = Vec<ModelTile<R>>;

    fn topology(&self) -> &Topology<D, R> {
        &self.topology
    }

    fn create_tile_set(&self, tiles: &[ModelTile<R>]) -> Self::TileSet {
        tiles.to_vec()
    }

    fn select(&mut self, index: usize, tile: ModelTile<R>) -> Resolution {
        self.restrict(index, &[tile])
    }

    fn select_set(&mut self, index: usize, set: &Self::TileSet) -> Resolution {
        self.restrict(index, set)
    }

    fn add_symmetry(&mut self, symmetry: &SymmetryMap<R>) {
        self.symmetries.push(symmetry.clone());
    }

    fn run(&mut self) -> Resolution {
        if self.status == Resolution::Contradiction {
            return self.status;
        }
        for index in 0..self.topology.index_count() {
            if !self.topology.contains_index(index) {
                continue;
            }
            self.values[index] = match self.draw(index) {
                Some(t) => CellValue::Decided(t),
                None => CellValue::Contradiction,
            };
        }
        self.check_symmetries();
        self.status = if self
            .values
            .iter()
            .any(|v| matches!(v, CellValue::Contradiction))
        {
            Resolution::Contradiction
        } else {
            Resolution::Decided
        };
        self.status
    }

    fn backtrack_count(&self) -> usize {
        0
    }

    fn values(&self) -> Vec<CellValue<R>> {
        self.values.clone()
    }
}

/// Counts `select` calls per index, for diagnostics
pub fn select_histogram<R>(selects: &[SelectCall<R>]) -> AHashMap<usize, usize> {
    let mut counts = AHashMap::new();
    for s in selects {
        *counts.entry(s.index).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SquareGrid;
    use crate::lattice::SquareRotation;
    use crate::model::TileId;
    use glam::{IVec3, Vec3};

    fn tiles() -> Vec<(ModelTile<SquareRotation>, f32)> {
        (0..3)
            .map(|i| (ModelTile::new(TileId(i), SquareRotation::IDENTITY, IVec3::ZERO), 1.0))
            .collect()
    }

    fn topology() -> Topology<crate::lattice::SquareFaceDir, SquareRotation> {
        Topology::from_grid(&SquareGrid::new(Vec3::ZERO, IVec3::new(2, 2, 1), Vec3::ONE))
    }

    #[test]
    fn test_select_narrows_domain() {
        let t = tiles();
        let mut p = RecordingPropagator::new(topology(), &t, 1);
        let set = p.create_tile_set(&[t[0].0, t[1].0]);
        assert_eq!(p.select_set(0, &set), Resolution::Undecided);
        assert_eq!(p.domain(0).len(), 2);
        assert_eq!(p.select(0, t[1].0), Resolution::Undecided);
        assert_eq!(p.domain(0), vec![t[1].0]);
        assert_eq!(p.run(), Resolution::Decided);
        assert_eq!(p.values()[0], CellValue::Decided(t[1].0));
        assert_eq!(p.selected_indices(), vec![0]);
    }

    #[test]
    fn test_empty_intersection_is_contradiction() {
        let t = tiles();
        let mut p = RecordingPropagator::new(topology(), &t, 1);
        p.select(2, t[0].0);
        assert_eq!(p.select(2, t[1].0), Resolution::Contradiction);
        assert_eq!(p.run(), Resolution::Contradiction);
        assert_eq!(p.values()[2], CellValue::Contradiction);
    }

    #[test]
    fn test_masked_cells_stay_undecided() {
        let t = tiles();
        let mask = vec![true, false, true, true];
        let mut p = RecordingPropagator::new(topology().with_mask(mask), &t, 7);
        assert_eq!(p.run(), Resolution::Decided);
        assert_eq!(p.values()[1], CellValue::Undecided);
        assert!(matches!(p.values()[0], CellValue::Decided(_)));
    }

    #[test]
    fn test_same_seed_same_values() {
        let t = tiles();
        let mut a = RecordingPropagator::new(topology(), &t, 42);
        let mut b = RecordingPropagator::new(topology(), &t, 42);
        a.run();
        b.run();
        assert_eq!(a.values(), b.values());
        assert_eq!(select_histogram(&a.selects).len(), 0);
    }
}
