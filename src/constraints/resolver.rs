//! Turns initial constraints into propagator calls
//!
//! The mask has to be final before the propagator exists, so `get_mask` is a
//! separate pass over the same constraint list. `ConstraintResolver` then
//! issues the `select` calls against the masked topology.

use ahash::AHashSet;
use glam::IVec3;
use tracing::{debug, info};

use super::propagator::{Propagator, Resolution};
use super::{FaceConstraint, InitialConstraint, PinConstraint, VolumeFilter, VolumeType};
use crate::core::error::{Result, TileGraphError, WarningKind, Warnings};
use crate::grid::{FaceDirOf, Grid, RotationOf, Topology};
use crate::lattice::{CellType, FaceDetails};
use crate::model::{ModelTile, Palette, Tile, TileId, TileModelInfo};

type Constraint<G> = InitialConstraint<FaceDirOf<G>, RotationOf<G>>;

/// Solver mask after removing masked-out volumes, face-constraint interiors
/// and, with `include_pins`, pinned cells
pub fn get_mask<G: Grid>(
    grid: &G,
    topology: &Topology<FaceDirOf<G>, RotationOf<G>>,
    info: &TileModelInfo<G::Cell>,
    constraints: &[Constraint<G>],
    include_pins: bool,
) -> Vec<bool> {
    let mut mask = topology
        .mask()
        .map(<[bool]>::to_vec)
        .unwrap_or_else(|| vec![true; topology.index_count()]);
    let mut clear = |cell: IVec3| {
        if let Some(i) = grid.get_index(cell) {
            mask[i] = false;
        }
    };

    for constraint in constraints {
        match constraint {
            InitialConstraint::Face(face) => {
                for &offset in &face.offsets {
                    if let Some((cell, _)) =
                        grid.try_move_by_offset(face.cell, IVec3::ZERO, offset, face.rotation)
                    {
                        clear(cell);
                    }
                }
            }
            InitialConstraint::Pin(pin) if include_pins => {
                let Some(tile) = info.tile_id(&pin.tile).and_then(|id| info.tile(id)) else {
                    continue;
                };
                for offset in tile.sorted_offsets() {
                    if let Some((cell, _)) =
                        grid.try_move_by_offset(pin.cell, IVec3::ZERO, offset, pin.rotation)
                    {
                        clear(cell);
                    }
                }
            }
            InitialConstraint::Pin(_) => {}
            InitialConstraint::Volume(volume) if volume.volume_type == VolumeType::MaskOut => {
                for &cell in &volume.cells {
                    clear(cell);
                }
            }
            InitialConstraint::Volume(_) => {}
        }
    }
    mask
}

/// Applies constraints to one propagator
///
/// Create one per propagator: the face dedup set is part of the solver
/// state it is priming.
pub struct ConstraintResolver<'a, G: Grid> {
    grid: &'a G,
    info: &'a TileModelInfo<G::Cell>,
    palette: &'a Palette,
    constrained: AHashSet<(IVec3, FaceDirOf<G>)>,
    selects: usize,
    pub warnings: Warnings,
}

impl<'a, G: Grid> ConstraintResolver<'a, G> {
    pub fn new(grid: &'a G, info: &'a TileModelInfo<G::Cell>, palette: &'a Palette) -> Self {
        Self {
            grid,
            info,
            palette,
            constrained: AHashSet::new(),
            selects: 0,
            warnings: Warnings::new(),
        }
    }

    /// Number of select calls issued so far
    pub fn select_count(&self) -> usize {
        self.selects
    }

    pub fn apply_all<P>(&mut self, propagator: &mut P, constraints: &[Constraint<G>]) -> Result<()>
    where
        P: Propagator<FaceDirOf<G>, RotationOf<G>>,
    {
        for constraint in constraints {
            self.apply(propagator, constraint)?;
        }
        info!(
            constraints = constraints.len(),
            selects = self.selects,
            "applied initial constraints"
        );
        Ok(())
    }

    pub fn apply<P>(&mut self, propagator: &mut P, constraint: &Constraint<G>) -> Result<()>
    where
        P: Propagator<FaceDirOf<G>, RotationOf<G>>,
    {
        match constraint {
            InitialConstraint::Face(face) => {
                self.apply_face(propagator, face);
                Ok(())
            }
            InitialConstraint::Pin(pin) => self.apply_pin(propagator, pin),
            InitialConstraint::Volume(volume) => self.apply_volume(propagator, volume),
        }
    }

    fn apply_face<P>(&mut self, propagator: &mut P, face: &FaceConstraint<FaceDirOf<G>, RotationOf<G>>)
    where
        P: Propagator<FaceDirOf<G>, RotationOf<G>>,
    {
        let grid = self.grid;
        let ct = grid.cell_type();
        for (offset, dir, details) in &face.faces {
            let Some((cell, rotation)) =
                grid.try_move_by_offset(face.cell, IVec3::ZERO, *offset, face.rotation)
            else {
                continue;
            };
            let (grid_dir, grid_details) = ct.rotate_by(*dir, details, rotation);
            let Some(m) = grid.try_move(cell, grid_dir) else {
                continue;
            };
            let (_, arrived) = ct.rotate_by(grid_dir, &grid_details, m.rotation);
            self.face_constrain(propagator, m.dest, m.inverse_dir, &arrived);
        }
    }

    /// Restricts `cell` to states whose face `dir` may touch `details`.
    /// Each (cell, face) is constrained at most once.
    pub fn face_constrain<P>(
        &mut self,
        propagator: &mut P,
        cell: IVec3,
        dir: FaceDirOf<G>,
        details: &FaceDetails,
    ) -> Option<Resolution>
    where
        P: Propagator<FaceDirOf<G>, RotationOf<G>>,
    {
        if !self.grid.in_bounds(cell) {
            return None;
        }
        let index = propagator.topology().get_index(cell)?;
        if !propagator.topology().contains_index(index) || !self.constrained.insert((cell, dir)) {
            return None;
        }
        let matching: Vec<_> = self
            .info
            .tiles_by_direction(dir)
            .iter()
            .filter(|(fd, _)| self.palette.matches(details, fd))
            .map(|&(_, mt)| mt)
            .collect();
        let set = propagator.create_tile_set(&matching);
        self.selects += 1;
        Some(propagator.select_set(index, &set))
    }

    fn apply_pin<P>(&mut self, propagator: &mut P, pin: &PinConstraint<RotationOf<G>>) -> Result<()>
    where
        P: Propagator<FaceDirOf<G>, RotationOf<G>>,
    {
        let missing = || TileGraphError::PinTileMissing {
            pin: pin.name.clone(),
            tile: pin.tile.clone(),
        };
        let id = self.info.tile_id(&pin.tile).ok_or_else(missing)?;
        if !self.info.includes(id) {
            return Err(missing());
        }
        let tile = self.info.tile(id).ok_or_else(missing)?;
        let offsets = tile.sorted_offsets();
        let first = offsets.first().copied().unwrap_or(IVec3::ZERO);
        if self
            .info
            .canonicalize(&ModelTile::new(id, pin.rotation, first))
            .is_none()
        {
            return Err(TileGraphError::PinRotationUnsupported {
                pin: pin.name.clone(),
            });
        }

        for offset in offsets {
            let Some((cell, rotation)) =
                self.grid
                    .try_move_by_offset(pin.cell, IVec3::ZERO, offset, pin.rotation)
            else {
                continue;
            };
            if !self.grid.in_bounds(cell) {
                continue;
            }
            let canonical = self
                .info
                .canonicalize(&ModelTile::new(id, rotation, offset))
                .ok_or_else(|| TileGraphError::PinRotationUnsupported {
                    pin: pin.name.clone(),
                })?;
            let Some(index) = propagator.topology().get_index(cell) else {
                continue;
            };
            if propagator.topology().contains_index(index) {
                propagator.select(index, canonical);
                self.selects += 1;
                // The remaining offsets follow from internal adjacency
                break;
            }
        }
        Ok(())
    }

    fn apply_volume<P>(&mut self, propagator: &mut P, volume: &VolumeFilter) -> Result<()>
    where
        P: Propagator<FaceDirOf<G>, RotationOf<G>>,
    {
        if volume.volume_type != VolumeType::TilesetFilter {
            return Ok(());
        }
        let ids = volume
            .tiles
            .iter()
            .map(|name| {
                self.info
                    .tile_id(name)
                    .ok_or_else(|| TileGraphError::UnknownTile(name.clone()))
            })
            .collect::<Result<AHashSet<TileId>>>()?;
        let tiles: Vec<_> = self
            .info
            .all_tiles()
            .iter()
            .filter(|(mt, _)| ids.contains(&mt.tile))
            .map(|&(mt, _)| mt)
            .collect();
        if tiles.is_empty() {
            self.warnings.push(
                WarningKind::SkippedConstraint,
                format!("{} allows no tiles, every cell it covers will contradict", volume.name),
            );
        }
        let set = propagator.create_tile_set(&tiles);
        for &cell in &volume.cells {
            let Some(index) = propagator.topology().get_index(cell) else {
                continue;
            };
            if propagator.topology().contains_index(index) {
                propagator.select_set(index, &set);
                self.selects += 1;
            }
        }
        Ok(())
    }

    /// Constrains every face on the outside of the grid by the skybox tile's
    /// paint on the face looking back in
    pub fn apply_skybox<P>(&mut self, propagator: &mut P, skybox: &Tile<FaceDirOf<G>>)
    where
        P: Propagator<FaceDirOf<G>, RotationOf<G>>,
    {
        let grid = self.grid;
        let ct = grid.cell_type();
        let anchor = skybox.sorted_offsets().first().copied().unwrap_or(IVec3::ZERO);
        let before = self.selects;
        for cell in grid.cells() {
            for dir in grid.valid_face_dirs(cell) {
                let outside = grid
                    .try_move(cell, dir)
                    .map_or(true, |m| !grid.in_bounds(m.dest));
                if outside {
                    let paint = skybox.paint_of(ct, anchor, ct.invert_dir(dir));
                    self.face_constrain(propagator, cell, dir, &paint);
                }
            }
        }
        debug!(selects = self.selects - before, tile = %skybox.name, "skybox");
    }
}
