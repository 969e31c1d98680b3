//! Scene descriptors to initial constraints
//!
//! A scene is a flat list of placed tiles, pins and volumes, all positioned
//! in the grid's local space.

use ahash::AHashSet;
use glam::{EulerRot, IVec3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{FaceConstraint, InitialConstraint, PinConstraint, PinType, VolumeFilter, VolumeType};
use crate::core::config::SurfaceConfig;
use crate::core::error::{Result, TileGraphError, WarningKind, Warnings};
use crate::core::types::Bounds;
use crate::grid::{FaceDirOf, Grid, RotationOf};
use crate::model::{Tile, TileModelInfo};

/// Position, rotation (Euler degrees, XYZ order) and scale of a scene object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Placement {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn rotated(mut self, degrees: Vec3) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        let r = self.rotation * std::f32::consts::PI / 180.0;
        let rotation = Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z);
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum VolumeShape {
    Box { center: Vec3, size: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl VolumeShape {
    pub fn bounds(&self) -> Bounds {
        match *self {
            VolumeShape::Box { center, size } => Bounds::from_center_size(center, size),
            VolumeShape::Sphere { center, radius } => {
                Bounds::from_center_size(center, Vec3::splat(radius * 2.0))
            }
        }
    }

    pub fn contains(&self, p: Vec3) -> bool {
        match *self {
            VolumeShape::Box { .. } => self.bounds().contains(p),
            VolumeShape::Sphere { center, radius } => p.distance_squared(center) <= radius * radius,
        }
    }
}

/// One authored object in a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneObject {
    /// A tile fixed in the scene; its painted faces constrain the cells
    /// around it and its own cells leave the solve
    Tile {
        #[serde(default)]
        name: Option<String>,
        tile: String,
        #[serde(default)]
        placement: Placement,
    },
    Pin {
        #[serde(default)]
        name: Option<String>,
        tile: String,
        #[serde(default)]
        placement: Placement,
        #[serde(default)]
        pin_type: PinType,
    },
    Volume {
        name: String,
        #[serde(default)]
        tiles: Vec<String>,
        #[serde(default)]
        volume_type: VolumeType,
        /// Cover every cell outside the shapes instead of inside
        #[serde(default)]
        invert: bool,
        shapes: Vec<VolumeShape>,
    },
}

type Constraint<G> = InitialConstraint<FaceDirOf<G>, RotationOf<G>>;

pub struct ConstraintBuilder<'a, G: Grid> {
    grid: &'a G,
    info: &'a TileModelInfo<G::Cell>,
    pub warnings: Warnings,
}

impl<'a, G: Grid> ConstraintBuilder<'a, G> {
    pub fn new(grid: &'a G, info: &'a TileModelInfo<G::Cell>) -> Self {
        Self {
            grid,
            info,
            warnings: Warnings::new(),
        }
    }

    pub fn build(&mut self, objects: &[SceneObject]) -> Result<Vec<Constraint<G>>> {
        let mut out = Vec::with_capacity(objects.len());
        for object in objects {
            if let Some(c) = self.build_one(object)? {
                out.push(c);
            }
        }
        debug!(objects = objects.len(), constraints = out.len(), "built scene constraints");
        Ok(out)
    }

    fn build_one(&mut self, object: &SceneObject) -> Result<Option<Constraint<G>>> {
        match object {
            SceneObject::Tile {
                name,
                tile,
                placement,
            } => {
                let name = name.clone().unwrap_or_else(|| format!("Tile {}", tile));
                let t = self
                    .lookup(tile)
                    .ok_or_else(|| TileGraphError::UnknownTile(tile.clone()))?;
                Ok(self
                    .place(&name, t, placement)
                    .map(|(cell, rotation)| self.face_constraint(name, t, cell, rotation, true)))
            }
            SceneObject::Pin {
                name,
                tile,
                placement,
                pin_type,
            } => {
                let name = name.clone().unwrap_or_else(|| format!("Pin {}", tile));
                let t = self.lookup(tile).ok_or_else(|| TileGraphError::PinTileMissing {
                    pin: name.clone(),
                    tile: tile.clone(),
                })?;
                let Some((cell, rotation)) = self.place(&name, t, placement) else {
                    return Ok(None);
                };
                Ok(Some(match pin_type {
                    PinType::Pin => InitialConstraint::Pin(PinConstraint {
                        name,
                        tile: tile.clone(),
                        cell,
                        rotation,
                    }),
                    PinType::FacesOnly => self.face_constraint(name, t, cell, rotation, false),
                    PinType::FacesAndInterior => self.face_constraint(name, t, cell, rotation, true),
                }))
            }
            SceneObject::Volume {
                name,
                tiles,
                volume_type,
                invert,
                shapes,
            } => Ok(Some(InitialConstraint::Volume(VolumeFilter {
                name: name.clone(),
                tiles: tiles.clone(),
                cells: self.volume_cells(shapes, *invert),
                volume_type: *volume_type,
            }))),
        }
    }

    fn lookup(&self, name: &str) -> Option<&'a Tile<FaceDirOf<G>>> {
        let info = self.info;
        info.tile_id(name).and_then(|id| info.tile(id))
    }

    fn place(
        &mut self,
        name: &str,
        tile: &Tile<FaceDirOf<G>>,
        placement: &Placement,
    ) -> Option<(IVec3, RotationOf<G>)> {
        let found = self
            .grid
            .find_cell_oriented(tile.center, placement.matrix());
        if found.is_none() {
            warn!(constraint = name, "could not place on the grid, skipping");
            self.warnings.push(
                WarningKind::SkippedConstraint,
                format!("{} is not aligned with the grid", name),
            );
        }
        found
    }

    fn face_constraint(
        &self,
        name: String,
        tile: &Tile<FaceDirOf<G>>,
        cell: IVec3,
        rotation: RotationOf<G>,
        interior: bool,
    ) -> Constraint<G> {
        InitialConstraint::Face(FaceConstraint {
            name,
            faces: tile.faces(self.grid.cell_type()),
            offsets: if interior {
                tile.sorted_offsets()
            } else {
                Vec::new()
            },
            cell,
            rotation,
        })
    }

    /// Cells whose centers lie in any shape, or in none of them when inverted
    fn volume_cells(&self, shapes: &[VolumeShape], invert: bool) -> Vec<IVec3> {
        let mut cells: AHashSet<IVec3> = if invert {
            self.grid.cells().into_iter().collect()
        } else {
            AHashSet::new()
        };
        for shape in shapes {
            for cell in self.grid.cells_intersecting_approx(&shape.bounds(), true) {
                if !shape.contains(self.grid.cell_center(cell)) {
                    continue;
                }
                if invert {
                    cells.remove(&cell);
                } else {
                    cells.insert(cell);
                }
            }
        }
        let mut cells: Vec<_> = cells.into_iter().collect();
        cells.sort_by_key(|&c| self.grid.get_index(c));
        cells
    }
}

/// Restricts each submesh's cells to the tiles listed for it
///
/// Mesh grids keep the submesh in the `z` coordinate of every cell.
pub fn submesh_filters<G: Grid>(grid: &G, surface: &SurfaceConfig, warnings: &mut Warnings) -> Vec<VolumeFilter> {
    if !surface.filter_submesh_tiles {
        return Vec::new();
    }
    let cells = grid.cells();
    surface
        .submesh_tiles
        .iter()
        .enumerate()
        .map(|(i, tiles)| {
            if tiles.is_empty() {
                warnings.push(
                    WarningKind::EmptySubmeshFilter,
                    format!("submesh {} allows no tiles", i),
                );
            }
            VolumeFilter {
                name: format!("Submesh {}", i),
                tiles: tiles.clone(),
                cells: cells.iter().copied().filter(|c| c.z == i as i32).collect(),
                volume_type: VolumeType::TilesetFilter,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{LatticeKind, RotationGroupType};
    use crate::grid::{CubeGrid, SquareGrid};
    use crate::lattice::{
        CellType, CubeCellType, CubeRotation, FaceDetails, FaceShape, SquareCellType,
        SquareFaceDir, SquareRotation,
    };
    use crate::model::TileEntry;

    fn square_info() -> TileModelInfo<SquareCellType> {
        let mut door = Tile::new("door", LatticeKind::Square).with_paint(
            IVec3::ZERO,
            SquareFaceDir::Right,
            FaceDetails::uniform(FaceShape::Square, 1),
        );
        door.rotation_group = RotationGroupType::XY;
        TileModelInfo::build(SquareCellType::new(), &[TileEntry::new(door, 1.0)]).unwrap()
    }

    fn grid() -> SquareGrid {
        SquareGrid::new(Vec3::ZERO, IVec3::new(4, 4, 1), Vec3::ONE)
    }

    #[test]
    fn test_scene_parses_from_toml() {
        let text = r#"
            [[objects]]
            kind = "pin"
            tile = "door"
            pin_type = "FacesOnly"
            placement = { position = [1.0, 2.0, 0.0] }

            [[objects]]
            kind = "volume"
            name = "hole"
            volume_type = "MaskOut"
            shapes = [{ shape = "sphere", center = [0.0, 0.0, 0.0], radius = 1.0 }]
        "#;
        #[derive(Deserialize)]
        struct Scene {
            objects: Vec<SceneObject>,
        }
        let scene: Scene = toml::from_str(text).unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert!(matches!(
            &scene.objects[0],
            SceneObject::Pin { pin_type: PinType::FacesOnly, .. }
        ));
    }

    #[test]
    fn test_pin_is_placed_and_rotated() {
        let info = square_info();
        let grid = grid();
        let mut builder = ConstraintBuilder::new(&grid, &info);
        let objects = [SceneObject::Pin {
            name: None,
            tile: "door".into(),
            placement: Placement::at(Vec3::new(2.0, 1.0, 0.0)).rotated(Vec3::new(0.0, 0.0, 90.0)),
            pin_type: PinType::Pin,
        }];
        let built = builder.build(&objects).unwrap();
        let InitialConstraint::Pin(pin) = &built[0] else {
            panic!("expected a pin");
        };
        assert_eq!(pin.cell, IVec3::new(2, 1, 0));
        assert_eq!(pin.name, "Pin door");
        let ct = SquareCellType::new();
        assert_eq!(ct.rotate(SquareFaceDir::Right, pin.rotation), SquareFaceDir::Up);
        assert_ne!(pin.rotation, SquareRotation::IDENTITY);
    }

    #[test]
    fn test_pin_type_controls_interior() {
        let info = square_info();
        let grid = grid();
        let mut builder = ConstraintBuilder::new(&grid, &info);
        let pin = |pin_type| SceneObject::Pin {
            name: Some("p".into()),
            tile: "door".into(),
            placement: Placement::at(Vec3::new(1.0, 1.0, 0.0)),
            pin_type,
        };
        let built = builder
            .build(&[pin(PinType::FacesOnly), pin(PinType::FacesAndInterior)])
            .unwrap();
        let offsets: Vec<usize> = built
            .iter()
            .map(|c| match c {
                InitialConstraint::Face(f) => f.offsets.len(),
                _ => usize::MAX,
            })
            .collect();
        assert_eq!(offsets, vec![0, 1]);
    }

    #[test]
    fn test_unknown_pin_tile_names_tile() {
        let info = square_info();
        let grid = grid();
        let mut builder = ConstraintBuilder::new(&grid, &info);
        let err = builder
            .build(&[SceneObject::Pin {
                name: Some("gate".into()),
                tile: "portcullis".into(),
                placement: Placement::default(),
                pin_type: PinType::Pin,
            }])
            .unwrap_err();
        assert!(err.to_string().contains("portcullis"));
    }

    #[test]
    fn test_misaligned_tile_is_skipped_with_warning() {
        let info = square_info();
        let grid = grid();
        let mut builder = ConstraintBuilder::new(&grid, &info);
        let built = builder
            .build(&[SceneObject::Tile {
                name: None,
                tile: "door".into(),
                placement: Placement::default().rotated(Vec3::new(0.0, 0.0, 45.0)),
            }])
            .unwrap();
        assert!(built.is_empty());
        assert_eq!(builder.warnings.count(WarningKind::SkippedConstraint), 1);
    }

    #[test]
    fn test_volume_cells_and_inversion() {
        let info = square_info();
        let grid = grid();
        let mut builder = ConstraintBuilder::new(&grid, &info);
        let shapes = vec![VolumeShape::Box {
            center: Vec3::new(0.5, 0.5, 0.0),
            size: Vec3::new(2.0, 2.0, 1.0),
        }];
        let volume = |invert| SceneObject::Volume {
            name: "v".into(),
            tiles: Vec::new(),
            volume_type: VolumeType::MaskOut,
            invert,
            shapes: shapes.clone(),
        };
        let built = builder.build(&[volume(false), volume(true)]).unwrap();
        let sizes: Vec<usize> = built
            .iter()
            .map(|c| match c {
                InitialConstraint::Volume(v) => v.cells.len(),
                _ => 0,
            })
            .collect();
        assert_eq!(sizes, vec![4, 12]);
    }

    #[test]
    fn test_cube_tile_placement_uses_tile_center() {
        let mut tile = Tile::new("crate", LatticeKind::Cube);
        tile.center = Vec3::new(0.0, 0.5, 0.0);
        let info = TileModelInfo::build(CubeCellType::new(), &[TileEntry::new(tile, 1.0)]).unwrap();
        let grid = CubeGrid::new(Vec3::ZERO, IVec3::new(3, 3, 3), Vec3::ONE);
        let mut builder = ConstraintBuilder::new(&grid, &info);
        let built = builder
            .build(&[SceneObject::Tile {
                name: None,
                tile: "crate".into(),
                placement: Placement::at(Vec3::new(1.0, 0.5, 2.0)),
            }])
            .unwrap();
        let InitialConstraint::Face(face) = &built[0] else {
            panic!("expected a face constraint");
        };
        assert_eq!(face.rotation, CubeRotation::IDENTITY);
        assert_eq!(face.faces.len(), 6);
        assert_eq!(face.offsets, vec![IVec3::ZERO]);
    }

    #[test]
    fn test_submesh_filters() {
        let grid = CubeGrid::new(Vec3::ZERO, IVec3::new(2, 1, 2), Vec3::ONE);
        let surface = SurfaceConfig {
            submesh_tiles: vec![vec!["grass".into()], Vec::new()],
            filter_submesh_tiles: true,
            ..SurfaceConfig::default()
        };
        let mut warnings = Warnings::new();
        let filters = submesh_filters(&grid, &surface, &mut warnings);
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].cells.len(), 2);
        assert_eq!(filters[1].name, "Submesh 1");
        assert_eq!(warnings.count(WarningKind::EmptySubmeshFilter), 1);
    }
}
