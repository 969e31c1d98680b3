//! Lattice families: rotation groups, face directions and tile-local geometry

pub mod cell_type;
pub mod cube;
pub mod face_details;
pub mod hex_prism;
pub mod rotation;
pub mod square;
pub mod triangle_prism;

pub use cell_type::{CellType, FaceDirection, RotationTable};
pub use cube::{CubeCellType, CubeFaceDir};
pub use face_details::{FaceDetails, FaceShape};
pub use hex_prism::{HexPrismCellType, HexPrismFaceDir};
pub use rotation::{
    CubeRotation, Dihedral, HexRotation, LatticeRotation, SquareRotation, TriangleRotation,
};
pub use square::{SquareCellType, SquareFaceDir};
pub use triangle_prism::{TrianglePrismCellType, TrianglePrismFaceDir};
