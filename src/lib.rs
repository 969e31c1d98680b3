//! Tilegraph - tile adjacency models for wave function collapse
//!
//! Turns painted tiles on square, cube, hex prism, triangle prism and mesh
//! surface lattices into canonical solver states, adjacency lists and
//! initial cell selections for an external propagator.

pub mod constraints;
pub mod core;
pub mod generator;
pub mod grid;
pub mod lattice;
pub mod model;

pub use crate::core::error::{Result, TileGraphError};
pub use generator::{Completion, Generator, TileInstance};
