pub mod config;
pub mod error;
pub mod types;

pub use config::{BorderItemConfig, GeneratorConfig, SurfaceConfig};
pub use error::{Result, TileGraphError, Warning, WarningKind, Warnings};
pub use types::{Bounds, LatticeKind, MirrorAxis, ModelType, RotationGroupType, Trs};
