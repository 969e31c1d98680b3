use thiserror::Error;

#[derive(Error, Debug)]
pub enum TileGraphError {
    #[error("Cannot run generator with zero tiles configured.")]
    ZeroTiles,

    #[error("You cannot mix tiles of multiple cell types, such as {0}")]
    MixedCellTypes(String),

    #[error("Model type {model} is not supported on {lattice} grids")]
    UnsupportedModel { model: String, lattice: String },

    #[error("Cannot do pin {pin} as it is rotated in a way that the tile doesn't support.")]
    PinRotationUnsupported { pin: String },

    #[error("Cannot do pin {pin} as the tile {tile} is not included in the generator")]
    PinTileMissing { pin: String, tile: String },

    #[error("Unknown tile: {0}")]
    UnknownTile(String),

    #[error("Mirror constraint not supported: {0}")]
    MirrorUnsupported(String),

    #[error("Mesh topology mismatch: {0}")]
    MeshTopologyMismatch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TileGraphError>;

/// Category of a non-fatal problem found while building a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum WarningKind {
    NonContiguousTile,
    EmptyTile,
    MissizedTile,
    PaletteMismatch,
    EmptySubmeshFilter,
    SkippedConstraint,
    OverlappingMeshEdge,
}

/// A non-fatal problem, surfaced to the caller instead of aborting generation
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

/// Accumulates warnings and mirrors each one to the log as it arrives
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: WarningKind, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(?kind, "{}", message);
        self.items.push(Warning { kind, message });
    }

    pub fn extend(&mut self, other: Warnings) {
        self.items.extend(other.items);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn count(&self, kind: WarningKind) -> usize {
        self.items.iter().filter(|w| w.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_tiles_message() {
        let err = TileGraphError::ZeroTiles;
        assert_eq!(err.to_string(), "Cannot run generator with zero tiles configured.");
    }

    #[test]
    fn test_pin_missing_names_tile() {
        let err = TileGraphError::PinTileMissing {
            pin: "door_pin".into(),
            tile: "door".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("door_pin"));
        assert!(msg.contains("door"));
        assert!(msg.contains("not included"));
    }

    #[test]
    fn test_warnings_accumulate() {
        let mut warnings = Warnings::new();
        warnings.push(WarningKind::NonContiguousTile, "Cannot use split as it is not contiguous");
        warnings.push(WarningKind::MissizedTile, "tile size differs");
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings.count(WarningKind::NonContiguousTile), 1);
    }
}
