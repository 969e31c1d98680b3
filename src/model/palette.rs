//! Which paint colors may touch
//!
//! Touching faces are compared slot by slot after mirroring one of them,
//! since each face is painted as seen from outside its own cell.

use serde::{Deserialize, Serialize};

use crate::lattice::FaceDetails;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub name: String,
    #[serde(default)]
    pub color: [f32; 3],
}

/// A symmetric color-compatibility table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub name: String,
    entries: Vec<PaletteEntry>,
    /// Row-major `entries.len()` squared
    matrix: Vec<bool>,
    /// Paint that matches anything, including itself
    wildcard: Option<u32>,
}

impl Palette {
    /// `count` colors, each matching only itself
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        let entries = (0..count)
            .map(|i| PaletteEntry {
                name: format!("color{}", i),
                color: [0.0; 3],
            })
            .collect();
        let mut matrix = vec![false; count * count];
        for i in 0..count {
            matrix[i * count + i] = true;
        }
        Self {
            name: name.into(),
            entries,
            matrix,
            wildcard: None,
        }
    }

    pub fn from_entries(name: impl Into<String>, entries: Vec<PaletteEntry>) -> Self {
        let mut palette = Self::new(name, entries.len());
        palette.entries = entries;
        palette
    }

    pub fn with_wildcard(mut self, paint: u32) -> Self {
        self.wildcard = Some(paint);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .map(|i| i as u32)
    }

    /// Sets compatibility both ways. Out-of-range colors are ignored.
    pub fn set_match(&mut self, a: u32, b: u32, allowed: bool) {
        let n = self.entries.len();
        let (a, b) = (a as usize, b as usize);
        if a >= n || b >= n {
            return;
        }
        self.matrix[a * n + b] = allowed;
        self.matrix[b * n + a] = allowed;
    }

    /// Whether two single paint colors may touch. Colors outside the table
    /// only match themselves.
    pub fn paint_matches(&self, a: u32, b: u32) -> bool {
        if self.wildcard.is_some_and(|w| w == a || w == b) {
            return true;
        }
        let n = self.entries.len();
        let (ia, ib) = (a as usize, b as usize);
        if ia >= n || ib >= n {
            return a == b;
        }
        self.matrix[ia * n + ib]
    }

    /// Whether two faces may touch: `a` against the mirror image of `b`
    pub fn matches(&self, a: &FaceDetails, b: &FaceDetails) -> bool {
        if a.rim.len() != b.rim.len() {
            return false;
        }
        let b = b.reflect_x();
        self.paint_matches(a.center, b.center)
            && a
                .rim
                .iter()
                .zip(&b.rim)
                .all(|(&x, &y)| self.paint_matches(x, y))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new("default", 8)
    }
}
