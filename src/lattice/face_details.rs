//! Painted face content
//!
//! A face is painted with a center color and a ring of colors around it,
//! listed counter-clockwise in the face's own frame. The frame is the one an
//! observer outside the cell sees: `u` to the right, `v` up, `u × v` pointing
//! out of the cell. Two touching faces share `v` and have opposite `u`, so a
//! face looks mirrored from its neighbour's side.

use serde::{Deserialize, Serialize};

/// Outline of a face, which fixes the length and layout of its rim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceShape {
    /// 8 rim slots at 45° steps, starting at +u
    Square,
    /// 12 rim slots at 30° steps starting at +u; even slots are sides
    Hexagon,
    /// 6 rim slots at 30° + 60°·i
    Triangle,
}

impl FaceShape {
    pub fn rim_len(self) -> usize {
        match self {
            FaceShape::Square => 8,
            FaceShape::Hexagon => 12,
            FaceShape::Triangle => 6,
        }
    }

    /// Index sum preserved by mirroring `u`
    pub fn mirror_axis(self) -> usize {
        match self {
            FaceShape::Square => 4,
            FaceShape::Hexagon => 6,
            FaceShape::Triangle => 2,
        }
    }

    pub fn from_rim_len(len: usize) -> Option<FaceShape> {
        match len {
            8 => Some(FaceShape::Square),
            12 => Some(FaceShape::Hexagon),
            6 => Some(FaceShape::Triangle),
            _ => None,
        }
    }
}

/// Direction of each square rim slot in (u, v)
const SQUARE_SLOTS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

/// Paint on one face of one cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceDetails {
    pub center: u32,
    pub rim: Vec<u32>,
}

impl FaceDetails {
    pub fn new(center: u32, rim: Vec<u32>) -> Self {
        Self { center, rim }
    }

    /// Every slot painted the same color
    pub fn uniform(shape: FaceShape, paint: u32) -> Self {
        Self {
            center: paint,
            rim: vec![paint; shape.rim_len()],
        }
    }

    /// Builds a square face from a 3x3 grid given top row first, as seen from outside
    pub fn square(rows: [[u32; 3]; 3]) -> Self {
        let [[tl, t, tr], [l, c, r], [bl, b, br]] = rows;
        Self {
            center: c,
            rim: vec![r, tr, t, tl, l, bl, b, br],
        }
    }

    pub fn shape(&self) -> Option<FaceShape> {
        FaceShape::from_rim_len(self.rim.len())
    }

    /// Turns the paint counter-clockwise by `steps` rim slots
    pub fn rotate_rim(&self, steps: i32) -> Self {
        let n = self.rim.len();
        if n == 0 {
            return self.clone();
        }
        let mut rim = vec![0; n];
        for (i, &paint) in self.rim.iter().enumerate() {
            rim[(i as i32 + steps).rem_euclid(n as i32) as usize] = paint;
        }
        Self {
            center: self.center,
            rim,
        }
    }

    /// Mirrors the paint in `u`
    pub fn reflect_x(&self) -> Self {
        let n = self.rim.len();
        if n == 0 {
            return self.clone();
        }
        let axis = self.shape().map(|s| s.mirror_axis()).unwrap_or(n / 2) as i32;
        let mut rim = vec![0; n];
        for (i, &paint) in self.rim.iter().enumerate() {
            rim[(axis - i as i32).rem_euclid(n as i32) as usize] = paint;
        }
        Self {
            center: self.center,
            rim,
        }
    }

    /// Applies a signed permutation of (u, v) to a square face
    ///
    /// `t` maps old face coordinates to new ones, row-major. Non-square faces
    /// are returned unchanged.
    pub fn transform(&self, t: [[i32; 2]; 2]) -> Self {
        if self.shape() != Some(FaceShape::Square) {
            return self.clone();
        }
        let mut rim = vec![0; 8];
        for (j, &(a, b)) in SQUARE_SLOTS.iter().enumerate() {
            let image = (t[0][0] * a + t[0][1] * b, t[1][0] * a + t[1][1] * b);
            if let Some(k) = SQUARE_SLOTS.iter().position(|&s| s == image) {
                rim[k] = self.rim[j];
            }
        }
        Self {
            center: self.center,
            rim,
        }
    }

    /// True when both faces carry identical paint in identical positions
    pub fn is_equivalent(&self, other: &FaceDetails) -> bool {
        self == other
    }
}
