//! Line segments produced by the Hough transform.
use serde::{Deserialize, Serialize};

/// Integer segment in slice-local pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateLine {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl CandidateLine {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Same segment with its endpoints exchanged.
    pub const fn reversed(&self) -> Self {
        Self::new(self.x2, self.y2, self.x1, self.y1)
    }

    pub fn p1(&self) -> [f64; 2] {
        [self.x1 as f64, self.y1 as f64]
    }

    pub fn p2(&self) -> [f64; 2] {
        [self.x2 as f64, self.y2 as f64]
    }

    /// Direction `p2 - p1`.
    pub fn direction(&self) -> [f64; 2] {
        [(self.x2 - self.x1) as f64, (self.y2 - self.y1) as f64]
    }

    pub fn length(&self) -> f64 {
        let [dx, dy] = self.direction();
        dx.hypot(dy)
    }

    pub fn is_degenerate(&self) -> bool {
        self.x1 == self.x2 && self.y1 == self.y2
    }

    /// Endpoints pushed outwards by `ratio * length` on each side.
    pub fn extended(&self, ratio: f64) -> ([f64; 2], [f64; 2]) {
        let [x1, y1] = self.p1();
        let [x2, y2] = self.p2();
        let (dx, dy) = (x1 - x2, y1 - y2);
        (
            [x1 + dx * ratio, y1 + dy * ratio],
            [x2 - dx * ratio, y2 - dy * ratio],
        )
    }
}
