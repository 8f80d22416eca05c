use super::TimingBreakdown;
use crate::line::CandidateLine;
use serde::Serialize;

/// Outcome of marker detection on one slice.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceMarkerReport {
    pub slice: usize,
    pub candidates: usize,
    pub accepted: Vec<CandidateLine>,
    pub edge_pixels: usize,
    pub timings: TimingBreakdown,
}

/// Per-slice detection results for a whole mask build.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerReport {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub slices: Vec<SliceMarkerReport>,
    pub timings: TimingBreakdown,
}

impl MarkerReport {
    pub fn total_candidates(&self) -> usize {
        self.slices.iter().map(|s| s.candidates).sum()
    }

    pub fn total_accepted(&self) -> usize {
        self.slices.iter().map(|s| s.accepted.len()).sum()
    }

    /// Slices with at least one accepted marker line.
    pub fn marked_slices(&self) -> Vec<usize> {
        self.slices
            .iter()
            .filter(|s| !s.accepted.is_empty())
            .map(|s| s.slice)
            .collect()
    }
}
