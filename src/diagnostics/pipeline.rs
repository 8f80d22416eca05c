use super::{MarkerReport, TimingBreakdown};
use crate::volume::ElementType;
use serde::Serialize;
use std::path::PathBuf;

/// Result summary produced by [`QcPipeline::run`](crate::pipeline::QcPipeline).
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QcReport {
    pub input: InputDescriptor,
    pub timings: TimingBreakdown,
    pub markers: MarkerReport,
    /// Non-zero voxels of the marker mask.
    pub mask_voxels: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masking: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampler: Option<String>,
}

impl QcReport {
    /// Fraction of mask voxels set, 0 for an empty input.
    pub fn mask_coverage(&self) -> f64 {
        let total = self.input.width * self.input.height * self.input.depth;
        if total == 0 {
            0.0
        } else {
            self.mask_voxels as f64 / total as f64
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDescriptor {
    pub path: PathBuf,
    /// How the input was interpreted: `tileRoot`, `brainDir`, `sliceDir` or `image`.
    pub kind: String,
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub channels: usize,
    pub element_type: ElementType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_serializes_camel_case_and_skips_absent_stages() {
        let report = QcReport {
            input: InputDescriptor {
                path: PathBuf::from("RES(8x4x2)"),
                kind: "tileRoot".to_string(),
                width: 4,
                height: 8,
                depth: 2,
                channels: 1,
                element_type: ElementType::U16,
            },
            timings: TimingBreakdown::default(),
            markers: MarkerReport::default(),
            mask_voxels: 16,
            masking: None,
            sampler: None,
        };
        assert_eq!(report.mask_coverage(), 0.25);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["input"]["elementType"], "u16");
        assert_eq!(json["maskVoxels"], 16);
        assert!(json.get("masking").is_none());
    }
}
