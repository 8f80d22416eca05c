use crate::diagnostics::TimingBreakdown;
use crate::edges::canny;
use crate::error::Result;
use crate::filters::gaussian::apply as apply_separable;
use crate::filters::{close, GaussianKernel, StructuringElement};
use crate::hough::probabilistic_hough;
use crate::image::{ImageF32, ImageU8};
use crate::line::CandidateLine;
use crate::markers::MarkerParams;
use log::trace;

/// Edge map and raw Hough segments of one slice.
#[derive(Clone, Debug)]
pub struct SliceDetection {
    /// Closed 0/255 edge map that was fed to the Hough transform.
    pub edges: ImageU8,
    pub lines: Vec<CandidateLine>,
    pub max_magnitude: f32,
    pub timings: TimingBreakdown,
}

/// Per-slice line detector: closing, smoothing, ratio Canny, edge closing
/// and probabilistic Hough.
///
/// Structuring elements and the Gaussian kernel are built once and reused
/// for every slice.
#[derive(Clone, Debug)]
pub struct EdgeLineDetector {
    params: MarkerParams,
    slice_se: StructuringElement,
    edge_se: StructuringElement,
    blur: Option<GaussianKernel>,
}

impl EdgeLineDetector {
    pub fn new(params: MarkerParams) -> Result<Self> {
        params.validate()?;
        let blur = (params.sigma > 0.0).then(|| GaussianKernel::for_sigma(params.sigma));
        Ok(Self {
            slice_se: StructuringElement::ellipse(params.se1),
            edge_se: StructuringElement::ellipse(params.se2),
            blur,
            params,
        })
    }

    pub fn params(&self) -> &MarkerParams {
        &self.params
    }

    /// Detect candidate lines on slice `z`.
    ///
    /// `z` only selects the Hough seed; edge failures carry slice index 0
    /// and are relabelled by the caller.
    pub fn detect(&self, slice: &ImageF32, z: usize) -> Result<SliceDetection> {
        let (w, h) = (slice.w, slice.h);
        let mut timings = TimingBreakdown::default();

        let closed = timings.time("closing", || close(&slice.data, w, h, &self.slice_se));
        let mut smooth = ImageF32 {
            w,
            h,
            stride: w,
            data: closed,
        };
        if let Some(kernel) = &self.blur {
            smooth = timings.time("blur", || apply_separable(kernel, &smooth));
        }

        let canny = canny(&smooth, self.params.canny_min, self.params.canny_max)?;
        timings.push("gradient", canny.gradient_ms);
        timings.push("nms", canny.nms_ms);
        timings.push("hysteresis", canny.hysteresis_ms);

        let edge_data = timings.time("edgeClosing", || close(&canny.edges.data, w, h, &self.edge_se));
        let edges = ImageU8 {
            w,
            h,
            stride: w,
            data: edge_data,
        };

        let opts = self.params.hough_options(z);
        let lines = timings.time("hough", || probabilistic_hough(&edges, &opts))?;
        timings.total_ms = timings.stages.iter().map(|s| s.elapsed_ms).sum();
        trace!("slice {z}: {} segments, max gradient {}", lines.len(), canny.max_magnitude);

        Ok(SliceDetection {
            edges,
            lines,
            max_magnitude: canny.max_magnitude,
            timings,
        })
    }
}

/// Candidate lines of a single slice with `params`.
pub fn detect_lines(slice: &ImageF32, params: &MarkerParams) -> Result<Vec<CandidateLine>> {
    let detector = EdgeLineDetector::new(params.clone())?;
    Ok(detector.detect(slice, 0)?.lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> MarkerParams {
        MarkerParams {
            se1: 3,
            se2: 3,
            hough_threshold: 30,
            hough_min_line_length: 40,
            hough_max_line_gap: 2,
            ..MarkerParams::default()
        }
    }

    #[test]
    fn constant_slice_yields_nothing() {
        let slice = ImageF32::filled(64, 48, 5000.0);
        let det = EdgeLineDetector::new(small_params())
            .unwrap()
            .detect(&slice, 0)
            .unwrap();
        assert_eq!(det.edges.count_nonzero(), 0);
        assert!(det.lines.is_empty());
        assert!(detect_lines(&slice, &small_params()).unwrap().is_empty());
    }

    #[test]
    fn bright_seam_produces_horizontal_segments() {
        let mut slice = ImageF32::filled(120, 60, 1000.0);
        for x in 10..110 {
            slice.set(x, 30, 30000.0);
        }
        let lines = detect_lines(&slice, &small_params()).unwrap();
        assert!(!lines.is_empty());
        for l in &lines {
            assert!((l.y1 - l.y2).abs() <= 2, "{l:?}");
            assert!((28..=32).contains(&l.y1), "{l:?}");
            assert!((l.x1 - l.x2).abs() >= 40, "{l:?}");
        }
    }

    #[test]
    fn nan_slice_fails() {
        let mut slice = ImageF32::filled(16, 16, 1.0);
        slice.set(8, 8, f32::NAN);
        assert!(detect_lines(&slice, &small_params()).is_err());
    }
}
