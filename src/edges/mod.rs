//! Edge detection for high-bit-depth slices.
//!
//! The detector follows the classic Canny structure, computed in f32 so that
//! 16-bit data is never quantised to 8 bits first:
//!
//! - Sobel gradients with reflect-101 borders;
//! - interpolated non-maximum suppression across the edge;
//! - hysteresis with thresholds expressed as ratios of the slice's maximum
//!   gradient magnitude.
//!
//! The result is a binary 0/255 edge map.

pub mod grad;
pub mod hysteresis;
pub mod nms;

pub use grad::{sobel_gradients, Grad};
pub use hysteresis::hysteresis;
pub use nms::suppress_non_maxima;

use crate::diagnostics::elapsed_ms;
use crate::error::{QcError, Result};
use crate::image::{ImageF32, ImageU8};
use std::time::Instant;

/// Edge map plus the numbers that produced it.
#[derive(Clone, Debug)]
pub struct CannyResult {
    pub edges: ImageU8,
    pub max_magnitude: f32,
    pub gradient_ms: f64,
    pub nms_ms: f64,
    pub hysteresis_ms: f64,
}

/// Ratio-thresholded Canny on a float image.
///
/// `low_ratio` and `high_ratio` scale the maximum gradient magnitude and
/// must satisfy `0 <= low_ratio < high_ratio <= 1`. A flat image yields an
/// empty map. A non-finite magnitude is reported as `EdgeDetectionFailed`
/// with slice index 0; callers working on volumes relabel it with
/// [`QcError::at_slice`].
pub fn canny(img: &ImageF32, low_ratio: f64, high_ratio: f64) -> Result<CannyResult> {
    if !(0.0..=1.0).contains(&low_ratio) || !(0.0..=1.0).contains(&high_ratio) || low_ratio >= high_ratio {
        return Err(QcError::InvalidParameter {
            name: "cannyMin/cannyMax",
            reason: format!("need 0 <= {low_ratio} < {high_ratio} <= 1"),
        });
    }

    let gradient_start = Instant::now();
    let grad = sobel_gradients(img);
    let gradient_ms = elapsed_ms(gradient_start);

    let max_magnitude = grad.mag.max_value().unwrap_or(0.0);
    if !max_magnitude.is_finite() {
        return Err(QcError::EdgeDetectionFailed {
            slice: 0,
            reason: format!("gradient magnitude is not finite ({max_magnitude})"),
        });
    }

    let nms_start = Instant::now();
    let nms = suppress_non_maxima(&grad);
    let nms_ms = elapsed_ms(nms_start);

    let hysteresis_start = Instant::now();
    let low = (max_magnitude as f64 * low_ratio) as f32;
    let high = (max_magnitude as f64 * high_ratio) as f32;
    let edges = hysteresis(&nms, low, high);
    let hysteresis_ms = elapsed_ms(hysteresis_start);

    Ok(CannyResult {
        edges,
        max_magnitude,
        gradient_ms,
        nms_ms,
        hysteresis_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_image_has_no_edges() {
        let img = ImageF32::filled(32, 16, 1234.0);
        let res = canny(&img, 0.1, 0.3).unwrap();
        assert_eq!(res.max_magnitude, 0.0);
        assert_eq!(res.edges.count_nonzero(), 0);
    }

    #[test]
    fn square_outline_is_detected() {
        let mut img = ImageF32::filled(40, 40, 1000.0);
        for y in 10..30 {
            for x in 10..30 {
                img.set(x, y, 30000.0);
            }
        }
        let res = canny(&img, 0.1, 0.3).unwrap();
        assert!(res.edges.count_nonzero() > 40);
        assert_eq!(res.edges.get(20, 20), 0);
        assert_eq!(res.edges.get(2, 2), 0);
        assert!(res.edges.data.iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn nan_input_fails() {
        let mut img = ImageF32::filled(8, 8, 1.0);
        img.set(3, 3, f32::NAN);
        assert!(matches!(
            canny(&img, 0.1, 0.3),
            Err(QcError::EdgeDetectionFailed { .. })
        ));
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let img = ImageF32::filled(8, 8, 1.0);
        assert!(matches!(
            canny(&img, 0.5, 0.2),
            Err(QcError::InvalidParameter { .. })
        ));
    }
}
