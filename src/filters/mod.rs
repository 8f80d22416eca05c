//! 2D smoothing and morphology used ahead of edge detection, plus the
//! depth-axis closing applied to finished marker masks.
//!
//! Borders differ by operation:
//! - linear filters (Gaussian, Sobel) mirror samples without repeating the
//!   edge pixel (`reflect-101`: `… 2 1 | 0 1 2 … n-1 | n-2 n-3 …`);
//! - dilation and erosion ignore neighbours that fall outside the image.

pub mod gaussian;
pub mod morphology;

pub use gaussian::{gaussian_blur, GaussianKernel, SeparableFilter};
pub use morphology::{close, close_depth, dilate, erode, MorphShape, StructuringElement};

/// Map a possibly out-of-range index into `0..len` with reflect-101 mirroring.
#[inline]
pub fn reflect_101(i: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = (2 * len - 2) as isize;
    let r = i.rem_euclid(period) as usize;
    if r < len {
        r
    } else {
        period as usize - r
    }
}
