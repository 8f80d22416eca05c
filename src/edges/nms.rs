//! Non-maximum suppression with sub-pixel interpolation along the gradient.
//!
//! The gradient angle is folded into [-π/2, π/2) and falls in one of four
//! 45° sectors. Each sector is bounded by an axis neighbour and a diagonal
//! neighbour; the magnitude one step along the gradient is blended from the
//! two by the tangent of the angle inside the sector, on both sides of the
//! pixel. A pixel survives only if it is strictly larger than both blends.
//!
//! The outermost 1-pixel frame is always suppressed.
use super::grad::Grad;
use crate::image::{ImageF32, ImageView, ImageViewMut};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Axis offset, diagonal offset and diagonal weight for a gradient angle.
#[inline]
fn sector(gx: f32, gy: f32) -> ((isize, isize), (isize, isize), f32) {
    let mut t = gy.atan2(gx);
    if t >= FRAC_PI_2 {
        t -= PI;
    } else if t < -FRAC_PI_2 {
        t += PI;
    }
    if t < -FRAC_PI_4 {
        ((0, -1), (1, -1), (t + FRAC_PI_2).tan())
    } else if t < 0.0 {
        ((1, 0), (1, -1), (-t).tan())
    } else if t < FRAC_PI_4 {
        ((1, 0), (1, 1), t.tan())
    } else {
        ((0, 1), (1, 1), (FRAC_PI_2 - t).tan())
    }
}

/// Suppress every magnitude that is not a local maximum across the edge.
pub fn suppress_non_maxima(grad: &Grad) -> ImageF32 {
    let mag = &grad.mag;
    let (w, h) = (mag.w, mag.h);
    let mut out = ImageF32::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }

    let at = |x: usize, y: usize, d: (isize, isize)| -> f32 {
        mag.get((x as isize + d.0) as usize, (y as isize + d.1) as usize)
    };

    for y in 1..h - 1 {
        let gx_row = grad.gx.row(y);
        let gy_row = grad.gy.row(y);
        let mag_row = mag.row(y);
        let dst = out.row_mut(y);
        for x in 1..w - 1 {
            let g = mag_row[x];
            if g == 0.0 {
                continue;
            }
            let (axis, diag, k) = sector(gx_row[x], gy_row[x]);
            let ahead = (1.0 - k) * at(x, y, axis) + k * at(x, y, diag);
            let behind =
                (1.0 - k) * at(x, y, (-axis.0, -axis.1)) + k * at(x, y, (-diag.0, -diag.1));
            if g > ahead && g > behind {
                dst[x] = g;
            }
        }
    }
    out
}
