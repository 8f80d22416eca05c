//! Grayscale dilation, erosion and closing with flat structuring elements.
//!
//! Elements are stored as `(dx, dy)` offsets relative to the anchor. Pixels
//! whose whole neighbourhood lies inside the image take a fast path over
//! precomputed linear offsets; the remaining border pixels check bounds and
//! skip neighbours outside the image.
use crate::error::{QcError, Result};
use crate::volume::{Shape, VolumeBuffer};
use rayon::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MorphShape {
    Rect,
    Ellipse,
}

/// Flat structuring element as anchor-relative offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructuringElement {
    width: usize,
    height: usize,
    offsets: Vec<(isize, isize)>,
}

impl StructuringElement {
    /// Build a `width × height` element anchored at its centre.
    ///
    /// The ellipse is the one inscribed in the box: row `dy` spans
    /// `round(c * sqrt(1 - dy² / r²))` columns either side of the centre,
    /// with `r = height / 2` and `c = width / 2`.
    pub fn new(shape: MorphShape, width: usize, height: usize) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let (cx, cy) = ((width / 2) as isize, (height / 2) as isize);
        let r = cy as f64;
        let mut offsets = Vec::new();
        for i in 0..height as isize {
            let (j0, j1) = match shape {
                MorphShape::Rect => (0, width as isize),
                MorphShape::Ellipse => {
                    let dy = (i - cy) as f64;
                    let dx = if r > 0.0 {
                        (cx as f64 * ((r * r - dy * dy).max(0.0) / (r * r)).sqrt()).round() as isize
                    } else {
                        0
                    };
                    ((cx - dx).max(0), (cx + dx + 1).min(width as isize))
                }
            };
            for j in j0..j1 {
                offsets.push((j - cx, i - cy));
            }
        }
        Self {
            width,
            height,
            offsets,
        }
    }

    pub fn ellipse(size: usize) -> Self {
        Self::new(MorphShape::Ellipse, size, size)
    }

    pub fn rect(width: usize, height: usize) -> Self {
        Self::new(MorphShape::Rect, width, height)
    }

    pub fn offsets(&self) -> &[(isize, isize)] {
        &self.offsets
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn reach(&self) -> (isize, isize, isize, isize) {
        self.offsets.iter().fold((0, 0, 0, 0), |(x0, x1, y0, y1), &(dx, dy)| {
            (x0.min(dx), x1.max(dx), y0.min(dy), y1.max(dy))
        })
    }
}

#[derive(Clone, Copy)]
enum Op {
    Dilate,
    Erode,
}

#[inline]
fn pick<T: Copy + PartialOrd>(op: Op, acc: T, v: T) -> T {
    match op {
        Op::Dilate if v > acc => v,
        Op::Erode if v < acc => v,
        _ => acc,
    }
}

fn morph_plane<T: Copy + PartialOrd>(
    src: &[T],
    w: usize,
    h: usize,
    se: &StructuringElement,
    op: Op,
) -> Vec<T> {
    let mut out = src.to_vec();
    if w == 0 || h == 0 {
        return out;
    }
    let (x_lo, x_hi, y_lo, y_hi) = se.reach();
    let linear: Vec<isize> = se
        .offsets
        .iter()
        .map(|&(dx, dy)| dy * w as isize + dx)
        .collect();

    for y in 0..h {
        let yi = y as isize;
        let row_inside = yi + y_lo >= 0 && yi + y_hi < h as isize;
        for x in 0..w {
            let xi = x as isize;
            let centre = y * w + x;
            let mut acc = src[centre];
            if row_inside && xi + x_lo >= 0 && xi + x_hi < w as isize {
                for &off in &linear {
                    acc = pick(op, acc, src[(centre as isize + off) as usize]);
                }
            } else {
                for &(dx, dy) in &se.offsets {
                    let (nx, ny) = (xi + dx, yi + dy);
                    if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                        continue;
                    }
                    acc = pick(op, acc, src[ny as usize * w + nx as usize]);
                }
            }
            out[centre] = acc;
        }
    }
    out
}

/// Grayscale dilation (neighbourhood maximum) of a row-major plane.
pub fn dilate<T: Copy + PartialOrd>(src: &[T], w: usize, h: usize, se: &StructuringElement) -> Vec<T> {
    morph_plane(src, w, h, se, Op::Dilate)
}

/// Grayscale erosion (neighbourhood minimum) of a row-major plane.
pub fn erode<T: Copy + PartialOrd>(src: &[T], w: usize, h: usize, se: &StructuringElement) -> Vec<T> {
    morph_plane(src, w, h, se, Op::Erode)
}

/// Closing: dilation followed by erosion with the same element.
pub fn close<T: Copy + PartialOrd>(src: &[T], w: usize, h: usize, se: &StructuringElement) -> Vec<T> {
    let dilated = dilate(src, w, h, se);
    erode(&dilated, w, h, se)
}

fn morph_depth(src: &[u8], shape: Shape, window: usize, op: Op) -> Vec<u8> {
    let slice_len = shape.slice_len();
    let depth = shape.depth as isize;
    let anchor = (window / 2) as isize;
    let mut out = vec![0u8; src.len()];
    out.par_chunks_mut(slice_len)
        .enumerate()
        .for_each(|(z, dst)| {
            let z = z as isize;
            dst.copy_from_slice(&src[z as usize * slice_len..(z as usize + 1) * slice_len]);
            for k in 0..window as isize {
                let zz = z + k - anchor;
                if zz == z || zz < 0 || zz >= depth {
                    continue;
                }
                let other = &src[zz as usize * slice_len..(zz as usize + 1) * slice_len];
                for (d, &s) in dst.iter_mut().zip(other) {
                    *d = pick(op, *d, s);
                }
            }
        });
    out
}

/// Closing along Z only with a `1 × window` line element.
///
/// Every XY position is closed independently across slices, which bridges
/// marker gaps shorter than `window` between neighbouring slices. Only
/// channel 0 of a U8 volume is supported.
pub fn close_depth(volume: &VolumeBuffer, window: usize) -> Result<VolumeBuffer> {
    let shape = volume.shape();
    let data = volume.as_u8().ok_or_else(|| QcError::InvalidParameter {
        name: "volume",
        reason: format!(
            "depth closing expects a u8 mask, found {:?}",
            volume.element_type()
        ),
    })?;
    if shape.channels != 1 {
        return Err(QcError::InvalidParameter {
            name: "volume",
            reason: format!("depth closing expects one channel, found {}", shape.channels),
        });
    }
    if window <= 1 || shape.depth <= 1 {
        return Ok(volume.clone());
    }
    let dilated = morph_depth(data, shape, window, Op::Dilate);
    let closed = morph_depth(&dilated, shape, window, Op::Erode);
    VolumeBuffer::from_u8(shape, closed)
}
