//! Progressive probabilistic Hough transform for line segments.
//!
//! Edge pixels are visited in random order. Each one votes into a
//! `(angle, rho)` accumulator; as soon as a cell reaches the vote threshold
//! the line through the current pixel is walked in both directions across
//! the edge map, tolerating gaps of up to `max_line_gap` pixels. Long enough
//! walks become segments, and their pixels are removed from the map and from
//! the accumulator so that later pixels cannot vote for the same line again.
//!
//! The walk uses 16.16 fixed point along the minor axis. Randomness comes
//! from a seeded [`StdRng`], so a given seed always yields the same
//! segments.
use crate::error::{QcError, Result};
use crate::image::ImageU8;
use crate::line::CandidateLine;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::PI;

const SHIFT: u32 = 16;

/// Parameters of the probabilistic Hough transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoughOptions {
    /// Distance resolution of the accumulator in pixels.
    pub rho: f64,
    /// Number of angle bins covering a half turn.
    pub angle_divisions: u32,
    /// Minimum accumulator votes for a line.
    pub threshold: u32,
    /// Segments shorter than this along both axes are dropped.
    pub min_line_length: u32,
    /// Largest run of missing pixels bridged while walking a line.
    pub max_line_gap: u32,
    /// Seed of the pixel visiting order.
    pub seed: u64,
    /// Stop after this many segments.
    pub max_lines: usize,
}

impl Default for HoughOptions {
    fn default() -> Self {
        Self {
            rho: 1.0,
            angle_divisions: 180,
            threshold: 100,
            min_line_length: 100,
            max_line_gap: 1,
            seed: 0,
            max_lines: usize::MAX,
        }
    }
}

impl HoughOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.rho.is_finite() && self.rho > 0.0) {
            return Err(QcError::InvalidParameter {
                name: "houghDistanceRes",
                reason: format!("must be positive, got {}", self.rho),
            });
        }
        if self.angle_divisions == 0 {
            return Err(QcError::InvalidParameter {
                name: "houghAngleRes",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Detect line segments among the non-zero pixels of `edges`.
pub fn probabilistic_hough(edges: &ImageU8, opts: &HoughOptions) -> Result<Vec<CandidateLine>> {
    opts.validate()?;
    let (w, h) = (edges.w, edges.h);
    let mut lines = Vec::new();
    if w == 0 || h == 0 {
        return Ok(lines);
    }

    let theta = PI / opts.angle_divisions as f64;
    let num_angle = ((PI / theta).round() as usize).max(1);
    // A distance step coarser than the slice still leaves one rho bin.
    let num_rho = ((((w + h) * 2 + 1) as f64 / opts.rho).round() as usize).max(1);
    let irho = 1.0 / opts.rho;
    let trig: Vec<(f32, f32)> = (0..num_angle)
        .map(|n| {
            let a = n as f64 * theta;
            ((a.cos() * irho) as f32, (a.sin() * irho) as f32)
        })
        .collect();
    let rho_offset = ((num_rho - 1) / 2) as i64;
    let rho_bin = |n: usize, x: i64, y: i64| -> usize {
        let (c, s) = trig[n];
        let r = (x as f32 * c + y as f32 * s).round() as i64 + rho_offset;
        n * num_rho + r.clamp(0, num_rho as i64 - 1) as usize
    };

    let mut accum = vec![0i32; num_angle * num_rho];
    let mut mask = vec![false; w * h];
    let mut points: Vec<(i64, i64)> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if edges.get(x, y) != 0 {
                mask[y * w + x] = true;
                points.push((x as i64, y as i64));
            }
        }
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let threshold = opts.threshold as i32;
    let gap_limit = opts.max_line_gap as i64;
    let min_len = opts.min_line_length as i64;
    let (wi, hi) = (w as i64, h as i64);

    let mut count = points.len();
    while count > 0 {
        let idx = rng.gen_range(0..count);
        let (px, py) = points[idx];
        points[idx] = points[count - 1];
        count -= 1;

        if !mask[(py * wi + px) as usize] {
            continue;
        }

        let mut max_val = threshold - 1;
        let mut max_n = 0usize;
        for n in 0..num_angle {
            let cell = &mut accum[rho_bin(n, px, py)];
            *cell += 1;
            if *cell > max_val {
                max_val = *cell;
                max_n = n;
            }
        }
        if max_val < threshold {
            continue;
        }

        // walk along the line direction (-sin, cos) of the winning angle
        let (cos_t, sin_t) = trig[max_n];
        let a = -sin_t as f64;
        let b = cos_t as f64;
        let (x_major, x0, y0, dx0, dy0) = if a.abs() > b.abs() {
            let dy0 = (b * (1i64 << SHIFT) as f64 / a.abs()).round() as i64;
            (true, px, (py << SHIFT) + (1 << (SHIFT - 1)), if a > 0.0 { 1 } else { -1 }, dy0)
        } else {
            let dx0 = (a * (1i64 << SHIFT) as f64 / b.abs()).round() as i64;
            (false, (px << SHIFT) + (1 << (SHIFT - 1)), py, dx0, if b > 0.0 { 1 } else { -1 })
        };
        let to_pixel = |x: i64, y: i64| -> (i64, i64) {
            if x_major {
                (x, y >> SHIFT)
            } else {
                (x >> SHIFT, y)
            }
        };

        let mut line_end = [(px, py); 2];
        for (k, end) in line_end.iter_mut().enumerate() {
            let (dx, dy) = if k == 0 { (dx0, dy0) } else { (-dx0, -dy0) };
            let (mut x, mut y) = (x0, y0);
            let mut gap = 0i64;
            loop {
                let (j, i) = to_pixel(x, y);
                if j < 0 || j >= wi || i < 0 || i >= hi {
                    break;
                }
                if mask[(i * wi + j) as usize] {
                    gap = 0;
                    *end = (j, i);
                } else {
                    gap += 1;
                    if gap > gap_limit {
                        break;
                    }
                }
                x += dx;
                y += dy;
            }
        }

        let good_line = (line_end[1].0 - line_end[0].0).abs() >= min_len
            || (line_end[1].1 - line_end[0].1).abs() >= min_len;

        for (k, &end) in line_end.iter().enumerate() {
            let (dx, dy) = if k == 0 { (dx0, dy0) } else { (-dx0, -dy0) };
            let (mut x, mut y) = (x0, y0);
            loop {
                let (j, i) = to_pixel(x, y);
                if j < 0 || j >= wi || i < 0 || i >= hi {
                    break;
                }
                let m = (i * wi + j) as usize;
                if mask[m] {
                    if good_line {
                        for n in 0..num_angle {
                            accum[rho_bin(n, j, i)] -= 1;
                        }
                    }
                    mask[m] = false;
                }
                if (j, i) == end {
                    break;
                }
                x += dx;
                y += dy;
            }
        }

        if good_line {
            lines.push(CandidateLine::new(
                line_end[0].0 as i32,
                line_end[0].1 as i32,
                line_end[1].0 as i32,
                line_end[1].1 as i32,
            ));
            if lines.len() >= opts.max_lines {
                break;
            }
        }
    }

    debug!("hough: {} segments from {}x{} edge map", lines.len(), w, h);
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(threshold: u32, min_len: u32) -> HoughOptions {
        HoughOptions {
            threshold,
            min_line_length: min_len,
            seed: 7,
            ..HoughOptions::default()
        }
    }

    #[test]
    fn empty_map_has_no_lines() {
        let edges = ImageU8::new(64, 32);
        assert!(probabilistic_hough(&edges, &opts(10, 10)).unwrap().is_empty());
    }

    #[test]
    fn horizontal_run_becomes_one_segment() {
        let mut edges = ImageU8::new(120, 40);
        for x in 10..110 {
            edges.set(x, 20, 255);
        }
        let lines = probabilistic_hough(&edges, &opts(30, 50)).unwrap();
        assert_eq!(lines.len(), 1);
        let l = lines[0];
        assert_eq!(l.y1, 20);
        assert_eq!(l.y2, 20);
        assert_eq!(l.x1.min(l.x2), 10);
        assert_eq!(l.x1.max(l.x2), 109);
    }

    #[test]
    fn short_run_is_rejected() {
        let mut edges = ImageU8::new(120, 40);
        for x in 10..40 {
            edges.set(x, 5, 255);
        }
        assert!(probabilistic_hough(&edges, &opts(20, 50)).unwrap().is_empty());
    }

    #[test]
    fn gap_larger_than_limit_splits_the_line() {
        let mut edges = ImageU8::new(200, 20);
        for x in (5..85).chain(95..175) {
            edges.set(x, 10, 255);
        }
        let lines = probabilistic_hough(&edges, &opts(30, 60)).unwrap();
        assert_eq!(lines.len(), 2);

        let bridged = HoughOptions {
            max_line_gap: 12,
            ..opts(30, 60)
        };
        let lines = probabilistic_hough(&edges, &bridged).unwrap();
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn same_seed_same_result() {
        let mut edges = ImageU8::new(100, 100);
        for i in 0..100 {
            edges.set(i, i, 255);
            edges.set(i, 50, 255);
        }
        let a = probabilistic_hough(&edges, &opts(20, 40)).unwrap();
        let b = probabilistic_hough(&edges, &opts(20, 40)).unwrap();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn distance_step_coarser_than_the_slice_still_votes() {
        let mut edges = ImageU8::new(8, 8);
        edges.set(3, 4, 255);
        let coarse = HoughOptions {
            rho: 100.0,
            ..opts(1, 0)
        };
        assert!(probabilistic_hough(&edges, &coarse).unwrap().len() <= 1);

        for x in 0..8 {
            edges.set(x, 6, 255);
        }
        for rho in [20.0, 40.0, 1e6] {
            let coarse = HoughOptions { rho, ..opts(3, 4) };
            assert!(probabilistic_hough(&edges, &coarse).is_ok(), "rho {rho}");
        }
    }

    #[test]
    fn zero_angle_divisions_is_invalid() {
        let edges = ImageU8::new(4, 4);
        let bad = HoughOptions {
            angle_divisions: 0,
            ..HoughOptions::default()
        };
        assert!(matches!(
            probabilistic_hough(&edges, &bad),
            Err(QcError::InvalidParameter { .. })
        ));
    }
}
