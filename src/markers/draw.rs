//! Thick line rasterisation into 8-bit slices.

/// Distance from `p` to the segment `a`-`b`.
#[inline]
fn distance_to_segment(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let (abx, aby) = (b[0] - a[0], b[1] - a[1]);
    let (apx, apy) = (p[0] - a[0], p[1] - a[1]);
    let len2 = abx * abx + aby * aby;
    let t = if len2 > 0.0 {
        ((apx * abx + apy * aby) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (dx, dy) = (apx - t * abx, apy - t * aby);
    dx.hypot(dy)
}

/// Paint every pixel whose centre lies within `width / 2` of the segment
/// `a`-`b` (a capsule with round caps). Endpoints may lie outside the image;
/// the stroke is clipped.
pub fn draw_thick_line(
    dst: &mut [u8],
    w: usize,
    h: usize,
    a: [f64; 2],
    b: [f64; 2],
    width: u32,
    value: u8,
) {
    if w == 0 || h == 0 {
        return;
    }
    let radius = width.max(1) as f64 / 2.0;
    let x_lo = (a[0].min(b[0]) - radius).floor().max(0.0);
    let x_hi = (a[0].max(b[0]) + radius).ceil().min((w - 1) as f64);
    let y_lo = (a[1].min(b[1]) - radius).floor().max(0.0);
    let y_hi = (a[1].max(b[1]) + radius).ceil().min((h - 1) as f64);
    if !(x_lo <= x_hi && y_lo <= y_hi) {
        return;
    }
    for y in y_lo as usize..=y_hi as usize {
        let row = &mut dst[y * w..(y + 1) * w];
        for x in x_lo as usize..=x_hi as usize {
            if distance_to_segment([x as f64, y as f64], a, b) <= radius {
                row[x] = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_stroke_has_requested_width() {
        let (w, h) = (20, 9);
        let mut img = vec![0u8; w * h];
        draw_thick_line(&mut img, w, h, [3.0, 4.0], [15.0, 4.0], 3, 255);
        let column: Vec<u8> = (0..h).map(|y| img[y * w + 9]).collect();
        assert_eq!(column, vec![0, 0, 0, 255, 255, 255, 0, 0, 0]);
        // round caps reach one pixel past each endpoint
        assert_eq!(img[4 * w + 2], 255);
        assert_eq!(img[4 * w + 1], 0);
        assert_eq!(img[4 * w + 16], 255);
        assert_eq!(img[4 * w + 17], 0);
    }

    #[test]
    fn stroke_is_clipped_to_the_image() {
        let (w, h) = (10, 10);
        let mut img = vec![0u8; w * h];
        draw_thick_line(&mut img, w, h, [-20.0, 5.0], [30.0, 5.0], 1, 7);
        assert!((0..w).all(|x| img[5 * w + x] == 7));
        assert_eq!(img.iter().filter(|&&v| v != 0).count(), w);

        let mut img = vec![0u8; w * h];
        draw_thick_line(&mut img, w, h, [-20.0, -20.0], [-10.0, -30.0], 3, 7);
        assert!(img.iter().all(|&v| v == 0));
    }
}
