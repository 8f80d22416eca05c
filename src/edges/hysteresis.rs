//! Seeded double-threshold linking of suppressed magnitudes.
use crate::image::{ImageF32, ImageU8};
use std::collections::VecDeque;

/// Link edges from seeds above `high` through any surviving neighbour.
///
/// - values `> high` seed a breadth-first growth over the 8-neighbourhood;
/// - values `< low` are discarded before growth starts;
/// - the growth promotes every non-zero neighbour reached from a seed;
/// - pixels never reached are cleared and reached ones become 255.
pub fn hysteresis(nms: &ImageF32, low: f32, high: f32) -> ImageU8 {
    let (w, h) = (nms.w, nms.h);
    let mut out = ImageU8::new(w, h);
    let mut alive: Vec<bool> = nms.data.iter().map(|&v| v != 0.0 && v >= low).collect();
    let mut queue = VecDeque::new();

    for (i, &v) in nms.data.iter().enumerate() {
        if v > high {
            out.data[i] = 255;
            queue.push_back((i % w, i / w));
        }
    }

    while let Some((x, y)) = queue.pop_front() {
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                let nx = x as isize + dx;
                let ny = y as isize + dy;
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let i = ny as usize * w + nx as usize;
                if out.data[i] == 255 || !alive[i] {
                    continue;
                }
                out.data[i] = 255;
                alive[i] = false;
                queue.push_back((nx as usize, ny as usize));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_pixels_need_a_strong_path() {
        let row = vec![0.0, 9.0, 5.0, 5.0, 0.0, 5.0, 2.0, 0.0];
        let nms = ImageF32::from_vec(8, 1, row).unwrap();
        let edges = hysteresis(&nms, 3.0, 8.0);
        assert_eq!(edges.data, vec![0, 255, 255, 255, 0, 0, 0, 0]);
    }

    #[test]
    fn below_low_breaks_the_chain() {
        let row = vec![9.0, 2.0, 5.0];
        let nms = ImageF32::from_vec(3, 1, row).unwrap();
        let edges = hysteresis(&nms, 3.0, 8.0);
        assert_eq!(edges.data, vec![255, 0, 0]);
    }

    #[test]
    fn diagonal_neighbours_link() {
        let mut nms = ImageF32::new(3, 3);
        nms.set(0, 0, 10.0);
        nms.set(1, 1, 4.0);
        nms.set(2, 2, 4.0);
        let edges = hysteresis(&nms, 3.0, 8.0);
        assert_eq!(edges.count_nonzero(), 3);
    }
}
