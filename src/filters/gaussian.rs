use super::reflect_101;
use crate::image::{ImageF32, ImageView, ImageViewMut};

/// Trait implemented by separable 1D filters applied along rows then columns.
pub trait SeparableFilter {
    /// The 1D taps in left-to-right order; the centre tap sits at `len / 2`.
    fn taps(&self) -> &[f32];
}

/// Sampled, normalised Gaussian.
#[derive(Clone, Debug, PartialEq)]
pub struct GaussianKernel {
    sigma: f64,
    taps: Vec<f32>,
}

impl GaussianKernel {
    /// Kernel with `size` taps (forced odd) for standard deviation `sigma`.
    pub fn new(size: usize, sigma: f64) -> Self {
        let size = if size % 2 == 0 { size + 1 } else { size };
        let centre = (size / 2) as f64;
        let denom = 2.0 * sigma * sigma;
        let raw: Vec<f64> = (0..size)
            .map(|i| {
                let d = i as f64 - centre;
                (-(d * d) / denom).exp()
            })
            .collect();
        let sum: f64 = raw.iter().sum();
        let taps = raw.iter().map(|&v| (v / sum) as f32).collect();
        Self { sigma, taps }
    }

    /// Kernel spanning `|3 * sigma|` samples, bumped to the next odd size.
    pub fn for_sigma(sigma: f64) -> Self {
        Self::new((3.0 * sigma).abs() as usize, sigma)
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl SeparableFilter for GaussianKernel {
    #[inline]
    fn taps(&self) -> &[f32] {
        &self.taps
    }
}

/// Convolve rows then columns with `filter`, mirroring at the borders.
pub fn apply<F: SeparableFilter + ?Sized>(filter: &F, src: &ImageF32) -> ImageF32 {
    let taps = filter.taps();
    let (w, h) = (src.w, src.h);
    if w == 0 || h == 0 || taps.len() <= 1 {
        return src.clone();
    }
    let half = (taps.len() / 2) as isize;

    let mut tmp = ImageF32::new(w, h);
    for y in 0..h {
        let row = src.row(y);
        let out = tmp.row_mut(y);
        for (x, dst) in out.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, &t) in taps.iter().enumerate() {
                let sx = reflect_101(x as isize + k as isize - half, w);
                acc += t * row[sx];
            }
            *dst = acc;
        }
    }

    let mut out = ImageF32::new(w, h);
    for y in 0..h {
        let rows: Vec<&[f32]> = (0..taps.len())
            .map(|k| tmp.row(reflect_101(y as isize + k as isize - half, h)))
            .collect();
        let dst = out.row_mut(y);
        for (x, px) in dst.iter_mut().enumerate() {
            *px = taps.iter().zip(&rows).map(|(&t, r)| t * r[x]).sum();
        }
    }
    out
}

/// Gaussian smoothing with the `|3 * sigma|` kernel size rule; identity for
/// `sigma <= 0`.
pub fn gaussian_blur(src: &ImageF32, sigma: f64) -> ImageF32 {
    if sigma <= 0.0 {
        return src.clone();
    }
    apply(&GaussianKernel::for_sigma(sigma), src)
}
