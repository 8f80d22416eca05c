use tera_qc::{Shape, VolumeBuffer};

/// One-pixel line from `a` to `b` (inclusive), stepping along the major axis.
pub fn draw_line_u16(
    data: &mut [u16],
    width: usize,
    a: (usize, usize),
    b: (usize, usize),
    value: u16,
) {
    let (x0, y0) = (a.0 as f64, a.1 as f64);
    let (x1, y1) = (b.0 as f64, b.1 as f64);
    let steps = (x1 - x0).abs().max((y1 - y0).abs()) as usize;
    for i in 0..=steps {
        let t = if steps == 0 { 0.0 } else { i as f64 / steps as f64 };
        let x = (x0 + t * (x1 - x0)).round() as usize;
        let y = (y0 + t * (y1 - y0)).round() as usize;
        data[y * width + x] = value;
    }
}

/// Flat U16 volume with the given one-pixel lines drawn on the listed slices.
pub struct SeamVolume {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub background: u16,
    pub lines: Vec<((usize, usize), (usize, usize))>,
    pub value: u16,
    /// Slices left without lines.
    pub skip_slices: Vec<usize>,
}

impl SeamVolume {
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
            background: 1000,
            lines: Vec::new(),
            value: 30000,
            skip_slices: Vec::new(),
        }
    }

    pub fn line(mut self, a: (usize, usize), b: (usize, usize)) -> Self {
        self.lines.push((a, b));
        self
    }

    pub fn skip(mut self, z: usize) -> Self {
        self.skip_slices.push(z);
        self
    }

    pub fn build(&self) -> VolumeBuffer {
        let shape = Shape::volume(self.width, self.height, self.depth);
        let mut data = vec![self.background; shape.voxel_count()];
        for (z, slice) in data.chunks_mut(shape.slice_len()).enumerate() {
            if self.skip_slices.contains(&z) {
                continue;
            }
            for &(a, b) in &self.lines {
                draw_line_u16(slice, self.width, a, b, self.value);
            }
        }
        VolumeBuffer::from_u16(shape, data).expect("synthetic volume")
    }
}

/// Non-zero voxels of a U8 mask slice with `y` in `rows`.
pub fn marked_in_rows(
    mask: &VolumeBuffer,
    z: usize,
    rows: std::ops::Range<usize>,
) -> usize {
    let shape = mask.shape();
    let bits = mask.as_u8().expect("u8 mask");
    rows.map(|y| {
        (0..shape.width)
            .filter(|&x| bits[shape.index(x, y, z, 0)] != 0)
            .count()
    })
    .sum()
}
