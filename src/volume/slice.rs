use super::{Shape, VolumeBuffer, VoxelData};
use crate::error::{QcError, Result};
use crate::image::{ImageF32, ImageU8};

impl VolumeBuffer {
    /// Extract XY slice `z` of channel `c`, widened to f32.
    pub fn slice_f32(&self, z: usize, c: usize) -> Result<ImageF32> {
        let shape = self.shape();
        let data = self.data().ok_or(QcError::EmptyVolume)?;
        check_slice(shape, z, c)?;
        let start = shape.index(0, 0, z, c);
        let len = shape.slice_len();
        let values: Vec<f32> = match data {
            VoxelData::U8(v) => v[start..start + len].iter().map(|&p| p as f32).collect(),
            VoxelData::U16(v) => v[start..start + len].iter().map(|&p| p as f32).collect(),
            VoxelData::F32(v) => v[start..start + len].to_vec(),
        };
        Ok(ImageF32 {
            w: shape.width,
            h: shape.height,
            stride: shape.width,
            data: values,
        })
    }

    /// Extract XY slice `z` of a U8 volume as an owned image.
    pub fn slice_u8(&self, z: usize, c: usize) -> Result<ImageU8> {
        let shape = self.shape();
        check_slice(shape, z, c)?;
        let data = self.as_u8().ok_or_else(|| QcError::InvalidParameter {
            name: "volume",
            reason: format!("expected u8 voxels, found {:?}", self.element_type()),
        })?;
        let start = shape.index(0, 0, z, c);
        Ok(ImageU8 {
            w: shape.width,
            h: shape.height,
            stride: shape.width,
            data: data[start..start + shape.slice_len()].to_vec(),
        })
    }
}

fn check_slice(shape: Shape, z: usize, c: usize) -> Result<()> {
    if z >= shape.depth || c >= shape.channels {
        return Err(QcError::InvalidParameter {
            name: "slice",
            reason: format!(
                "slice (z={z}, c={c}) outside depth {} / channels {}",
                shape.depth, shape.channels
            ),
        });
    }
    Ok(())
}

/// Min-max stretch of a float image into 0..=255.
///
/// A constant image maps to all zeros.
pub fn normalize_to_u8(img: &ImageF32) -> ImageU8 {
    let (lo, hi) = img
        .data
        .iter()
        .filter(|v| v.is_finite())
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let mut out = ImageU8::new(img.w, img.h);
    let range = hi - lo;
    if !range.is_finite() || range <= 0.0 {
        return out;
    }
    let scale = 255.0 / range;
    for (dst, &src) in out.data.iter_mut().zip(&img.data) {
        *dst = ((src - lo) * scale).round().clamp(0.0, 255.0) as u8;
    }
    out
}
