//! Applying a binary marker mask to a volume.
//!
//! [`apply`] is a single voxel-wise conjunction: a voxel survives where the
//! mask is set, or where it is clear when `invert` is true. Removing and
//! isolating markers are the two polarities of the same operation.

use crate::error::{QcError, Result};
use crate::volume::{VolumeBuffer, VoxelData};
use log::debug;
use rayon::prelude::*;

fn mask_planes<T>(data: &[T], plane_len: usize, mask: &[u8], invert: bool) -> Vec<T>
where
    T: Copy + Default + Send + Sync,
{
    let mut out = data.to_vec();
    out.par_chunks_mut(plane_len).for_each(|plane| {
        plane
            .par_iter_mut()
            .zip(mask.par_iter())
            .for_each(|(v, &m)| {
                if (m != 0) == invert {
                    *v = T::default();
                }
            });
    });
    out
}

/// Keep voxels of `volume` selected by `mask`, zero the rest.
///
/// `mask` must be a single-channel U8 volume with the same width, height and
/// depth; it is applied to every channel. The result keeps the volume's
/// shape and element type.
pub fn apply(volume: &VolumeBuffer, mask: &VolumeBuffer, invert: bool) -> Result<VolumeBuffer> {
    let data = volume.data().ok_or(QcError::EmptyVolume)?;
    let shape = volume.shape();
    let mask_shape = mask.shape();
    if shape.spatial() != mask_shape.spatial() {
        return Err(QcError::ShapeMismatch {
            volume: shape.spatial(),
            mask: mask_shape.spatial(),
        });
    }
    let bits = mask.as_u8().ok_or_else(|| QcError::InvalidParameter {
        name: "mask",
        reason: format!("expected u8 voxels, found {:?}", mask.element_type()),
    })?;
    let plane_len = shape.channel_len();
    let bits = &bits[..plane_len];

    let masked = match data {
        VoxelData::U8(v) => VoxelData::U8(mask_planes(v, plane_len, bits, invert)),
        VoxelData::U16(v) => VoxelData::U16(mask_planes(v, plane_len, bits, invert)),
        VoxelData::F32(v) => VoxelData::F32(mask_planes(v, plane_len, bits, invert)),
    };
    debug!(
        "masked {} channel(s) of {}x{}x{} (invert={invert})",
        shape.channels, shape.width, shape.height, shape.depth
    );
    VolumeBuffer::from_data(shape, masked)
}

/// Swap set and clear voxels of a U8 mask (0 <-> 255).
pub fn complement_mask(mask: &VolumeBuffer) -> Result<VolumeBuffer> {
    if mask.is_empty() {
        return Err(QcError::EmptyVolume);
    }
    let bits = mask.as_u8().ok_or_else(|| QcError::InvalidParameter {
        name: "mask",
        reason: format!("expected u8 voxels, found {:?}", mask.element_type()),
    })?;
    let flipped = bits
        .par_iter()
        .map(|&m| if m == 0 { u8::MAX } else { 0 })
        .collect();
    VolumeBuffer::from_u8(mask.shape(), flipped)
}

/// Zero every marked voxel.
pub fn remove_markers(volume: &VolumeBuffer, mask: &VolumeBuffer) -> Result<VolumeBuffer> {
    apply(volume, mask, true)
}

/// Zero every unmarked voxel.
pub fn isolate_markers(volume: &VolumeBuffer, mask: &VolumeBuffer) -> Result<VolumeBuffer> {
    apply(volume, mask, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::{ElementType, Shape};

    fn sample() -> (VolumeBuffer, VolumeBuffer) {
        let shape = Shape::new(3, 2, 2, 2);
        let data: Vec<u16> = (1..=shape.voxel_count() as u16).collect();
        let volume = VolumeBuffer::from_u16(shape, data).unwrap();
        let bits = vec![255, 0, 0, 255, 0, 255, 0, 0, 255, 255, 0, 0];
        let mask = VolumeBuffer::from_u8(Shape::volume(3, 2, 2), bits).unwrap();
        (volume, mask)
    }

    #[test]
    fn polarities_partition_the_volume() {
        let (volume, mask) = sample();
        let kept = apply(&volume, &mask, false).unwrap();
        let removed = apply(&volume, &mask, true).unwrap();
        assert_eq!(kept.element_type(), Some(ElementType::U16));
        assert_eq!(kept.shape(), volume.shape());
        let (k, r, v) = (
            kept.as_u16().unwrap(),
            removed.as_u16().unwrap(),
            volume.as_u16().unwrap(),
        );
        for i in 0..v.len() {
            assert!(k[i] == 0 || r[i] == 0);
            assert_eq!(k[i] | r[i], v[i]);
        }
    }

    #[test]
    fn mask_applies_to_every_channel() {
        let (volume, mask) = sample();
        let kept = isolate_markers(&volume, &mask).unwrap();
        let plane = volume.shape().channel_len();
        let k = kept.as_u16().unwrap();
        assert_eq!(k[0], 1);
        assert_eq!(k[plane], 1 + plane as u16);
        assert_eq!(k[1], 0);
        assert_eq!(k[plane + 1], 0);
    }

    #[test]
    fn inverted_apply_equals_apply_with_complement() {
        let (volume, mask) = sample();
        let flipped = complement_mask(&mask).unwrap();
        assert_eq!(
            remove_markers(&volume, &mask).unwrap(),
            apply(&volume, &flipped, false).unwrap()
        );
        assert_eq!(complement_mask(&flipped).unwrap(), mask);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let (volume, _) = sample();
        let mask = VolumeBuffer::zeros(Shape::volume(3, 2, 3), ElementType::U8);
        assert!(matches!(
            apply(&volume, &mask, false),
            Err(QcError::ShapeMismatch { .. })
        ));
        let wrong_type = VolumeBuffer::zeros(Shape::volume(3, 2, 2), ElementType::U16);
        assert!(apply(&volume, &wrong_type, false).is_err());
    }
}
