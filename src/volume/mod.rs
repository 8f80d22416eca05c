//! Owned 4D voxel buffer shared by every pipeline stage.
//!
//! A [`VolumeBuffer`] holds `width × height × depth × channels` elements of a
//! single [`ElementType`] in one contiguous allocation, or nothing at all.
//! There is no intermediate state: storage is either absent (empty buffer) or
//! sized exactly for the current shape.
//!
//! Layout is channel-major planes, then slices, then rows:
//! `index = ((c * depth + z) * height + y) * width + x`.

mod slice;

pub use slice::normalize_to_u8;

use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Pixel element type of a volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    U8,
    U16,
    F32,
}

impl ElementType {
    /// Size of one element in bytes.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            ElementType::U8 => 1,
            ElementType::U16 => 2,
            ElementType::F32 => 4,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::U8 => "u8",
            ElementType::U16 => "u16",
            ElementType::F32 => "f32",
        };
        f.write_str(name)
    }
}

impl FromStr for ElementType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u8" | "uint8" | "8" => Ok(ElementType::U8),
            "u16" | "uint16" | "16" => Ok(ElementType::U16),
            "f32" | "float32" | "32" => Ok(ElementType::F32),
            other => Err(format!("unknown element type `{other}`")),
        }
    }
}

/// Extent of a volume along its four axes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
    pub channels: usize,
}

impl Shape {
    pub const fn new(width: usize, height: usize, depth: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            depth,
            channels,
        }
    }

    /// Single-channel shape.
    pub const fn volume(width: usize, height: usize, depth: usize) -> Self {
        Self::new(width, height, depth, 1)
    }

    pub const fn voxel_count(&self) -> usize {
        self.width * self.height * self.depth * self.channels
    }

    /// `voxel_count`, or `None` when the product does not fit in `usize`.
    pub fn checked_voxel_count(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)?
            .checked_mul(self.depth)?
            .checked_mul(self.channels)
    }

    /// Number of elements in one XY slice of one channel.
    pub const fn slice_len(&self) -> usize {
        self.width * self.height
    }

    /// Number of elements in one channel.
    pub const fn channel_len(&self) -> usize {
        self.width * self.height * self.depth
    }

    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.depth == 0 || self.channels == 0
    }

    /// Spatial extent `(width, height, depth)`, ignoring channels.
    pub const fn spatial(&self) -> (usize, usize, usize) {
        (self.width, self.height, self.depth)
    }

    #[inline]
    pub const fn index(&self, x: usize, y: usize, z: usize, c: usize) -> usize {
        ((c * self.depth + z) * self.height + y) * self.width + x
    }
}

/// Typed backing storage.
#[derive(Clone, Debug, PartialEq)]
pub enum VoxelData {
    U8(Vec<u8>),
    U16(Vec<u16>),
    F32(Vec<f32>),
}

impl VoxelData {
    pub fn zeros(element_type: ElementType, len: usize) -> Self {
        match element_type {
            ElementType::U8 => VoxelData::U8(vec![0; len]),
            ElementType::U16 => VoxelData::U16(vec![0; len]),
            ElementType::F32 => VoxelData::F32(vec![0.0; len]),
        }
    }

    /// Like [`VoxelData::zeros`], but reports a failed allocation instead of
    /// aborting.
    pub fn try_zeros(element_type: ElementType, len: usize) -> Result<Self> {
        fn filled<T: Copy>(len: usize, zero: T) -> Result<Vec<T>> {
            let mut v = Vec::new();
            v.try_reserve_exact(len).map_err(|e| QcError::InvalidParameter {
                name: "shape",
                reason: format!("cannot allocate {len} elements: {e}"),
            })?;
            v.resize(len, zero);
            Ok(v)
        }
        Ok(match element_type {
            ElementType::U8 => VoxelData::U8(filled(len, 0)?),
            ElementType::U16 => VoxelData::U16(filled(len, 0)?),
            ElementType::F32 => VoxelData::F32(filled(len, 0.0)?),
        })
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            VoxelData::U8(_) => ElementType::U8,
            VoxelData::U16(_) => ElementType::U16,
            VoxelData::F32(_) => ElementType::F32,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VoxelData::U8(v) => v.len(),
            VoxelData::U16(v) => v.len(),
            VoxelData::F32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index` widened to `f32`.
    #[inline]
    pub fn get_f32(&self, index: usize) -> f32 {
        match self {
            VoxelData::U8(v) => v[index] as f32,
            VoxelData::U16(v) => v[index] as f32,
            VoxelData::F32(v) => v[index],
        }
    }
}

/// Exclusively owned volume with shape and element type.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VolumeBuffer {
    shape: Shape,
    data: Option<VoxelData>,
}

impl VolumeBuffer {
    /// Empty buffer with no storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-initialised buffer of the given shape and type.
    pub fn zeros(shape: Shape, element_type: ElementType) -> Self {
        let mut volume = Self::new();
        volume.allocate(shape, element_type);
        volume
    }

    /// Zeroed buffer whose storage is allocated fallibly.
    ///
    /// Fails with `InvalidParameter` when the voxel or byte count of `shape`
    /// overflows `usize` or the allocator refuses the request.
    pub fn try_zeros(shape: Shape, element_type: ElementType) -> Result<Self> {
        let voxels = shape
            .checked_voxel_count()
            .filter(|n| n.checked_mul(element_type.size()).is_some())
            .ok_or_else(|| QcError::InvalidParameter {
                name: "shape",
                reason: format!("{shape:?} of {element_type} overflows the address space"),
            })?;
        if voxels == 0 {
            return Ok(Self::new());
        }
        Ok(Self {
            shape,
            data: Some(VoxelData::try_zeros(element_type, voxels)?),
        })
    }

    /// Wrap existing storage; its length must match `shape`.
    pub fn from_data(shape: Shape, data: VoxelData) -> Result<Self> {
        if shape.checked_voxel_count() != Some(data.len()) {
            return Err(QcError::InvalidParameter {
                name: "data",
                reason: format!("expected {:?} to hold {} elements", shape, data.len()),
            });
        }
        if shape.is_empty() {
            return Ok(Self::new());
        }
        Ok(Self {
            shape,
            data: Some(data),
        })
    }

    pub fn from_u8(shape: Shape, data: Vec<u8>) -> Result<Self> {
        Self::from_data(shape, VoxelData::U8(data))
    }

    pub fn from_u16(shape: Shape, data: Vec<u16>) -> Result<Self> {
        Self::from_data(shape, VoxelData::U16(data))
    }

    pub fn from_f32(shape: Shape, data: Vec<f32>) -> Result<Self> {
        Self::from_data(shape, VoxelData::F32(data))
    }

    /// Replace any existing storage with a zeroed buffer for `shape`.
    ///
    /// A zero-voxel shape leaves the buffer empty.
    pub fn allocate(&mut self, shape: Shape, element_type: ElementType) {
        self.release();
        if shape.is_empty() {
            return;
        }
        self.data = Some(VoxelData::zeros(element_type, shape.voxel_count()));
        self.shape = shape;
    }

    /// Drop the storage and reset the shape.
    pub fn release(&mut self) {
        self.data = None;
        self.shape = Shape::default();
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none()
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn element_type(&self) -> Option<ElementType> {
        self.data.as_ref().map(VoxelData::element_type)
    }

    /// Size of the storage in bytes (0 when empty).
    pub fn byte_len(&self) -> usize {
        self.data
            .as_ref()
            .map_or(0, |d| d.len() * d.element_type().size())
    }

    pub fn data(&self) -> Option<&VoxelData> {
        self.data.as_ref()
    }

    pub fn data_mut(&mut self) -> Option<&mut VoxelData> {
        self.data.as_mut()
    }

    pub fn into_data(self) -> Option<VoxelData> {
        self.data
    }

    pub fn as_u8(&self) -> Option<&[u8]> {
        match &self.data {
            Some(VoxelData::U8(v)) => Some(v),
            _ => None,
        }
    }

    pub fn as_u8_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.data {
            Some(VoxelData::U8(v)) => Some(v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<&[u16]> {
        match &self.data {
            Some(VoxelData::U16(v)) => Some(v),
            _ => None,
        }
    }

    pub fn as_u16_mut(&mut self) -> Option<&mut [u16]> {
        match &mut self.data {
            Some(VoxelData::U16(v)) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.data {
            Some(VoxelData::F32(v)) => Some(v),
            _ => None,
        }
    }

    /// Copy channel 0 of `block` into channel 0 of `self` at `offset`.
    ///
    /// Both buffers must hold the same element type and the block must fit.
    pub fn paste(&mut self, block: &VolumeBuffer, offset: (usize, usize, usize)) -> Result<()> {
        let dst_shape = self.shape;
        let src_shape = block.shape;
        let (x, y, z) = offset;
        if x + src_shape.width > dst_shape.width
            || y + src_shape.height > dst_shape.height
            || z + src_shape.depth > dst_shape.depth
        {
            return Err(QcError::InvalidParameter {
                name: "offset",
                reason: format!("block {src_shape:?} at {offset:?} exceeds {dst_shape:?}"),
            });
        }
        match (self.data.as_mut(), block.data.as_ref()) {
            (Some(VoxelData::U8(dst)), Some(VoxelData::U8(src))) => {
                copy_block_rows(dst, dst_shape, src, src_shape, offset)
            }
            (Some(VoxelData::U16(dst)), Some(VoxelData::U16(src))) => {
                copy_block_rows(dst, dst_shape, src, src_shape, offset)
            }
            (Some(VoxelData::F32(dst)), Some(VoxelData::F32(src))) => {
                copy_block_rows(dst, dst_shape, src, src_shape, offset)
            }
            (None, _) | (_, None) => return Err(QcError::EmptyVolume),
            _ => {
                return Err(QcError::InvalidParameter {
                    name: "block",
                    reason: format!(
                        "element type {:?} does not match {:?}",
                        block.element_type(),
                        self.element_type()
                    ),
                })
            }
        }
        Ok(())
    }

    /// Voxel value widened to `f32`, `None` when out of range or empty.
    pub fn get_f32(&self, x: usize, y: usize, z: usize, c: usize) -> Option<f32> {
        let s = self.shape;
        if x >= s.width || y >= s.height || z >= s.depth || c >= s.channels {
            return None;
        }
        self.data.as_ref().map(|d| d.get_f32(s.index(x, y, z, c)))
    }
}

/// Copy `src` rows into `dst` at a 3D offset, one contiguous row at a time.
///
/// Rows of a narrower block are not contiguous in the destination, so each
/// `(z, y)` row of the block is copied separately. Only channel 0 of both
/// buffers is addressed. The caller guarantees the block fits.
fn copy_block_rows<T: Copy>(
    dst: &mut [T],
    dst_shape: Shape,
    src: &[T],
    src_shape: Shape,
    offset: (usize, usize, usize),
) {
    let (x_off, y_off, z_off) = offset;
    let row_len = src_shape.width;
    for z in 0..src_shape.depth {
        for y in 0..src_shape.height {
            let src_start = src_shape.index(0, y, z, 0);
            let dst_start = dst_shape.index(x_off, y_off + y, z_off + z, 0);
            dst[dst_start..dst_start + row_len].copy_from_slice(&src[src_start..src_start + row_len]);
        }
    }
}
