//! I/O seams for volumes plus JSON helpers.
//!
//! - [`VolumeLoader`]: turns a path into a [`VolumeBuffer`]; closures qualify.
//! - [`ImageFileLoader`]: default loader for 8/16-bit and float images.
//! - [`VolumeWriter`] / [`SliceDirWriter`]: persist a volume as one image per slice.
//! - [`load_slice_stack`]: stack a directory of single-slice images along Z.
//! - `save_image_u8`, `write_json_file`: debugging artefacts.
use super::{ImageU8, ImageView};
use crate::error::{QcError, Result};
use crate::tiles::listing::sorted_files;
use crate::volume::{normalize_to_u8, ElementType, Shape, VolumeBuffer, VoxelData};
use image::{DynamicImage, ImageBuffer, Luma};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Source of volumes (tile blocks, single images).
pub trait VolumeLoader {
    fn load(&self, path: &Path) -> Result<VolumeBuffer>;
}

impl<F> VolumeLoader for F
where
    F: Fn(&Path) -> Result<VolumeBuffer>,
{
    fn load(&self, path: &Path) -> Result<VolumeBuffer> {
        self(path)
    }
}

/// Sink for finished volumes.
pub trait VolumeWriter {
    fn save(&self, path: &Path, volume: &VolumeBuffer) -> Result<()>;
}

/// Decodes a 2D grayscale image into a depth-1, single-channel volume.
///
/// 8-bit grayscale decodes to U8, 16-bit grayscale to U16 and 32-bit float
/// images to F32. Colour images are converted to luminance at their native
/// bit depth.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileLoader;

impl VolumeLoader for ImageFileLoader {
    fn load(&self, path: &Path) -> Result<VolumeBuffer> {
        let img = image::open(path).map_err(|e| QcError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let (w, h) = (img.width() as usize, img.height() as usize);
        let shape = Shape::volume(w, h, 1);
        let data = luminance(img);
        debug!(
            "loaded {} ({}x{}, {})",
            path.display(),
            w,
            h,
            data.element_type()
        );
        VolumeBuffer::from_data(shape, data)
    }
}

/// Native-depth luminance of a decoded image.
fn luminance(img: DynamicImage) -> VoxelData {
    match img {
        DynamicImage::ImageLuma8(buf) => VoxelData::U8(buf.into_raw()),
        DynamicImage::ImageLuma16(buf) => VoxelData::U16(buf.into_raw()),
        eight_bit @ (DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_)) => VoxelData::U8(eight_bit.into_luma8().into_raw()),
        float @ (DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_)) => {
            VoxelData::F32(float.to_luma32f().into_raw())
        }
        other => VoxelData::U16(other.into_luma16().into_raw()),
    }
}

/// Writes a volume as numbered PNG slices into a directory.
///
/// U8 and U16 voxels are written at their native depth; F32 slices are
/// min-max stretched to 8 bits. Multi-channel volumes get one file per
/// channel and slice, see [`SliceDirWriter::channel_slice_path`].
#[derive(Clone, Debug)]
pub struct SliceDirWriter {
    pub prefix: String,
}

impl Default for SliceDirWriter {
    fn default() -> Self {
        Self {
            prefix: "slice".to_string(),
        }
    }
}

impl SliceDirWriter {
    pub fn slice_path(&self, dir: &Path, z: usize) -> PathBuf {
        dir.join(format!("{}_{z:05}.png", self.prefix))
    }

    pub fn channel_slice_path(&self, dir: &Path, c: usize, z: usize) -> PathBuf {
        dir.join(format!("{}_c{c}_{z:05}.png", self.prefix))
    }

    fn slice_image(
        volume: &VolumeBuffer,
        data: &VoxelData,
        z: usize,
        c: usize,
        out: &Path,
    ) -> Result<DynamicImage> {
        let shape = volume.shape();
        let (w, h) = (shape.width as u32, shape.height as u32);
        let start = shape.index(0, 0, z, c);
        let range = start..start + shape.slice_len();
        let image = match data {
            VoxelData::U8(v) => ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(w, h, v[range].to_vec())
                .map(DynamicImage::ImageLuma8),
            VoxelData::U16(v) => ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w, h, v[range].to_vec())
                .map(DynamicImage::ImageLuma16),
            VoxelData::F32(_) => {
                let stretched = normalize_to_u8(&volume.slice_f32(z, c)?);
                ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(w, h, stretched.data)
                    .map(DynamicImage::ImageLuma8)
            }
        };
        image.ok_or_else(|| QcError::Save {
            path: out.to_path_buf(),
            reason: "slice buffer does not match its dimensions".to_string(),
        })
    }
}

impl VolumeWriter for SliceDirWriter {
    fn save(&self, path: &Path, volume: &VolumeBuffer) -> Result<()> {
        let data = volume.data().ok_or(QcError::EmptyVolume)?;
        let shape = volume.shape();
        fs::create_dir_all(path).map_err(|e| save_error(path, e))?;
        for c in 0..shape.channels {
            for z in 0..shape.depth {
                let out = if shape.channels == 1 {
                    self.slice_path(path, z)
                } else {
                    self.channel_slice_path(path, c, z)
                };
                let image = Self::slice_image(volume, data, z, c, &out)?;
                image.save(&out).map_err(|e| save_error(&out, e))?;
            }
        }
        debug!(
            "wrote {} slices x {} channels to {}",
            shape.depth,
            shape.channels,
            path.display()
        );
        Ok(())
    }
}

/// Load every file of `dir` (natural name order) as one Z slice.
///
/// All slices must share width, height and `element_type`.
pub fn load_slice_stack(
    dir: &Path,
    loader: &dyn VolumeLoader,
    element_type: ElementType,
) -> Result<VolumeBuffer> {
    let files = sorted_files(dir)?;
    if files.is_empty() {
        return Err(QcError::Load {
            path: dir.to_path_buf(),
            reason: "directory holds no slice images".to_string(),
        });
    }

    let mut volume = VolumeBuffer::new();
    for (z, file) in files.iter().enumerate() {
        let slice = loader.load(file)?;
        let found = slice.element_type().ok_or(QcError::EmptyVolume)?;
        if found != element_type {
            return Err(QcError::InconsistentElementType {
                path: file.clone(),
                expected: element_type,
                found,
            });
        }
        let s = slice.shape();
        if volume.is_empty() {
            volume.allocate(Shape::volume(s.width, s.height, files.len()), element_type);
        }
        let target = volume.shape();
        if s.width != target.width || s.height != target.height || s.depth != 1 {
            return Err(QcError::Load {
                path: file.clone(),
                reason: format!(
                    "slice is {}x{}x{}, expected {}x{}x1",
                    s.width, s.height, s.depth, target.width, target.height
                ),
            });
        }
        volume.paste(&slice, (0, 0, z))?;
    }
    debug!("stacked {} slices from {}", files.len(), dir.display());
    Ok(volume)
}

/// Save an 8-bit image as PNG, creating parent directories.
pub fn save_image_u8(img: &ImageU8, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut raw = Vec::with_capacity(img.w * img.h);
    for row in img.rows() {
        raw.extend_from_slice(row);
    }
    let buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_raw(img.w as u32, img.h as u32, raw).ok_or_else(|| QcError::Save {
            path: path.to_path_buf(),
            reason: "failed to create image buffer".to_string(),
        })?;
    buffer.save(path).map_err(|e| save_error(path, e))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| save_error(path, e))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| save_error(parent, e))?;
        }
    }
    Ok(())
}

fn save_error(path: &Path, err: impl std::fmt::Display) -> QcError {
    QcError::Save {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}
