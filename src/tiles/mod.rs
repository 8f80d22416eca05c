//! Reassembly of directory-sharded tile trees into one contiguous volume.
//!
//! A tile root is named after its full resolution, `RES(<H>x<W>x<D>)`, and
//! holds three nested levels:
//!
//! ```text
//! RES(600x800x120)/
//!   000000/            Y band
//!     000000_000000/   X band
//!       000000_000000_000000.tif   block covering the first Z range
//!       000000_000000_000040.tif
//! ```
//!
//! No file carries its own offset. Position is implied by listing order and
//! by the extents of the blocks that came before it, so every level is sorted
//! with [`listing::natural_cmp`] before it is walked.

pub mod listing;

use crate::error::{QcError, Result};
use crate::image::io::VolumeLoader;
use crate::volume::{ElementType, Shape, VolumeBuffer};
use listing::{file_name, sorted_dirs, sorted_files};
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

const RES_TOKEN: &str = "RES(";

/// Full-volume extent parsed from a tile root name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub height: usize,
    pub width: usize,
    pub depth: usize,
}

impl Resolution {
    pub fn shape(&self) -> Shape {
        Shape::volume(self.width, self.height, self.depth)
    }

    /// Declared voxel count, `None` when it does not fit in `usize`.
    pub fn voxel_count(&self) -> Option<usize> {
        self.shape().checked_voxel_count()
    }
}

/// Parse the `RES(<H>x<W>x<D>)` token anywhere in `name`.
pub fn parse_resolution(name: &str) -> Option<Resolution> {
    let start = name.find(RES_TOKEN)? + RES_TOKEN.len();
    let len = name[start..].find(')')?;
    let mut parts = name[start..start + len].split('x').map(|p| {
        if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        p.parse::<usize>().ok()
    });
    let height = parts.next()??;
    let width = parts.next()??;
    let depth = parts.next()??;
    if parts.next().is_some() {
        return None;
    }
    Some(Resolution {
        height,
        width,
        depth,
    })
}

fn invalid_root(root: &Path, reason: impl Into<String>) -> QcError {
    QcError::InvalidTileRoot {
        path: root.to_path_buf(),
        reason: reason.into(),
    }
}

/// Validate `root` and return its declared resolution.
pub fn tile_root_resolution(root: &Path) -> Result<Resolution> {
    if !root.exists() {
        return Err(invalid_root(root, "path does not exist"));
    }
    if !root.is_dir() {
        return Err(invalid_root(root, "not a directory"));
    }
    let name = file_name(root);
    let res = parse_resolution(&name)
        .ok_or_else(|| invalid_root(root, "name lacks a RES(<H>x<W>x<D>) token"))?;
    match res.voxel_count() {
        None => Err(invalid_root(root, "declared resolution overflows the voxel count")),
        Some(0) => Err(invalid_root(root, "declared resolution has no voxels")),
        Some(_) => Ok(res),
    }
}

/// Rebuild the full volume stored under `root`.
///
/// Blocks are loaded one at a time and dropped right after their rows are
/// copied. Any failure discards the partially filled output.
pub fn reassemble(
    root: &Path,
    loader: &dyn VolumeLoader,
    element_type: ElementType,
) -> Result<VolumeBuffer> {
    let res = tile_root_resolution(root)?;
    let shape = res.shape();
    info!(
        "reassembling {} into {}x{}x{} ({})",
        root.display(),
        shape.width,
        shape.height,
        shape.depth,
        element_type
    );
    let mut volume = VolumeBuffer::try_zeros(shape, element_type).map_err(|e| match e {
        QcError::InvalidParameter { reason, .. } => invalid_root(root, reason),
        other => other,
    })?;

    let mut y_off = 0usize;
    for y_band in sorted_dirs(root)? {
        let mut x_off = 0usize;
        let mut band_height = 0usize;
        for x_band in sorted_dirs(&y_band)? {
            let mut z_off = 0usize;
            let mut block_extent = (0usize, 0usize);
            for block_path in sorted_files(&x_band)? {
                let block = load_block(&block_path, loader, element_type)?;
                let bs = block.shape();
                if x_off + bs.width > shape.width
                    || y_off + bs.height > shape.height
                    || z_off + bs.depth > shape.depth
                {
                    return Err(QcError::BlockOutOfBounds {
                        path: block_path,
                        x: x_off,
                        y: y_off,
                        z: z_off,
                    });
                }
                volume.paste(&block, (x_off, y_off, z_off))?;
                debug!(
                    "block {} ({}x{}x{}) at ({x_off}, {y_off}, {z_off})",
                    block_path.display(),
                    bs.width,
                    bs.height,
                    bs.depth
                );
                z_off += bs.depth;
                block_extent = (bs.width, bs.height);
            }
            x_off += block_extent.0;
            band_height = block_extent.1;
        }
        debug!("y band {} done, height {band_height}", y_band.display());
        y_off += band_height;
    }

    Ok(volume)
}

fn load_block(
    path: &Path,
    loader: &dyn VolumeLoader,
    element_type: ElementType,
) -> Result<VolumeBuffer> {
    let block = loader.load(path).map_err(|source| QcError::BlockLoadFailed {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;
    match block.element_type() {
        None => Err(QcError::BlockLoadFailed {
            path: path.to_path_buf(),
            source: Box::new(QcError::EmptyVolume),
        }),
        Some(found) if found != element_type => Err(QcError::InconsistentElementType {
            path: path.to_path_buf(),
            expected: element_type,
            found,
        }),
        Some(_) => Ok(block),
    }
}

/// Pick the tile root with the fewest voxels among the children of `dir`.
///
/// Children whose names lack a resolution token, or declare one whose voxel
/// count overflows, are ignored.
pub fn find_lowest_resolution(dir: &Path) -> Result<PathBuf> {
    sorted_dirs(dir)?
        .into_iter()
        .filter_map(|p| {
            let voxels = parse_resolution(&file_name(&p))?.voxel_count();
            if voxels.is_none() {
                warn!("skipping {}: resolution overflows", p.display());
            }
            Some((voxels?, p))
        })
        .min_by_key(|(voxels, _)| *voxels)
        .map(|(_, p)| p)
        .ok_or_else(|| invalid_root(dir, "no RES(<H>x<W>x<D>) sub-directory"))
}
