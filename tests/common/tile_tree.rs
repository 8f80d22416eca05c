use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tera_qc::{QcError, Result, Shape, VolumeBuffer};

/// Tile tree on disk whose block files are empty placeholders; the blocks
/// themselves live in memory and are served by [`TileTree::loader`].
pub struct TileTree {
    pub dir: TempDir,
    pub brain: PathBuf,
    pub root: PathBuf,
    blocks: HashMap<PathBuf, VolumeBuffer>,
}

impl TileTree {
    /// `<tmp>/brain/<root_name>`.
    pub fn new(root_name: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let brain = dir.path().join("brain");
        let root = brain.join(root_name);
        fs::create_dir_all(&root).expect("create tile root");
        Self {
            dir,
            brain,
            root,
            blocks: HashMap::new(),
        }
    }

    pub fn add_block(
        &mut self,
        y_band: &str,
        x_band: &str,
        file: &str,
        block: VolumeBuffer,
    ) -> PathBuf {
        let band = self.root.join(y_band).join(x_band);
        fs::create_dir_all(&band).expect("create band");
        let path = band.join(file);
        fs::write(&path, b"").expect("create block file");
        self.blocks.insert(path.clone(), block);
        path
    }

    pub fn loader(&self) -> impl Fn(&Path) -> Result<VolumeBuffer> + Send + Sync + 'static {
        let blocks = Arc::new(self.blocks.clone());
        move |path: &Path| {
            blocks.get(path).cloned().ok_or_else(|| QcError::Load {
                path: path.to_path_buf(),
                reason: "no such block".to_string(),
            })
        }
    }
}

pub fn constant_u16(width: usize, height: usize, depth: usize, value: u16) -> VolumeBuffer {
    let shape = Shape::volume(width, height, depth);
    VolumeBuffer::from_u16(shape, vec![value; shape.voxel_count()]).expect("block")
}

/// Block whose voxel at (x, y, z) encodes its position.
pub fn coded_u16(width: usize, height: usize, depth: usize, base: u16) -> VolumeBuffer {
    let shape = Shape::volume(width, height, depth);
    let mut data = Vec::with_capacity(shape.voxel_count());
    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                data.push(base + (z * 100 + y * 10 + x) as u16);
            }
        }
    }
    VolumeBuffer::from_u16(shape, data).expect("block")
}
