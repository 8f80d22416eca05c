//! End-to-end QC run: load, marker mask, masking, optional ROI sampling.
//!
//! Inputs are recognised by their layout on disk:
//! - a tile root (`RES(<H>x<W>x<D>)` directory) is reassembled,
//! - a brain directory holding several tile roots uses the lowest resolution,
//! - any other directory is read as a stack of single-slice images,
//! - a file is decoded as one slice.

use crate::config::ConfigMap;
use crate::diagnostics::{elapsed_ms, InputDescriptor, QcReport, StageTiming, TimingBreakdown};
use crate::error::{QcError, Result};
use crate::image::io::{load_slice_stack, ImageFileLoader, VolumeLoader};
use crate::markers::{MarkerMaskBuilder, MarkerParams};
use crate::masking;
use crate::roi::{LocalMaximaParams, RoiSampler};
use crate::tiles::listing::{file_name, sorted_dirs};
use crate::tiles::{find_lowest_resolution, parse_resolution, reassemble};
use crate::volume::{ElementType, VolumeBuffer};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// What the masking stage keeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskingMode {
    /// Zero marker voxels.
    #[default]
    Remove,
    /// Zero everything except marker voxels.
    Isolate,
    /// Skip masking.
    None,
}

impl MaskingMode {
    pub fn label(self) -> &'static str {
        match self {
            MaskingMode::Remove => "remove",
            MaskingMode::Isolate => "isolate",
            MaskingMode::None => "none",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    TileRoot,
    BrainDir,
    SliceDir,
    Image,
    Memory,
}

impl InputKind {
    pub fn detect(path: &Path) -> Result<Self> {
        if path.is_file() {
            return Ok(InputKind::Image);
        }
        if !path.is_dir() {
            return Err(QcError::Load {
                path: path.to_path_buf(),
                reason: "input does not exist".to_string(),
            });
        }
        if parse_resolution(&file_name(path)).is_some() {
            return Ok(InputKind::TileRoot);
        }
        let has_tile_root = sorted_dirs(path)?
            .iter()
            .any(|p| parse_resolution(&file_name(p)).is_some());
        Ok(if has_tile_root {
            InputKind::BrainDir
        } else {
            InputKind::SliceDir
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            InputKind::TileRoot => "tileRoot",
            InputKind::BrainDir => "brainDir",
            InputKind::SliceDir => "sliceDir",
            InputKind::Image => "image",
            InputKind::Memory => "memory",
        }
    }
}

/// Brain directories (those holding at least one tile root) directly below `root`.
pub fn find_brain_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut brains = Vec::new();
    for dir in sorted_dirs(root)? {
        if InputKind::detect(&dir)? == InputKind::BrainDir {
            brains.push(dir);
        }
    }
    Ok(brains)
}

/// Products of one pipeline run.
#[derive(Debug)]
pub struct QcOutcome {
    pub volume: VolumeBuffer,
    pub mask: VolumeBuffer,
    /// Absent when masking is [`MaskingMode::None`].
    pub masked: Option<VolumeBuffer>,
    pub sampled: Option<VolumeBuffer>,
    pub report: QcReport,
}

type SharedLoader = Box<dyn VolumeLoader + Send + Sync>;
type SharedSampler = Box<dyn RoiSampler + Send + Sync>;

pub struct QcPipeline {
    builder: MarkerMaskBuilder,
    masking: MaskingMode,
    element_type: ElementType,
    loader: SharedLoader,
    sampler: Option<SharedSampler>,
    roi: LocalMaximaParams,
}

impl QcPipeline {
    pub fn new(params: MarkerParams) -> Result<Self> {
        Ok(Self {
            builder: MarkerMaskBuilder::new(params)?,
            masking: MaskingMode::default(),
            element_type: ElementType::U16,
            loader: Box::new(ImageFileLoader),
            sampler: None,
            roi: LocalMaximaParams::default(),
        })
    }

    /// Marker and sampler parameters read from one flat map.
    pub fn from_config(map: &ConfigMap) -> Result<Self> {
        let mut pipeline = Self::new(MarkerParams::from_config(map)?)?;
        pipeline.roi = LocalMaximaParams::from_config(map)?;
        Ok(pipeline)
    }

    pub fn with_masking(mut self, masking: MaskingMode) -> Self {
        self.masking = masking;
        self
    }

    /// Element type expected from tile blocks and slice stacks.
    pub fn with_element_type(mut self, element_type: ElementType) -> Self {
        self.element_type = element_type;
        self
    }

    pub fn with_loader(mut self, loader: impl VolumeLoader + Send + Sync + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_sampler(mut self, sampler: impl RoiSampler + Send + Sync + 'static) -> Self {
        self.sampler = Some(Box::new(sampler));
        self
    }

    pub fn params(&self) -> &MarkerParams {
        self.builder.params()
    }

    /// Load `path` according to its detected kind.
    pub fn load(&self, path: &Path) -> Result<(VolumeBuffer, InputKind)> {
        let kind = InputKind::detect(path)?;
        let loader = self.loader.as_ref();
        let volume = match kind {
            InputKind::TileRoot => reassemble(path, loader, self.element_type)?,
            InputKind::BrainDir => {
                let root = find_lowest_resolution(path)?;
                info!("using tile root {}", root.display());
                reassemble(&root, loader, self.element_type)?
            }
            InputKind::SliceDir => load_slice_stack(path, loader, self.element_type)?,
            InputKind::Image | InputKind::Memory => loader.load(path)?,
        };
        if volume.is_empty() {
            return Err(QcError::EmptyVolume);
        }
        Ok((volume, kind))
    }

    pub fn run(&self, path: &Path) -> Result<QcOutcome> {
        let start = Instant::now();
        let (volume, kind) = self.load(path)?;
        let load_ms = elapsed_ms(start);
        let mut outcome = self.process(volume, path, kind)?;
        outcome
            .report
            .timings
            .stages
            .insert(0, StageTiming::new("load", load_ms));
        outcome.report.timings.total_ms += load_ms;
        Ok(outcome)
    }

    /// Run every stage after loading on an in-memory volume.
    pub fn run_volume(&self, volume: VolumeBuffer) -> Result<QcOutcome> {
        self.process(volume, Path::new(""), InputKind::Memory)
    }

    fn process(&self, volume: VolumeBuffer, path: &Path, kind: InputKind) -> Result<QcOutcome> {
        let start = Instant::now();
        let shape = volume.shape();
        let element_type = volume.element_type().ok_or(QcError::EmptyVolume)?;
        let mut timings = TimingBreakdown::default();

        let (mask, markers) = timings.time("mask", || self.builder.build_with_report(&volume))?;
        let mask_voxels = mask
            .as_u8()
            .map_or(0, |m| m.iter().filter(|&&v| v != 0).count());

        let masked = match self.masking {
            MaskingMode::Remove => Some(timings.time("masking", || {
                masking::remove_markers(&volume, &mask)
            })?),
            MaskingMode::Isolate => Some(timings.time("masking", || {
                masking::isolate_markers(&volume, &mask)
            })?),
            MaskingMode::None => None,
        };

        let sampled = match &self.sampler {
            Some(sampler) => {
                let source = masked.as_ref().unwrap_or(&volume);
                Some(timings.time("sample", || sampler.sample(source, &self.roi))?)
            }
            None => None,
        };
        timings.total_ms = elapsed_ms(start);

        let report = QcReport {
            input: InputDescriptor {
                path: path.to_path_buf(),
                kind: kind.label().to_string(),
                width: shape.width,
                height: shape.height,
                depth: shape.depth,
                channels: shape.channels,
                element_type,
            },
            timings,
            markers,
            mask_voxels,
            masking: masked.as_ref().map(|_| self.masking.label().to_string()),
            sampler: self.sampler.as_ref().map(|s| s.name().to_string()),
        };
        info!(
            "{} ({}): {} mask voxels ({:.3}%) in {:.1} ms",
            path.display(),
            kind.label(),
            mask_voxels,
            report.mask_coverage() * 100.0,
            report.timings.total_ms
        );
        Ok(QcOutcome {
            volume,
            mask,
            masked,
            sampled,
            report,
        })
    }
}
