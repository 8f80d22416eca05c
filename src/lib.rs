#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod image;
pub mod masking;
pub mod pipeline;
pub mod roi;
pub mod tiles;
pub mod volume;

// Stage internals, public for tools and tests.
pub mod angle;
pub mod edges;
pub mod filters;
pub mod hough;
pub mod line;
pub mod markers;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{QcError, Result};
pub use crate::pipeline::{MaskingMode, QcOutcome, QcPipeline};
pub use crate::volume::{ElementType, Shape, VolumeBuffer};

pub use crate::markers::{build_mask, MarkerMaskBuilder, MarkerParams};
pub use crate::masking::{apply as apply_mask, complement_mask};
pub use crate::tiles::reassemble;

// High-level diagnostics returned by the pipeline.
pub use crate::diagnostics::{MarkerReport, QcReport};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use tera_qc::prelude::*;
/// use std::path::Path;
///
/// # fn main() -> tera_qc::Result<()> {
/// let volume = reassemble(Path::new("brain/RES(600x800x120)"), &ImageFileLoader, ElementType::U16)?;
/// let mask = build_mask(&volume, &MarkerParams::default())?;
/// let cleaned = tera_qc::masking::remove_markers(&volume, &mask)?;
/// println!("{:?}", cleaned.shape());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::image::io::{ImageFileLoader, VolumeLoader};
    pub use crate::{build_mask, reassemble, ElementType, MarkerParams, Shape, VolumeBuffer};
}
