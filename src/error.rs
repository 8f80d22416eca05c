//! Error type shared by every stage of the QC pipeline.
//!
//! All core operations return [`Result`]. A failure never leaves a partially
//! built volume or mask behind: the operation drops its own buffers before
//! the error propagates.

use std::path::PathBuf;
use thiserror::Error;

use crate::volume::ElementType;

pub type Result<T> = std::result::Result<T, QcError>;

#[derive(Error, Debug)]
pub enum QcError {
    #[error("invalid tile root {path}: {reason}")]
    InvalidTileRoot { path: PathBuf, reason: String },

    #[error("failed to load block {path}: {source}")]
    BlockLoadFailed {
        path: PathBuf,
        #[source]
        source: Box<QcError>,
    },

    #[error("inconsistent element type in {path}: expected {expected}, found {found}")]
    InconsistentElementType {
        path: PathBuf,
        expected: ElementType,
        found: ElementType,
    },

    #[error("block {path} at offset ({x}, {y}, {z}) does not fit into the volume")]
    BlockOutOfBounds {
        path: PathBuf,
        x: usize,
        y: usize,
        z: usize,
    },

    #[error("edge detection failed on slice {slice}: {reason}")]
    EdgeDetectionFailed { slice: usize, reason: String },

    #[error("shape mismatch: volume is {volume:?}, mask is {mask:?}")]
    ShapeMismatch {
        volume: (usize, usize, usize),
        mask: (usize, usize, usize),
    },

    #[error("cannot parse config key `{key}` with value `{value}`")]
    ConfigParse { key: String, value: String },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("volume is empty")]
    EmptyVolume,

    #[error("load error for {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("save error for {path}: {reason}")]
    Save { path: PathBuf, reason: String },

    #[error("ROI sampler unavailable: {0}")]
    SamplerUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QcError {
    /// Attach a slice index to an edge-detection failure; other errors pass through.
    pub fn at_slice(self, slice: usize) -> Self {
        match self {
            QcError::EdgeDetectionFailed { reason, .. } => {
                QcError::EdgeDetectionFailed { slice, reason }
            }
            other => other,
        }
    }
}
