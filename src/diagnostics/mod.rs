//! Serializable diagnostics for marker detection and whole pipeline runs.
//!
//! `QcReport` is the entry point returned by the pipeline; it embeds the
//! per-slice `MarkerReport` and a `TimingBreakdown` of every stage.

pub mod markers;
pub mod pipeline;
pub mod timing;

pub use markers::{MarkerReport, SliceMarkerReport};
pub use pipeline::{InputDescriptor, QcReport};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
