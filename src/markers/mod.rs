//! Scan-seam marker detection.
//!
//! - [`detector`]: per-slice closing, smoothing, Canny and probabilistic
//!   Hough producing candidate segments.
//! - [`filter`]: geometric acceptance of candidates against the volume
//!   centre and the expected seam orientation.
//! - [`draw`]: thick line rasterisation into a slice mask.
//! - [`mask`]: the whole-volume mask build with depth closing.

pub mod detector;
pub mod draw;
pub mod filter;
pub mod mask;
pub mod params;

pub use detector::{detect_lines, EdgeLineDetector, SliceDetection};
pub use draw::draw_thick_line;
pub use filter::LineFilter;
pub use mask::{build_mask, MarkerMaskBuilder};
pub use params::MarkerParams;
