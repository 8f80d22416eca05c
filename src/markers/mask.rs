use super::detector::EdgeLineDetector;
use super::draw::draw_thick_line;
use super::filter::LineFilter;
use super::MarkerParams;
use crate::diagnostics::{elapsed_ms, MarkerReport, SliceMarkerReport};
use crate::error::{QcError, Result};
use crate::filters::close_depth;
use crate::volume::{ElementType, Shape, VolumeBuffer};
use log::{debug, info};
use rayon::prelude::*;
use std::time::Instant;

/// Builds the binary marker mask of a volume.
///
/// Every Z slice (channel 0) is processed independently and in parallel:
/// candidate lines are detected, filtered against the volume geometry,
/// extended at both ends and drawn into that slice of the mask. A closing
/// along Z then bridges slices where a seam was missed. The first failing
/// slice aborts the whole build.
#[derive(Clone, Debug)]
pub struct MarkerMaskBuilder {
    detector: EdgeLineDetector,
}

impl MarkerMaskBuilder {
    pub fn new(params: MarkerParams) -> Result<Self> {
        Ok(Self {
            detector: EdgeLineDetector::new(params)?,
        })
    }

    pub fn params(&self) -> &MarkerParams {
        self.detector.params()
    }

    pub fn build(&self, volume: &VolumeBuffer) -> Result<VolumeBuffer> {
        self.build_with_report(volume).map(|(mask, _)| mask)
    }

    /// Build the mask and report per-slice detections and timings.
    pub fn build_with_report(&self, volume: &VolumeBuffer) -> Result<(VolumeBuffer, MarkerReport)> {
        if volume.is_empty() {
            return Err(QcError::EmptyVolume);
        }
        let start = Instant::now();
        let shape = volume.shape();
        let (w, h, d) = shape.spatial();
        let params = self.params();
        let filter = LineFilter::from_params((w, h, d), params);
        let mask_shape = Shape::volume(w, h, d);
        let mut mask = vec![0u8; mask_shape.voxel_count()];

        let slices_start = Instant::now();
        let slices: Vec<SliceMarkerReport> = mask
            .par_chunks_mut(mask_shape.slice_len())
            .enumerate()
            .map(|(z, dst)| {
                let slice = volume.slice_f32(z, 0)?;
                let detection = self
                    .detector
                    .detect(&slice, z)
                    .map_err(|e| e.at_slice(z))?;
                let accepted: Vec<_> = detection
                    .lines
                    .iter()
                    .copied()
                    .filter(|line| filter.accepts(line, z))
                    .collect();
                for line in &accepted {
                    let (a, b) = line.extended(params.extend_ratio);
                    draw_thick_line(dst, w, h, a, b, params.line_width, u8::MAX);
                }
                if !accepted.is_empty() {
                    debug!(
                        "slice {z}: {} of {} lines accepted",
                        accepted.len(),
                        detection.lines.len()
                    );
                }
                Ok(SliceMarkerReport {
                    slice: z,
                    candidates: detection.lines.len(),
                    accepted,
                    edge_pixels: detection.edges.count_nonzero(),
                    timings: detection.timings,
                })
            })
            .collect::<Result<_>>()?;
        let slices_ms = elapsed_ms(slices_start);

        let planar = VolumeBuffer::from_u8(mask_shape, mask)?;
        let closing_start = Instant::now();
        let closed = close_depth(&planar, params.se3)?;
        drop(planar);
        let closing_ms = elapsed_ms(closing_start);

        let mut report = MarkerReport {
            width: w,
            height: h,
            depth: d,
            slices,
            ..MarkerReport::default()
        };
        report.timings.push("slices", slices_ms);
        report.timings.push("depthClosing", closing_ms);
        report.timings.total_ms = elapsed_ms(start);
        info!(
            "marker mask {}x{}x{}: {} lines accepted of {} in {:.1} ms",
            w,
            h,
            d,
            report.total_accepted(),
            report.total_candidates(),
            report.timings.total_ms
        );
        debug_assert_eq!(closed.element_type(), Some(ElementType::U8));
        Ok((closed, report))
    }
}

/// Marker mask of `volume`: U8, one channel, values 0 or 255.
pub fn build_mask(volume: &VolumeBuffer, params: &MarkerParams) -> Result<VolumeBuffer> {
    MarkerMaskBuilder::new(params.clone())?.build(volume)
}
