use crate::angle::angle_between_dirless;
use crate::line::CandidateLine;
use crate::markers::MarkerParams;
use nalgebra::Vector3;

/// Geometric acceptance test for candidate marker lines.
///
/// Scan seams run parallel to the shorter image axis and lie away from the
/// tissue in the middle of the volume. A line is accepted when
/// - its 3D distance to the volume centre is at least `min_distance`, with
///   slices placed at `z * z_thickness`, and
/// - it lies within `angle_limit` degrees of the vertical axis for volumes
///   wider than tall, of the horizontal axis otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct LineFilter {
    width: usize,
    height: usize,
    centre: Vector3<f64>,
    z_thickness: f64,
    min_distance: f64,
    angle_limit_rad: f64,
}

impl LineFilter {
    pub fn new(
        volume: (usize, usize, usize),
        z_thickness: f64,
        min_distance: f64,
        angle_limit_deg: f64,
    ) -> Self {
        let (width, height, depth) = volume;
        let centre = Vector3::new(
            width as f64 / 2.0,
            height as f64 / 2.0,
            depth as f64 / 2.0 * z_thickness,
        );
        Self {
            width,
            height,
            centre,
            z_thickness,
            min_distance,
            angle_limit_rad: angle_limit_deg.to_radians(),
        }
    }

    pub fn from_params(volume: (usize, usize, usize), params: &MarkerParams) -> Self {
        Self::new(
            volume,
            params.z_thickness,
            params.filter_min_distance,
            params.angle_limit,
        )
    }

    /// Distance from the volume centre to the infinite line through the
    /// segment; `None` for a zero-length segment.
    pub fn distance_to_centre(&self, line: &CandidateLine, slice: usize) -> Option<f64> {
        if line.is_degenerate() {
            return None;
        }
        let z = slice as f64 * self.z_thickness;
        let p1 = Vector3::new(line.x1 as f64, line.y1 as f64, z);
        let p2 = Vector3::new(line.x2 as f64, line.y2 as f64, z);
        let cross = (p2 - self.centre).cross(&(p1 - self.centre));
        Some(cross.norm() / (p2 - p1).norm())
    }

    /// Axis that accepted lines must follow.
    pub fn reference_axis(&self) -> [f64; 2] {
        if self.width > self.height {
            [0.0, 1.0]
        } else {
            [1.0, 0.0]
        }
    }

    pub fn accepts(&self, line: &CandidateLine, slice: usize) -> bool {
        let Some(distance) = self.distance_to_centre(line, slice) else {
            return false;
        };
        if distance < self.min_distance {
            return false;
        }
        angle_between_dirless(&line.direction(), &self.reference_axis()) <= self.angle_limit_rad
    }
}
