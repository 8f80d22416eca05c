use crate::config::ConfigMap;
use crate::error::{QcError, Result};
use crate::hough::HoughOptions;
use serde::{Deserialize, Serialize};

/// Tuning of marker detection, masking and depth interpolation.
///
/// Configuration keys are the camelCase field names below; `from_config`
/// reads them from a [`ConfigMap`] and validates the result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkerParams {
    /// Elliptical closing applied to each slice before smoothing.
    pub se1: usize,
    /// Elliptical closing applied to the edge map.
    pub se2: usize,
    /// Window of the closing along Z applied to the finished mask.
    pub se3: usize,
    pub hough_distance_res: f64,
    /// Angle bins per half turn.
    pub hough_angle_res: u32,
    pub hough_threshold: u32,
    pub hough_min_line_length: u32,
    pub hough_max_line_gap: u32,
    /// Base seed; slice `z` uses `hough_seed + z`.
    pub hough_seed: u64,
    /// Stroke width of drawn markers in pixels.
    pub line_width: u32,
    /// Fraction of a line's length added at each end before drawing.
    pub extend_ratio: f64,
    /// Minimum 3D distance between a line and the volume centre.
    pub filter_min_distance: f64,
    /// Maximum deviation from the accepted axis, in degrees.
    pub angle_limit: f64,
    /// Physical Z spacing relative to XY.
    pub z_thickness: f64,
    pub canny_min: f64,
    pub canny_max: f64,
    /// Gaussian sigma before edge detection; `<= 0` disables smoothing.
    pub sigma: f64,
}

impl Default for MarkerParams {
    fn default() -> Self {
        Self {
            se1: 11,
            se2: 5,
            se3: 21,
            hough_distance_res: 1.0,
            hough_angle_res: 180,
            hough_threshold: 100,
            hough_min_line_length: 100,
            hough_max_line_gap: 1,
            hough_seed: 0,
            line_width: 3,
            extend_ratio: 0.1,
            filter_min_distance: 300.0,
            angle_limit: 5.0,
            z_thickness: 2.0,
            canny_min: 0.1,
            canny_max: 0.3,
            sigma: 1.0,
        }
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> QcError {
    QcError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

impl MarkerParams {
    /// Read every parameter from `map`, defaulting absent keys.
    pub fn from_config(map: &ConfigMap) -> Result<Self> {
        let d = Self::default();
        let params = Self {
            se1: map.get_or("se1", d.se1)?,
            se2: map.get_or("se2", d.se2)?,
            se3: map.get_or("se3", d.se3)?,
            hough_distance_res: map.get_or("houghDistanceRes", d.hough_distance_res)?,
            hough_angle_res: map.get_or("houghAngleRes", d.hough_angle_res)?,
            hough_threshold: map.get_or("houghThreshold", d.hough_threshold)?,
            hough_min_line_length: map.get_or("houghMinLineLength", d.hough_min_line_length)?,
            hough_max_line_gap: map.get_or("houghMaxLineGap", d.hough_max_line_gap)?,
            hough_seed: map.get_or("houghSeed", d.hough_seed)?,
            line_width: map.get_or("lineWidth", d.line_width)?,
            extend_ratio: map.get_or("extendRatio", d.extend_ratio)?,
            filter_min_distance: map.get_or("filterMinDistance", d.filter_min_distance)?,
            angle_limit: map.get_or("angleLimit", d.angle_limit)?,
            z_thickness: map.get_or("zThickness", d.z_thickness)?,
            canny_min: map.get_or("cannyMin", d.canny_min)?,
            canny_max: map.get_or("cannyMax", d.canny_max)?,
            sigma: map.get_or("sigma", d.sigma)?,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, size) in [("se1", self.se1), ("se2", self.se2), ("se3", self.se3)] {
            if size == 0 {
                return Err(invalid(name, "structuring element size must be >= 1"));
            }
        }
        if !(self.canny_min >= 0.0 && self.canny_min < self.canny_max && self.canny_max <= 1.0) {
            return Err(invalid(
                "cannyMin/cannyMax",
                format!("need 0 <= {} < {} <= 1", self.canny_min, self.canny_max),
            ));
        }
        if self.line_width == 0 {
            return Err(invalid("lineWidth", "must be >= 1"));
        }
        if !(self.extend_ratio.is_finite() && self.extend_ratio >= 0.0) {
            return Err(invalid("extendRatio", format!("must be >= 0, got {}", self.extend_ratio)));
        }
        if !(self.filter_min_distance.is_finite() && self.filter_min_distance >= 0.0) {
            return Err(invalid(
                "filterMinDistance",
                format!("must be >= 0, got {}", self.filter_min_distance),
            ));
        }
        if !(0.0..=90.0).contains(&self.angle_limit) {
            return Err(invalid("angleLimit", format!("must lie in [0, 90], got {}", self.angle_limit)));
        }
        if !(self.z_thickness.is_finite() && self.z_thickness > 0.0) {
            return Err(invalid("zThickness", format!("must be > 0, got {}", self.z_thickness)));
        }
        if !self.sigma.is_finite() {
            return Err(invalid("sigma", "must be finite"));
        }
        self.hough_options(0).validate()
    }

    /// Hough settings for slice `z`.
    pub fn hough_options(&self, z: usize) -> HoughOptions {
        HoughOptions {
            rho: self.hough_distance_res,
            angle_divisions: self.hough_angle_res,
            threshold: self.hough_threshold,
            min_line_length: self.hough_min_line_length,
            max_line_gap: self.hough_max_line_gap,
            seed: self.hough_seed.wrapping_add(z as u64),
            ..HoughOptions::default()
        }
    }
}
