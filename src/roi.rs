//! Region-of-interest sampling seam.
//!
//! Sampling picks regions by the density of local intensity maxima. Only the
//! contract lives here; hosts plug an implementation into the pipeline.

use crate::config::ConfigMap;
use crate::error::{QcError, Result};
use crate::volume::VolumeBuffer;
use serde::{Deserialize, Serialize};

/// Local-maxima search settings handed to a sampler.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalMaximaParams {
    /// Neighbourhood radius in voxels.
    pub radius: usize,
    /// Minimum intensity of a maximum.
    pub threshold: f64,
}

impl Default for LocalMaximaParams {
    fn default() -> Self {
        Self {
            radius: 3,
            threshold: 0.0,
        }
    }
}

impl LocalMaximaParams {
    /// Reads `localMaximaRadius` and `localMaximaThreshold`.
    pub fn from_config(map: &ConfigMap) -> Result<Self> {
        let d = Self::default();
        let params = Self {
            radius: map.get_or("localMaximaRadius", d.radius)?,
            threshold: map.get_or("localMaximaThreshold", d.threshold)?,
        };
        if params.radius == 0 {
            return Err(QcError::InvalidParameter {
                name: "localMaximaRadius",
                reason: "must be >= 1".to_string(),
            });
        }
        if !params.threshold.is_finite() {
            return Err(QcError::InvalidParameter {
                name: "localMaximaThreshold",
                reason: "must be finite".to_string(),
            });
        }
        Ok(params)
    }
}

pub trait RoiSampler {
    fn name(&self) -> &str;

    /// Sample regions of `volume`, returning a volume of the sampled content.
    fn sample(&self, volume: &VolumeBuffer, params: &LocalMaximaParams) -> Result<VolumeBuffer>;
}

/// Placeholder used when no sampler is installed; always fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableSampler;

impl RoiSampler for UnavailableSampler {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn sample(&self, _volume: &VolumeBuffer, _params: &LocalMaximaParams) -> Result<VolumeBuffer> {
        Err(QcError::SamplerUnavailable(
            "no local-maxima sampler is installed".to_string(),
        ))
    }
}
