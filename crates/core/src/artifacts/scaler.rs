use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{read_json, ArtifactKind, FeatureScaler};
use crate::domain::features::{FeatureVector, ScaledFeatureVector, FEATURE_DIM, FEATURE_NAMES};
use crate::errors::StartupError;

/// Scale below which a feature is treated as constant and only centered.
const MIN_SCALE: f64 = 1e-10;

/// Standard scaler with fixed per-feature mean and scale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScalerFile")]
pub struct StandardScaler {
    mean: [f64; FEATURE_DIM],
    scale: [f64; FEATURE_DIM],
}

#[derive(Deserialize)]
struct ScalerFile {
    mean: [f64; FEATURE_DIM],
    scale: [f64; FEATURE_DIM],
}

impl TryFrom<ScalerFile> for StandardScaler {
    type Error = String;

    fn try_from(file: ScalerFile) -> Result<Self, Self::Error> {
        Self::new(file.mean, file.scale)
    }
}

impl StandardScaler {
    pub fn new(mean: [f64; FEATURE_DIM], scale: [f64; FEATURE_DIM]) -> Result<Self, String> {
        for (index, name) in FEATURE_NAMES.iter().enumerate() {
            if !mean[index].is_finite() {
                return Err(format!("mean for `{name}` is not finite"));
            }
            if !scale[index].is_finite() || scale[index] < 0.0 {
                return Err(format!("scale for `{name}` must be a finite non-negative number"));
            }
        }
        Ok(Self { mean, scale })
    }

    pub fn load(path: &Path) -> Result<Self, StartupError> {
        read_json(ArtifactKind::Scaler, path)
    }

    pub fn mean(&self) -> &[f64; FEATURE_DIM] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64; FEATURE_DIM] {
        &self.scale
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: &FeatureVector) -> ScaledFeatureVector {
        let raw = features.to_array();
        let mut scaled = [0.0; FEATURE_DIM];
        for (index, value) in scaled.iter_mut().enumerate() {
            let centered = raw[index] - self.mean[index];
            *value = if self.scale[index] > MIN_SCALE {
                centered / self.scale[index]
            } else {
                centered
            };
        }
        ScaledFeatureVector::new(scaled)
    }
}
