//! RFM feature vectors fed to the segmentation model.

use serde::Serialize;

use crate::errors::QueryError;

/// Number of features the segmentation model consumes.
pub const FEATURE_DIM: usize = 3;

/// Feature names in model input order.
pub const FEATURE_NAMES: [&str; FEATURE_DIM] = ["recency", "frequency", "monetary"];

/// Raw customer profile: days since last purchase, purchase count, total spend.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FeatureVector {
    recency: f64,
    frequency: f64,
    monetary: f64,
}

impl FeatureVector {
    pub fn new(recency: f64, frequency: f64, monetary: f64) -> Result<Self, QueryError> {
        ensure_non_negative("recency", recency)?;
        ensure_non_negative("frequency", frequency)?;
        if frequency.fract() != 0.0 {
            return Err(QueryError::InvalidInput {
                field: "frequency",
                reason: format!("must be a whole number of transactions, got {frequency}"),
            });
        }
        ensure_non_negative("monetary", monetary)?;

        Ok(Self { recency, frequency, monetary })
    }

    pub fn recency(&self) -> f64 {
        self.recency
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn monetary(&self) -> f64 {
        self.monetary
    }

    pub fn to_array(&self) -> [f64; FEATURE_DIM] {
        [self.recency, self.frequency, self.monetary]
    }
}

/// Feature vector after the pre-fit scaler transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScaledFeatureVector([f64; FEATURE_DIM]);

impl ScaledFeatureVector {
    pub fn new(values: [f64; FEATURE_DIM]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; FEATURE_DIM] {
        &self.0
    }
}

fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), QueryError> {
    if !value.is_finite() {
        return Err(QueryError::InvalidInput {
            field,
            reason: format!("must be a finite number, got {value}"),
        });
    }
    if value < 0.0 {
        return Err(QueryError::InvalidInput {
            field,
            reason: format!("must be non-negative, got {value}"),
        });
    }
    Ok(())
}
