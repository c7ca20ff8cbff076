use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::StartupError;

/// Cluster index produced by the segmentation model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u32);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentLabel {
    #[serde(rename = "High-Value")]
    HighValue,
    Regular,
    Occasional,
    #[serde(rename = "At-Risk")]
    AtRisk,
    Unknown,
}

impl SegmentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighValue => "High-Value",
            Self::Regular => "Regular",
            Self::Occasional => "Occasional",
            Self::AtRisk => "At-Risk",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SegmentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cluster-to-label table for a given training run.
///
/// The cluster semantics are fixed when the model is trained, so the table is
/// versioned alongside the model and checked against its cluster count at
/// startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SegmentLabelMap {
    version: &'static str,
    labels: &'static [(SegmentId, SegmentLabel)],
}

pub const RFM_SEGMENT_LABELS: SegmentLabelMap = SegmentLabelMap::new(
    "rfm-kmeans-v1",
    &[
        (SegmentId(0), SegmentLabel::HighValue),
        (SegmentId(1), SegmentLabel::Regular),
        (SegmentId(2), SegmentLabel::Occasional),
        (SegmentId(3), SegmentLabel::AtRisk),
    ],
);

impl SegmentLabelMap {
    pub const fn new(version: &'static str, labels: &'static [(SegmentId, SegmentLabel)]) -> Self {
        Self { version, labels }
    }

    pub fn version(&self) -> &'static str {
        self.version
    }

    pub fn cardinality(&self) -> usize {
        self.labels.len()
    }

    /// Ids outside the table map to [`SegmentLabel::Unknown`].
    pub fn label_for(&self, id: SegmentId) -> SegmentLabel {
        self.labels
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, label)| *label)
            .unwrap_or(SegmentLabel::Unknown)
    }

    pub fn validate_cardinality(&self, clusters: usize) -> Result<(), StartupError> {
        if clusters != self.cardinality() {
            return Err(StartupError::SegmentMapMismatch {
                version: self.version,
                labels: self.cardinality(),
                clusters,
            });
        }
        Ok(())
    }
}

impl Default for SegmentLabelMap {
    fn default() -> Self {
        RFM_SEGMENT_LABELS
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SegmentPrediction {
    pub segment_id: SegmentId,
    pub label: SegmentLabel,
}
