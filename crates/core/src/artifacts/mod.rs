//! Offline-trained model artifacts and the traits the query path consumes.
//!
//! Artifacts are stored as JSON documents. Each type validates its own shape on
//! deserialization, so a document that parses is safe to query.

pub mod kmeans;
pub mod scaler;
pub mod similarity;

use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::domain::features::{FeatureVector, ScaledFeatureVector};
use crate::domain::segment::SegmentId;
use crate::errors::StartupError;

pub use kmeans::KMeansModel;
pub use scaler::StandardScaler;
pub use similarity::SimilarityMatrix;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    KMeansModel,
    Scaler,
    SimilarityMatrix,
}

impl ArtifactKind {
    pub const REQUIRED: [ArtifactKind; 3] =
        [ArtifactKind::KMeansModel, ArtifactKind::Scaler, ArtifactKind::SimilarityMatrix];

    pub fn name(&self) -> &'static str {
        match self {
            Self::KMeansModel => "kmeans_model",
            Self::Scaler => "scaler",
            Self::SimilarityMatrix => "similarity_matrix",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pre-fit normalization applied to raw features before clustering.
pub trait FeatureScaler: Send + Sync {
    fn transform(&self, features: &FeatureVector) -> ScaledFeatureVector;
}

/// Maps a scaled feature vector to exactly one cluster.
pub trait SegmentClassifier: Send + Sync {
    fn cluster_count(&self) -> usize;

    fn predict(&self, features: &ScaledFeatureVector) -> SegmentId;
}

pub(crate) fn read_json<T: DeserializeOwned>(
    kind: ArtifactKind,
    path: &Path,
) -> Result<T, StartupError> {
    let file = File::open(path).map_err(|error| StartupError::ArtifactCorrupt {
        name: kind,
        cause: format!("could not open `{}`: {error}", path.display()),
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|error| StartupError::ArtifactCorrupt {
        name: kind,
        cause: format!("could not decode `{}`: {error}", path.display()),
    })
}
