use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{read_json, ArtifactKind, SegmentClassifier};
use crate::domain::features::{ScaledFeatureVector, FEATURE_DIM};
use crate::domain::segment::SegmentId;
use crate::errors::StartupError;

/// Fitted k-means model: prediction assigns the nearest centroid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KMeansFile")]
pub struct KMeansModel {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    centroids: Vec<[f64; FEATURE_DIM]>,
}

#[derive(Deserialize)]
struct KMeansFile {
    #[serde(default)]
    version: Option<String>,
    centroids: Vec<[f64; FEATURE_DIM]>,
}

impl TryFrom<KMeansFile> for KMeansModel {
    type Error = String;

    fn try_from(file: KMeansFile) -> Result<Self, Self::Error> {
        Self::new(file.version, file.centroids)
    }
}

impl KMeansModel {
    pub fn new(version: Option<String>, centroids: Vec<[f64; FEATURE_DIM]>) -> Result<Self, String> {
        if centroids.is_empty() {
            return Err("model has no centroids".to_string());
        }
        if let Some(index) =
            centroids.iter().position(|centroid| centroid.iter().any(|value| !value.is_finite()))
        {
            return Err(format!("centroid {index} contains a non-finite coordinate"));
        }
        Ok(Self { version, centroids })
    }

    pub fn load(path: &Path) -> Result<Self, StartupError> {
        read_json(ArtifactKind::KMeansModel, path)
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn centroids(&self) -> &[[f64; FEATURE_DIM]] {
        &self.centroids
    }
}

impl SegmentClassifier for KMeansModel {
    fn cluster_count(&self) -> usize {
        self.centroids.len()
    }

    fn predict(&self, features: &ScaledFeatureVector) -> SegmentId {
        let point = features.values();
        let mut min_dist = f64::INFINITY;
        let mut min_cluster = 0;

        // Strict comparison keeps the lowest index on ties.
        for (cluster, centroid) in self.centroids.iter().enumerate() {
            let dist = squared_distance(point, centroid);
            if dist < min_dist {
                min_dist = dist;
                min_cluster = cluster;
            }
        }

        SegmentId(min_cluster as u32)
    }
}

fn squared_distance(left: &[f64; FEATURE_DIM], right: &[f64; FEATURE_DIM]) -> f64 {
    left.iter().zip(right.iter()).map(|(a, b)| (a - b) * (a - b)).sum()
}

#[cfg(test)]
mod tests {
    use super::KMeansModel;
    use crate::artifacts::SegmentClassifier;
    use crate::domain::features::ScaledFeatureVector;
    use crate::domain::segment::SegmentId;

    fn model() -> KMeansModel {
        KMeansModel::new(
            Some("rfm-kmeans-v1".to_string()),
            vec![[-1.0, 1.0, 1.0], [0.0, 0.0, 0.0], [1.0, -0.5, -0.5], [2.0, -1.0, -1.0]],
        )
        .expect("valid model")
    }

    #[test]
    fn predicts_nearest_centroid() {
        let model = model();

        assert_eq!(model.predict(&ScaledFeatureVector::new([-0.9, 1.2, 0.8])), SegmentId(0));
        assert_eq!(model.predict(&ScaledFeatureVector::new([0.1, 0.1, -0.1])), SegmentId(1));
        assert_eq!(model.predict(&ScaledFeatureVector::new([2.5, -1.0, -1.5])), SegmentId(3));
        assert_eq!(model.cluster_count(), 4);
    }

    #[test]
    fn equidistant_point_goes_to_lowest_cluster() {
        let model =
            KMeansModel::new(None, vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]).expect("valid model");

        assert_eq!(model.predict(&ScaledFeatureVector::new([0.0, 0.0, 0.0])), SegmentId(0));
    }

    #[test]
    fn decodes_model_document() {
        let model: KMeansModel = serde_json::from_str(
            r#"{"version":"rfm-kmeans-v1","centroids":[[0.0,0.0,0.0],[1.0,1.0,1.0]]}"#,
        )
        .expect("decode");

        assert_eq!(model.version(), Some("rfm-kmeans-v1"));
        assert_eq!(model.centroids().len(), 2);
    }

    #[test]
    fn decoding_rejects_empty_and_misshapen_centroids() {
        assert!(serde_json::from_str::<KMeansModel>(r#"{"centroids":[]}"#).is_err());
        assert!(serde_json::from_str::<KMeansModel>(r#"{"centroids":[[1.0,2.0]]}"#).is_err());
    }
}
