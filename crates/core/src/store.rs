use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::artifacts::{
    ArtifactKind, FeatureScaler, KMeansModel, SegmentClassifier, SimilarityMatrix, StandardScaler,
};
use crate::catalog::{CatalogColumns, NameIndex, ProductCatalog};
use crate::domain::segment::SegmentLabelMap;
use crate::errors::{MissingArtifact, StartupError};

/// Where the model bundle and product dataset live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactLocations {
    pub kmeans_model: PathBuf,
    pub scaler: PathBuf,
    pub similarity_matrix: PathBuf,
    pub catalog: PathBuf,
    pub catalog_columns: CatalogColumns,
}

impl ArtifactLocations {
    pub fn path_for(&self, kind: ArtifactKind) -> &PathBuf {
        match kind {
            ArtifactKind::KMeansModel => &self.kmeans_model,
            ArtifactKind::Scaler => &self.scaler,
            ArtifactKind::SimilarityMatrix => &self.similarity_matrix,
        }
    }

    pub fn missing_artifacts(&self) -> Vec<MissingArtifact> {
        ArtifactKind::REQUIRED
            .into_iter()
            .filter(|kind| !self.path_for(*kind).is_file())
            .map(|kind| MissingArtifact { kind, path: self.path_for(kind).clone() })
            .collect()
    }
}

/// In-memory pieces of a store, for callers that bring their own artifacts.
pub struct StoreParts {
    pub scaler: Box<dyn FeatureScaler>,
    pub classifier: Box<dyn SegmentClassifier>,
    pub labels: SegmentLabelMap,
    pub similarity: SimilarityMatrix,
    pub catalog: ProductCatalog,
}

/// Immutable inference state loaded once at startup.
pub struct ModelStore {
    scaler: Box<dyn FeatureScaler>,
    classifier: Box<dyn SegmentClassifier>,
    labels: SegmentLabelMap,
    similarity: SimilarityMatrix,
    catalog: ProductCatalog,
    names: NameIndex,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub clusters: usize,
    pub label_map_version: &'static str,
    pub similarity_products: usize,
    pub catalog_products: usize,
    pub indexed_names: usize,
    pub name_collisions: usize,
}

impl ModelStore {
    /// Loads every artifact, or none.
    ///
    /// All three model artifacts are checked for presence before any is
    /// decoded, so a missing bundle is reported in one error. The product
    /// dataset is loaded last and fails with its own error variant.
    pub fn initialize(locations: &ArtifactLocations) -> Result<Self, StartupError> {
        let missing = locations.missing_artifacts();
        if !missing.is_empty() {
            return Err(StartupError::ArtifactMissing { missing });
        }

        let classifier = KMeansModel::load(&locations.kmeans_model)?;
        let scaler = StandardScaler::load(&locations.scaler)?;
        let similarity = SimilarityMatrix::load(&locations.similarity_matrix)?;
        info!(
            event_name = "system.store.models_loaded",
            correlation_id = "bootstrap",
            clusters = classifier.cluster_count(),
            model_version = classifier.version().unwrap_or("unversioned"),
            similarity_products = similarity.len(),
            "model artifacts loaded"
        );

        let labels = SegmentLabelMap::default();
        if let Some(version) = classifier.version() {
            if version != labels.version() {
                warn!(
                    event_name = "system.store.label_map_version_mismatch",
                    correlation_id = "bootstrap",
                    model_version = version,
                    label_map_version = labels.version(),
                    "model version differs from segment label map version"
                );
            }
        }

        let catalog = ProductCatalog::load(&locations.catalog, &locations.catalog_columns)?;

        Self::from_parts(StoreParts {
            scaler: Box::new(scaler),
            classifier: Box::new(classifier),
            labels,
            similarity,
            catalog,
        })
    }

    pub fn from_parts(parts: StoreParts) -> Result<Self, StartupError> {
        parts.labels.validate_cardinality(parts.classifier.cluster_count())?;
        let names = NameIndex::build(&parts.catalog);

        Ok(Self {
            scaler: parts.scaler,
            classifier: parts.classifier,
            labels: parts.labels,
            similarity: parts.similarity,
            catalog: parts.catalog,
            names,
        })
    }

    pub fn scaler(&self) -> &dyn FeatureScaler {
        self.scaler.as_ref()
    }

    pub fn classifier(&self) -> &dyn SegmentClassifier {
        self.classifier.as_ref()
    }

    pub fn labels(&self) -> &SegmentLabelMap {
        &self.labels
    }

    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    pub fn catalog(&self) -> &ProductCatalog {
        &self.catalog
    }

    pub fn names(&self) -> &NameIndex {
        &self.names
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            clusters: self.classifier.cluster_count(),
            label_map_version: self.labels.version(),
            similarity_products: self.similarity.len(),
            catalog_products: self.catalog.len(),
            indexed_names: self.names.len(),
            name_collisions: self.names.collisions(),
        }
    }
}

impl fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelStore").field("summary", &self.summary()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use super::{ArtifactLocations, ModelStore, StoreParts};
    use crate::artifacts::{ArtifactKind, KMeansModel, SimilarityMatrix, StandardScaler};
    use crate::catalog::{CatalogColumns, ProductCatalog};
    use crate::domain::segment::SegmentLabelMap;
    use crate::errors::StartupError;

    fn locations(dir: &Path) -> ArtifactLocations {
        ArtifactLocations {
            kmeans_model: dir.join("kmeans_model.json"),
            scaler: dir.join("scaler.json"),
            similarity_matrix: dir.join("similarity_matrix.json"),
            catalog: dir.join("online_retail.csv"),
            catalog_columns: CatalogColumns::default(),
        }
    }

    fn write_bundle(dir: &Path) {
        fs::write(
            dir.join("kmeans_model.json"),
            r#"{"version":"rfm-kmeans-v1","centroids":[[-1,1,1],[0,0,0],[1,-1,-1],[2,-2,-2]]}"#,
        )
        .expect("write model");
        fs::write(dir.join("scaler.json"), r#"{"mean":[90,4,1500],"scale":[100,7,8000]}"#)
            .expect("write scaler");
        fs::write(
            dir.join("similarity_matrix.json"),
            r#"{"products":["10002","71053"],"scores":[[1.0,0.4],[0.4,1.0]]}"#,
        )
        .expect("write similarity");
        fs::write(
            dir.join("online_retail.csv"),
            "StockCode,Description\n10002,INFLATABLE POLITICAL GLOBE\n71053,WHITE METAL LANTERN\n",
        )
        .expect("write dataset");
    }

    #[test]
    fn initialize_loads_complete_bundle() {
        let dir = TempDir::new().expect("temp dir");
        write_bundle(dir.path());

        let store = ModelStore::initialize(&locations(dir.path())).expect("store loads");
        let summary = store.summary();

        assert_eq!(summary.clusters, 4);
        assert_eq!(summary.similarity_products, 2);
        assert_eq!(summary.catalog_products, 2);
        assert_eq!(summary.label_map_version, "rfm-kmeans-v1");
    }

    #[test]
    fn initialize_reports_every_missing_model_artifact() {
        let dir = TempDir::new().expect("temp dir");

        let error = ModelStore::initialize(&locations(dir.path())).expect_err("nothing on disk");

        assert_eq!(error.missing_names(), vec!["kmeans_model", "scaler", "similarity_matrix"]);
    }

    #[test]
    fn presence_is_checked_before_decoding() {
        let dir = TempDir::new().expect("temp dir");
        fs::write(dir.path().join("kmeans_model.json"), "corrupt").expect("write model");

        let error = ModelStore::initialize(&locations(dir.path())).expect_err("bundle incomplete");

        assert!(matches!(error, StartupError::ArtifactMissing { .. }));
        assert_eq!(error.missing_names(), vec!["scaler", "similarity_matrix"]);
    }

    #[test]
    fn corrupt_artifact_names_the_artifact() {
        let dir = TempDir::new().expect("temp dir");
        write_bundle(dir.path());
        fs::write(dir.path().join("similarity_matrix.json"), r#"{"products":["A"],"scores":[]}"#)
            .expect("overwrite similarity");

        let error = ModelStore::initialize(&locations(dir.path())).expect_err("bad matrix");

        assert!(matches!(
            error,
            StartupError::ArtifactCorrupt { name: ArtifactKind::SimilarityMatrix, .. }
        ));
    }

    #[test]
    fn missing_dataset_is_distinguishable_from_model_failures() {
        let dir = TempDir::new().expect("temp dir");
        write_bundle(dir.path());
        fs::remove_file(dir.path().join("online_retail.csv")).expect("remove dataset");

        let error = ModelStore::initialize(&locations(dir.path())).expect_err("no dataset");

        assert!(matches!(error, StartupError::DatasetUnreadable { .. }));
        assert!(!error.is_model_failure());
    }

    #[test]
    fn stale_label_map_fails_loudly() {
        let model = KMeansModel::new(None, vec![[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]]).expect("model");
        let result = ModelStore::from_parts(StoreParts {
            scaler: Box::new(StandardScaler::new([0.0; 3], [1.0; 3]).expect("scaler")),
            classifier: Box::new(model),
            labels: SegmentLabelMap::default(),
            similarity: SimilarityMatrix::new(Vec::new(), Vec::new()).expect("empty matrix"),
            catalog: ProductCatalog::default(),
        });

        assert!(matches!(
            result,
            Err(StartupError::SegmentMapMismatch { labels: 4, clusters: 2, .. })
        ));
    }
}
