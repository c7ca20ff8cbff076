pub mod artifacts;
pub mod catalog;
pub mod config;
pub mod demo;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod store;

pub use artifacts::{
    ArtifactKind, FeatureScaler, KMeansModel, SegmentClassifier, SimilarityMatrix, StandardScaler,
};
pub use catalog::{CatalogColumns, NameIndex, ProductCatalog};
pub use domain::features::{FeatureVector, ScaledFeatureVector};
pub use domain::product::{Product, ProductId};
pub use domain::segment::{SegmentId, SegmentLabel, SegmentLabelMap, SegmentPrediction};
pub use engine::{QueryEngine, RecommendedProduct, Recommendations};
pub use errors::{InterfaceError, QueryError, StartupError};
pub use store::{ArtifactLocations, ModelStore, StoreParts, StoreSummary};
