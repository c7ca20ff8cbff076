use std::path::PathBuf;

use thiserror::Error;

use crate::artifacts::ArtifactKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StartupError {
    #[error("missing model artifacts: {}", describe_missing(.missing))]
    ArtifactMissing { missing: Vec<MissingArtifact> },
    #[error("model artifact `{name}` could not be loaded: {cause}")]
    ArtifactCorrupt { name: ArtifactKind, cause: String },
    #[error("product dataset `{}` is unreadable: {cause}", .path.display())]
    DatasetUnreadable { path: PathBuf, cause: String },
    #[error(
        "segment label map `{version}` defines {labels} labels but the model has {clusters} clusters"
    )]
    SegmentMapMismatch { version: &'static str, labels: usize, clusters: usize },
}

impl StartupError {
    pub fn missing_names(&self) -> Vec<&'static str> {
        match self {
            Self::ArtifactMissing { missing } => {
                missing.iter().map(|artifact| artifact.kind.name()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Failures of the model bundle, as opposed to the product dataset.
    pub fn is_model_failure(&self) -> bool {
        !matches!(self, Self::DatasetUnreadable { .. })
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::ArtifactMissing { .. } => "artifact_missing",
            Self::ArtifactCorrupt { .. } => "artifact_corrupt",
            Self::DatasetUnreadable { .. } => "dataset_unreadable",
            Self::SegmentMapMismatch { .. } => "segment_map_mismatch",
        }
    }
}

fn describe_missing(missing: &[MissingArtifact]) -> String {
    missing
        .iter()
        .map(|artifact| format!("{} (`{}`)", artifact.kind, artifact.path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid input for `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },
    #[error("product not found: `{name}`")]
    ProductNotFound { name: String },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::NotFound { .. } => "Product not found. Please check the name and try again.",
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "invalid_input",
            Self::NotFound { .. } => "not_found",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. } | Self::NotFound { correlation_id, .. } => {
                correlation_id
            }
        }
    }
}

impl QueryError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<QueryError> for InterfaceError {
    fn from(value: QueryError) -> Self {
        let message = value.to_string();
        match value {
            QueryError::InvalidInput { .. } => {
                Self::BadRequest { message, correlation_id: "unassigned".to_owned() }
            }
            QueryError::ProductNotFound { .. } => {
                Self::NotFound { message, correlation_id: "unassigned".to_owned() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::artifacts::ArtifactKind;
    use crate::errors::{InterfaceError, MissingArtifact, QueryError, StartupError};

    #[test]
    fn invalid_input_maps_to_bad_request_interface_error() {
        let interface = QueryError::InvalidInput {
            field: "monetary",
            reason: "must be non-negative, got -1".to_owned(),
        }
        .into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.error_code(), "invalid_input");
    }

    #[test]
    fn product_not_found_has_user_safe_message() {
        let interface =
            QueryError::ProductNotFound { name: "NO SUCH MUG".to_owned() }.into_interface("req-2");

        assert!(matches!(interface, InterfaceError::NotFound { .. }));
        assert_eq!(interface.error_code(), "not_found");
        assert_eq!(
            interface.user_message(),
            "Product not found. Please check the name and try again."
        );
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn missing_artifacts_are_reported_together() {
        let error = StartupError::ArtifactMissing {
            missing: vec![
                MissingArtifact {
                    kind: ArtifactKind::KMeansModel,
                    path: PathBuf::from("models/kmeans_model.json"),
                },
                MissingArtifact { kind: ArtifactKind::Scaler, path: PathBuf::from("models/scaler.json") },
            ],
        };

        assert_eq!(error.missing_names(), vec!["kmeans_model", "scaler"]);
        let message = error.to_string();
        assert!(message.contains("kmeans_model (`models/kmeans_model.json`)"));
        assert!(message.contains("scaler (`models/scaler.json`)"));
        assert!(error.is_model_failure());
    }

    #[test]
    fn dataset_failures_are_a_separate_domain() {
        let error = StartupError::DatasetUnreadable {
            path: PathBuf::from("data/online_retail.csv"),
            cause: "file not found".to_owned(),
        };

        assert!(!error.is_model_failure());
        assert_eq!(error.error_class(), "dataset_unreadable");
    }
}
