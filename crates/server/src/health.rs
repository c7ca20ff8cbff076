use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use spectrum_core::{QueryEngine, StoreSummary};

#[derive(Clone)]
pub struct HealthState {
    engine: QueryEngine,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub models: HealthCheck,
    pub store: StoreSummary,
    pub checked_at: String,
}

pub fn router(engine: QueryEngine) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { engine })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let store = state.engine.store().summary();
    let models = models_check(&store);
    let ready = models.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "spectrum-server runtime initialized".to_string(),
        },
        models,
        store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

/// The store is validated at startup; an empty similarity table still serves
/// predictions but can never produce recommendations.
fn models_check(store: &StoreSummary) -> HealthCheck {
    if store.similarity_products == 0 {
        return HealthCheck {
            status: "degraded",
            detail: "similarity matrix holds no products".to_string(),
        };
    }

    HealthCheck {
        status: "ready",
        detail: format!(
            "{} clusters ({}), {} scored products, {} catalog products",
            store.clusters,
            store.label_map_version,
            store.similarity_products,
            store.catalog_products
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use spectrum_core::catalog::ProductCatalog;
    use spectrum_core::{
        demo, ModelStore, QueryEngine, SegmentLabelMap, SimilarityMatrix, StoreParts,
    };
    use tempfile::TempDir;

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_with_loaded_bundle() {
        let dir = TempDir::new().expect("temp dir");
        let locations = demo::write_bundle(dir.path()).expect("bundle written");
        let store = ModelStore::initialize(&locations).expect("bundle loads");

        let (status, Json(payload)) =
            health(State(HealthState { engine: QueryEngine::new(Arc::new(store)) })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.models.status, "ready");
        assert_eq!(payload.store.clusters, 4);
        assert_eq!(payload.store.similarity_products, 5);
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_without_similarity_data() {
        let store = ModelStore::from_parts(StoreParts {
            scaler: Box::new(demo::scaler().expect("scaler")),
            classifier: Box::new(demo::kmeans_model().expect("model")),
            labels: SegmentLabelMap::default(),
            similarity: SimilarityMatrix::new(Vec::new(), Vec::new()).expect("empty matrix"),
            catalog: ProductCatalog::from_products(Vec::new()),
        })
        .expect("store assembles");

        let (status, Json(payload)) =
            health(State(HealthState { engine: QueryEngine::new(Arc::new(store)) })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}
