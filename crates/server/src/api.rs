//! JSON query endpoints.
//!
//! - `POST /api/v1/predict`    : segment for an RFM profile
//! - `POST /api/v1/recommend`  : similar products by name or id
//! - `GET  /api/v1/products`   : catalog names, optionally filtered by `?search=`

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use spectrum_core::config::RecommendationConfig;
use spectrum_core::{InterfaceError, ProductId, QueryEngine, RecommendedProduct};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    engine: QueryEngine,
    default_top_n: usize,
    max_top_n: usize,
}

impl ApiState {
    pub fn new(engine: QueryEngine, recommendation: &RecommendationConfig) -> Self {
        Self {
            engine,
            default_top_n: recommendation.default_top_n,
            max_top_n: recommendation.max_top_n,
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub recency: f64,
    pub frequency: f64,
    pub monetary: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub segment_id: u32,
    pub segment_label: &'static str,
    pub correlation_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub product_name: Option<String>,
    pub product_id: Option<String>,
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub product_id: ProductId,
    pub recommendations: Vec<RecommendedProduct>,
    pub correlation_id: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProductsQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub products: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
    pub message: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl From<InterfaceError> for ApiError {
    fn from(value: InterfaceError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            InterfaceError::BadRequest { message, .. } => {
                (StatusCode::BAD_REQUEST, message.clone())
            }
            InterfaceError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, self.0.user_message().to_string())
            }
        };
        let body = ApiErrorBody {
            error: self.0.error_code(),
            message,
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/predict", post(predict))
        .route("/api/v1/recommend", post(recommend))
        .route("/api/v1/products", get(products))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn predict(
    State(state): State<ApiState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let correlation_id = new_correlation_id();
    let body = parse_body(payload, &correlation_id)?;

    let prediction = state
        .engine
        .predict_segment(body.recency, body.frequency, body.monetary)
        .map_err(|error| reject(error.into_interface(&correlation_id)))?;

    info!(
        event_name = "api.predict.completed",
        correlation_id = %correlation_id,
        segment_label = prediction.label.as_str(),
        "segment prediction served"
    );

    Ok(Json(PredictResponse {
        segment_id: prediction.segment_id.0,
        segment_label: prediction.label.as_str(),
        correlation_id,
    }))
}

async fn recommend(
    State(state): State<ApiState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let correlation_id = new_correlation_id();
    let body = parse_body(payload, &correlation_id)?;

    let top_n = body.top_n.unwrap_or(state.default_top_n);
    if top_n > state.max_top_n {
        return Err(reject(InterfaceError::BadRequest {
            message: format!("top_n must be at most {}", state.max_top_n),
            correlation_id,
        }));
    }

    let outcome = match (body.product_id.as_deref(), body.product_name.as_deref()) {
        (Some(id), None) => state.engine.recommend_by_id(&ProductId::from(id.trim()), top_n),
        (None, Some(name)) => state.engine.recommend_products(name, top_n),
        _ => {
            return Err(reject(InterfaceError::BadRequest {
                message: "exactly one of product_name or product_id is required".to_string(),
                correlation_id,
            }));
        }
    };

    let recommendations =
        outcome.map_err(|error| reject(error.into_interface(&correlation_id)))?;

    info!(
        event_name = "api.recommend.completed",
        correlation_id = %correlation_id,
        product_id = %recommendations.product_id,
        returned = recommendations.items.len(),
        "recommendations served"
    );

    Ok(Json(RecommendResponse {
        product_id: recommendations.product_id,
        recommendations: recommendations.items,
        correlation_id,
    }))
}

async fn products(
    State(state): State<ApiState>,
    Query(query): Query<ProductsQuery>,
) -> Json<ProductsResponse> {
    let products = state
        .engine
        .product_names(query.search.as_deref())
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(ProductsResponse { products })
}

/// Malformed, mistyped or incomplete bodies are `invalid_input` like any other bad value.
fn parse_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    correlation_id: &str,
) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => Err(reject(InterfaceError::BadRequest {
            message: rejection.body_text(),
            correlation_id: correlation_id.to_string(),
        })),
    }
}

fn new_correlation_id() -> String {
    format!("req-{}", Uuid::new_v4())
}

fn reject(error: InterfaceError) -> ApiError {
    warn!(
        event_name = "api.request.rejected",
        correlation_id = %error.correlation_id(),
        error_code = error.error_code(),
        error = %error,
        "request rejected"
    );
    ApiError::from(error)
}
