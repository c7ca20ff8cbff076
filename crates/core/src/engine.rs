//! Segment prediction and product recommendation over a loaded [`ModelStore`].

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::features::FeatureVector;
use crate::domain::product::{normalize_name, ProductId};
use crate::domain::segment::SegmentPrediction;
use crate::errors::QueryError;
use crate::store::ModelStore;

pub const DEFAULT_TOP_N: usize = 5;

/// Shown for a recommended product that has no catalog description.
pub const DESCRIPTION_NOT_FOUND: &str = "Description not found";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecommendedProduct {
    pub product_id: ProductId,
    pub description: String,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Recommendations {
    pub product_id: ProductId,
    pub items: Vec<RecommendedProduct>,
}

impl Recommendations {
    pub fn descriptions(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.description.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Read-only query surface. Cheap to clone and safe to share across threads.
#[derive(Clone, Debug)]
pub struct QueryEngine {
    store: Arc<ModelStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    pub fn predict_segment(
        &self,
        recency: f64,
        frequency: f64,
        monetary: f64,
    ) -> Result<SegmentPrediction, QueryError> {
        let features = FeatureVector::new(recency, frequency, monetary)?;
        let scaled = self.store.scaler().transform(&features);
        let segment_id = self.store.classifier().predict(&scaled);
        let label = self.store.labels().label_for(segment_id);

        debug!(
            event_name = "query.segment.predicted",
            recency,
            frequency,
            monetary,
            segment_id = segment_id.0,
            segment_label = label.as_str(),
            "segment predicted"
        );

        Ok(SegmentPrediction { segment_id, label })
    }

    /// Recommends neighbors of the product whose display name matches `name`
    /// case-insensitively.
    pub fn recommend_products(
        &self,
        name: &str,
        top_n: usize,
    ) -> Result<Recommendations, QueryError> {
        let product_id = self
            .store
            .names()
            .resolve(name)
            .cloned()
            .ok_or_else(|| QueryError::ProductNotFound { name: normalize_name(name) })?;

        Ok(self.neighbors(product_id, top_n))
    }

    pub fn recommend_by_id(
        &self,
        product_id: &ProductId,
        top_n: usize,
    ) -> Result<Recommendations, QueryError> {
        if !self.store.catalog().contains(product_id) {
            return Err(QueryError::ProductNotFound { name: product_id.to_string() });
        }

        Ok(self.neighbors(product_id.clone(), top_n))
    }

    /// Sorted, normalized product names; `search` filters by case-insensitive
    /// substring.
    pub fn product_names(&self, search: Option<&str>) -> Vec<&str> {
        let needle = search.map(normalize_name).filter(|needle| !needle.is_empty());
        self.store
            .names()
            .sorted_names()
            .into_iter()
            .filter(|name| needle.as_deref().map_or(true, |needle| name.contains(needle)))
            .collect()
    }

    fn neighbors(&self, product_id: ProductId, top_n: usize) -> Recommendations {
        let Some(column) = self.store.similarity().column(&product_id) else {
            debug!(
                event_name = "query.recommend.no_similarity_data",
                product_id = %product_id,
                "product has no similarity column"
            );
            return Recommendations { product_id, items: Vec::new() };
        };

        let mut candidates: Vec<(&ProductId, f64)> =
            column.filter(|(candidate, _)| **candidate != product_id).collect();
        // Stable sort: equal scores keep their column order.
        candidates.sort_by(|left, right| right.1.total_cmp(&left.1));

        let catalog = self.store.catalog();
        let items: Vec<RecommendedProduct> = candidates
            .into_iter()
            .take(top_n)
            .map(|(candidate, score)| RecommendedProduct {
                product_id: candidate.clone(),
                description: catalog
                    .description(candidate)
                    .unwrap_or(DESCRIPTION_NOT_FOUND)
                    .to_string(),
                score,
            })
            .collect();

        debug!(
            event_name = "query.recommend.completed",
            product_id = %product_id,
            top_n,
            returned = items.len(),
            "recommendations computed"
        );

        Recommendations { product_id, items }
    }
}
