use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{read_json, ArtifactKind};
use crate::domain::product::ProductId;
use crate::errors::StartupError;

/// Square item-to-item similarity table keyed by product id on both axes.
///
/// `scores[row][column]` is the similarity of `products[row]` against
/// `products[column]`. Queries only ever read a single column and never assume
/// the table is symmetric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimilarityFile", into = "SimilarityFile")]
pub struct SimilarityMatrix {
    products: Vec<ProductId>,
    index: HashMap<ProductId, usize>,
    scores: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct SimilarityFile {
    products: Vec<ProductId>,
    scores: Vec<Vec<f64>>,
}

impl TryFrom<SimilarityFile> for SimilarityMatrix {
    type Error = String;

    fn try_from(file: SimilarityFile) -> Result<Self, Self::Error> {
        Self::new(file.products, file.scores)
    }
}

impl From<SimilarityMatrix> for SimilarityFile {
    fn from(matrix: SimilarityMatrix) -> Self {
        let size = matrix.products.len();
        let scores = if size == 0 {
            Vec::new()
        } else {
            matrix.scores.chunks(size).map(<[f64]>::to_vec).collect()
        };
        Self { products: matrix.products, scores }
    }
}

impl SimilarityMatrix {
    pub fn new(products: Vec<ProductId>, rows: Vec<Vec<f64>>) -> Result<Self, String> {
        let size = products.len();
        if rows.len() != size {
            return Err(format!("expected {size} rows for {size} products, found {}", rows.len()));
        }

        let mut index = HashMap::with_capacity(size);
        for (position, product) in products.iter().enumerate() {
            if index.insert(product.clone(), position).is_some() {
                return Err(format!("product `{product}` appears more than once"));
            }
        }

        let mut scores = Vec::with_capacity(size * size);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != size {
                return Err(format!(
                    "row {row} (`{}`) has {} cells, expected {size}",
                    products[row],
                    values.len()
                ));
            }
            if let Some(column) = values.iter().position(|value| !value.is_finite()) {
                return Err(format!(
                    "cell (`{}`, `{}`) is not a finite number",
                    products[row], products[column]
                ));
            }
            scores.extend(values);
        }

        Ok(Self { products, index, scores })
    }

    pub fn load(path: &Path) -> Result<Self, StartupError> {
        read_json(ArtifactKind::SimilarityMatrix, path)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn products(&self) -> &[ProductId] {
        &self.products
    }

    pub fn contains(&self, product: &ProductId) -> bool {
        self.index.contains_key(product)
    }

    pub fn score(&self, row: &ProductId, column: &ProductId) -> Option<f64> {
        let row = *self.index.get(row)?;
        let column = *self.index.get(column)?;
        Some(self.scores[row * self.products.len() + column])
    }

    /// Scores of every product against `target`, in row order.
    pub fn column<'a>(
        &'a self,
        target: &ProductId,
    ) -> Option<impl Iterator<Item = (&'a ProductId, f64)> + 'a> {
        let column = *self.index.get(target)?;
        let size = self.products.len();
        Some(
            self.products
                .iter()
                .enumerate()
                .map(move |(row, product)| (product, self.scores[row * size + column])),
        )
    }
}
