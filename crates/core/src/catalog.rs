//! Product catalog built from the transactional dataset.
//!
//! The dataset is a CSV export with one row per invoice line. Only the product
//! id and description columns are read. Rows with either field blank are
//! dropped and the first row seen for an id decides its description.
//!
//! The reverse [`NameIndex`] is keyed by the trimmed, uppercased description.
//! When two ids share a description the one registered later in the catalog
//! wins, so name lookups are not injective. Callers that know the id should
//! look up by id instead.
//!
//! Surrounding whitespace is part of the collision: `"GLOBE"` registered as A
//! and `"GLOBE "` registered as B share the key `GLOBE`, which resolves to B.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::domain::product::{normalize_name, Product, ProductId};
use crate::errors::StartupError;

pub const DEFAULT_ID_COLUMN: &str = "StockCode";
pub const DEFAULT_NAME_COLUMN: &str = "Description";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogColumns {
    pub id: String,
    pub name: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self { id: DEFAULT_ID_COLUMN.to_string(), name: DEFAULT_NAME_COLUMN.to_string() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductCatalog {
    products: Vec<Product>,
    by_id: HashMap<ProductId, usize>,
    dropped_rows: usize,
    duplicate_rows: usize,
}

impl ProductCatalog {
    /// Builds a catalog keeping the first description seen for each id.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalog = Self::default();
        for product in products {
            catalog.push(product.id.0, product.description);
        }
        catalog
    }

    pub fn load(path: &Path, columns: &CatalogColumns) -> Result<Self, StartupError> {
        let unreadable = |cause: String| StartupError::DatasetUnreadable {
            path: path.to_path_buf(),
            cause,
        };

        let file = File::open(path).map_err(|error| unreadable(error.to_string()))?;
        let catalog = Self::read_csv(file, columns).map_err(unreadable)?;

        info!(
            event_name = "system.catalog.loaded",
            correlation_id = "bootstrap",
            path = %path.display(),
            products = catalog.len(),
            dropped_rows = catalog.dropped_rows,
            duplicate_rows = catalog.duplicate_rows,
            "product catalog loaded"
        );
        Ok(catalog)
    }

    pub fn read_csv<R: Read>(reader: R, columns: &CatalogColumns) -> Result<Self, String> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers =
            reader.headers().map_err(|error| format!("failed to read headers: {error}"))?.clone();

        let column_position = |name: &str| {
            headers.iter().position(|header| header.trim() == name).ok_or_else(|| {
                format!(
                    "column `{name}` not found (available columns: {:?})",
                    headers.iter().collect::<Vec<_>>()
                )
            })
        };
        let id_index = column_position(&columns.id)?;
        let name_index = column_position(&columns.name)?;

        let mut catalog = Self::default();
        for (offset, record) in reader.records().enumerate() {
            let record =
                record.map_err(|error| format!("failed to read row {}: {error}", offset + 2))?;
            let id = record.get(id_index).unwrap_or_default();
            let name = record.get(name_index).unwrap_or_default();
            catalog.push(id.to_string(), name.to_string());
        }

        Ok(catalog)
    }

    fn push(&mut self, id: String, description: String) {
        let id = id.trim();
        if id.is_empty() || description.trim().is_empty() {
            self.dropped_rows += 1;
            return;
        }

        let id = ProductId(id.to_string());
        if self.by_id.contains_key(&id) {
            self.duplicate_rows += 1;
            return;
        }

        self.by_id.insert(id.clone(), self.products.len());
        self.products.push(Product { id, description });
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.by_id.get(id).map(|position| &self.products[*position])
    }

    pub fn description(&self, id: &ProductId) -> Option<&str> {
        self.get(id).map(|product| product.description.as_str())
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Products in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameIndex {
    by_name: HashMap<String, ProductId>,
    collisions: usize,
}

impl NameIndex {
    pub fn build(catalog: &ProductCatalog) -> Self {
        let mut index = Self::default();
        for product in catalog.iter() {
            let key = normalize_name(&product.description);
            if let Some(previous) = index.by_name.insert(key, product.id.clone()) {
                index.collisions += 1;
                warn!(
                    event_name = "system.catalog.name_collision",
                    correlation_id = "bootstrap",
                    description = %product.description,
                    replaced_id = %previous,
                    product_id = %product.id,
                    "display name shared by several products; later product wins name lookups"
                );
            }
        }
        index
    }

    pub fn resolve(&self, name: &str) -> Option<&ProductId> {
        self.by_name.get(&normalize_name(name))
    }

    /// Normalized names, sorted.
    pub fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
