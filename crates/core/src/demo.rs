//! Small self-consistent model bundle for local runs and tests.
//!
//! The centroids live in the scaled RFM space of the bundled scaler and follow
//! the cluster semantics of [`RFM_SEGMENT_LABELS`](crate::domain::segment::RFM_SEGMENT_LABELS).

use std::fs;
use std::io;
use std::path::Path;

use crate::artifacts::{KMeansModel, SimilarityMatrix, StandardScaler};
use crate::catalog::CatalogColumns;
use crate::domain::product::ProductId;
use crate::store::ArtifactLocations;

pub const KMEANS_FILE: &str = "kmeans_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const SIMILARITY_FILE: &str = "similarity_matrix.json";
pub const CATALOG_FILE: &str = "online_retail.csv";

const PRODUCTS: &[(&str, &str)] = &[
    ("10002", "INFLATABLE POLITICAL GLOBE"),
    ("85123A", "WHITE HANGING HEART T-LIGHT HOLDER"),
    ("71053", "WHITE METAL LANTERN"),
    ("84029G", "KNITTED UNION FLAG HOT WATER BOTTLE"),
    ("84406B", "CREAM CUPID HEARTS COAT HANGER"),
    ("22752", "SET 7 BABUSHKA NESTING BOXES"),
];

/// Row-major scores over the first five catalog products; the last product
/// is deliberately absent from the table.
const SCORES: [[f64; 5]; 5] = [
    [1.0, 0.9, 0.85, 0.7, 0.2],
    [0.9, 1.0, 0.6, 0.35, 0.5],
    [0.85, 0.6, 1.0, 0.3, 0.45],
    [0.7, 0.35, 0.3, 1.0, 0.25],
    [0.2, 0.5, 0.45, 0.25, 1.0],
];

pub fn scaler() -> Result<StandardScaler, String> {
    StandardScaler::new([92.5, 4.3, 2048.2], [100.8, 7.7, 8985.2])
}

pub fn kmeans_model() -> Result<KMeansModel, String> {
    KMeansModel::new(
        Some("rfm-kmeans-v1".to_string()),
        vec![
            [-0.8, 1.2, 0.9],
            [-0.55, 0.05, -0.1],
            [0.3, -0.35, -0.2],
            [1.9, -0.5, -0.22],
        ],
    )
}

pub fn similarity_matrix() -> Result<SimilarityMatrix, String> {
    let products = PRODUCTS.iter().take(SCORES.len()).map(|(id, _)| ProductId::from(*id));
    SimilarityMatrix::new(products.collect(), SCORES.iter().map(|row| row.to_vec()).collect())
}

/// Writes the catalog as an invoice-line export, one row per product.
pub fn write_catalog<W: io::Write>(writer: W) -> csv::Result<()> {
    write_catalog_rows(PRODUCTS, writer)
}

fn write_catalog_rows<W: io::Write>(products: &[(&str, &str)], writer: W) -> csv::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["InvoiceNo", "StockCode", "Description", "Quantity"])?;
    for (line, (id, description)) in products.iter().enumerate() {
        let invoice = (536365 + line).to_string();
        let quantity = (line + 1).to_string();
        writer.write_record([invoice.as_str(), *id, *description, quantity.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the bundle into `dir` and returns its locations.
pub fn write_bundle(dir: &Path) -> io::Result<ArtifactLocations> {
    fs::create_dir_all(dir)?;

    let locations = ArtifactLocations {
        kmeans_model: dir.join(KMEANS_FILE),
        scaler: dir.join(SCALER_FILE),
        similarity_matrix: dir.join(SIMILARITY_FILE),
        catalog: dir.join(CATALOG_FILE),
        catalog_columns: CatalogColumns::default(),
    };

    write_json(&locations.kmeans_model, &kmeans_model().map_err(io::Error::other)?)?;
    write_json(&locations.scaler, &scaler().map_err(io::Error::other)?)?;
    write_json(&locations.similarity_matrix, &similarity_matrix().map_err(io::Error::other)?)?;
    let file = fs::File::create(&locations.catalog)?;
    write_catalog(file).map_err(io::Error::other)?;

    Ok(locations)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let body = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    fs::write(path, body)
}
