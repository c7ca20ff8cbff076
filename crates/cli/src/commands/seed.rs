use std::path::Path;

use serde::Serialize;
use spectrum_core::demo;

use super::{CommandResult, EXIT_IO};

#[derive(Debug, Serialize)]
struct SeedData {
    kmeans_model: String,
    scaler: String,
    similarity_matrix: String,
    catalog: String,
}

pub fn run(dir: &Path) -> CommandResult {
    let locations = match demo::write_bundle(dir) {
        Ok(locations) => locations,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "io",
                format!("failed to write demo bundle to `{}`: {error}", dir.display()),
                EXIT_IO,
            );
        }
    };

    let data = SeedData {
        kmeans_model: locations.kmeans_model.display().to_string(),
        scaler: locations.scaler.display().to_string(),
        similarity_matrix: locations.similarity_matrix.display().to_string(),
        catalog: locations.catalog.display().to_string(),
    };

    CommandResult::success_with_data(
        "seed",
        format!(
            "demo bundle written to `{}`; point SPECTRUM_MODEL_DIR and SPECTRUM_CATALOG_PATH at it",
            dir.display()
        ),
        &data,
    )
}
