use serde::Serialize;

use super::{load_engine, CommandResult};

#[derive(Debug, Serialize)]
struct ProductsData<'a> {
    search: Option<&'a str>,
    products: Vec<&'a str>,
}

pub fn run(search: Option<&str>) -> CommandResult {
    let (_, engine) = match load_engine("products") {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    let products = engine.product_names(search);
    CommandResult::success_with_data(
        "products",
        format!("{} products", products.len()),
        &ProductsData { search, products },
    )
}
