use spectrum_core::ProductId;

use super::{load_engine, CommandResult, EXIT_INVALID_INPUT};

pub fn run(product: &str, by_id: bool, top_n: Option<usize>) -> CommandResult {
    let (config, engine) = match load_engine("recommend") {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    let top_n = top_n.unwrap_or(config.recommendation.default_top_n);
    if top_n > config.recommendation.max_top_n {
        return CommandResult::failure(
            "recommend",
            "invalid_input",
            format!(
                "invalid input for `top_n`: {top_n} exceeds the maximum of {}",
                config.recommendation.max_top_n
            ),
            EXIT_INVALID_INPUT,
        );
    }

    let outcome = if by_id {
        engine.recommend_by_id(&ProductId::from(product.trim()), top_n)
    } else {
        engine.recommend_products(product, top_n)
    };

    match outcome {
        Ok(recommendations) => {
            let message = if recommendations.is_empty() {
                format!("no similarity data for product `{}`", recommendations.product_id)
            } else {
                format!(
                    "{} recommendations for product `{}`",
                    recommendations.items.len(),
                    recommendations.product_id
                )
            };
            CommandResult::success_with_data("recommend", message, &recommendations)
        }
        Err(error) => CommandResult::query_failure("recommend", error),
    }
}
