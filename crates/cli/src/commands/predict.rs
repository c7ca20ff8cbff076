use serde::Serialize;

use super::{load_engine, CommandResult};

#[derive(Debug, Serialize)]
struct PredictData {
    recency: f64,
    frequency: f64,
    monetary: f64,
    segment_id: u32,
    segment_label: &'static str,
}

pub fn run(recency: f64, frequency: f64, monetary: f64) -> CommandResult {
    let (_, engine) = match load_engine("predict") {
        Ok(loaded) => loaded,
        Err(failure) => return failure,
    };

    match engine.predict_segment(recency, frequency, monetary) {
        Ok(prediction) => CommandResult::success_with_data(
            "predict",
            format!("This customer belongs to: {}", prediction.label),
            &PredictData {
                recency,
                frequency,
                monetary,
                segment_id: prediction.segment_id.0,
                segment_label: prediction.label.as_str(),
            },
        ),
        Err(error) => CommandResult::query_failure("predict", error),
    }
}
