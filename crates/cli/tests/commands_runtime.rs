use std::env;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use spectrum_cli::commands::{config, doctor, predict, products, recommend, seed};
use spectrum_core::demo;
use tempfile::TempDir;

#[test]
fn predict_returns_segment_label_for_demo_bundle() {
    let dir = TempDir::new().expect("temp dir");
    with_bundle(&dir, &[], || {
        let result = predict::run(10.0, 14.0, 9000.0);
        assert_eq!(result.exit_code, 0, "expected successful prediction");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "predict");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["segment_label"], "High-Value");
        assert_eq!(payload["message"], "This customer belongs to: High-Value");
    });
}

#[test]
fn predict_rejects_negative_recency_with_invalid_input_code() {
    let dir = TempDir::new().expect("temp dir");
    with_bundle(&dir, &[], || {
        let result = predict::run(-1.0, 5.0, 100.0);
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn predict_reports_missing_artifacts_as_startup_failure() {
    let dir = TempDir::new().expect("temp dir");
    let model_dir = dir.path().display().to_string();
    with_env(&[("SPECTRUM_MODEL_DIR", &model_dir)], || {
        let result = predict::run(30.0, 5.0, 100.0);
        assert_eq!(result.exit_code, 3);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "artifact_missing");
        let message = payload["message"].as_str().unwrap_or_default();
        assert!(message.contains("kmeans_model"));
        assert!(message.contains("similarity_matrix"));
    });
}

#[test]
fn recommend_by_name_returns_ranked_neighbors() {
    let dir = TempDir::new().expect("temp dir");
    with_bundle(&dir, &[], || {
        let result = recommend::run("white metal lantern", false, Some(3));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["product_id"], "71053");
        let descriptions: Vec<&str> = payload["data"]["items"]
            .as_array()
            .expect("items array")
            .iter()
            .filter_map(|item| item["description"].as_str())
            .collect();
        assert_eq!(
            descriptions,
            vec![
                "INFLATABLE POLITICAL GLOBE",
                "WHITE HANGING HEART T-LIGHT HOLDER",
                "CREAM CUPID HEARTS COAT HANGER",
            ]
        );
    });
}

#[test]
fn recommend_by_id_uses_configured_default_top_n() {
    let dir = TempDir::new().expect("temp dir");
    with_bundle(&dir, &[("SPECTRUM_RECOMMENDATION_DEFAULT_TOP_N", "2")], || {
        let result = recommend::run("10002", true, None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["items"].as_array().map(Vec::len), Some(2));
    });
}

#[test]
fn recommend_unknown_product_returns_not_found_code() {
    let dir = TempDir::new().expect("temp dir");
    with_bundle(&dir, &[], || {
        let result = recommend::run("PINK PAPER PARASOL", false, None);
        assert_eq!(result.exit_code, 5);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "not_found");
    });
}

#[test]
fn recommend_rejects_top_n_above_configured_maximum() {
    let dir = TempDir::new().expect("temp dir");
    let vars = [
        ("SPECTRUM_RECOMMENDATION_DEFAULT_TOP_N", "2"),
        ("SPECTRUM_RECOMMENDATION_MAX_TOP_N", "3"),
    ];
    with_bundle(&dir, &vars, || {
        let result = recommend::run("white metal lantern", false, Some(4));
        assert_eq!(result.exit_code, 4);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "invalid_input");
    });
}

#[test]
fn recommend_for_unscored_product_succeeds_with_empty_list() {
    let dir = TempDir::new().expect("temp dir");
    with_bundle(&dir, &[], || {
        let result = recommend::run("Set 7 Babushka Nesting Boxes", false, None);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["data"]["items"], Value::Array(Vec::new()));
    });
}

#[test]
fn products_filters_by_search_term() {
    let dir = TempDir::new().expect("temp dir");
    with_bundle(&dir, &[], || {
        let result = products::run(Some("heart"));
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(
            payload["data"]["products"],
            serde_json::json!([
                "CREAM CUPID HEARTS COAT HANGER",
                "WHITE HANGING HEART T-LIGHT HOLDER"
            ])
        );
    });
}

#[test]
fn doctor_passes_with_demo_bundle() {
    let dir = TempDir::new().expect("temp dir");
    with_bundle(&dir, &[], || {
        let (exit_code, output) = doctor::run(true);
        assert_eq!(exit_code, 0, "expected all checks to pass: {output}");

        let payload = parse_payload(&output);
        assert_eq!(payload["overall_status"], "pass");
        assert_eq!(payload["store"]["clusters"], 4);
        assert_eq!(payload["store"]["catalog_products"], 6);
    });
}

#[test]
fn doctor_skips_model_loading_when_artifacts_are_missing() {
    let dir = TempDir::new().expect("temp dir");
    let model_dir = dir.path().display().to_string();
    with_env(&[("SPECTRUM_MODEL_DIR", &model_dir)], || {
        let (exit_code, output) = doctor::run(false);
        assert_eq!(exit_code, 3);
        assert!(output.contains("- [fail] artifact_presence"));
        assert!(output.contains("- [skip] model_loading"));
    });
}

#[test]
fn config_reports_env_sources() {
    with_env(&[("SPECTRUM_SERVER_PORT", "9090"), ("SPECTRUM_LOG_LEVEL", "debug")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let entries = payload["data"]["entries"].as_array().expect("entries array");
        let port = entries.iter().find(|entry| entry["key"] == "server.port").expect("port entry");
        assert_eq!(port["value"], "9090");
        assert_eq!(port["source"], "env (SPECTRUM_SERVER_PORT)");

        let level =
            entries.iter().find(|entry| entry["key"] == "logging.level").expect("level entry");
        assert_eq!(level["source"], "env (SPECTRUM_LOG_LEVEL)");

        let scaler =
            entries.iter().find(|entry| entry["key"] == "artifacts.scaler").expect("scaler entry");
        assert_eq!(scaler["source"], "default");
    });
}

#[test]
fn config_ignores_blank_env_values_when_attributing_sources() {
    with_env(&[("SPECTRUM_SERVER_PORT", ""), ("SPECTRUM_LOGGING_LEVEL", "  ")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        let entries = payload["data"]["entries"].as_array().expect("entries array");
        let port = entries.iter().find(|entry| entry["key"] == "server.port").expect("port entry");
        assert_eq!(port["value"], "8080");
        assert_eq!(port["source"], "default");

        let level =
            entries.iter().find(|entry| entry["key"] == "logging.level").expect("level entry");
        assert_eq!(level["value"], "info");
        assert_eq!(level["source"], "default");
    });
}

#[test]
fn config_returns_config_failure_for_invalid_override() {
    with_env(&[("SPECTRUM_SERVER_PORT", "not-a-port")], || {
        let result = config::run();
        assert_eq!(result.exit_code, 2);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_writes_a_loadable_bundle() {
    let dir = TempDir::new().expect("temp dir");
    let target = dir.path().join("bundle");

    let result = seed::run(&target);
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "seed");
    assert!(target.join(demo::KMEANS_FILE).is_file());
    assert!(target.join(demo::CATALOG_FILE).is_file());
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

/// Seeds the demo bundle into `dir` and points config at it.
fn with_bundle(dir: &TempDir, extra: &[(&str, &str)], test_fn: impl FnOnce()) {
    let locations = demo::write_bundle(dir.path()).expect("demo bundle written");
    let model_dir = dir.path().display().to_string();
    let catalog = locations.catalog.display().to_string();

    let mut vars = vec![
        ("SPECTRUM_MODEL_DIR", model_dir.as_str()),
        ("SPECTRUM_CATALOG_PATH", catalog.as_str()),
    ];
    vars.extend_from_slice(extra);
    with_env(&vars, test_fn);
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "SPECTRUM_MODEL_DIR",
        "SPECTRUM_KMEANS_MODEL_PATH",
        "SPECTRUM_SCALER_PATH",
        "SPECTRUM_SIMILARITY_MATRIX_PATH",
        "SPECTRUM_CATALOG_PATH",
        "SPECTRUM_CATALOG_ID_COLUMN",
        "SPECTRUM_CATALOG_NAME_COLUMN",
        "SPECTRUM_RECOMMENDATION_DEFAULT_TOP_N",
        "SPECTRUM_RECOMMENDATION_MAX_TOP_N",
        "SPECTRUM_SERVER_BIND_ADDRESS",
        "SPECTRUM_SERVER_PORT",
        "SPECTRUM_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "SPECTRUM_LOGGING_LEVEL",
        "SPECTRUM_LOGGING_FORMAT",
        "SPECTRUM_LOG_LEVEL",
        "SPECTRUM_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
