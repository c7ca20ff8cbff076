use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use spectrum_core::config::{AppConfig, LoadOptions};
use toml::Value;

use super::{CommandResult, EXIT_CONFIG};

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

#[derive(Debug, Serialize)]
struct ConfigData {
    precedence: &'static str,
    config_file: Option<String>,
    entries: Vec<ConfigEntry>,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                EXIT_CONFIG,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let artifacts = &config.artifacts;
    let fields: [(&'static str, &[&str], String); 14] = [
        ("artifacts.model_dir", &["SPECTRUM_MODEL_DIR"], artifacts.model_dir.display().to_string()),
        (
            "artifacts.kmeans_model",
            &["SPECTRUM_KMEANS_MODEL_PATH"],
            artifacts.kmeans_model.display().to_string(),
        ),
        ("artifacts.scaler", &["SPECTRUM_SCALER_PATH"], artifacts.scaler.display().to_string()),
        (
            "artifacts.similarity_matrix",
            &["SPECTRUM_SIMILARITY_MATRIX_PATH"],
            artifacts.similarity_matrix.display().to_string(),
        ),
        ("artifacts.catalog", &["SPECTRUM_CATALOG_PATH"], artifacts.catalog.display().to_string()),
        (
            "artifacts.catalog_id_column",
            &["SPECTRUM_CATALOG_ID_COLUMN"],
            artifacts.catalog_id_column.clone(),
        ),
        (
            "artifacts.catalog_name_column",
            &["SPECTRUM_CATALOG_NAME_COLUMN"],
            artifacts.catalog_name_column.clone(),
        ),
        (
            "recommendation.default_top_n",
            &["SPECTRUM_RECOMMENDATION_DEFAULT_TOP_N"],
            config.recommendation.default_top_n.to_string(),
        ),
        (
            "recommendation.max_top_n",
            &["SPECTRUM_RECOMMENDATION_MAX_TOP_N"],
            config.recommendation.max_top_n.to_string(),
        ),
        (
            "server.bind_address",
            &["SPECTRUM_SERVER_BIND_ADDRESS"],
            config.server.bind_address.clone(),
        ),
        ("server.port", &["SPECTRUM_SERVER_PORT"], config.server.port.to_string()),
        (
            "server.graceful_shutdown_secs",
            &["SPECTRUM_SERVER_GRACEFUL_SHUTDOWN_SECS"],
            config.server.graceful_shutdown_secs.to_string(),
        ),
        (
            "logging.level",
            &["SPECTRUM_LOGGING_LEVEL", "SPECTRUM_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        (
            "logging.format",
            &["SPECTRUM_LOGGING_FORMAT", "SPECTRUM_LOG_FORMAT"],
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
        ),
    ];

    let entries = fields
        .into_iter()
        .map(|(key, env_keys, value)| ConfigEntry {
            key,
            value,
            source: field_source(
                key,
                env_keys,
                config_file_doc.as_ref(),
                config_file_path.as_deref(),
            ),
        })
        .collect();

    let data = ConfigData {
        precedence: "env > file > default",
        config_file: config_file_path.map(|path| path.display().to_string()),
        entries,
    };

    CommandResult::success_with_data("config", "effective configuration", &data)
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("spectrum.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/spectrum.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env_value_is_set(key)) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

/// Blank values are ignored by the config loader, so they never count as a source.
fn env_value_is_set(key: &str) -> bool {
    env::var(key).is_ok_and(|value| !value.trim().is_empty())
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}
