use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogColumns, DEFAULT_ID_COLUMN, DEFAULT_NAME_COLUMN};
use crate::engine::DEFAULT_TOP_N;
use crate::store::ArtifactLocations;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub artifacts: ArtifactsConfig,
    pub recommendation: RecommendationConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Model bundle and dataset locations.
///
/// Relative model artifact paths resolve against `model_dir`; the catalog path
/// resolves against the working directory.
#[derive(Clone, Debug)]
pub struct ArtifactsConfig {
    pub model_dir: PathBuf,
    pub kmeans_model: PathBuf,
    pub scaler: PathBuf,
    pub similarity_matrix: PathBuf,
    pub catalog: PathBuf,
    pub catalog_id_column: String,
    pub catalog_name_column: String,
}

#[derive(Clone, Debug)]
pub struct RecommendationConfig {
    pub default_top_n: usize,
    pub max_top_n: usize,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub model_dir: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub log_level: Option<String>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifacts: ArtifactsConfig {
                model_dir: PathBuf::from("models"),
                kmeans_model: PathBuf::from("kmeans_model.json"),
                scaler: PathBuf::from("scaler.json"),
                similarity_matrix: PathBuf::from("similarity_matrix.json"),
                catalog: PathBuf::from("data/online_retail.csv"),
                catalog_id_column: DEFAULT_ID_COLUMN.to_string(),
                catalog_name_column: DEFAULT_NAME_COLUMN.to_string(),
            },
            recommendation: RecommendationConfig { default_top_n: DEFAULT_TOP_N, max_top_n: 50 },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl ArtifactsConfig {
    pub fn locations(&self) -> ArtifactLocations {
        ArtifactLocations {
            kmeans_model: self.model_dir.join(&self.kmeans_model),
            scaler: self.model_dir.join(&self.scaler),
            similarity_matrix: self.model_dir.join(&self.similarity_matrix),
            catalog: self.catalog.clone(),
            catalog_columns: CatalogColumns {
                id: self.catalog_id_column.clone(),
                name: self.catalog_name_column.clone(),
            },
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("spectrum.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(artifacts) = patch.artifacts {
            if let Some(model_dir) = artifacts.model_dir {
                self.artifacts.model_dir = model_dir;
            }
            if let Some(kmeans_model) = artifacts.kmeans_model {
                self.artifacts.kmeans_model = kmeans_model;
            }
            if let Some(scaler) = artifacts.scaler {
                self.artifacts.scaler = scaler;
            }
            if let Some(similarity_matrix) = artifacts.similarity_matrix {
                self.artifacts.similarity_matrix = similarity_matrix;
            }
            if let Some(catalog) = artifacts.catalog {
                self.artifacts.catalog = catalog;
            }
            if let Some(catalog_id_column) = artifacts.catalog_id_column {
                self.artifacts.catalog_id_column = catalog_id_column;
            }
            if let Some(catalog_name_column) = artifacts.catalog_name_column {
                self.artifacts.catalog_name_column = catalog_name_column;
            }
        }

        if let Some(recommendation) = patch.recommendation {
            if let Some(default_top_n) = recommendation.default_top_n {
                self.recommendation.default_top_n = default_top_n;
            }
            if let Some(max_top_n) = recommendation.max_top_n {
                self.recommendation.max_top_n = max_top_n;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SPECTRUM_MODEL_DIR") {
            self.artifacts.model_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("SPECTRUM_KMEANS_MODEL_PATH") {
            self.artifacts.kmeans_model = PathBuf::from(value);
        }
        if let Some(value) = read_env("SPECTRUM_SCALER_PATH") {
            self.artifacts.scaler = PathBuf::from(value);
        }
        if let Some(value) = read_env("SPECTRUM_SIMILARITY_MATRIX_PATH") {
            self.artifacts.similarity_matrix = PathBuf::from(value);
        }
        if let Some(value) = read_env("SPECTRUM_CATALOG_PATH") {
            self.artifacts.catalog = PathBuf::from(value);
        }
        if let Some(value) = read_env("SPECTRUM_CATALOG_ID_COLUMN") {
            self.artifacts.catalog_id_column = value;
        }
        if let Some(value) = read_env("SPECTRUM_CATALOG_NAME_COLUMN") {
            self.artifacts.catalog_name_column = value;
        }

        if let Some(value) = read_env("SPECTRUM_RECOMMENDATION_DEFAULT_TOP_N") {
            self.recommendation.default_top_n =
                parse_usize("SPECTRUM_RECOMMENDATION_DEFAULT_TOP_N", &value)?;
        }
        if let Some(value) = read_env("SPECTRUM_RECOMMENDATION_MAX_TOP_N") {
            self.recommendation.max_top_n =
                parse_usize("SPECTRUM_RECOMMENDATION_MAX_TOP_N", &value)?;
        }

        if let Some(value) = read_env("SPECTRUM_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SPECTRUM_SERVER_PORT") {
            self.server.port = parse_u16("SPECTRUM_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SPECTRUM_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("SPECTRUM_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("SPECTRUM_LOGGING_LEVEL").or_else(|| read_env("SPECTRUM_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SPECTRUM_LOGGING_FORMAT").or_else(|| read_env("SPECTRUM_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(model_dir) = overrides.model_dir {
            self.artifacts.model_dir = model_dir;
        }
        if let Some(catalog) = overrides.catalog {
            self.artifacts.catalog = catalog;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_artifacts(&self.artifacts)?;
        validate_recommendation(&self.recommendation)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("spectrum.toml"), PathBuf::from("config/spectrum.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_artifacts(artifacts: &ArtifactsConfig) -> Result<(), ConfigError> {
    let paths = [
        ("artifacts.kmeans_model", &artifacts.kmeans_model),
        ("artifacts.scaler", &artifacts.scaler),
        ("artifacts.similarity_matrix", &artifacts.similarity_matrix),
        ("artifacts.catalog", &artifacts.catalog),
    ];
    for (key, path) in paths {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
    }

    let id_column = artifacts.catalog_id_column.trim();
    let name_column = artifacts.catalog_name_column.trim();
    if id_column.is_empty() || name_column.is_empty() {
        return Err(ConfigError::Validation(
            "artifacts.catalog_id_column and artifacts.catalog_name_column must not be empty"
                .to_string(),
        ));
    }
    if id_column == name_column {
        return Err(ConfigError::Validation(
            "artifacts.catalog_id_column and artifacts.catalog_name_column must differ"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_recommendation(recommendation: &RecommendationConfig) -> Result<(), ConfigError> {
    if recommendation.max_top_n == 0 || recommendation.max_top_n > 1000 {
        return Err(ConfigError::Validation(
            "recommendation.max_top_n must be in range 1..=1000".to_string(),
        ));
    }

    if recommendation.default_top_n == 0
        || recommendation.default_top_n > recommendation.max_top_n
    {
        return Err(ConfigError::Validation(format!(
            "recommendation.default_top_n must be in range 1..={}",
            recommendation.max_top_n
        )));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    artifacts: Option<ArtifactsPatch>,
    recommendation: Option<RecommendationPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ArtifactsPatch {
    model_dir: Option<PathBuf>,
    kmeans_model: Option<PathBuf>,
    scaler: Option<PathBuf>,
    similarity_matrix: Option<PathBuf>,
    catalog: Option<PathBuf>,
    catalog_id_column: Option<String>,
    catalog_name_column: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    default_top_n: Option<usize>,
    max_top_n: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
