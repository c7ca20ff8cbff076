pub mod config;
pub mod doctor;
pub mod predict;
pub mod products;
pub mod recommend;
pub mod seed;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use spectrum_core::config::{AppConfig, LoadOptions};
use spectrum_core::{ModelStore, QueryEngine, QueryError};

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_STARTUP: u8 = 3;
pub const EXIT_INVALID_INPUT: u8 = 4;
pub const EXIT_NOT_FOUND: u8 = 5;
pub const EXIT_IO: u8 = 6;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: &impl Serialize,
    ) -> Self {
        let data = match serde_json::to_value(data) {
            Ok(data) => data,
            Err(error) => {
                return Self::failure(command, "serialization", error.to_string(), EXIT_IO)
            }
        };
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data: Some(data),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn query_failure(command: &str, error: QueryError) -> Self {
        match error {
            QueryError::InvalidInput { .. } => {
                Self::failure(command, "invalid_input", error.to_string(), EXIT_INVALID_INPUT)
            }
            QueryError::ProductNotFound { .. } => Self::failure(
                command,
                "not_found",
                format!("{error}. Please check the name and try again."),
                EXIT_NOT_FOUND,
            ),
        }
    }
}

/// Loads config and the model store, or the failure to print for `command`.
pub(crate) fn load_engine(command: &str) -> Result<(AppConfig, QueryEngine), CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })?;

    let store = ModelStore::initialize(&config.artifacts.locations()).map_err(|error| {
        CommandResult::failure(command, error.error_class(), error.to_string(), EXIT_STARTUP)
    })?;

    Ok((config, QueryEngine::new(Arc::new(store))))
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
