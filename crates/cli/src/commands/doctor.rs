use serde::Serialize;
use spectrum_core::config::{AppConfig, LoadOptions};
use spectrum_core::{ArtifactLocations, ModelStore, StoreSummary};

use super::EXIT_STARTUP;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store: Option<StoreSummary>,
}

/// Returns the exit code and rendered report.
pub fn run(json_output: bool) -> (u8, String) {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_STARTUP };

    if json_output {
        let output = serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
        return (exit_code, output);
    }

    (exit_code, render_human(&report))
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();
    let mut store = None;

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });

            let locations = config.artifacts.locations();
            let presence = check_artifact_presence(&locations);
            let artifacts_present = presence.status == CheckStatus::Pass;
            checks.push(presence);

            if artifacts_present {
                let (check, summary) = check_store_loading(&locations);
                checks.push(check);
                store = summary;
            } else {
                checks.push(skipped("model_loading", "skipped because artifacts are missing"));
            }
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped(
                "artifact_presence",
                "skipped because configuration did not load",
            ));
            checks.push(skipped("model_loading", "skipped because configuration did not load"));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks, store }
}

fn check_artifact_presence(locations: &ArtifactLocations) -> DoctorCheck {
    let missing = locations.missing_artifacts();
    if missing.is_empty() {
        return DoctorCheck {
            name: "artifact_presence",
            status: CheckStatus::Pass,
            details: "kmeans_model, scaler and similarity_matrix found".to_string(),
        };
    }

    let details = missing
        .iter()
        .map(|artifact| format!("{} (`{}`)", artifact.kind, artifact.path.display()))
        .collect::<Vec<_>>()
        .join(", ");
    DoctorCheck {
        name: "artifact_presence",
        status: CheckStatus::Fail,
        details: format!("missing: {details}"),
    }
}

fn check_store_loading(locations: &ArtifactLocations) -> (DoctorCheck, Option<StoreSummary>) {
    match ModelStore::initialize(locations) {
        Ok(store) => {
            let summary = store.summary();
            let check = DoctorCheck {
                name: "model_loading",
                status: CheckStatus::Pass,
                details: format!(
                    "{} clusters, {} scored products, {} catalog products, {} name collisions",
                    summary.clusters,
                    summary.similarity_products,
                    summary.catalog_products,
                    summary.name_collisions
                ),
            };
            (check, Some(summary))
        }
        Err(error) => {
            let check = DoctorCheck {
                name: "model_loading",
                status: CheckStatus::Fail,
                details: format!("{}: {error}", error.error_class()),
            };
            (check, None)
        }
    }
}

fn skipped(name: &'static str, details: &str) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Skipped, details: details.to_string() }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
