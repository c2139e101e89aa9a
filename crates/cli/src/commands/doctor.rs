use riverlevels_core::config::{AppConfig, LoadOptions};
use riverlevels_core::LocaleCatalog;
use riverlevels_skill::{HttpRiverStateFetcher, IntentTable, RiverStateFetcher};
use serde::Serialize;

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
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            let catalog = LocaleCatalog::from_config(&config);
            checks.push(check_catalog_integrity(&catalog));
            checks.push(check_provider_reachability(&config, &catalog));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["catalog_integrity", "provider_reachability"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_catalog_integrity(catalog: &LocaleCatalog) -> DoctorCheck {
    let intents = IntentTable::for_catalog(catalog);
    let locale = catalog.active_locale();

    let mut problems = Vec::new();
    for entity in locale.entities() {
        let intent = entity.level_intent_name();
        if intents.river_for(&intent) != Some(entity.name.as_str()) {
            problems.push(format!("`{intent}` does not route to `{}`", entity.name));
        }
        if catalog.lookup(&entity.name).is_unknown() {
            problems.push(format!("`{}` does not resolve in the catalog", entity.name));
        }
    }
    if locale.entities().is_empty() {
        problems.push(format!("locale `{}` has no rivers", locale.locale));
    }

    if problems.is_empty() {
        DoctorCheck {
            name: "catalog_integrity",
            status: CheckStatus::Pass,
            details: format!(
                "{} river(s) in `{}` resolve through their level intents (locales: {})",
                locale.entities().len(),
                locale.locale,
                catalog.locales().collect::<Vec<_>>().join(", ")
            ),
        }
    } else {
        DoctorCheck {
            name: "catalog_integrity",
            status: CheckStatus::Fail,
            details: problems.join("; "),
        }
    }
}

fn check_provider_reachability(config: &AppConfig, catalog: &LocaleCatalog) -> DoctorCheck {
    let Some(probe) = catalog.active_locale().entities().first().cloned() else {
        return DoctorCheck {
            name: "provider_reachability",
            status: CheckStatus::Skipped,
            details: "no river configured to probe".to_string(),
        };
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "provider_reachability",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let fetcher = HttpRiverStateFetcher::from_config(&config.provider);
    match runtime.block_on(fetcher.fetch(&probe)) {
        Ok(reading) => DoctorCheck {
            name: "provider_reachability",
            status: CheckStatus::Pass,
            details: format!(
                "`{}` answered for {}: {} ({})",
                fetcher.base_url(),
                reading.river,
                reading.state_text,
                reading.state_value
            ),
        },
        Err(error) => DoctorCheck {
            name: "provider_reachability",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
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
