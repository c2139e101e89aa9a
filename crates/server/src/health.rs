use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use riverlevels_core::LocaleCatalog;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    catalog: Arc<LocaleCatalog>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(catalog: Arc<LocaleCatalog>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { catalog })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state.catalog);
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "riverlevels-server runtime initialized".to_string(),
        },
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn catalog_check(catalog: &LocaleCatalog) -> HealthCheck {
    let locale = catalog.active_locale();
    let rivers = locale.entities().len();
    if rivers == 0 {
        return HealthCheck {
            status: "degraded",
            detail: format!("locale `{}` has no rivers to report on", locale.locale),
        };
    }
    let locales = catalog.locales().collect::<Vec<_>>().join(", ");
    HealthCheck {
        status: "ready",
        detail: format!("{rivers} river(s) in locale `{}` (locales: {locales})", locale.locale),
    }
}
