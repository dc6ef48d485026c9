// src/web/handlers.rs
// =============================================================================
// Request handlers of the registration API.
//
// POST /                      register a batch of sites for monitoring
// GET  /sites/:site_id/metrics stored metrics of one site
// GET  /health                liveness and number of running check loops
// =============================================================================

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::{error, info};

use super::validation::is_valid;
use super::AppState;
use crate::model::{CheckResult, NewSite};

// Validates the submitted sites, stores them and starts monitoring them
//
// The body is read as raw bytes so that an empty or malformed body gets a
// plain-text 400 with our own message.
pub async fn add_to_monitoring(State(state): State<AppState>, body: Bytes) -> (StatusCode, String) {
    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, "empty body request".to_string());
    }

    let sites: Vec<NewSite> = match serde_json::from_slice(&body) {
        Ok(sites) => sites,
        Err(_) => return (StatusCode::BAD_REQUEST, "malformed request".to_string()),
    };

    if let Err(e) = is_valid(&sites) {
        return (StatusCode::BAD_REQUEST, e.to_string());
    }

    // Losing a site definition is visible to the caller, so a failed write
    // is reported instead of swallowed
    let saved = match state.registry.save_sites(&sites).await {
        Ok(saved) => saved,
        Err(e) => {
            error!(error = %e, "cannot register sites");
            return (StatusCode::INTERNAL_SERVER_ERROR, "URLs cannot be added".to_string());
        }
    };

    info!(count = saved.len(), "sites registered");
    state.scheduler.add_sites(saved);

    (StatusCode::OK, "the URL added to the monitoring".to_string())
}

/// Returns every stored metric of a site, oldest first
pub async fn get_metrics(
    State(state): State<AppState>,
    Path(site_id): Path<i64>,
) -> Result<Json<Vec<CheckResult>>, (StatusCode, &'static str)> {
    state.metrics.get_metrics(site_id).await.map(Json).map_err(|e| {
        error!(site_id, error = %e, "cannot load metrics");
        (StatusCode::INTERNAL_SERVER_ERROR, "metrics cannot be loaded")
    })
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "active_loops": state.scheduler.active_loops(),
    }))
}
