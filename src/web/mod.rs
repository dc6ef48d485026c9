// src/web/mod.rs
// =============================================================================
// This module is the HTTP front end of the service.
//
// Submodules:
// - validation: Checks submitted site definitions
// - handlers: The request handlers
//
// This file builds the router and holds the state shared by all handlers.
// =============================================================================

mod handlers;
pub mod validation;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::store::{MetricsStore, SiteRegistry};
use crate::watch::Scheduler;

/// State shared by every request handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn SiteRegistry>,
    pub metrics: Arc<dyn MetricsStore>,
    pub scheduler: Arc<Scheduler>,
}

/// Builds the API router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::add_to_monitoring))
        .route("/sites/:site_id/metrics", get(handlers::get_metrics))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
