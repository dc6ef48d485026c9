// src/store/mod.rs
// =============================================================================
// This module persists monitored sites and the metrics recorded for them.
//
// Two traits split the work:
// - SiteRegistry: stores site definitions and hands them back on startup
// - MetricsStore: stores one CheckResult per check and reads them back
//
// Submodules:
// - postgres: The real implementation on top of a sqlx connection pool
// - memory: An in-memory implementation used by the tests
// =============================================================================

#[cfg(test)]
pub(crate) mod memory;
mod postgres;

pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{CheckResult, NewSite, Site};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("site {site_id} has an invalid pattern: {source}")]
    InvalidPattern {
        site_id: i64,
        #[source]
        source: regex::Error,
    },
}

/// Storage for check results
#[async_trait]
pub trait MetricsStore: Send + Sync {
    async fn save_metric(&self, result: &CheckResult) -> Result<(), StoreError>;

    /// All metrics of one site, oldest first
    async fn get_metrics(&self, site_id: i64) -> Result<Vec<CheckResult>, StoreError>;
}

/// Storage for site definitions
#[async_trait]
pub trait SiteRegistry: Send + Sync {
    /// Every stored site, used once at startup to repopulate the scheduler
    async fn get_sites(&self) -> Result<Vec<Site>, StoreError>;

    /// Stores the candidates and returns them with their assigned ids
    async fn save_sites(&self, candidates: &[NewSite]) -> Result<Vec<Site>, StoreError>;
}

// Turns a stored interval into seconds; negative values never pass validation
fn interval_secs(check_interval_sec: i32) -> u64 {
    u64::try_from(check_interval_sec).unwrap_or(0)
}
