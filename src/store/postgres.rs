// src/store/postgres.rs
// =============================================================================
// Postgres implementation of SiteRegistry and MetricsStore.
//
// Tables (see migrations/):
//   watch_list(site_id, url, regexp, check_interval_sec)
//   metrics(metric_id, site_id, timestamp, response_time_ns, status_code, content)
//
// The pool is shared by every check loop, so many loops can save metrics at
// the same time.
// =============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use super::{interval_secs, MetricsStore, SiteRegistry, StoreError};
use crate::model::{CheckResult, NewSite, Site};

type SiteRow = (i64, String, String, i32);
type MetricRow = (i64, i32, DateTime<Utc>, i64, Option<String>);

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Opens a connection pool to the database
    pub async fn connect(dsn: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(10))
            .connect(dsn)
            .await?;

        info!("connected to database");
        Ok(PgStore { pool })
    }

    /// Applies every pending migration found in `dir`
    pub async fn run_migrations(&self, dir: &Path) -> Result<(), StoreError> {
        info!(dir = %dir.display(), "running database migrations");
        let migrator = Migrator::new(dir).await?;
        migrator.run(&self.pool).await?;
        info!("migrations complete");
        Ok(())
    }

    /// Reverts every applied migration found in `dir`
    pub async fn rollback_migrations(&self, dir: &Path) -> Result<(), StoreError> {
        info!(dir = %dir.display(), "rolling back database migrations");
        let migrator = Migrator::new(dir).await?;
        migrator.undo(&self.pool, 0).await?;
        info!("rollback complete");
        Ok(())
    }
}

#[async_trait]
impl MetricsStore for PgStore {
    async fn save_metric(&self, result: &CheckResult) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO metrics (site_id, timestamp, response_time_ns, status_code, content) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(result.site_id)
        .bind(result.timestamp)
        .bind(i64::try_from(result.elapsed.as_nanos()).unwrap_or(i64::MAX))
        .bind(i32::from(result.status_code))
        .bind(result.extracted_content.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_metrics(&self, site_id: i64) -> Result<Vec<CheckResult>, StoreError> {
        let rows: Vec<MetricRow> = sqlx::query_as(
            "SELECT site_id, status_code, timestamp, response_time_ns, content \
             FROM metrics WHERE site_id = $1 ORDER BY timestamp",
        )
        .bind(site_id)
        .fetch_all(&self.pool)
        .await?;

        let metrics = rows
            .into_iter()
            .map(|(site_id, status_code, timestamp, response_time_ns, content)| CheckResult {
                site_id,
                status_code: u16::try_from(status_code).unwrap_or_default(),
                timestamp,
                elapsed: Duration::from_nanos(u64::try_from(response_time_ns).unwrap_or_default()),
                extracted_content: content,
            })
            .collect();

        Ok(metrics)
    }
}

#[async_trait]
impl SiteRegistry for PgStore {
    async fn get_sites(&self) -> Result<Vec<Site>, StoreError> {
        tracing::debug!("loading sites for monitoring from database");

        let rows: Vec<SiteRow> = sqlx::query_as(
            "SELECT site_id, url, regexp, check_interval_sec FROM watch_list ORDER BY site_id",
        )
        .fetch_all(&self.pool)
        .await?;

        // A pattern that stopped compiling must not keep the other sites
        // from being monitored
        let mut sites = Vec::with_capacity(rows.len());
        for row in rows {
            match site_from_row(row) {
                Ok(site) => sites.push(site),
                Err(e) => warn!(error = %e, "skipping stored site"),
            }
        }

        Ok(sites)
    }

    async fn save_sites(&self, candidates: &[NewSite]) -> Result<Vec<Site>, StoreError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO watch_list (url, regexp, check_interval_sec) ");
        builder.push_values(candidates, |mut row, site| {
            row.push_bind(site.url.clone())
                .push_bind(site.regexp.clone())
                .push_bind(i32::try_from(site.check_interval_sec).unwrap_or(i32::MAX));
        });
        builder.push(" RETURNING site_id, url, regexp, check_interval_sec");

        let rows: Vec<SiteRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "got an error while saving URLs to the watch list");
                e
            })?;

        rows.into_iter().map(site_from_row).collect()
    }
}

fn site_from_row((site_id, url, regexp, check_interval_sec): SiteRow) -> Result<Site, StoreError> {
    Site::new(site_id, url, &regexp, interval_secs(check_interval_sec))
        .map_err(|source| StoreError::InvalidPattern { site_id, source })
}
