// In-memory store for tests. Not durable; everything is lost on drop.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{interval_secs, MetricsStore, SiteRegistry, StoreError};
use crate::model::{CheckResult, NewSite, Site};

#[derive(Debug, Default)]
pub struct MemoryStore {
    sites: Mutex<Vec<Site>>,
    metrics: Mutex<Vec<CheckResult>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following write fail with a database error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn metrics(&self) -> Vec<CheckResult> {
        self.metrics.lock().unwrap().clone()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MetricsStore for MemoryStore {
    async fn save_metric(&self, result: &CheckResult) -> Result<(), StoreError> {
        self.check_writable()?;
        self.metrics.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn get_metrics(&self, site_id: i64) -> Result<Vec<CheckResult>, StoreError> {
        let mut metrics: Vec<_> = self
            .metrics
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.site_id == site_id)
            .cloned()
            .collect();
        metrics.sort_by_key(|m| m.timestamp);
        Ok(metrics)
    }
}

#[async_trait]
impl SiteRegistry for MemoryStore {
    async fn get_sites(&self) -> Result<Vec<Site>, StoreError> {
        Ok(self.sites.lock().unwrap().clone())
    }

    async fn save_sites(&self, candidates: &[NewSite]) -> Result<Vec<Site>, StoreError> {
        self.check_writable()?;

        let mut sites = self.sites.lock().unwrap();
        let mut saved = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let site_id = sites.len() as i64 + 1;
            let site = Site::new(
                site_id,
                candidate.url.clone(),
                &candidate.regexp,
                interval_secs(i32::try_from(candidate.check_interval_sec).unwrap_or(i32::MAX)),
            )
            .map_err(|source| StoreError::InvalidPattern { site_id, source })?;
            sites.push(site.clone());
            saved.push(site);
        }

        Ok(saved)
    }
}
