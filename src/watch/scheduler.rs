// src/watch/scheduler.rs
// =============================================================================
// This module runs one check loop per monitored site.
//
// How a loop works:
// 1. FETCHING: fetch the site once
// 2. If the fetch produced a response, save it as a metric
// 3. WAITING: sleep for the site's interval
// 4. Go back to 1, until the scheduler shuts down
//
// Loops are independent tasks. They never talk to each other; the only thing
// they share is the metrics store (a connection pool) and the shutdown token.
// A failed fetch or a failed save only costs that one cycle.
//
// Rust concepts:
// - Arc<dyn Trait>: Shared ownership of the fetcher and store by every loop
// - tokio::select!: Race a fetch or a sleep against the shutdown signal
// - TaskTracker: Keeps track of spawned loops so shutdown can wait for them
// =============================================================================

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::checker::{Fetch, FetchOutcome};
use crate::model::{CheckResult, Site};
use crate::store::MetricsStore;

/// Owns the check loops of every monitored site
pub struct Scheduler {
    fetcher: Arc<dyn Fetch>,
    store: Arc<dyn MetricsStore>,
    shutdown: CancellationToken,
    loops: TaskTracker,
}

impl Scheduler {
    pub fn new(fetcher: Arc<dyn Fetch>, store: Arc<dyn MetricsStore>) -> Self {
        Scheduler {
            fetcher,
            store,
            shutdown: CancellationToken::new(),
            loops: TaskTracker::new(),
        }
    }

    // Starts one check loop per site and returns immediately
    //
    // Calls are additive: loops started earlier keep running untouched.
    // Sites are not deduplicated, passing the same site twice starts two
    // loops for it.
    pub fn add_sites(&self, sites: Vec<Site>) {
        for site in sites {
            let fetcher = Arc::clone(&self.fetcher);
            let store = Arc::clone(&self.store);
            let shutdown = self.shutdown.clone();

            self.loops.spawn(run_check_loop(site, fetcher, store, shutdown));
        }
    }

    /// Number of check loops that are still running
    pub fn active_loops(&self) -> usize {
        self.loops.len()
    }

    // Stops every check loop
    //
    // In-flight fetches are abandoned. Waits at most `grace` for the loops to
    // finish and returns false if some of them were still running by then.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        info!(active_loops = self.active_loops(), "stopping check loops");

        self.shutdown.cancel();
        self.loops.close();

        match tokio::time::timeout(grace, self.loops.wait()).await {
            Ok(()) => true,
            Err(_) => {
                warn!(
                    still_running = self.active_loops(),
                    grace_secs = grace.as_secs(),
                    "check loops did not stop within the grace period"
                );
                false
            }
        }
    }
}

// The check loop of a single site
//
// Fetch, record and sleep happen strictly in sequence, so two fetches of the
// same site never overlap.
async fn run_check_loop(
    site: Site,
    fetcher: Arc<dyn Fetch>,
    store: Arc<dyn MetricsStore>,
    shutdown: CancellationToken,
) {
    info!(
        site_id = site.id,
        url = %site.url,
        interval_secs = site.interval.as_secs(),
        "the site added to monitoring"
    );

    loop {
        // FETCHING
        let outcome = tokio::select! {
            _ = shutdown.cancelled() => break,
            outcome = fetcher.fetch(&site.url, &site.pattern) => outcome,
        };

        match outcome {
            FetchOutcome::Success(response) => {
                let result = CheckResult {
                    site_id: site.id,
                    status_code: response.status_code,
                    timestamp: response.timestamp,
                    elapsed: response.elapsed,
                    extracted_content: response.extracted_content,
                };

                if let Err(e) = store.save_metric(&result).await {
                    warn!(site_id = site.id, error = %e, "cannot save the site metrics");
                }
            }
            FetchOutcome::Failure(failure) => {
                warn!(site_id = site.id, url = %site.url, error = %failure, "cannot get the site content");
            }
        }

        // WAITING
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(site.interval) => {}
        }
    }

    debug!(site_id = site.id, "check loop stopped");
}
