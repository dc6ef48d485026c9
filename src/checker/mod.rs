// src/checker/mod.rs
// =============================================================================
// This module checks monitored sites.
//
// Submodules:
// - http: Fetches a site once and reports status, timing and content
// - extract: Pulls regex matches out of a response body
// =============================================================================

mod extract;
pub(crate) mod http;

pub use http::{CheckResponse, Fetch, FetchFailure, FetchOutcome, HttpFetcher};
