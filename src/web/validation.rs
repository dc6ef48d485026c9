// src/web/validation.rs
// =============================================================================
// Validation of site definitions submitted to the registration API.
//
// Checks, in order (the first failure wins):
// 1. The batch is not empty
// 2. Every URL parses and is http(s) with a host
// 3. Every pattern is non-empty and compiles
// 4. Every interval is within [5, 300] seconds
// =============================================================================

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::model::NewSite;

pub const MIN_INTERVAL_SECS: i64 = 5;
pub const MAX_INTERVAL_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty request")]
    EmptyRequest,
    #[error("invalid url")]
    InvalidUrl,
    #[error("empty regexp")]
    EmptyRegexp,
    #[error("invalid regexp")]
    InvalidRegexp,
    #[error("check_interval_sec must be between 5 and 300")]
    IntervalOutOfRange,
}

/// Checks a batch of site definitions before it is stored
pub fn is_valid(sites: &[NewSite]) -> Result<(), ValidationError> {
    if sites.is_empty() {
        return Err(ValidationError::EmptyRequest);
    }

    for site in sites {
        validate_url(&site.url)?;

        if site.regexp.is_empty() {
            return Err(ValidationError::EmptyRegexp);
        }
        if Regex::new(&site.regexp).is_err() {
            return Err(ValidationError::InvalidRegexp);
        }

        if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&site.check_interval_sec) {
            return Err(ValidationError::IntervalOutOfRange);
        }
    }

    Ok(())
}

// Validate URL format and scheme
fn validate_url(url: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(url).map_err(|_| ValidationError::InvalidUrl)?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some_and(|h| !h.is_empty()) => Ok(()),
        _ => Err(ValidationError::InvalidUrl),
    }
}
