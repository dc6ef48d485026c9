// src/model.rs
// =============================================================================
// Shared data types: monitored sites, registration candidates and the metric
// recorded for every successful check.
//
// A Site is immutable once its check loop has started. The pattern is stored
// as text in the database and compiled into a Regex when the Site is built.
// =============================================================================

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

/// A site being monitored
#[derive(Debug, Clone)]
pub struct Site {
    /// Unique id assigned by the site registry
    pub id: i64,
    pub url: String,
    /// Extraction pattern applied to the body of 200 responses
    pub pattern: Regex,
    /// Time to wait between the end of one check and the start of the next
    pub interval: Duration,
}

impl Site {
    /// Builds a site from its stored representation, compiling the pattern
    pub fn new(id: i64, url: String, pattern: &str, interval_secs: u64) -> Result<Self, regex::Error> {
        Ok(Site {
            id,
            url,
            pattern: Regex::new(pattern)?,
            interval: Duration::from_secs(interval_secs),
        })
    }
}

// A site definition as submitted to the registration API
//
// Field names match the JSON body: {"url", "regexp", "check_interval_sec"}
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSite {
    pub url: String,
    pub regexp: String,
    pub check_interval_sec: i64,
}

/// One recorded outcome of a single fetch
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CheckResult {
    pub site_id: i64,
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "response_time_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
    /// Newline-joined regex matches; None unless the response was 200
    #[serde(rename = "content")]
    pub extracted_content: Option<String>,
}

fn as_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}
