// src/wayback/client.rs
// =============================================================================
// This module talks to the Internet Archive's Wayback Machine.
//
// Two operations:
// - lookup: "is there an archived snapshot of this URL, and where is it?"
//   GET https://archive.org/wayback/available?url=<encoded url>
// - save: "please archive this URL"
//   POST https://web.archive.org/save/<url>
//
// Each call is exactly one HTTP round trip. No retries, no caching - the
// caller (the link replacer) decides what to do with failures.
//
// Rust concepts:
// - Traits: ArchiveLookup lets tests swap in a fake archive
// - serde: Decoding the nested JSON payload into typed structs
// - Result<T, E>: Every network call can fail
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::error::ArchiveError;

pub const DEFAULT_AVAILABILITY_ENDPOINT: &str = "https://archive.org/wayback/available";
pub const DEFAULT_SAVE_ENDPOINT: &str = "https://web.archive.org/save/";

// What the archive told us about a single URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SnapshotOutcome {
    /// A snapshot exists at this URL
    Found { url: String },
    /// The archive has no snapshot of the URL
    NotFound,
    /// The archive returned a snapshot record without a usable URL
    Invalid,
}

// The seam between the link replacer and the network.
//
// WaybackClient is the real implementation; tests implement this with an
// in-memory fake so no network is needed.
#[async_trait]
pub trait ArchiveLookup: Send + Sync {
    async fn lookup(&self, url: &str) -> Result<SnapshotOutcome, ArchiveError>;

    async fn save(&self, url: &str) -> Result<(), ArchiveError>;
}

// Lets several owners share one client (and lets tests keep a handle on
// their fake after handing it to a replacer)
#[async_trait]
impl<T: ArchiveLookup + ?Sized> ArchiveLookup for Arc<T> {
    async fn lookup(&self, url: &str) -> Result<SnapshotOutcome, ArchiveError> {
        (**self).lookup(url).await
    }

    async fn save(&self, url: &str) -> Result<(), ArchiveError> {
        (**self).save(url).await
    }
}

// Settings for the real client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Availability API (the lookup endpoint)
    pub availability_endpoint: String,
    /// Prefix the target URL is appended to when saving
    pub save_endpoint: String,
    /// Per-request timeout; None keeps reqwest's default (no timeout)
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            availability_endpoint: DEFAULT_AVAILABILITY_ENDPOINT.to_string(),
            save_endpoint: DEFAULT_SAVE_ENDPOINT.to_string(),
            timeout: None,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// The JSON shape returned by the availability API:
//
// {
//   "url": "example.com",
//   "archived_snapshots": {
//     "closest": {
//       "available": true,
//       "url": "http://web.archive.org/web/20200101000000/http://example.com/",
//       "timestamp": "20200101000000",
//       "status": "200"
//     }
//   }
// }
//
// When nothing is archived, "archived_snapshots" is an empty object.
//
// The payload is walked as a loose serde_json::Value rather than typed
// structs: a 2xx body that IS JSON but has an unexpected shape (say
// "url": 42) is an Invalid snapshot for that one link, not a decode error.
fn outcome_from_payload(payload: &Value) -> SnapshotOutcome {
    let closest = match payload
        .get("archived_snapshots")
        .and_then(|snapshots| snapshots.get("closest"))
    {
        None | Some(Value::Null) => return SnapshotOutcome::NotFound,
        Some(closest) => closest,
    };

    // The archive says it has no usable copy, even if a url tags along
    if closest.get("available") == Some(&Value::Bool(false)) {
        return SnapshotOutcome::NotFound;
    }

    match closest.get("url").and_then(Value::as_str) {
        Some(url) if !url.is_empty() => SnapshotOutcome::Found {
            url: url.to_string(),
        },
        // Missing, empty, or not a string
        _ => SnapshotOutcome::Invalid,
    }
}

// HTTP client for the Wayback Machine
//
// Cheap to clone: reqwest::Client is reference counted internally.
#[derive(Debug, Clone)]
pub struct WaybackClient {
    http: Client,
    availability_endpoint: Url,
    save_endpoint: String,
}

impl WaybackClient {
    pub fn new(config: ClientConfig) -> Result<Self, ArchiveError> {
        let mut builder = Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        // Validate both endpoints up front so a typo fails fast, not per link
        let availability_endpoint = Url::parse(&config.availability_endpoint)?;
        Url::parse(&config.save_endpoint)?;

        Ok(Self {
            http: builder.build()?,
            availability_endpoint,
            save_endpoint: config.save_endpoint,
        })
    }

    // Builds `<availability endpoint>?url=<percent-encoded target>`
    fn availability_url(&self, target: &str) -> Url {
        let mut url = self.availability_endpoint.clone();
        url.query_pairs_mut().append_pair("url", target);
        url
    }

    // The save endpoint takes the target URL as a raw path suffix
    fn save_url(&self, target: &str) -> String {
        format!("{}{}", self.save_endpoint, target)
    }
}

#[async_trait]
impl ArchiveLookup for WaybackClient {
    async fn lookup(&self, url: &str) -> Result<SnapshotOutcome, ArchiveError> {
        let response = self.http.get(self.availability_url(url)).send().await?;
        let status = response.status();
        debug!(
            status = status.as_u16(),
            reason = status.canonical_reason().unwrap_or(""),
            "Get Wayback Machine link"
        );

        if !status.is_success() {
            return Err(ArchiveError::from_status(status));
        }

        let payload: Value = response.json().await.map_err(ArchiveError::Decode)?;
        Ok(outcome_from_payload(&payload))
    }

    async fn save(&self, url: &str) -> Result<(), ArchiveError> {
        let response = self.http.post(self.save_url(url)).send().await?;
        let status = response.status();
        debug!(
            status = status.as_u16(),
            reason = status.canonical_reason().unwrap_or(""),
            "Save to Wayback Machine"
        );

        if !status.is_success() {
            return Err(ArchiveError::from_status(status));
        }

        Ok(())
    }
}
