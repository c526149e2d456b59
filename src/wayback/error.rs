// src/wayback/error.rs
// =============================================================================
// Errors that can come back from the Wayback Machine client.
//
// "Not found" is NOT an error here - it's a normal SnapshotOutcome. These are
// the cases where we couldn't get a usable answer at all.
// =============================================================================

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive answered, but with a non-2xx status
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    /// The request never got a response (DNS, connect, timeout, ...)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// 2xx response whose body wasn't the JSON we expected
    #[error("could not decode archive response: {0}")]
    Decode(#[source] reqwest::Error),

    /// A configured endpoint isn't a valid URL
    #[error("invalid archive endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}

impl ArchiveError {
    // Builds a Status error from a reqwest status code, keeping the
    // canonical reason text ("Not Found", "Service Unavailable", ...)
    pub(crate) fn from_status(status: StatusCode) -> Self {
        ArchiveError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }
}
