// src/wayback/mod.rs
// =============================================================================
// Client for the Internet Archive's Wayback Machine.
//
// Submodules:
// - client: the HTTP client, its config and the ArchiveLookup trait
// - error: what can go wrong talking to the archive
// =============================================================================

mod client;
mod error;

pub use client::{
    ArchiveLookup, ClientConfig, SnapshotOutcome, WaybackClient, DEFAULT_AVAILABILITY_ENDPOINT,
    DEFAULT_SAVE_ENDPOINT,
};
pub use error::ArchiveError;
