// src/testing.rs
// =============================================================================
// Test doubles shared by the unit tests: a scripted archive and a progress
// recorder. Compiled only for `cargo test`.
// =============================================================================

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::replacer::ProgressSink;
use crate::wayback::{ArchiveError, ArchiveLookup, SnapshotOutcome};

enum FakeResponse {
    Outcome(SnapshotOutcome),
    Status(u16),
    Panic,
}

// An archive that answers from a script. Links it wasn't told about are
// reported as not found.
#[derive(Default)]
pub(crate) struct FakeArchive {
    responses: HashMap<String, FakeResponse>,
    gate: Option<Arc<Notify>>,
    save_status: Option<u16>,
    lookups: Mutex<Vec<String>>,
    saves: Mutex<Vec<String>>,
}

impl FakeArchive {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn found(mut self, link: &str, snapshot: &str) -> Self {
        let outcome = SnapshotOutcome::Found {
            url: snapshot.to_string(),
        };
        self.responses
            .insert(link.to_string(), FakeResponse::Outcome(outcome));
        self
    }

    pub(crate) fn invalid(mut self, link: &str) -> Self {
        self.responses.insert(
            link.to_string(),
            FakeResponse::Outcome(SnapshotOutcome::Invalid),
        );
        self
    }

    pub(crate) fn http_error(mut self, link: &str, status: u16) -> Self {
        self.responses
            .insert(link.to_string(), FakeResponse::Status(status));
        self
    }

    pub(crate) fn panics_on(mut self, link: &str) -> Self {
        self.responses.insert(link.to_string(), FakeResponse::Panic);
        self
    }

    pub(crate) fn failing_saves(mut self, status: u16) -> Self {
        self.save_status = Some(status);
        self
    }

    // Every lookup waits for the gate to be notified before answering
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub(crate) fn saves(&self) -> Vec<String> {
        self.saves.lock().unwrap().clone()
    }
}

fn status_error(status: u16) -> ArchiveError {
    ArchiveError::from_status(StatusCode::from_u16(status).unwrap())
}

#[async_trait]
impl ArchiveLookup for FakeArchive {
    async fn lookup(&self, url: &str) -> Result<SnapshotOutcome, ArchiveError> {
        self.lookups.lock().unwrap().push(url.to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match self.responses.get(url) {
            None => Ok(SnapshotOutcome::NotFound),
            Some(FakeResponse::Outcome(outcome)) => Ok(outcome.clone()),
            Some(FakeResponse::Status(status)) => Err(status_error(*status)),
            Some(FakeResponse::Panic) => panic!("archive exploded on {url}"),
        }
    }

    async fn save(&self, url: &str) -> Result<(), ArchiveError> {
        self.saves.lock().unwrap().push(url.to_string());
        match self.save_status {
            Some(status) => Err(status_error(status)),
            None => Ok(()),
        }
    }
}

// Remembers every status message it was given
#[derive(Default)]
pub(crate) struct Recorder {
    messages: Mutex<Vec<String>>,
}

impl Recorder {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl ProgressSink for Recorder {
    fn set_text(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}
