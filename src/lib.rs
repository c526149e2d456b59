// src/lib.rs
// =============================================================================
// wayback-rewriter: rewrite links in text to their Wayback Machine snapshots.
//
// Modules, in dependency order:
// - wayback: the Wayback Machine client (lookup + save)
// - replacer: finds links and swaps archived ones for their snapshots
// - session: one-run-at-a-time orchestration over a Document
//
// The binary (src/main.rs) is a thin command-line host around Session.
// =============================================================================

pub mod replacer;
pub mod session;
pub mod wayback;

#[cfg(test)]
mod testing;

pub use replacer::{LinkReplacer, ProgressSink, ReplacerOptions};
pub use session::{BufferDocument, Document, FileDocument, RunOutcome, Session};
pub use wayback::{ArchiveLookup, ClientConfig, SnapshotOutcome, WaybackClient};
