// src/replacer/mod.rs
// =============================================================================
// The link replacement core.
//
// Submodules:
// - extract: finding links in text, hostnames, the blocklist
// - links: the LinkReplacer itself
// - options: failure policy, save-on-miss, hooks
// - progress: the ProgressSink trait and its messages
// =============================================================================

mod extract;
mod links;
mod options;
mod progress;

pub use extract::{extract_links, hostname, is_blocked, link_spans, BLOCKED_HOSTNAMES};
pub use links::{LinkReplacer, ReplaceError};
pub use options::{FailurePolicy, LinkHooks, ReplacerOptions};
pub use progress::{replacing_message, ProgressSink, READY_MESSAGE};
