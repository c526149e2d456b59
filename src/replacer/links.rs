// src/replacer/links.rs
// =============================================================================
// The link replacer: turns live links into Wayback Machine snapshot links.
//
// How it works:
// 1. Find every http/https link in the text (see extract.rs)
// 2. Deduplicate them, keeping first-occurrence order
// 3. For each unique link, one at a time:
//    - report progress ("Replacing 2 of 5 link(s)...")
//    - skip it if the host is blocked (localhost, web.archive.org, ...)
//    - ask the archive for the closest snapshot
//    - remember the snapshot URL if there is one
// 4. Rebuild the text, swapping every occurrence of each resolved link
//
// Lookups are deliberately sequential: progress and substitution order stay
// deterministic, at the cost of one round trip per link.
//
// Rust concepts:
// - Generics: LinkReplacer<C> works with any ArchiveLookup
// - Ranges: Substitution works on the spans found in the original text
// - HashMap: link text -> snapshot URL
// =============================================================================

use std::collections::HashMap;
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::extract::{extract_links, hostname, is_blocked, link_spans};
use super::options::{FailurePolicy, ReplacerOptions};
use super::progress::{replacing_message, ProgressSink};
use crate::wayback::{ArchiveError, ArchiveLookup, SnapshotOutcome};

// Only returned under FailurePolicy::Abort
#[derive(Debug, Error)]
pub enum ReplaceError {
    #[error("failed to look up {link}: {source}")]
    Lookup {
        link: String,
        #[source]
        source: ArchiveError,
    },
}

pub struct LinkReplacer<C> {
    client: C,
    options: ReplacerOptions,
}

impl<C: ArchiveLookup> LinkReplacer<C> {
    pub fn new(client: C) -> Self {
        Self::with_options(client, ReplacerOptions::default())
    }

    pub fn with_options(client: C, options: ReplacerOptions) -> Self {
        Self { client, options }
    }

    // Replaces every archived link in `content` with its snapshot URL.
    //
    // Returns the content unchanged (the same String, byte for byte) when no
    // link was replaced, so callers can skip writing it back.
    pub async fn replace<P: ProgressSink + ?Sized>(
        &self,
        content: String,
        progress: &P,
    ) -> Result<String, ReplaceError> {
        let links: Vec<String> = extract_links(&content)
            .into_iter()
            .map(str::to_string)
            .collect();
        if links.is_empty() {
            return Ok(content);
        }

        let total = links.len();
        let mut replacements: HashMap<String, String> = HashMap::new();

        for (idx, link) in links.iter().enumerate() {
            progress.set_text(&replacing_message(idx + 1, total));

            if let Some(snapshot) = self.resolve(link).await? {
                replacements.insert(link.clone(), snapshot);
            }
        }

        info!(replaced = replacements.len(), total, "Finished replacing links");

        if replacements.is_empty() {
            return Ok(content);
        }

        let spans = link_spans(&content);
        Ok(substitute(&content, &spans, &replacements))
    }

    // Runs one link through the blocklist and the archive.
    //
    // Ok(Some(url)) = replace with url, Ok(None) = leave the link alone.
    async fn resolve(&self, link: &str) -> Result<Option<String>, ReplaceError> {
        let host = match hostname(link) {
            Ok(host) => host,
            Err(e) => {
                // The grammar admits things the URL parser rejects ("http://[x")
                warn!(link = %link, error = %e, "Skipping link with unparseable hostname");
                return Ok(None);
            }
        };

        if is_blocked(&host) {
            info!("Ignoring blocked hostname: {}", host);
            self.options.hooks.link_ignore(link);
            return Ok(None);
        }

        self.options.hooks.link_process(link);

        match self.client.lookup(link).await {
            Ok(SnapshotOutcome::Found { url }) => {
                info!("Replaced {} with {}", link, url);
                self.options.hooks.link_replace(link, &url);
                Ok(Some(url))
            }
            Ok(SnapshotOutcome::NotFound) => {
                warn!("Detected unarchived link: {}", link);
                if self.options.save_unarchived {
                    self.save(link).await;
                }
                Ok(None)
            }
            Ok(SnapshotOutcome::Invalid) => {
                warn!(link = %link, "Wayback URL is not null but not truthy either");
                Ok(None)
            }
            Err(source) => match self.options.failure_policy {
                FailurePolicy::Continue => {
                    error!(link = %link, error = %source, "Failed to look up link, skipping");
                    Ok(None)
                }
                FailurePolicy::Abort => Err(ReplaceError::Lookup {
                    link: link.to_string(),
                    source,
                }),
            },
        }
    }

    // Submitting a link for archiving is best effort; it never affects the
    // document
    async fn save(&self, link: &str) {
        match self.client.save(link).await {
            Ok(()) => debug!(link = %link, "Submitted link for archiving"),
            Err(e) => warn!(link = %link, error = %e, "Failed to submit link for archiving"),
        }
    }
}

// Rebuilds `content`, swapping each span whose text has a replacement.
//
// Working from the original spans (instead of search-and-replace on the
// growing result) means a link that is a prefix of another link, like
// http://a.com/x vs http://a.com/xy, can never clobber the longer one, and a
// snapshot URL we just inserted is never matched again.
fn substitute(
    content: &str,
    spans: &[Range<usize>],
    replacements: &HashMap<String, String>,
) -> String {
    let mut result = String::with_capacity(content.len());
    let mut last = 0;

    for span in spans {
        let link = &content[span.clone()];
        if let Some(snapshot) = replacements.get(link) {
            result.push_str(&content[last..span.start]);
            result.push_str(snapshot);
            last = span.end;
        }
    }

    result.push_str(&content[last..]);
    result
}
