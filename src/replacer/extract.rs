// src/replacer/extract.rs
// =============================================================================
// This module finds links in plain text and decides which ones we may touch.
//
// Unlike a markdown parser, we scan the raw text with a regular expression:
//   https?://[^\s)>\]]+
// The excluded characters stop a match at the end of markdown link syntax
// `[text](url)`, angle brackets `<url>` and square brackets, so we never
// swallow the closing punctuation into the URL.
//
// Rust concepts:
// - OnceLock: Compile the regex once, reuse it forever
// - Ranges: We remember WHERE each link is, not just what it says
// - HashSet: Deduplicate while keeping first-occurrence order
// =============================================================================

use regex::Regex;
use std::collections::HashSet;
use std::ops::Range;
use std::sync::OnceLock;
use url::{Host, Url};

// Hostnames we never look up or rewrite: loopback addresses, and the
// Wayback Machine itself (those links are already archived)
pub const BLOCKED_HOSTNAMES: [&str; 5] = [
    "0.0.0.0",
    "localhost",
    "127.0.0.1",
    "::1",
    "web.archive.org",
];

const URL_PATTERN: &str = r"https?://[^\s)>\]]+";

fn url_regex() -> &'static Regex {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    // The pattern is a constant, so failing to compile it is a programmer error
    URL_REGEX.get_or_init(|| Regex::new(URL_PATTERN).expect("URL pattern is valid"))
}

// Byte ranges of every link in the text, in order, non-overlapping
pub fn link_spans(content: &str) -> Vec<Range<usize>> {
    url_regex().find_iter(content).map(|m| m.range()).collect()
}

// All unique links in the text, in the order they first appear
//
// Example:
//   "a http://x.com b http://y.com c http://x.com"
//   -> ["http://x.com", "http://y.com"]
pub fn extract_links(content: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    url_regex()
        .find_iter(content)
        .map(|m| m.as_str())
        .filter(|link| seen.insert(*link))
        .collect()
}

// Parses the hostname out of a link.
//
// IPv6 hosts come back without brackets ("::1", not "[::1]") so they can be
// compared against BLOCKED_HOSTNAMES directly.
pub fn hostname(link: &str) -> Result<String, url::ParseError> {
    let url = Url::parse(link)?;
    match url.host() {
        Some(Host::Domain(domain)) => Ok(domain.to_string()),
        Some(Host::Ipv4(addr)) => Ok(addr.to_string()),
        Some(Host::Ipv6(addr)) => Ok(addr.to_string()),
        None => Err(url::ParseError::EmptyHost),
    }
}

pub fn is_blocked(hostname: &str) -> bool {
    BLOCKED_HOSTNAMES.contains(&hostname)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why OnceLock?
//    - Compiling a regex is expensive compared to running it
//    - OnceLock runs the closure the first time and hands out the same
//      &'static Regex afterwards, even across threads
//
// 2. What does `seen.insert(*link)` return?
//    - HashSet::insert returns true if the value was NOT already there
//    - So `.filter(|link| seen.insert(*link))` keeps only first occurrences
//
// 3. Why return Range<usize> from link_spans?
//    - A range is just two numbers, it doesn't borrow the text
//    - We can slice the text later with &content[range]
// -----------------------------------------------------------------------------
