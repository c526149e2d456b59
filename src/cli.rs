// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The CLI plays the part of the "host": it decides where the text comes from
// (a file, or stdin for a selection) and where the result goes. Everything
// interesting happens in the library.
//
// Rust concepts:
// - Derive macros: clap generates the parser from these types
// - Option<T>: flags the user may leave out
// - global = true: flags that work before or after the subcommand
// =============================================================================

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use wayback_rewriter::wayback::{DEFAULT_AVAILABILITY_ENDPOINT, DEFAULT_SAVE_ENDPOINT};

#[derive(Parser, Debug)]
#[command(
    name = "wayback-rewriter",
    version,
    about = "Rewrite links in text documents to their Wayback Machine snapshots",
    long_about = "wayback-rewriter finds http/https links in a document, asks the Internet Archive \
                  for the closest snapshot of each, and replaces the links that have one. \
                  Links to localhost and to web.archive.org itself are left alone."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logs (RUST_LOG overrides this)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Per-request timeout in seconds (default: no timeout)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Stop at the first failed lookup instead of skipping that link
    #[arg(long, global = true)]
    pub abort_on_error: bool,

    /// Ask the archive to save links it has no snapshot of
    #[arg(long, global = true)]
    pub save_unarchived: bool,

    /// Wayback availability API endpoint
    #[arg(long, global = true, value_name = "URL", default_value = DEFAULT_AVAILABILITY_ENDPOINT)]
    pub api_endpoint: String,

    /// Prefix that URLs are appended to when saving
    #[arg(long, global = true, value_name = "URL", default_value = DEFAULT_SAVE_ENDPOINT)]
    pub save_endpoint: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace links in a whole document, writing it back if anything changed
    ///
    /// Example: wayback-rewriter document notes/reading-list.md
    Document {
        /// Path of the text/markdown file to rewrite
        path: PathBuf,

        /// Print the rewritten text instead of saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// Replace links in a selection read from stdin, printing the result
    ///
    /// Example: pbpaste | wayback-rewriter selection | pbcopy
    Selection,

    /// Look up the closest snapshot of a single URL
    Lookup {
        url: String,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Submit a URL to the Wayback Machine for archiving
    Save { url: String },
}
