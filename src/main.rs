// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (tracing, to stderr so stdout stays clean)
// 3. Build the Wayback client, the link replacer and a session around them
// 4. Dispatch to the subcommand handler
// 5. Exit with proper code (0 = success, 1 = nothing archived / rejected, 2 = error)
// =============================================================================

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use wayback_rewriter::replacer::{FailurePolicy, LinkHooks, LinkReplacer, ProgressSink, ReplacerOptions};
use wayback_rewriter::session::{FileDocument, RunOutcome, Session};
use wayback_rewriter::wayback::{ArchiveLookup, ClientConfig, SnapshotOutcome, WaybackClient};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs from our crate at info (or debug with --debug), everything else at warn.
// RUST_LOG, when set, wins.
fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,wayback_rewriter={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let client = WaybackClient::new(client_config(&cli))
        .context("failed to set up the Wayback Machine client")?;
    let options = replacer_options(&cli);

    match cli.command {
        Commands::Document { path, dry_run } => {
            let session = Session::new(LinkReplacer::with_options(client, options), StatusLine);
            handle_document(&session, &path, dry_run).await
        }
        Commands::Selection => {
            let session = Session::new(LinkReplacer::with_options(client, options), StatusLine);
            handle_selection(&session).await
        }
        Commands::Lookup { url, json } => handle_lookup(&client, &url, json).await,
        Commands::Save { url } => handle_save(&client, &url).await,
    }
}

fn client_config(cli: &Cli) -> ClientConfig {
    ClientConfig {
        availability_endpoint: cli.api_endpoint.clone(),
        save_endpoint: cli.save_endpoint.clone(),
        timeout: cli.timeout.map(Duration::from_secs),
        ..ClientConfig::default()
    }
}

fn replacer_options(cli: &Cli) -> ReplacerOptions {
    let failure_policy = if cli.abort_on_error {
        FailurePolicy::Abort
    } else {
        FailurePolicy::Continue
    };

    ReplacerOptions {
        failure_policy,
        save_unarchived: cli.save_unarchived,
        hooks: LinkHooks::default()
            .on_link_replace(|link, snapshot| eprintln!("   🔗 {} -> {}", link, snapshot)),
    }
}

// Our stand-in for an editor's status bar: one line on stderr per update
struct StatusLine;

impl ProgressSink for StatusLine {
    fn set_text(&self, message: &str) {
        eprintln!("{}", message);
    }
}

// Handles the 'document' subcommand
async fn handle_document<C: ArchiveLookup>(
    session: &Session<C, StatusLine>,
    path: &Path,
    dry_run: bool,
) -> Result<i32> {
    eprintln!("🔍 Rewriting links in {}", path.display());

    let mut doc = FileDocument::new(path);

    if dry_run {
        let (outcome, text) = session.preview(&mut doc).await?;
        print!("{}", text);
        io::stdout().flush()?;
        return Ok(exit_code(outcome));
    }

    let outcome = session.execute(&mut doc).await?;
    match outcome {
        RunOutcome::Rewritten => info!("Saved {}", path.display()),
        RunOutcome::Unchanged | RunOutcome::Empty => info!("No links replaced, {} left as is", path.display()),
        RunOutcome::Rejected => {}
    }
    Ok(exit_code(outcome))
}

// Handles the 'selection' subcommand: stdin in, stdout out
async fn handle_selection<C: ArchiveLookup>(session: &Session<C, StatusLine>) -> Result<i32> {
    let outcome = session.execute_piped(io::stdin().lock(), io::stdout().lock()).await?;
    Ok(exit_code(outcome))
}

// Handles the 'lookup' subcommand
async fn handle_lookup(client: &WaybackClient, url: &str, json: bool) -> Result<i32> {
    let outcome = client.lookup(url).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        match &outcome {
            SnapshotOutcome::Found { url: snapshot } => println!("✅ {}", snapshot),
            SnapshotOutcome::NotFound => println!("❌ No snapshot of {}", url),
            SnapshotOutcome::Invalid => println!("⚠️  Archive returned an unusable snapshot for {}", url),
        }
    }

    match outcome {
        SnapshotOutcome::Found { .. } => Ok(0),
        SnapshotOutcome::NotFound | SnapshotOutcome::Invalid => Ok(1),
    }
}

// Handles the 'save' subcommand
async fn handle_save(client: &WaybackClient, url: &str) -> Result<i32> {
    client.save(url).await?;
    println!("✅ Submitted {} for archiving", url);
    Ok(0)
}

fn exit_code(outcome: RunOutcome) -> i32 {
    match outcome {
        RunOutcome::Rejected => 1,
        RunOutcome::Empty | RunOutcome::Unchanged | RunOutcome::Rewritten => 0,
    }
}
