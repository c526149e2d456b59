// src/session.rs
// =============================================================================
// A Session runs the link replacer against a document, one run at a time.
//
// It owns the pieces the replacer itself doesn't care about:
// - the "is a run active?" flag, so overlapping runs are refused
// - the status sink, which is reset to "Ready" whenever a run ends
// - reading the document and writing it back only if something changed
//
// The flag is cleared by a guard's Drop impl, so it is released on every exit
// path: success, error, or a panic unwinding through the run.
//
// Rust concepts:
// - AtomicBool + compare_exchange: a lock that never waits
// - RAII guards: cleanup that runs when a value goes out of scope
// - Traits: Document abstracts over files, stdin, and test buffers
// =============================================================================

use anyhow::{Context, Result};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error};

use crate::replacer::{LinkReplacer, ProgressSink, READY_MESSAGE};
use crate::wayback::ArchiveLookup;

// Something that holds text we can rewrite
pub trait Document {
    fn read(&mut self) -> Result<String>;

    fn write(&mut self, content: &str) -> Result<()>;
}

// A text file on disk
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Document for FileDocument {
    fn read(&mut self) -> Result<String> {
        fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))
    }

    fn write(&mut self, content: &str) -> Result<()> {
        fs::write(&self.path, content)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

// Text held in memory, e.g. a selection read from stdin
#[derive(Debug, Clone, Default)]
pub struct BufferDocument {
    original: String,
    written: Option<String>,
}

impl BufferDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            original: content.into(),
            written: None,
        }
    }

    pub fn was_written(&self) -> bool {
        self.written.is_some()
    }

    // The latest text: what was written back, or the original if nothing was
    pub fn into_contents(self) -> String {
        self.written.unwrap_or(self.original)
    }
}

impl Document for BufferDocument {
    fn read(&mut self) -> Result<String> {
        Ok(self.written.clone().unwrap_or_else(|| self.original.clone()))
    }

    fn write(&mut self, content: &str) -> Result<()> {
        self.written = Some(content.to_string());
        Ok(())
    }
}

// How a call to Session::execute ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run was already active; nothing was touched
    Rejected,
    /// The document was empty
    Empty,
    /// Links were checked but none were replaced
    Unchanged,
    /// At least one link was replaced and the document written back
    Rewritten,
}

pub struct Session<C, P> {
    replacer: LinkReplacer<C>,
    status: P,
    active: AtomicBool,
}

impl<C: ArchiveLookup, P: ProgressSink> Session<C, P> {
    pub fn new(replacer: LinkReplacer<C>, status: P) -> Self {
        Self {
            replacer,
            status,
            active: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    // Replaces the links in `document`, writing it back only if it changed.
    //
    // If another run is in progress this returns Ok(RunOutcome::Rejected)
    // straight away, without reading the document or touching the status.
    pub async fn execute<D: Document + ?Sized>(&self, document: &mut D) -> Result<RunOutcome> {
        let _guard = match ActiveGuard::acquire(&self.active, &self.status) {
            Some(guard) => guard,
            None => {
                debug!("Plugin already running, exiting!");
                return Ok(RunOutcome::Rejected);
            }
        };

        let result = self.run(document).await;
        if let Err(e) = &result {
            error!("Error replacing links: {:#}", e);
        }
        result
    }

    // Runs against an in-memory copy of `document`, leaving the source
    // untouched. Returns the outcome and the text a real run would have saved.
    pub async fn preview<D: Document + ?Sized>(&self, document: &mut D) -> Result<(RunOutcome, String)> {
        let mut copy = BufferDocument::new(document.read()?);
        let outcome = self.execute(&mut copy).await?;
        Ok((outcome, copy.into_contents()))
    }

    // Reads all of `input`, runs it, and writes the resulting text to
    // `output`. The text is echoed even when nothing changed (or the run was
    // rejected) so a pipe never loses it.
    pub async fn execute_piped<R: Read, W: Write>(&self, mut input: R, mut output: W) -> Result<RunOutcome> {
        let mut content = String::new();
        input
            .read_to_string(&mut content)
            .context("failed to read input")?;

        let mut doc = BufferDocument::new(content);
        let outcome = self.execute(&mut doc).await?;

        output
            .write_all(doc.into_contents().as_bytes())
            .context("failed to write output")?;
        output.flush().context("failed to write output")?;
        Ok(outcome)
    }

    async fn run<D: Document + ?Sized>(&self, document: &mut D) -> Result<RunOutcome> {
        let content = document.read()?;
        if content.is_empty() {
            return Ok(RunOutcome::Empty);
        }

        let result = self.replacer.replace(content.clone(), &self.status).await?;
        if result == content {
            return Ok(RunOutcome::Unchanged);
        }

        document.write(&result)?;
        Ok(RunOutcome::Rewritten)
    }
}

// Holds the session's active flag for the length of one run
struct ActiveGuard<'a, P: ProgressSink> {
    active: &'a AtomicBool,
    status: &'a P,
}

impl<'a, P: ProgressSink> ActiveGuard<'a, P> {
    fn acquire(active: &'a AtomicBool, status: &'a P) -> Option<Self> {
        active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { active, status })
    }
}

impl<P: ProgressSink> Drop for ActiveGuard<'_, P> {
    fn drop(&mut self) {
        self.status.set_text(READY_MESSAGE);
        self.active.store(false, Ordering::Release);
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why an AtomicBool and not a Mutex?
//    - We never want to WAIT for the other run, only to know it exists
//    - compare_exchange(false, true) flips the flag only if nobody else has,
//      and tells us whether we won
//
// 2. What is an RAII guard?
//    - A value whose Drop impl does the cleanup
//    - `let _guard = ...` keeps it alive until the end of the function
//    - Early returns, `?` and panics all drop it, so the flag always clears
//    - Careful: `let _ = ...` (no name) would drop it IMMEDIATELY
//
// 3. Why `D: Document + ?Sized`?
//    - ?Sized lets callers pass a `&mut dyn Document` as well as concrete types
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replacer::{FailurePolicy, ReplacerOptions};
    use crate::testing::{FakeArchive, Recorder};
    use std::sync::Arc;
    use tokio::sync::Notify;

    const SNAPSHOT: &str = "http://web.archive.org/web/2020/http://example.com/a";

    fn session(archive: Arc<FakeArchive>) -> Session<Arc<FakeArchive>, Arc<Recorder>> {
        Session::new(LinkReplacer::new(archive), Arc::new(Recorder::default()))
    }

    #[tokio::test]
    async fn test_rewrites_and_resets_status() {
        let archive = Arc::new(FakeArchive::new().found("http://example.com/a", SNAPSHOT));
        let status = Arc::new(Recorder::default());
        let session = Session::new(LinkReplacer::new(archive), status.clone());
        let mut doc = BufferDocument::new("See http://example.com/a and http://example.com/a again");

        let outcome = session.execute(&mut doc).await.unwrap();

        assert_eq!(outcome, RunOutcome::Rewritten);
        assert_eq!(
            doc.into_contents(),
            format!("See {SNAPSHOT} and {SNAPSHOT} again")
        );
        assert_eq!(
            status.messages(),
            vec!["Wayback: Replacing 1 of 1 link(s)...", "Wayback: Ready"]
        );
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_unchanged_document_is_not_written() {
        let session = session(Arc::new(FakeArchive::new()));
        let mut doc = BufferDocument::new("http://example.com/missing");

        let outcome = session.execute(&mut doc).await.unwrap();

        assert_eq!(outcome, RunOutcome::Unchanged);
        assert!(!doc.was_written());
    }

    #[tokio::test]
    async fn test_empty_document() {
        let archive = Arc::new(FakeArchive::new());
        let session = session(archive.clone());
        let mut doc = BufferDocument::new("");

        assert_eq!(session.execute(&mut doc).await.unwrap(), RunOutcome::Empty);
        assert!(archive.lookups().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_run_is_rejected() {
        let gate = Arc::new(Notify::new());
        let archive = Arc::new(
            FakeArchive::new()
                .found("http://example.com/a", SNAPSHOT)
                .gated(gate.clone()),
        );
        let status = Arc::new(Recorder::default());
        let session = Session::new(LinkReplacer::new(archive.clone()), status.clone());

        let mut first_doc = BufferDocument::new("http://example.com/a");
        let mut second_doc = BufferDocument::new("http://example.com/b");

        // The first run parks inside its lookup until the gate opens; the
        // second run starts while it is parked
        let first = session.execute(&mut first_doc);
        let second = async {
            let outcome = session.execute(&mut second_doc).await;
            assert!(session.is_active());
            gate.notify_one();
            outcome
        };
        let (first, second) = tokio::join!(first, second);

        assert_eq!(first.unwrap(), RunOutcome::Rewritten);
        assert_eq!(second.unwrap(), RunOutcome::Rejected);
        assert!(!second_doc.was_written());
        assert_eq!(second_doc.into_contents(), "http://example.com/b");
        assert_eq!(archive.lookups(), vec!["http://example.com/a"]);
        assert_eq!(
            status.messages(),
            vec!["Wayback: Replacing 1 of 1 link(s)...", "Wayback: Ready"]
        );
        assert!(!session.is_active());
    }

    #[tokio::test]
    async fn test_error_releases_guard() {
        let archive = Arc::new(FakeArchive::new().http_error("http://example.com/a", 500));
        let options = ReplacerOptions {
            failure_policy: FailurePolicy::Abort,
            ..ReplacerOptions::default()
        };
        let status = Arc::new(Recorder::default());
        let session = Session::new(LinkReplacer::with_options(archive, options), status.clone());
        let mut doc = BufferDocument::new("http://example.com/a");

        assert!(session.execute(&mut doc).await.is_err());
        assert!(!session.is_active());
        assert_eq!(status.messages().last().unwrap(), READY_MESSAGE);

        // The session is usable again afterwards
        let mut empty = BufferDocument::new("");
        assert_eq!(session.execute(&mut empty).await.unwrap(), RunOutcome::Empty);
    }

    #[tokio::test]
    async fn test_panic_releases_guard() {
        let archive = Arc::new(FakeArchive::new().panics_on("http://example.com/a"));
        let status = Arc::new(Recorder::default());
        let session = Arc::new(Session::new(LinkReplacer::new(archive), status.clone()));

        let task_session = session.clone();
        let handle = tokio::spawn(async move {
            let mut doc = BufferDocument::new("http://example.com/a");
            task_session.execute(&mut doc).await
        });

        assert!(handle.await.unwrap_err().is_panic());
        assert!(!session.is_active());
        assert_eq!(status.messages().last().unwrap(), READY_MESSAGE);
    }

    #[tokio::test]
    async fn test_file_document_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "wayback-rewriter-session-{}.md",
            std::process::id()
        ));
        fs::write(&path, "Read [this](http://example.com/a).\n").unwrap();

        let archive = Arc::new(FakeArchive::new().found("http://example.com/a", SNAPSHOT));
        let session = session(archive);
        let mut doc = FileDocument::new(&path);

        assert_eq!(session.execute(&mut doc).await.unwrap(), RunOutcome::Rewritten);
        assert_eq!(
            fs::read_to_string(doc.path()).unwrap(),
            format!("Read [this]({SNAPSHOT}).\n")
        );

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_piped_rewritten_text_is_printed() {
        let archive = Arc::new(FakeArchive::new().found("http://example.com/a", SNAPSHOT));
        let session = session(archive);
        let mut output = Vec::new();

        let outcome = session
            .execute_piped("go to http://example.com/a\n".as_bytes(), &mut output)
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Rewritten);
        assert_eq!(String::from_utf8(output).unwrap(), format!("go to {SNAPSHOT}\n"));
    }

    #[tokio::test]
    async fn test_piped_unchanged_text_is_echoed() {
        let session = session(Arc::new(FakeArchive::new()));
        let mut output = Vec::new();

        let input = "http://example.com/missing and http://localhost/x";
        let outcome = session
            .execute_piped(input.as_bytes(), &mut output)
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Unchanged);
        assert_eq!(String::from_utf8(output).unwrap(), input);
    }

    #[tokio::test]
    async fn test_piped_empty_input_is_a_no_op() {
        let archive = Arc::new(FakeArchive::new());
        let status = Arc::new(Recorder::default());
        let session = Session::new(LinkReplacer::new(archive.clone()), status.clone());
        let mut output = Vec::new();

        let outcome = session.execute_piped(std::io::empty(), &mut output).await.unwrap();

        assert_eq!(outcome, RunOutcome::Empty);
        assert!(output.is_empty());
        assert!(archive.lookups().is_empty());
        assert_eq!(status.messages(), vec![READY_MESSAGE]);
    }

    #[tokio::test]
    async fn test_preview_leaves_file_alone() {
        let path = std::env::temp_dir().join(format!(
            "wayback-rewriter-preview-{}.md",
            std::process::id()
        ));
        let original = "Read [this](http://example.com/a).\n";
        fs::write(&path, original).unwrap();

        let archive = Arc::new(FakeArchive::new().found("http://example.com/a", SNAPSHOT));
        let session = session(archive);
        let mut doc = FileDocument::new(&path);

        let (outcome, text) = session.preview(&mut doc).await.unwrap();

        assert_eq!(outcome, RunOutcome::Rewritten);
        assert_eq!(text, format!("Read [this]({SNAPSHOT}).\n"));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_preview_of_missing_file_is_an_error() {
        let session = session(Arc::new(FakeArchive::new()));
        let mut doc = FileDocument::new("/definitely/not/here.md");

        let err = session.preview(&mut doc).await.unwrap_err();
        assert!(err.to_string().contains("failed to read /definitely/not/here.md"));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let session = session(Arc::new(FakeArchive::new()));
        let mut doc = FileDocument::new("/definitely/not/here.md");

        let err = session.execute(&mut doc).await.unwrap_err();
        assert!(err.to_string().contains("failed to read"));
        assert!(!session.is_active());
    }
}
