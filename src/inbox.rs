//! Inbox watcher: synchronous poll loop that ingests dropped manuscripts.
//!
//! Watches a directory for new files. `.epub` files go through the EPUB
//! path; anything else is treated as pasted text. Successfully processed
//! files move to a `done/` subdirectory; failures are logged and the file
//! is left in place for the next attempt after it is fixed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{error, info};

use crate::error::{IngestError, IngestResult};
use crate::ingest::{IngestOutcome, IngestRequest, Overrides, ingest, ingest_epub_bytes};
use crate::shelf::Shelf;

/// Configuration for the inbox watcher.
pub struct InboxConfig {
    /// Directory to watch for new files.
    pub inbox_dir: PathBuf,
    /// Poll interval.
    pub poll_interval: Duration,
    /// Directory to move successfully ingested files to.
    pub done_dir: PathBuf,
}

impl InboxConfig {
    /// Create config for an inbox directory, deriving `done_dir` as
    /// `inbox_dir/done/`.
    pub fn new(inbox_dir: PathBuf) -> Self {
        let done_dir = inbox_dir.join("done");
        Self {
            inbox_dir,
            poll_interval: Duration::from_secs(5),
            done_dir,
        }
    }
}

/// Run the inbox watcher loop. Blocks until interrupted.
pub fn watch_inbox(shelf: &mut Shelf, config: &InboxConfig) -> IngestResult<()> {
    std::fs::create_dir_all(&config.inbox_dir).map_err(|e| IngestError::Io { source: e })?;
    std::fs::create_dir_all(&config.done_dir).map_err(|e| IngestError::Io { source: e })?;

    info!(
        inbox = %config.inbox_dir.display(),
        poll_secs = config.poll_interval.as_secs(),
        "watching inbox"
    );

    loop {
        scan_once(shelf, config);
        std::thread::sleep(config.poll_interval);
    }
}

/// One pass over the inbox directory. Failures are reported per file and
/// never abort the scan.
pub fn scan_once(shelf: &mut Shelf, config: &InboxConfig) {
    let entries = match std::fs::read_dir(&config.inbox_dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(inbox = %config.inbox_dir.display(), "error reading inbox: {e}");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        // Skip directories (including done/) and hidden files.
        if path.is_dir() {
            continue;
        }
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'))
        {
            continue;
        }

        info!(file = %path.display(), "detected inbox file");
        match process_inbox_file(shelf, &path, &config.done_dir) {
            Ok(()) => info!(file = %path.display(), "ingested and moved to done/"),
            Err(e) => error!(file = %path.display(), "ingestion failed: {e}"),
        }
    }
}

/// Ingest a single file from the inbox, then move it to `done/`.
fn process_inbox_file(shelf: &mut Shelf, path: &Path, done_dir: &Path) -> IngestResult<()> {
    let overrides = Overrides {
        title: file_stem_title(path),
        ..Default::default()
    };

    let is_epub = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("epub"));

    let outcome = if is_epub {
        let bytes = std::fs::read(path).map_err(|e| IngestError::Io { source: e })?;
        ingest_epub_bytes(shelf, &bytes, &overrides, false)?
    } else {
        let text = std::fs::read_to_string(path).map_err(|e| IngestError::Io { source: e })?;
        ingest(
            shelf,
            IngestRequest {
                pasted_text: Some(text),
                overrides,
                ..Default::default()
            },
        )?
    };

    if let IngestOutcome::Persisted {
        book,
        chapters_written,
    } = &outcome
    {
        info!(book = %book.id, chapters = chapters_written, "inbox ingestion complete");
    }

    if let Some(filename) = path.file_name() {
        let dest = done_dir.join(filename);
        std::fs::rename(path, &dest).map_err(|e| IngestError::PersistenceFailure {
            message: format!("move {} -> {}: {e}", path.display(), dest.display()),
        })?;
    }

    Ok(())
}

/// Title override from the file name, so inbox books are not all called
/// "Pasted Manuscript".
fn file_stem_title(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.replace(['-', '_'], " "))
        .filter(|s| !s.trim().is_empty())
}
