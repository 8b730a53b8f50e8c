//! EPUB structural reader.
//!
//! Walks the archive's reading order ("spine"), filters out non-text
//! resources that erroneously appear in it, and reduces each entry to a
//! plain-text chapter candidate. The `epub` crate wants a file path, so the
//! input bytes are written to a scoped temp file that is removed on every
//! exit path; the parse itself runs on a worker thread under a hard
//! wall-clock timeout.

use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use epub::doc::EpubDoc;
use regex::Regex;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{IngestError, IngestResult};
use crate::html;
use crate::model::{ChapterCandidate, ParsedBook};
use crate::normalize::normalize;

/// Hard wall-clock budget for one parse.
pub const PARSE_TIMEOUT: Duration = Duration::from_secs(30);

/// Candidates at or below this many characters are dropped: navigation
/// pages, blank dividers, cover pages. A quality filter, not an error.
pub const MIN_CHAPTER_CHARS: usize = 50;

static RE_FIRST_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h[1-6][^>]*>(.*?)</h[1-6]>").unwrap());

/// Parse an EPUB binary into a [`ParsedBook`]. Single attempt, no retry.
pub fn read_epub(bytes: &[u8]) -> IngestResult<ParsedBook> {
    read_epub_with(bytes, PARSE_TIMEOUT, |path| extract_chapters(path))
}

/// Timeout/cleanup wrapper around an arbitrary parse function.
///
/// The temp file is deleted on success, parse error, and timeout alike.
/// On timeout the worker thread is abandoned; unlinking is safe even while
/// the worker still holds the open descriptor.
pub(crate) fn read_epub_with<F>(
    bytes: &[u8],
    timeout: Duration,
    parse: F,
) -> IngestResult<ParsedBook>
where
    F: FnOnce(&Path) -> IngestResult<ParsedBook> + Send + 'static,
{
    let mut tmp = NamedTempFile::new().map_err(|e| IngestError::Io { source: e })?;
    tmp.write_all(bytes)
        .and_then(|()| tmp.flush())
        .map_err(|e| IngestError::Io { source: e })?;

    let path = tmp.path().to_path_buf();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(parse(&path));
    });

    let outcome = match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(IngestError::ParseTimeout {
            seconds: timeout.as_secs(),
        }),
        Err(RecvTimeoutError::Disconnected) => Err(IngestError::ExtractionFailure {
            message: "parser worker exited without producing a result".into(),
        }),
    };

    if let Err(err) = tmp.close() {
        // Cleanup failure must not mask the primary outcome.
        warn!("failed to remove temporary parse file: {err}");
    }

    outcome
}

/// Open the archive and walk its reading order into chapter candidates.
fn extract_chapters(path: &Path) -> IngestResult<ParsedBook> {
    let mut doc = EpubDoc::new(path).map_err(|e| IngestError::ArchiveCorruption {
        message: e.to_string(),
    })?;

    let title = doc
        .mdata("title")
        .map(|m| m.value.clone())
        .unwrap_or_default();
    let author = doc
        .metadata
        .iter()
        .filter(|m| m.property == "creator")
        .map(|m| m.value.clone())
        .collect::<Vec<_>>()
        .join(", ");

    let total = doc.get_num_chapters();
    let mut chapters = Vec::new();

    for idx in 0..total {
        if !doc.set_current_chapter(idx) {
            continue;
        }

        let Some(resource_id) = doc.get_current_id() else {
            debug!(index = idx, "spine entry without a manifest id; skipping");
            continue;
        };

        if let Some(mime) = doc.get_current_mime() {
            if !is_textual_media_type(&mime) {
                debug!(index = idx, resource = %resource_id, %mime, "non-text spine entry; skipping");
                continue;
            }
        }

        // Raw bytes, decoded lossily: a stray non-UTF-8 byte must not cost
        // the whole chapter.
        let Some((data, _mime)) = doc.get_current() else {
            continue;
        };
        let markup = String::from_utf8_lossy(&data);

        let content = normalize(&html::reduce(&markup));
        if content.chars().count() <= MIN_CHAPTER_CHARS {
            debug!(index = idx, resource = %resource_id, chars = content.chars().count(), "dropping short chapter");
            continue;
        }

        let chapter_title = first_heading(&markup)
            .unwrap_or_else(|| format!("Chapter {}", chapters.len() + 1));
        debug!(index = idx, title = %chapter_title, chars = content.chars().count(), "retained chapter");
        chapters.push(ChapterCandidate {
            title: chapter_title,
            content,
        });
    }

    info!(
        %title,
        spine_entries = total,
        chapters = chapters.len(),
        "finished EPUB extraction"
    );

    Ok(ParsedBook {
        title,
        author,
        chapters,
    })
}

/// Whether a declared manifest media type can carry chapter text.
fn is_textual_media_type(media_type: &str) -> bool {
    let mt = media_type.to_lowercase();
    mt.contains("xml") || mt.contains("html") || mt.contains("text")
}

/// First `<h1>`–`<h6>` heading in the raw markup, reduced to plain text.
fn first_heading(markup: &str) -> Option<String> {
    RE_FIRST_HEADING
        .captures(markup)
        .map(|caps| html::reduce(&caps[1]))
        .filter(|heading| !heading.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn invalid_archive_is_archive_corruption() {
        let err = read_epub(b"This is not an EPUB").unwrap_err();
        assert!(matches!(err, IngestError::ArchiveCorruption { .. }));
    }

    #[test]
    fn media_type_filter() {
        assert!(is_textual_media_type("application/xhtml+xml"));
        assert!(is_textual_media_type("text/html"));
        assert!(is_textual_media_type("TEXT/PLAIN"));
        assert!(!is_textual_media_type("image/jpeg"));
        assert!(!is_textual_media_type("font/otf"));
    }

    #[test]
    fn first_heading_extraction() {
        let markup = "<body><h2 class=\"t\">The <em>Real</em> Title</h2><p>x</p></body>";
        assert_eq!(first_heading(markup).as_deref(), Some("The Real Title"));
        assert_eq!(first_heading("<p>no headings</p>"), None);
    }

    #[test]
    fn slow_parse_times_out_and_temp_file_is_removed() {
        let seen_path = Arc::new(Mutex::new(None));
        let recorder = Arc::clone(&seen_path);

        let err = read_epub_with(b"bytes", Duration::from_millis(50), move |path| {
            *recorder.lock().unwrap() = Some(path.to_path_buf());
            std::thread::sleep(Duration::from_secs(5));
            Ok(ParsedBook::default())
        })
        .unwrap_err();

        assert!(matches!(err, IngestError::ParseTimeout { .. }));
        let path = seen_path.lock().unwrap().clone().expect("parser saw the temp file");
        assert!(!path.exists(), "temp file must be gone after timeout");
    }

    #[test]
    fn parse_error_still_removes_temp_file() {
        let seen_path = Arc::new(Mutex::new(None));
        let recorder = Arc::clone(&seen_path);

        let err = read_epub_with(b"bytes", Duration::from_secs(5), move |path| {
            *recorder.lock().unwrap() = Some(path.to_path_buf());
            Err(IngestError::ArchiveCorruption {
                message: "stub".into(),
            })
        })
        .unwrap_err();

        assert!(matches!(err, IngestError::ArchiveCorruption { .. }));
        let path = seen_path.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }
}
