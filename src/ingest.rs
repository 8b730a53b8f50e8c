//! Ingestion orchestrator.
//!
//! Routes a request to the EPUB path (download → structural read) or the
//! pasted-text path (normalize → split), applies overrides, and either
//! returns the parsed book or persists it through a [`Shelf`] handle. One
//! request processes one document to completion; nothing is shared across
//! requests.

use std::io::Read;

use tracing::{debug, info};

use crate::chunk::{MAX_CHUNK_CHARS, chunk};
use crate::epub::read_epub;
use crate::error::{IngestError, IngestResult};
use crate::model::{BookRecord, ChapterRecord, ParsedBook, unix_now};
use crate::normalize::normalize;
use crate::shelf::Shelf;
use crate::split::split_pasted;

/// Fallback title for the pasted-text path.
pub const DEFAULT_TITLE: &str = "Pasted Manuscript";
/// Fallback author when the source declares none.
pub const DEFAULT_AUTHOR: &str = "Anonymous";
/// Fallback genre list.
pub const DEFAULT_GENRE: &str = "Ingested";

/// Download size ceiling. Bodies that exceed it fail the request rather
/// than being truncated into a corrupt-looking archive.
const MAX_DOWNLOAD_BYTES: u64 = 256 * 1024 * 1024;

/// Caller-supplied metadata that wins over extracted values.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<Vec<String>>,
}

/// One ingestion request. Exactly one of `file_url` / `pasted_text` must be
/// set; `dry_run` skips persistence and returns the parsed book.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    /// Fetchable URL pointing at an EPUB binary.
    pub file_url: Option<String>,
    /// Raw pasted plain/HTML text.
    pub pasted_text: Option<String>,
    pub overrides: Overrides,
    pub dry_run: bool,
}

/// What an ingestion produced.
#[derive(Debug)]
pub enum IngestOutcome {
    /// Dry run: the normalized book, not persisted.
    Parsed(ParsedBook),
    /// Persisted book plus the number of chapter records written.
    Persisted {
        book: BookRecord,
        chapters_written: usize,
    },
}

/// Run one ingestion request against a shelf.
pub fn ingest(shelf: &mut Shelf, request: IngestRequest) -> IngestResult<IngestOutcome> {
    let parsed = match (&request.file_url, &request.pasted_text) {
        (Some(url), _) => {
            let bytes = download(url)?;
            info!(%url, bytes = bytes.len(), "downloaded source document");
            read_epub(&bytes)?
        }
        (None, Some(text)) => parse_pasted(text),
        (None, None) => return Err(IngestError::NoSourceProvided),
    };

    finish(shelf, parsed, &request.overrides, request.dry_run)
}

/// Ingest an EPUB supplied directly as bytes (local upload path).
pub fn ingest_epub_bytes(
    shelf: &mut Shelf,
    bytes: &[u8],
    overrides: &Overrides,
    dry_run: bool,
) -> IngestResult<IngestOutcome> {
    let parsed = read_epub(bytes)?;
    finish(shelf, parsed, overrides, dry_run)
}

/// Pasted-text path: normalize, then split at heuristic chapter boundaries.
fn parse_pasted(text: &str) -> ParsedBook {
    let cleaned = normalize(text);
    let chapters = split_pasted(&cleaned);
    debug!(chapters = chapters.len(), chars = cleaned.len(), "split pasted text");
    ParsedBook {
        title: String::new(),
        author: String::new(),
        chapters,
    }
}

/// Apply overrides and defaults, then persist or return.
fn finish(
    shelf: &mut Shelf,
    parsed: ParsedBook,
    overrides: &Overrides,
    dry_run: bool,
) -> IngestResult<IngestOutcome> {
    let title = overrides
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| non_empty(&parsed.title))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let author = overrides
        .author
        .clone()
        .filter(|a| !a.trim().is_empty())
        .or_else(|| non_empty(&parsed.author))
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());
    let genre = overrides
        .genre
        .clone()
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| vec![DEFAULT_GENRE.to_string()]);

    if dry_run {
        return Ok(IngestOutcome::Parsed(ParsedBook {
            title,
            author,
            chapters: parsed.chapters,
        }));
    }

    let book_id = shelf.upsert_book(&title, &author, genre)?;
    let now = unix_now();

    // Flatten logical chapters into persisted records, chunking oversized
    // content. Chapter numbers run over the chunk sequence, so they can
    // outrun the logical chapter count.
    let mut records = Vec::new();
    for candidate in &parsed.chapters {
        for piece in chunk(&candidate.content, MAX_CHUNK_CHARS) {
            records.push(ChapterRecord {
                chapter_number: records.len() + 1,
                title: candidate.title.clone(),
                content: piece,
                owner_id: book_id.clone(),
                created_at: now,
            });
        }
    }
    shelf.write_chapters(&book_id, &records)?;

    let book = shelf
        .get(&book_id)
        .cloned()
        .ok_or_else(|| IngestError::BookNotFound { id: book_id })?;
    info!(book = %book.id, chapters = records.len(), "ingestion complete");

    Ok(IngestOutcome::Persisted {
        book,
        chapters_written: records.len(),
    })
}

/// Fetch an EPUB binary over HTTP. Non-2xx responses fail.
fn download(url: &str) -> IngestResult<Vec<u8>> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| IngestError::DownloadFailure {
            url: url.into(),
            message: e.to_string(),
        })?;

    read_body(response.into_reader(), MAX_DOWNLOAD_BYTES, url)
}

/// Buffer a response body of at most `limit` bytes; a longer body is a
/// [`IngestError::DownloadFailure`], never a silent truncation.
fn read_body<R: Read>(reader: R, limit: u64, url: &str) -> IngestResult<Vec<u8>> {
    let mut data = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut data)
        .map_err(|e| IngestError::DownloadFailure {
            url: url.into(),
            message: format!("read body: {e}"),
        })?;
    if data.len() as u64 > limit {
        return Err(IngestError::DownloadFailure {
            url: url.into(),
            message: format!("response body exceeds the {limit}-byte limit"),
        });
    }
    Ok(data)
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_shelf(dir: &tempfile::TempDir) -> Shelf {
        Shelf::open(dir.path()).unwrap()
    }

    #[test]
    fn no_source_fails_without_side_effects() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut shelf = open_shelf(&dir);

        let err = ingest(&mut shelf, IngestRequest::default()).unwrap_err();
        assert!(matches!(err, IngestError::NoSourceProvided));
        assert!(shelf.is_empty());
        assert!(!dir.path().join("catalog.json").exists());
    }

    #[test]
    fn pasted_text_defaults_applied() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut shelf = open_shelf(&dir);

        let outcome = ingest(
            &mut shelf,
            IngestRequest {
                pasted_text: Some("Just a short story with no markers.".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let IngestOutcome::Persisted { book, chapters_written } = outcome else {
            panic!("expected persisted outcome");
        };
        assert_eq!(book.title, DEFAULT_TITLE);
        assert_eq!(book.author, DEFAULT_AUTHOR);
        assert_eq!(book.genre, vec![DEFAULT_GENRE.to_string()]);
        assert_eq!(chapters_written, 1);

        let chapters = shelf.load_chapters(&book.id).unwrap();
        assert_eq!(chapters[0].title, "Full Volume");
        assert_eq!(chapters[0].owner_id, book.id);
    }

    #[test]
    fn overrides_win_over_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut shelf = open_shelf(&dir);

        let outcome = ingest(
            &mut shelf,
            IngestRequest {
                pasted_text: Some("Chapter 1\nSome text.".into()),
                overrides: Overrides {
                    title: Some("My Novel".into()),
                    author: Some("R. Author".into()),
                    genre: Some(vec!["Mystery".into(), "Noir".into()]),
                },
                ..Default::default()
            },
        )
        .unwrap();

        let IngestOutcome::Persisted { book, .. } = outcome else {
            panic!("expected persisted outcome");
        };
        assert_eq!(book.title, "My Novel");
        assert_eq!(book.author, "R. Author");
        assert_eq!(book.genre.len(), 2);
    }

    #[test]
    fn dry_run_returns_without_persisting() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut shelf = open_shelf(&dir);

        let outcome = ingest(
            &mut shelf,
            IngestRequest {
                pasted_text: Some("Chapter 1\nA\nChapter 2\nB".into()),
                dry_run: true,
                ..Default::default()
            },
        )
        .unwrap();

        let IngestOutcome::Parsed(book) = outcome else {
            panic!("expected parsed outcome");
        };
        assert_eq!(book.chapters.len(), 2);
        assert!(shelf.is_empty());
    }

    #[test]
    fn oversized_chapter_is_chunked_and_renumbered() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut shelf = open_shelf(&dir);

        // ~31k chars in one logical chapter -> 3 records at the 15k ceiling.
        let body = "All work and no play makes Jack a dull boy. ".repeat(700);
        let outcome = ingest(
            &mut shelf,
            IngestRequest {
                pasted_text: Some(format!("Chapter 1\n{body}")),
                overrides: Overrides {
                    title: Some("Big One".into()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .unwrap();

        let IngestOutcome::Persisted { book, chapters_written } = outcome else {
            panic!("expected persisted outcome");
        };
        assert_eq!(chapters_written, 3);
        assert_eq!(book.total_chapters, 3);

        let chapters = shelf.load_chapters(&book.id).unwrap();
        let numbers: Vec<_> = chapters.iter().map(|c| c.chapter_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(
            chapters
                .iter()
                .all(|c| c.content.chars().count() <= MAX_CHUNK_CHARS)
        );
        assert!(chapters.iter().all(|c| c.title == "Chapter 1"));
    }

    #[test]
    fn reingest_same_title_reuses_book() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut shelf = open_shelf(&dir);

        let overrides = Overrides {
            title: Some("Stable Title".into()),
            ..Default::default()
        };
        let first = ingest(
            &mut shelf,
            IngestRequest {
                pasted_text: Some("Chapter 1\nA\nChapter 2\nB\nChapter 3\nC".into()),
                overrides: overrides.clone(),
                ..Default::default()
            },
        )
        .unwrap();
        let second = ingest(
            &mut shelf,
            IngestRequest {
                pasted_text: Some("Chapter 1\nOnly one now.".into()),
                overrides,
                ..Default::default()
            },
        )
        .unwrap();

        let (IngestOutcome::Persisted { book: a, .. }, IngestOutcome::Persisted { book: b, .. }) =
            (first, second)
        else {
            panic!("expected persisted outcomes");
        };
        assert_eq!(a.id, b.id);
        assert_eq!(shelf.len(), 1);
        assert_eq!(b.total_chapters, 1);
        assert_eq!(shelf.load_chapters(&b.id).unwrap().len(), 1);
    }

    #[test]
    fn oversized_body_is_refused_not_truncated() {
        let body = vec![0u8; 100];
        let err = read_body(std::io::Cursor::new(&body), 64, "http://host/big.epub").unwrap_err();
        let IngestError::DownloadFailure { message, .. } = err else {
            panic!("expected download failure");
        };
        assert!(message.contains("exceeds"));

        let ok = read_body(std::io::Cursor::new(&body), 100, "http://host/fits.epub").unwrap();
        assert_eq!(ok.len(), 100);
    }

    #[test]
    fn bad_url_is_download_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut shelf = open_shelf(&dir);

        let err = ingest(
            &mut shelf,
            IngestRequest {
                file_url: Some("http://127.0.0.1:1/never.epub".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, IngestError::DownloadFailure { .. }));
    }
}
