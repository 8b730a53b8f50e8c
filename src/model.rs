//! Core data types for the ingestion pipeline.
//!
//! Everything here lives for the duration of a single ingestion request;
//! only `BookRecord` and `ChapterRecord` outlive it, as persisted shelf
//! documents.

use serde::{Deserialize, Serialize};

/// One extracted chapter: plain text with `\n\n` as the only structural
/// markup. Candidates whose content is 50 characters or shorter are dropped
/// by the EPUB reader (navigation pages, blank dividers, cover pages).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterCandidate {
    pub title: String,
    pub content: String,
}

/// The pipeline's in-memory output, prior to any persistence.
#[derive(Debug, Clone, Default)]
pub struct ParsedBook {
    /// Extracted title; empty string if the source declared none.
    pub title: String,
    /// Extracted creators, joined with `", "` when there are several.
    pub author: String,
    pub chapters: Vec<ChapterCandidate>,
}

/// Persistent root record for a book on the shelf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookRecord {
    /// URL-safe slug identifier derived from the title.
    pub id: String,
    pub title: String,
    /// Lowercased copy kept for case-insensitive search.
    pub title_lower: String,
    pub author: String,
    pub author_lower: String,
    pub genre: Vec<String>,
    /// Count of persisted chapter records. When chunking splits a logical
    /// chapter, this reflects the actual chunk count, not the logical count.
    pub total_chapters: usize,
    /// Seconds since UNIX epoch.
    pub created_at: u64,
    pub last_updated: u64,
}

/// Persistent record for a single stored chapter (one chunk).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterRecord {
    /// 1-based position in the stored sequence. May outrun the logical
    /// chapter count when a chapter was chunked.
    pub chapter_number: usize,
    pub title: String,
    /// At most the chunk ceiling in characters.
    pub content: String,
    /// Id of the owning `BookRecord`.
    pub owner_id: String,
    pub created_at: u64,
}

/// Current wall-clock time as seconds since UNIX epoch.
pub(crate) fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
