//! Rich diagnostic error types for the ingestion pipeline.

use miette::Diagnostic;
use thiserror::Error;

/// Errors surfaced by manuscript ingestion.
///
/// Per-chapter length filtering and incidental chapter-boundary matches are
/// deliberate heuristic decisions, not errors; they never appear here.
#[derive(Debug, Error, Diagnostic)]
pub enum IngestError {
    #[error("no source provided: expected a file URL or pasted text")]
    #[diagnostic(
        code(scriptorium::ingest::no_source),
        help(
            "Provide exactly one source: a URL pointing at an EPUB binary, \
             a local EPUB file, or pasted manuscript text."
        )
    )]
    NoSourceProvided,

    #[error("download failed for \"{url}\": {message}")]
    #[diagnostic(
        code(scriptorium::ingest::download_failure),
        help(
            "The source URL could not be fetched. Check that the URL is \
             reachable, returns a 2xx status, and serves the EPUB binary."
        )
    )]
    DownloadFailure { url: String, message: String },

    #[error("corrupt or unreadable EPUB archive: {message}")]
    #[diagnostic(
        code(scriptorium::epub::archive_corruption),
        help(
            "The file could not be opened as an EPUB container. Verify it is \
             a valid EPUB and not truncated or a different format."
        )
    )]
    ArchiveCorruption { message: String },

    #[error("EPUB parse exceeded the {seconds}s timeout")]
    #[diagnostic(
        code(scriptorium::epub::parse_timeout),
        help(
            "Parsing did not finish within the wall-clock budget. The archive \
             may be pathological; the temporary parse file has been removed."
        )
    )]
    ParseTimeout { seconds: u64 },

    #[error("chapter extraction failed: {message}")]
    #[diagnostic(
        code(scriptorium::epub::extraction_failure),
        help(
            "An unexpected error occurred while walking the EPUB reading \
             order. Check the inner message for details."
        )
    )]
    ExtractionFailure { message: String },

    #[error("persistence failed: {message}")]
    #[diagnostic(
        code(scriptorium::shelf::persistence_failure),
        help(
            "Failed to read or write the shelf catalog or a chapter record. \
             Check that the shelf directory exists and has correct permissions."
        )
    )]
    PersistenceFailure { message: String },

    #[error("book not found: \"{id}\"")]
    #[diagnostic(
        code(scriptorium::shelf::book_not_found),
        help("No book with this id exists on the shelf. List books with `scriptorium list`.")
    )]
    BookNotFound { id: String },

    #[error("I/O error: {source}")]
    #[diagnostic(
        code(scriptorium::io),
        help("A filesystem operation failed. Check file paths and permissions.")
    )]
    Io {
        #[source]
        source: std::io::Error,
    },
}

/// Convenience alias for pipeline operation results.
pub type IngestResult<T> = std::result::Result<T, IngestError>;
