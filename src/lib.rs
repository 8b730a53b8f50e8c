//! # scriptorium
//!
//! Manuscript ingestion and chaptering engine. Takes a raw document — an
//! EPUB binary (local file or URL) or pasted plain/HTML text — and produces
//! a normalized sequence of `(title, content)` chapter records, optionally
//! persisting them to an on-disk shelf as individually numbered documents.
//!
//! ## Pipeline
//!
//! - **Normalizer** (`normalize`): strips UI artifacts, zero-width
//!   characters, and publisher/credit boilerplate from any text blob.
//! - **HTML reducer** (`html`): turns EPUB-internal (X)HTML into
//!   structure-preserving plain text with `\n\n` paragraph breaks.
//! - **EPUB reader** (`epub`): walks the reading order, filters non-text
//!   resources, and applies the reducer + normalizer per spine entry, under
//!   a hard wall-clock timeout.
//! - **Splitter** (`split`): heuristic chapter-boundary detection for
//!   pasted text ("Chapter N", roman numerals, numbered headers).
//! - **Chunker** (`chunk`): bounds chapter content to the per-record size
//!   ceiling, losslessly.
//! - **Orchestrator** (`ingest`): chooses the extraction path, applies
//!   overrides, and writes books and chapters through a `Shelf` handle.
//!
//! ## Library usage
//!
//! ```no_run
//! use scriptorium::ingest::{ingest, IngestRequest};
//! use scriptorium::shelf::Shelf;
//!
//! let mut shelf = Shelf::open(std::path::Path::new(".scriptorium")).unwrap();
//! let request = IngestRequest {
//!     pasted_text: Some("Chapter 1\nIt was a dark and stormy night.".into()),
//!     ..Default::default()
//! };
//! let outcome = ingest(&mut shelf, request).unwrap();
//! println!("{outcome:?}");
//! ```

pub mod chunk;
pub mod epub;
pub mod error;
pub mod html;
pub mod inbox;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod shelf;
pub mod split;

pub use error::{IngestError, IngestResult};
pub use ingest::{IngestOutcome, IngestRequest, Overrides, ingest};
pub use model::{BookRecord, ChapterCandidate, ChapterRecord, ParsedBook};
pub use shelf::Shelf;
