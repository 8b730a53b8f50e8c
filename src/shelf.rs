//! Persistent shelf: book catalog plus per-chapter record files.
//!
//! Layout under an explicitly injected root directory (no process-wide
//! singleton):
//!
//! ```text
//! {root}/catalog.json                      Vec<BookRecord>
//! {root}/chapters/{book_id}/{NNNN}.json    one ChapterRecord per file
//! ```
//!
//! Chapter writes are independent, order-insensitive documents; re-ingesting
//! a book replaces its chapter directory wholesale.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{IngestError, IngestResult};
use crate::model::{BookRecord, ChapterRecord, unix_now};

/// Handle to one shelf directory.
pub struct Shelf {
    root: PathBuf,
    catalog_path: PathBuf,
    records: Vec<BookRecord>,
}

impl Shelf {
    /// Open or create a shelf rooted at `dir`. A missing catalog file means
    /// an empty shelf.
    pub fn open(dir: &Path) -> IngestResult<Self> {
        let catalog_path = dir.join("catalog.json");

        let records = if catalog_path.exists() {
            let data = std::fs::read_to_string(&catalog_path).map_err(|e| {
                IngestError::PersistenceFailure {
                    message: format!("read {}: {e}", catalog_path.display()),
                }
            })?;
            serde_json::from_str(&data).map_err(|e| IngestError::PersistenceFailure {
                message: format!("parse {}: {e}", catalog_path.display()),
            })?
        } else {
            Vec::new()
        };

        Ok(Self {
            root: dir.to_path_buf(),
            catalog_path,
            records,
        })
    }

    fn flush(&self) -> IngestResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| IngestError::PersistenceFailure {
            message: format!("create dir {}: {e}", self.root.display()),
        })?;
        let json = serde_json::to_string_pretty(&self.records).map_err(|e| {
            IngestError::PersistenceFailure {
                message: format!("serialize catalog: {e}"),
            }
        })?;
        std::fs::write(&self.catalog_path, json).map_err(|e| IngestError::PersistenceFailure {
            message: format!("write {}: {e}", self.catalog_path.display()),
        })
    }

    /// Exact-title lookup, used to reuse a book's identity on re-ingest.
    pub fn find_by_title(&self, title: &str) -> Option<&BookRecord> {
        self.records.iter().find(|r| r.title == title)
    }

    /// Look up a book by id.
    pub fn get(&self, id: &str) -> Option<&BookRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// List all book records.
    pub fn list(&self) -> &[BookRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Create a book record, or reuse the identity of an existing book with
    /// the same exact title. Returns the book id; `total_chapters` is synced
    /// later by [`Shelf::write_chapters`].
    pub fn upsert_book(
        &mut self,
        title: &str,
        author: &str,
        genre: Vec<String>,
    ) -> IngestResult<String> {
        let now = unix_now();

        if let Some(existing) = self.records.iter_mut().find(|r| r.title == title) {
            existing.author = author.to_string();
            existing.author_lower = author.to_lowercase();
            existing.genre = genre;
            existing.last_updated = now;
            let id = existing.id.clone();
            self.flush()?;
            return Ok(id);
        }

        let id = slugify(title);
        self.records.push(BookRecord {
            id: id.clone(),
            title: title.to_string(),
            title_lower: title.to_lowercase(),
            author: author.to_string(),
            author_lower: author.to_lowercase(),
            genre,
            total_chapters: 0,
            created_at: now,
            last_updated: now,
        });
        self.flush()?;
        Ok(id)
    }

    /// Replace a book's chapter records and recompute `total_chapters` from
    /// the actual number written.
    pub fn write_chapters(&mut self, book_id: &str, chapters: &[ChapterRecord]) -> IngestResult<()> {
        let dir = self.chapters_dir(book_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| IngestError::PersistenceFailure {
                message: format!("clear {}: {e}", dir.display()),
            })?;
        }
        std::fs::create_dir_all(&dir).map_err(|e| IngestError::PersistenceFailure {
            message: format!("create dir {}: {e}", dir.display()),
        })?;

        for chapter in chapters {
            let path = dir.join(format!("{:04}.json", chapter.chapter_number));
            let json =
                serde_json::to_string_pretty(chapter).map_err(|e| IngestError::PersistenceFailure {
                    message: format!("serialize chapter {}: {e}", chapter.chapter_number),
                })?;
            std::fs::write(&path, json).map_err(|e| IngestError::PersistenceFailure {
                message: format!("write {}: {e}", path.display()),
            })?;
        }

        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == book_id)
            .ok_or_else(|| IngestError::BookNotFound { id: book_id.into() })?;
        record.total_chapters = chapters.len();
        record.last_updated = unix_now();
        self.flush()?;

        info!(book = %book_id, chapters = chapters.len(), "wrote chapter records");
        Ok(())
    }

    /// Load a book's chapter records, ordered by chapter number.
    pub fn load_chapters(&self, book_id: &str) -> IngestResult<Vec<ChapterRecord>> {
        let dir = self.chapters_dir(book_id);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut chapters = Vec::new();
        let entries = std::fs::read_dir(&dir).map_err(|e| IngestError::PersistenceFailure {
            message: format!("read {}: {e}", dir.display()),
        })?;
        for entry in entries.flatten() {
            let data = std::fs::read_to_string(entry.path()).map_err(|e| {
                IngestError::PersistenceFailure {
                    message: format!("read {}: {e}", entry.path().display()),
                }
            })?;
            let record: ChapterRecord =
                serde_json::from_str(&data).map_err(|e| IngestError::PersistenceFailure {
                    message: format!("parse {}: {e}", entry.path().display()),
                })?;
            chapters.push(record);
        }
        chapters.sort_by_key(|c| c.chapter_number);
        Ok(chapters)
    }

    /// Remove a book and its chapter records. Returns the removed record.
    pub fn remove(&mut self, id: &str) -> IngestResult<BookRecord> {
        let pos = self
            .records
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| IngestError::BookNotFound { id: id.into() })?;
        let record = self.records.remove(pos);
        self.flush()?;

        let dir = self.chapters_dir(id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| IngestError::PersistenceFailure {
                message: format!("remove {}: {e}", dir.display()),
            })?;
        }
        Ok(record)
    }

    fn chapters_dir(&self, book_id: &str) -> PathBuf {
        self.root.join("chapters").join(book_id)
    }
}

/// Generate a URL-safe slug from a title string.
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
