//! scriptorium CLI: manuscript ingestion and chaptering.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use scriptorium::ingest::{IngestOutcome, IngestRequest, Overrides, ingest, ingest_epub_bytes};
use scriptorium::inbox::{InboxConfig, watch_inbox};
use scriptorium::shelf::Shelf;

#[derive(Parser)]
#[command(name = "scriptorium", version, about = "Manuscript ingestion and chaptering engine")]
struct Cli {
    /// Shelf directory for persisted books and chapters.
    #[arg(long, global = true, default_value = ".scriptorium")]
    shelf_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a manuscript from a URL, a local EPUB, or pasted text.
    Ingest {
        /// URL pointing at an EPUB binary.
        #[arg(long, conflicts_with_all = ["file", "text", "text_file"])]
        url: Option<String>,

        /// Local EPUB file.
        #[arg(long, conflicts_with_all = ["text", "text_file"])]
        file: Option<PathBuf>,

        /// Pasted manuscript text, inline.
        #[arg(long, conflicts_with = "text_file")]
        text: Option<String>,

        /// File whose contents are treated as pasted text.
        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Override the extracted title.
        #[arg(long)]
        title: Option<String>,

        /// Override the extracted author.
        #[arg(long)]
        author: Option<String>,

        /// Genre tags (repeatable).
        #[arg(long)]
        genre: Vec<String>,

        /// Parse and print the result without persisting anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// List all books on the shelf.
    List,

    /// Show a book and its chapter records.
    Show {
        /// Book id (slug).
        id: String,
    },

    /// Remove a book and its chapters from the shelf.
    Remove {
        /// Book id (slug).
        id: String,
    },

    /// Watch a drop directory and ingest new files as they appear.
    Inbox {
        /// Directory to watch.
        #[arg(long, default_value = "inbox")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut shelf = Shelf::open(&cli.shelf_dir)?;

    match cli.command {
        Commands::Ingest {
            url,
            file,
            text,
            text_file,
            title,
            author,
            genre,
            dry_run,
        } => {
            let overrides = Overrides {
                title,
                author,
                genre: (!genre.is_empty()).then_some(genre),
            };

            let outcome = if let Some(path) = file {
                let bytes = std::fs::read(&path).into_diagnostic()?;
                ingest_epub_bytes(&mut shelf, &bytes, &overrides, dry_run)?
            } else {
                let pasted_text = match (text, text_file) {
                    (Some(t), _) => Some(t),
                    (None, Some(path)) => Some(std::fs::read_to_string(&path).into_diagnostic()?),
                    (None, None) => None,
                };
                ingest(
                    &mut shelf,
                    IngestRequest {
                        file_url: url,
                        pasted_text,
                        overrides,
                        dry_run,
                    },
                )?
            };

            match outcome {
                IngestOutcome::Parsed(book) => {
                    println!("Parsed \"{}\" by {} (dry run, not persisted)", book.title, book.author);
                    for (i, chapter) in book.chapters.iter().enumerate() {
                        println!(
                            "  {}. \"{}\" ({} chars)",
                            i + 1,
                            chapter.title,
                            chapter.content.chars().count()
                        );
                    }
                }
                IngestOutcome::Persisted {
                    book,
                    chapters_written,
                } => {
                    println!("Ingested \"{}\" by {}", book.title, book.author);
                    println!("  id:       {}", book.id);
                    println!("  genre:    {}", book.genre.join(", "));
                    println!("  chapters: {chapters_written}");
                }
            }
        }

        Commands::List => {
            let books = shelf.list();
            if books.is_empty() {
                println!("Shelf is empty.");
            } else {
                println!("Books ({}):", books.len());
                for book in books {
                    println!(
                        "  {} — \"{}\" by {} ({} chapters)",
                        book.id, book.title, book.author, book.total_chapters
                    );
                }
            }
        }

        Commands::Show { id } => {
            let book = shelf
                .get(&id)
                .ok_or_else(|| scriptorium::IngestError::BookNotFound { id: id.clone() })?;
            println!("Book: \"{}\"", book.title);
            println!("  id:           {}", book.id);
            println!("  author:       {}", book.author);
            println!("  genre:        {}", book.genre.join(", "));
            println!("  chapters:     {}", book.total_chapters);
            println!("  created_at:   {}", book.created_at);
            println!("  last_updated: {}", book.last_updated);

            let chapters = shelf.load_chapters(&id)?;
            for chapter in &chapters {
                println!(
                    "  {:>4}. \"{}\" ({} chars)",
                    chapter.chapter_number,
                    chapter.title,
                    chapter.content.chars().count()
                );
            }
        }

        Commands::Remove { id } => {
            let removed = shelf.remove(&id)?;
            println!("Removed \"{}\" ({})", removed.title, removed.id);
        }

        Commands::Inbox { dir } => {
            let config = InboxConfig::new(dir);
            watch_inbox(&mut shelf, &config)?;
        }
    }

    Ok(())
}
