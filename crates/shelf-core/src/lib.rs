//! Shelf Core Library
//!
//! This crate provides the core functionality for Shelf, a personal
//! book-tracking application: a local store for books, reviews, annotations
//! and tags, a barcode-driven catalog lookup, and a view router with strict
//! cleanup-before-mount ordering.
//!
//! # Architecture
//!
//! - **SQLite**: system of record, one `(key, record)` table per collection
//! - **Catalog**: SRU search service answering with UNIMARC records
//! - **Router**: cancellable view loads over a static route table
//!
//! # Quick Start
//!
//! ```text
//! let mut library = Library::open(&config)?;
//!
//! // Add a book
//! let book = library.add_book(&BookDraft::new("Dune"))?;
//! library.add_tag(book.id, "fiction")?;
//!
//! // Look one up by barcode
//! let pipeline = ScanPipeline::new(CatalogClient::from_config(&config)?);
//! let outcome = pipeline.process("978-0-14-032872-1").await?;
//! ```
//!
//! # Modules
//!
//! - `library`: book lifecycle and queries (main entry point)
//! - `store`: transactional object store
//! - `storage`: collections, record encoding, schema, errors
//! - `models`: books, reviews, annotations and tags
//! - `isbn`: barcode normalization and ISBN-13 to ISBN-10 conversion
//! - `catalog`: catalog client, UNIMARC parsing, search debounce
//! - `scan`: scan-to-record pipeline and the capture device queue
//! - `cover`: cover image resolution
//! - `router`: view routing, history and cancellation
//! - `export`: JSON and spreadsheet export
//! - `config`: application configuration

pub mod catalog;
pub mod config;
pub mod cover;
pub mod draft;
pub mod export;
pub mod isbn;
pub mod library;
pub mod models;
pub mod notice;
pub mod router;
pub mod scan;
pub mod storage;
pub mod store;

pub use catalog::{BookSuggestion, Catalog, CatalogClient, CatalogError};
pub use config::Config;
pub use draft::{BookDraft, DraftCover};
pub use library::{Library, LibraryError, ValidationError};
pub use models::{normalize_tag, Annotation, Book, ReadingStatus, Review, Tag};
pub use notice::Notice;
pub use router::{NavState, Route, Router};
pub use scan::{ScanOutcome, ScanPipeline, ScanSession, ScanState};
pub use storage::{Collection, StorageError, TxMode};
pub use store::Store;
