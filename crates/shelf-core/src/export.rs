//! Full-state export
//!
//! Two formats, both covering all four collections:
//!
//! - a JSON document keyed by collection name, images base64-encoded
//! - a spreadsheet as one CSV sheet per collection, images replaced by
//!   [`IMAGE_PLACEHOLDER`]

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::info;

use crate::models::{Annotation, Book, Review, Tag};
use crate::storage::{Collection, StorageError, TxMode};
use crate::store::Store;

/// Stands in for binary image fields in spreadsheet sheets
pub const IMAGE_PLACEHOLDER: &str = "[image]";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write sheet: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Everything in the store, read in one transaction
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub books: Vec<Book>,
    pub reviews: Vec<Review>,
    pub annotations: Vec<Annotation>,
    pub tags: Vec<Tag>,
}

impl Snapshot {
    pub fn read(store: &mut Store) -> ExportResult<Self> {
        let tx = store.transaction(&Collection::ALL, TxMode::ReadOnly)?;
        Ok(Self {
            books: tx.get_all()?,
            reviews: tx.get_all()?,
            annotations: tx.get_all()?,
            tags: tx.get_all()?,
        })
    }

    /// The interchange document
    pub fn to_json(&self) -> ExportResult<Value> {
        let mut doc = Map::new();
        doc.insert(
            Collection::Books.name().into(),
            records(&self.books, |b| ("cover", b.cover.as_deref()))?,
        );
        doc.insert(
            Collection::Reviews.name().into(),
            serde_json::to_value(&self.reviews)?,
        );
        doc.insert(
            Collection::Annotations.name().into(),
            records(&self.annotations, |a| ("image", a.image.as_deref()))?,
        );
        doc.insert(
            Collection::Tags.name().into(),
            serde_json::to_value(&self.tags)?,
        );
        Ok(Value::Object(doc))
    }

    pub fn write_json(&self, path: &Path) -> ExportResult<()> {
        let json = serde_json::to_string_pretty(&self.to_json()?)?;
        fs::write(path, json).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Exported JSON to {:?}", path);
        Ok(())
    }

    /// Write `books.csv`, `reviews.csv`, `annotations.csv` and `tags.csv`
    pub fn write_sheets(&self, dir: &Path) -> ExportResult<Vec<PathBuf>> {
        fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let paths: Vec<PathBuf> = Collection::ALL
            .iter()
            .map(|c| dir.join(format!("{}.csv", c.name())))
            .collect();

        self.write_books_sheet(&paths[0])?;
        self.write_reviews_sheet(&paths[1])?;
        self.write_annotations_sheet(&paths[2])?;
        self.write_tags_sheet(&paths[3])?;

        info!("Exported {} sheets to {:?}", paths.len(), dir);
        Ok(paths)
    }

    fn write_books_sheet(&self, path: &Path) -> ExportResult<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record([
            "id",
            "title",
            "author",
            "year",
            "isbn",
            "pages",
            "summary",
            "publisher",
            "cover",
            "status",
            "bookmark",
            "tags",
            "readCount",
            "dateAdded",
            "dateUpdated",
        ])?;
        for book in &self.books {
            wtr.write_record([
                book.id.to_string(),
                book.title.clone(),
                book.author.clone(),
                opt(book.year),
                book.isbn.clone().unwrap_or_default(),
                opt(book.pages),
                book.summary.clone().unwrap_or_default(),
                book.publisher.clone().unwrap_or_default(),
                placeholder(book.cover.as_deref()),
                book.status.to_string(),
                opt(book.bookmark),
                book.tags.join("; "),
                book.read_count.to_string(),
                book.date_added.to_rfc3339(),
                book.date_updated
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default(),
            ])?;
        }
        wtr.flush().map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    fn write_reviews_sheet(&self, path: &Path) -> ExportResult<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["id", "bookId", "rating", "comment", "date"])?;
        for review in &self.reviews {
            wtr.write_record([
                opt(review.id),
                review.book_id.to_string(),
                review.rating.to_string(),
                review.comment.clone().unwrap_or_default(),
                review.date.to_rfc3339(),
            ])?;
        }
        wtr.flush().map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    fn write_annotations_sheet(&self, path: &Path) -> ExportResult<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["id", "bookId", "text", "quote", "page", "image", "date"])?;
        for note in &self.annotations {
            wtr.write_record([
                opt(note.id),
                note.book_id.to_string(),
                note.text.clone(),
                note.quote.clone().unwrap_or_default(),
                opt(note.page),
                placeholder(note.image.as_deref()),
                note.date.to_rfc3339(),
            ])?;
        }
        wtr.flush().map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    fn write_tags_sheet(&self, path: &Path) -> ExportResult<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        wtr.write_record(["name"])?;
        for tag in &self.tags {
            wtr.write_record([tag.name()])?;
        }
        wtr.flush().map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }
}

/// Serialize records, replacing one binary field with its base64 text
fn records<T, F>(items: &[T], blob: F) -> ExportResult<Value>
where
    T: Serialize,
    F: Fn(&T) -> (&'static str, Option<&[u8]>),
{
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let mut value = serde_json::to_value(item)?;
        let (field, bytes) = blob(item);
        if let Value::Object(map) = &mut value {
            let encoded = bytes.map_or(Value::Null, |b| Value::String(STANDARD.encode(b)));
            map.insert(field.to_string(), encoded);
        }
        out.push(value);
    }
    Ok(Value::Array(out))
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn placeholder(bytes: Option<&[u8]>) -> String {
    match bytes {
        Some(_) => IMAGE_PLACEHOLDER.to_string(),
        None => String::new(),
    }
}
