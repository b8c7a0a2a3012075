//! Storage layer
//!
//! SQLite-backed object store with four named collections. Records are
//! CBOR-encoded into a `(key, record)` table per collection.
//!
//! ## Collections
//!
//! - `books` - keyed by the book's UUID (caller-supplied)
//! - `reviews` - store-assigned integer keys
//! - `annotations` - store-assigned integer keys
//! - `tags` - keyed by canonical tag name

pub mod error;
pub mod schema;

use std::fmt;

use rusqlite::types::{FromSql, ToSql};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::models::{Annotation, Book, Review, Tag};

pub use error::{StorageError, StorageResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};

/// The named collections of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Books,
    Reviews,
    Annotations,
    Tags,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Books,
        Collection::Reviews,
        Collection::Annotations,
        Collection::Tags,
    ];

    /// Table (and export section) name
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Books => "books",
            Collection::Reviews => "reviews",
            Collection::Annotations => "annotations",
            Collection::Tags => "tags",
        }
    }

    /// Whether the store generates keys for this collection
    pub fn auto_key(&self) -> bool {
        matches!(self, Collection::Reviews | Collection::Annotations)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared access mode of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
    ReadOnly,
    ReadWrite,
}

/// A value persisted in one collection
pub trait Record: Serialize + DeserializeOwned {
    const COLLECTION: Collection;
    type Key: ToSql + FromSql + Clone + fmt::Display;

    /// The record's key, if it has one yet
    fn key(&self) -> Option<Self::Key>;

    /// Called with the store-assigned key for auto-keyed collections
    fn set_key(&mut self, _key: Self::Key) {}
}

impl Record for Book {
    const COLLECTION: Collection = Collection::Books;
    type Key = String;

    fn key(&self) -> Option<String> {
        Some(self.id.to_string())
    }
}

impl Record for Review {
    const COLLECTION: Collection = Collection::Reviews;
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }
}

impl Record for Annotation {
    const COLLECTION: Collection = Collection::Annotations;
    type Key = i64;

    fn key(&self) -> Option<i64> {
        self.id
    }

    fn set_key(&mut self, key: i64) {
        self.id = Some(key);
    }
}

impl Record for Tag {
    const COLLECTION: Collection = Collection::Tags;
    type Key = String;

    fn key(&self) -> Option<String> {
        Some(self.name().to_string())
    }
}

/// Encode a record for storage
pub(crate) fn encode<R: Record>(record: &R) -> StorageResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(record, &mut bytes).map_err(|e| StorageError::Encode {
        collection: R::COLLECTION,
        details: e.to_string(),
    })?;
    Ok(bytes)
}

/// Decode a stored record
pub(crate) fn decode<R: Record>(key: &R::Key, bytes: &[u8]) -> StorageResult<R> {
    ciborium::from_reader(bytes).map_err(|e| StorageError::CorruptRecord {
        collection: R::COLLECTION,
        key: key.to_string(),
        details: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_collection_names() {
        let names: Vec<&str> = Collection::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["books", "reviews", "annotations", "tags"]);
    }

    #[test]
    fn test_auto_key_collections() {
        assert!(!Collection::Books.auto_key());
        assert!(Collection::Reviews.auto_key());
        assert!(Collection::Annotations.auto_key());
        assert!(!Collection::Tags.auto_key());
    }

    #[test]
    fn test_book_encoding_preserves_fields() {
        let mut book = Book::new("Dune");
        book.cover = Some(vec![1, 2, 3, 4]);
        book.bookmark = Some(42);

        let bytes = encode(&book).unwrap();
        let decoded: Book = decode(&book.id.to_string(), &bytes).unwrap();
        assert_eq!(decoded, book);
    }

    #[test]
    fn test_decode_garbage_is_corrupt_record() {
        let err = decode::<Annotation>(&7, &[0xFF, 0x00, 0x13]).unwrap_err();
        match err {
            StorageError::CorruptRecord {
                collection, key, ..
            } => {
                assert_eq!(collection, Collection::Annotations);
                assert_eq!(key, "7");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_review_key_assignment() {
        let mut review = Review {
            id: None,
            book_id: Uuid::new_v4(),
            rating: 8,
            comment: None,
            date: chrono::Utc::now(),
        };
        assert!(review.key().is_none());
        review.set_key(12);
        assert_eq!(review.key(), Some(12));
    }
}
