//! Data models for shelf
//!
//! Defines the persisted records: Book, Review, Annotation, and Tag.
//! Binary fields (covers, annotation images) are stored as raw bytes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reading progress of a book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingStatus {
    #[default]
    ToRead,
    Reading,
    Finished,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::ToRead,
        ReadingStatus::Reading,
        ReadingStatus::Finished,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::ToRead => "to-read",
            ReadingStatus::Reading => "reading",
            ReadingStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for ReadingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReadingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReadingStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| format!("unknown status '{}' (expected to-read, reading or finished)", s))
    }
}

/// A book in the collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier, assigned at creation
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub year: Option<i32>,
    /// Canonical identifier (ISBN-10 or ISBN-13)
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    /// Cover image bytes
    #[serde(default, with = "serde_bytes")]
    pub cover: Option<Vec<u8>>,
    #[serde(default)]
    pub status: ReadingStatus,
    /// Page marker, always positive when present
    #[serde(default)]
    pub bookmark: Option<u32>,
    /// Canonical tag names in insertion order
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub read_count: u32,
    pub date_added: DateTime<Utc>,
    #[serde(default)]
    pub date_updated: Option<DateTime<Utc>>,
}

impl Book {
    /// Create a new book with the given title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            author: String::new(),
            year: None,
            isbn: None,
            pages: None,
            summary: None,
            publisher: None,
            cover: None,
            status: ReadingStatus::ToRead,
            bookmark: None,
            tags: Vec::new(),
            read_count: 0,
            date_added: Utc::now(),
            date_updated: None,
        }
    }

    /// Add a canonical tag; returns false when it was already present
    pub fn add_tag(&mut self, tag: &Tag) -> bool {
        if self.has_tag(tag.name()) {
            return false;
        }
        self.tags.push(tag.name().to_string());
        true
    }

    /// Remove a tag; returns false when it was not present
    pub fn remove_tag(&mut self, name: &str) -> bool {
        match self.tags.iter().position(|t| t == name) {
            Some(pos) => {
                self.tags.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Move to `status`; finishing a book counts one more read
    pub fn set_status(&mut self, status: ReadingStatus) {
        if status == ReadingStatus::Finished && self.status != ReadingStatus::Finished {
            self.read_count += 1;
        }
        self.status = status;
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t == name)
    }

    /// Timestamp used for "recently updated" ordering
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.date_updated.unwrap_or(self.date_added)
    }
}

/// A rating and optional comment; at most one per book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Store-assigned sequential id
    #[serde(default)]
    pub id: Option<i64>,
    pub book_id: Uuid,
    /// 1 to 10
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub date: DateTime<Utc>,
}

/// A quote or note attached to a book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    /// Store-assigned sequential id
    #[serde(default)]
    pub id: Option<i64>,
    pub book_id: Uuid,
    pub text: String,
    #[serde(default)]
    pub quote: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default, with = "serde_bytes")]
    pub image: Option<Vec<u8>>,
    pub date: DateTime<Utc>,
}

impl Annotation {
    pub fn new(book_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            id: None,
            book_id,
            text: text.into(),
            quote: None,
            page: None,
            image: None,
            date: Utc::now(),
        }
    }
}

/// A tag name from the global registry
///
/// Names are canonicalized once, on construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Tag {
    name: String,
}

impl Tag {
    /// Create a tag, canonicalizing the raw name
    pub fn new(raw: &str) -> Self {
        Self {
            name: normalize_tag(raw),
        }
    }

    /// Get the tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Canonicalize a tag name: trimmed, first letter uppercased, rest lowercased
///
/// Applying it twice yields the same value.
pub fn normalize_tag(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };

    let upper = first.to_uppercase();
    // Multi-char expansions ("ß" -> "SS") would not survive a second pass
    let mut name: String = if upper.len() == 1 {
        upper.collect()
    } else {
        first.to_string()
    };
    name.push_str(&chars.as_str().to_lowercase());
    name
}
