//! The add-flow's draft record
//!
//! A draft is the form state of the add screen before it becomes a
//! [`Book`](crate::models::Book). It is filled by hand, from a search
//! suggestion or by a successful scan, and is owned by whichever flow holds it.

use serde::{Deserialize, Serialize};

use crate::catalog::BookSuggestion;
use crate::cover::{primary_cover_url, CoverCandidates, CoverFetcher};

/// Where the draft's cover comes from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum DraftCover {
    #[default]
    None,
    /// Remote image, downloaded when the book is saved
    Url(String),
    /// Image supplied directly
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub isbn: Option<String>,
    pub pages: Option<u32>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub cover: DraftCover,
}

impl BookDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Replace the draft's fields with a catalog suggestion
    pub fn fill_from(&mut self, suggestion: &BookSuggestion) {
        self.title = suggestion.title.clone();
        self.author = suggestion.author.clone();
        self.year = suggestion.year;
        self.isbn = suggestion.isbn.clone();
        self.pages = suggestion.pages;
        self.summary = Some(suggestion.summary.clone());
        self.publisher = suggestion.publisher.clone();
        self.cover = match &suggestion.isbn {
            Some(isbn) => DraftCover::Url(primary_cover_url(isbn)),
            None => DraftCover::None,
        };
    }

    /// Download a remote cover, trying the fallback provider once
    ///
    /// A cover that cannot be loaded is dropped rather than failing the save.
    pub async fn resolve_cover(&mut self, fetcher: &CoverFetcher) {
        let DraftCover::Url(url) = &self.cover else {
            return;
        };

        let mut urls = vec![url.clone()];
        if let Some(isbn) = &self.isbn {
            let derived = primary_cover_url(isbn);
            if *url == derived {
                urls = CoverCandidates::new(isbn.as_str()).collect();
            }
        }

        self.cover = match fetcher.fetch_first(urls).await {
            Some(bytes) => DraftCover::Bytes(bytes),
            None => DraftCover::None,
        };
    }

    /// Cover bytes, if already resolved
    pub fn cover_bytes(&self) -> Option<&[u8]> {
        match &self.cover {
            DraftCover::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl From<&BookSuggestion> for BookDraft {
    fn from(suggestion: &BookSuggestion) -> Self {
        let mut draft = BookDraft::default();
        draft.fill_from(suggestion);
        draft
    }
}
