//! Filtering, sorting and paging of books and annotations

use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use uuid::Uuid;

use crate::models::{normalize_tag, Annotation, Book, ReadingStatus, Review};

/// Books per page of the collection grid
pub const PAGE_SIZE: usize = 12;

/// How a multi-tag filter combines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMode {
    /// Book must carry every selected tag
    #[default]
    All,
    /// Book must carry at least one selected tag
    Any,
}

impl FromStr for TagMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" | "and" => Ok(TagMode::All),
            "any" | "or" => Ok(TagMode::Any),
            _ => Err(format!("Unknown tag mode: {} (expected all or any)", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSort {
    #[default]
    DateDesc,
    DateAsc,
    RatingDesc,
    RatingAsc,
}

impl FromStr for BookSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date-desc" => Ok(BookSort::DateDesc),
            "date-asc" => Ok(BookSort::DateAsc),
            "rating-desc" => Ok(BookSort::RatingDesc),
            "rating-asc" => Ok(BookSort::RatingAsc),
            _ => Err(format!(
                "Unknown sort: {} (expected date-desc, date-asc, rating-desc or rating-asc)",
                s
            )),
        }
    }
}

/// Collection screen filter
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    /// Case-insensitive match on title or author
    pub search: String,
    pub status: Option<ReadingStatus>,
    pub tags: Vec<String>,
    pub tag_mode: TagMode,
    pub sort: BookSort,
}

impl BookQuery {
    /// Filter and sort `books`; unrated books sort as rating 0
    pub fn apply(&self, books: Vec<Book>, reviews: &[Review]) -> Vec<Book> {
        let needle = self.search.trim().to_lowercase();
        let tags: Vec<String> = self
            .tags
            .iter()
            .map(|t| normalize_tag(t))
            .filter(|t| !t.is_empty())
            .collect();

        let mut matches: Vec<Book> = books
            .into_iter()
            .filter(|book| {
                needle.is_empty()
                    || book.title.to_lowercase().contains(&needle)
                    || book.author.to_lowercase().contains(&needle)
            })
            .filter(|book| self.status.map_or(true, |status| book.status == status))
            .filter(|book| {
                tags.is_empty()
                    || match self.tag_mode {
                        TagMode::All => tags.iter().all(|t| book.has_tag(t)),
                        TagMode::Any => tags.iter().any(|t| book.has_tag(t)),
                    }
            })
            .collect();

        let ratings: HashMap<Uuid, u8> = reviews.iter().map(|r| (r.book_id, r.rating)).collect();
        let rating = |book: &Book| ratings.get(&book.id).copied().unwrap_or(0);

        match self.sort {
            BookSort::DateDesc => matches.sort_by(|a, b| b.last_touched().cmp(&a.last_touched())),
            BookSort::DateAsc => matches.sort_by(|a, b| a.last_touched().cmp(&b.last_touched())),
            BookSort::RatingDesc => matches.sort_by(|a, b| rating(b).cmp(&rating(a))),
            BookSort::RatingAsc => matches.sort_by(|a, b| rating(a).cmp(&rating(b))),
        }
        matches
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationKind {
    #[default]
    All,
    HasImage,
    HasQuote,
}

impl FromStr for AnnotationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(AnnotationKind::All),
            "has-image" => Ok(AnnotationKind::HasImage),
            "has-quote" => Ok(AnnotationKind::HasQuote),
            _ => Err(format!(
                "Unknown annotation kind: {} (expected all, has-image or has-quote)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationSort {
    #[default]
    DateDesc,
    DateAsc,
    PageAsc,
}

impl FromStr for AnnotationSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date-desc" => Ok(AnnotationSort::DateDesc),
            "date-asc" => Ok(AnnotationSort::DateAsc),
            "page-asc" => Ok(AnnotationSort::PageAsc),
            _ => Err(format!(
                "Unknown sort: {} (expected date-desc, date-asc or page-asc)",
                s
            )),
        }
    }
}

/// Annotation screen filter
#[derive(Debug, Clone, Default)]
pub struct AnnotationQuery {
    pub book: Option<Uuid>,
    /// Case-insensitive match on text or quote
    pub search: String,
    pub kind: AnnotationKind,
    pub sort: AnnotationSort,
}

impl AnnotationQuery {
    pub fn apply(&self, annotations: Vec<Annotation>) -> Vec<Annotation> {
        let needle = self.search.trim().to_lowercase();

        let mut matches: Vec<Annotation> = annotations
            .into_iter()
            .filter(|note| self.book.map_or(true, |id| note.book_id == id))
            .filter(|note| {
                needle.is_empty()
                    || note.text.to_lowercase().contains(&needle)
                    || note
                        .quote
                        .as_ref()
                        .is_some_and(|q| q.to_lowercase().contains(&needle))
            })
            .filter(|note| match self.kind {
                AnnotationKind::All => true,
                AnnotationKind::HasImage => note.image.is_some(),
                AnnotationKind::HasQuote => note.quote.as_ref().is_some_and(|q| !q.is_empty()),
            })
            .collect();

        match self.sort {
            AnnotationSort::DateDesc => matches.sort_by(|a, b| b.date.cmp(&a.date)),
            AnnotationSort::DateAsc => matches.sort_by(|a, b| a.date.cmp(&b.date)),
            AnnotationSort::PageAsc => {
                matches.sort_by(|a, b| a.page.unwrap_or(0).cmp(&b.page.unwrap_or(0)))
            }
        }
        matches
    }
}

/// One page of the collection grid
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero-based page number
    pub number: usize,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn page_count(&self) -> usize {
        self.total_items.div_ceil(PAGE_SIZE)
    }

    pub fn has_next(&self) -> bool {
        (self.number + 1) * PAGE_SIZE < self.total_items
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }
}

/// Newest-first page of books
pub fn paginate(mut books: Vec<Book>, number: usize) -> Page<Book> {
    books.sort_by(|a, b| match b.date_added.cmp(&a.date_added) {
        Ordering::Equal => a.title.cmp(&b.title),
        other => other,
    });

    let total_items = books.len();
    let items = books
        .into_iter()
        .skip(number.saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .collect();

    Page {
        items,
        number,
        total_items,
    }
}
