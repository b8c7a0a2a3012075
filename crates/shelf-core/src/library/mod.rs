//! Library operations
//!
//! The book lifecycle on top of the [`Store`]: validation happens before any
//! transaction is opened, so a rejected input never writes anything.

pub mod query;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::draft::BookDraft;
use crate::models::{Annotation, Book, ReadingStatus, Review, Tag};
use crate::storage::{Collection, StorageError, TxMode};
use crate::store::Store;

pub use query::{
    paginate, AnnotationKind, AnnotationQuery, AnnotationSort, BookQuery, BookSort, Page, TagMode,
    PAGE_SIZE,
};

/// Rejected user input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Title is required")]
    EmptyTitle,

    #[error("Bookmark must be a positive page number, got {0:?}")]
    InvalidBookmark(String),

    #[error("Rating must be between 1 and 10, got {0}")]
    RatingOutOfRange(u8),

    #[error("Annotation text is required")]
    EmptyAnnotation,

    #[error("Page must be a positive number, got {0:?}")]
    InvalidPage(String),

    #[error("Tag name is empty")]
    EmptyTag,
}

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Book not found: {0}")]
    BookNotFound(Uuid),

    #[error("Annotation not found: {0}")]
    AnnotationNotFound(i64),
}

pub type LibraryResult<T> = std::result::Result<T, LibraryError>;

/// Full edit of a book's details
#[derive(Debug, Clone, Default)]
pub struct BookEdit {
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub isbn: Option<String>,
    pub pages: Option<u32>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    pub status: ReadingStatus,
    /// Replaces the cover when present; the old cover is kept otherwise
    pub cover: Option<Vec<u8>>,
}

impl From<&Book> for BookEdit {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year,
            isbn: book.isbn.clone(),
            pages: book.pages,
            summary: book.summary.clone(),
            publisher: book.publisher.clone(),
            status: book.status,
            cover: None,
        }
    }
}

/// Content of a new or edited annotation
#[derive(Debug, Clone, Default)]
pub struct AnnotationInput {
    pub text: String,
    pub quote: Option<String>,
    pub page: Option<u32>,
    pub image: Option<Vec<u8>>,
}

/// Parse a page number typed by the user; empty input means "none"
pub fn parse_page(input: &str) -> Result<Option<u32>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidPage(input.to_string()));
    }
    match trimmed.parse::<u32>() {
        Ok(page) if page > 0 => Ok(Some(page)),
        _ => Err(ValidationError::InvalidPage(input.to_string())),
    }
}

fn required_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(title.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct Library {
    store: Store,
}

impl Library {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn open(config: &Config) -> LibraryResult<Self> {
        Ok(Self::new(Store::open(config)?))
    }

    pub fn open_in_memory() -> LibraryResult<Self> {
        Ok(Self::new(Store::open_in_memory()?))
    }

    pub fn store(&mut self) -> &mut Store {
        &mut self.store
    }

    // ==================== Books ====================

    /// Create a book from the add-flow's draft
    ///
    /// A cover still given as a URL is not stored; resolve it first.
    pub fn add_book(&mut self, draft: &BookDraft) -> LibraryResult<Book> {
        let title = required_title(&draft.title)?;

        let mut book = Book::new(title);
        book.author = draft.author.trim().to_string();
        book.year = draft.year;
        book.isbn = non_blank(draft.isbn.clone());
        book.pages = draft.pages;
        book.summary = non_blank(draft.summary.clone());
        book.publisher = non_blank(draft.publisher.clone());
        book.cover = draft.cover_bytes().map(<[u8]>::to_vec);

        self.store.add(&mut book)?;
        info!("Added book {} ({})", book.title, book.id);
        Ok(book)
    }

    pub fn find_book(&mut self, id: Uuid) -> LibraryResult<Option<Book>> {
        Ok(self.store.get(&id.to_string())?)
    }

    pub fn book(&mut self, id: Uuid) -> LibraryResult<Book> {
        self.find_book(id)?.ok_or(LibraryError::BookNotFound(id))
    }

    pub fn books(&mut self) -> LibraryResult<Vec<Book>> {
        Ok(self.store.get_all()?)
    }

    /// Read-modify-write of one book in a single transaction
    fn update_book<F>(&mut self, id: Uuid, change: F) -> LibraryResult<Book>
    where
        F: FnOnce(&mut Book),
    {
        let mut tx = self
            .store
            .transaction(&[Collection::Books], TxMode::ReadWrite)?;
        let mut book: Book = tx
            .get(&id.to_string())?
            .ok_or(LibraryError::BookNotFound(id))?;
        change(&mut book);
        tx.put(&mut book)?;
        tx.commit()?;
        Ok(book)
    }

    /// Change the reading status; finishing a book counts one more read
    pub fn set_status(&mut self, id: Uuid, status: ReadingStatus) -> LibraryResult<Book> {
        self.update_book(id, |book| book.set_status(status))
    }

    /// Set the bookmark from user input; empty input clears it
    pub fn set_bookmark(&mut self, id: Uuid, input: &str) -> LibraryResult<Book> {
        let bookmark = parse_page(input)
            .map_err(|_| ValidationError::InvalidBookmark(input.to_string()))?;
        self.update_book(id, |book| book.bookmark = bookmark)
    }

    pub fn edit_book(&mut self, id: Uuid, edit: BookEdit) -> LibraryResult<Book> {
        let title = required_title(&edit.title)?;
        self.update_book(id, |book| {
            book.title = title;
            book.author = edit.author.trim().to_string();
            book.year = edit.year;
            book.isbn = non_blank(edit.isbn);
            book.pages = edit.pages;
            book.summary = non_blank(edit.summary);
            book.publisher = non_blank(edit.publisher);
            book.set_status(edit.status);
            if let Some(cover) = edit.cover {
                book.cover = Some(cover);
            }
            book.date_updated = Some(Utc::now());
        })
    }

    /// Delete a book along with its review and annotations
    pub fn delete_book(&mut self, id: Uuid) -> LibraryResult<()> {
        let mut tx = self.store.transaction(
            &[Collection::Books, Collection::Reviews, Collection::Annotations],
            TxMode::ReadWrite,
        )?;

        if !tx.delete::<Book>(&id.to_string())? {
            return Err(LibraryError::BookNotFound(id));
        }

        let reviews: Vec<Review> = tx.get_all()?;
        for key in reviews
            .iter()
            .filter(|r| r.book_id == id)
            .filter_map(|r| r.id)
        {
            tx.delete::<Review>(&key)?;
        }

        let annotations: Vec<Annotation> = tx.get_all()?;
        let mut removed = 0;
        for key in annotations
            .iter()
            .filter(|a| a.book_id == id)
            .filter_map(|a| a.id)
        {
            tx.delete::<Annotation>(&key)?;
            removed += 1;
        }

        tx.commit()?;
        info!("Deleted book {} and {} annotation(s)", id, removed);
        Ok(())
    }

    // ==================== Tags ====================

    /// Tag a book; returns false when it already carried the tag
    ///
    /// The tag registry is updated in a second transaction. If that one
    /// fails the book keeps the tag and the registry misses the name, which
    /// only hides it from the tag picker.
    pub fn add_tag(&mut self, id: Uuid, raw: &str) -> LibraryResult<bool> {
        let mut tag = Tag::new(raw);
        if tag.is_empty() {
            return Err(ValidationError::EmptyTag.into());
        }

        let mut added = false;
        self.update_book(id, |book| added = book.add_tag(&tag))?;
        if !added {
            debug!("Book {} already tagged {}", id, tag);
            return Ok(false);
        }

        self.store.put(&mut tag)?;
        Ok(true)
    }

    /// Untag a book; the registry entry is left in place
    pub fn remove_tag(&mut self, id: Uuid, raw: &str) -> LibraryResult<bool> {
        let tag = Tag::new(raw);
        let mut removed = false;
        self.update_book(id, |book| removed = book.remove_tag(tag.name()))?;
        Ok(removed)
    }

    /// Every registered tag, including ones no book uses any more
    pub fn tags(&mut self) -> LibraryResult<Vec<Tag>> {
        Ok(self.store.get_all()?)
    }

    // ==================== Reviews ====================

    /// Create or replace the review of a book
    pub fn upsert_review(
        &mut self,
        book_id: Uuid,
        rating: u8,
        comment: Option<String>,
    ) -> LibraryResult<Review> {
        if !(1..=10).contains(&rating) {
            return Err(ValidationError::RatingOutOfRange(rating).into());
        }

        let mut tx = self
            .store
            .transaction(&[Collection::Books, Collection::Reviews], TxMode::ReadWrite)?;
        if tx.get::<Book>(&book_id.to_string())?.is_none() {
            return Err(LibraryError::BookNotFound(book_id));
        }

        let existing = tx
            .get_all::<Review>()?
            .into_iter()
            .find(|r| r.book_id == book_id);

        let mut review = Review {
            id: existing.and_then(|r| r.id),
            book_id,
            rating,
            comment: non_blank(comment),
            date: Utc::now(),
        };
        tx.put(&mut review)?;
        tx.commit()?;
        Ok(review)
    }

    pub fn review_for(&mut self, book_id: Uuid) -> LibraryResult<Option<Review>> {
        Ok(self
            .reviews()?
            .into_iter()
            .find(|r| r.book_id == book_id))
    }

    pub fn reviews(&mut self) -> LibraryResult<Vec<Review>> {
        Ok(self.store.get_all()?)
    }

    // ==================== Annotations ====================

    fn validated(input: AnnotationInput) -> Result<AnnotationInput, ValidationError> {
        let text = input.text.trim().to_string();
        if text.is_empty() {
            return Err(ValidationError::EmptyAnnotation);
        }
        if input.page == Some(0) {
            return Err(ValidationError::InvalidPage("0".to_string()));
        }
        Ok(AnnotationInput {
            text,
            quote: non_blank(input.quote),
            ..input
        })
    }

    pub fn add_annotation(
        &mut self,
        book_id: Uuid,
        input: AnnotationInput,
    ) -> LibraryResult<Annotation> {
        let input = Self::validated(input)?;

        let mut tx = self.store.transaction(
            &[Collection::Books, Collection::Annotations],
            TxMode::ReadWrite,
        )?;
        if tx.get::<Book>(&book_id.to_string())?.is_none() {
            return Err(LibraryError::BookNotFound(book_id));
        }

        let mut annotation = Annotation {
            id: None,
            book_id,
            text: input.text,
            quote: input.quote,
            page: input.page,
            image: input.image,
            date: Utc::now(),
        };
        tx.add(&mut annotation)?;
        tx.commit()?;
        Ok(annotation)
    }

    /// Replace an annotation's content; the image is kept unless a new one is given
    pub fn edit_annotation(&mut self, id: i64, input: AnnotationInput) -> LibraryResult<Annotation> {
        let input = Self::validated(input)?;

        let mut tx = self
            .store
            .transaction(&[Collection::Annotations], TxMode::ReadWrite)?;
        let mut annotation: Annotation = tx.get(&id)?.ok_or(LibraryError::AnnotationNotFound(id))?;
        annotation.text = input.text;
        annotation.quote = input.quote;
        annotation.page = input.page;
        if input.image.is_some() {
            annotation.image = input.image;
        }
        tx.put(&mut annotation)?;
        tx.commit()?;
        Ok(annotation)
    }

    pub fn delete_annotation(&mut self, id: i64) -> LibraryResult<()> {
        if !self.store.delete::<Annotation>(&id)? {
            return Err(LibraryError::AnnotationNotFound(id));
        }
        Ok(())
    }

    pub fn annotations(&mut self) -> LibraryResult<Vec<Annotation>> {
        Ok(self.store.get_all()?)
    }

    // ==================== Queries ====================

    pub fn query_books(&mut self, query: &BookQuery) -> LibraryResult<Vec<Book>> {
        let tx = self
            .store
            .transaction(&[Collection::Books, Collection::Reviews], TxMode::ReadOnly)?;
        let books = tx.get_all::<Book>()?;
        let reviews = tx.get_all::<Review>()?;
        Ok(query.apply(books, &reviews))
    }

    pub fn query_annotations(&mut self, query: &AnnotationQuery) -> LibraryResult<Vec<Annotation>> {
        Ok(query.apply(self.annotations()?))
    }

    /// One page of the collection grid, newest first
    pub fn page(&mut self, number: usize) -> LibraryResult<Page<Book>> {
        Ok(paginate(self.books()?, number))
    }
}
