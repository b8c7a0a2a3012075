//! Book command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::debug;

use shelf_core::cover::CoverFetcher;
use shelf_core::library::{AnnotationQuery, BookEdit, BookQuery, BookSort, TagMode};
use shelf_core::{
    BookDraft, CatalogClient, Config, DraftCover, Library, ReadingStatus, ScanOutcome,
    ScanPipeline,
};

use super::parse_book_id;
use crate::prompt::{ask, confirm};
use crate::output::Output;

/// Book fields settable from the command line
#[derive(Args, Debug, Default, Clone)]
pub struct BookFields {
    /// Author
    #[arg(short, long)]
    pub author: Option<String>,
    /// Publication year
    #[arg(short, long)]
    pub year: Option<i32>,
    /// ISBN-10 or ISBN-13
    #[arg(long)]
    pub isbn: Option<String>,
    /// Page count
    #[arg(long)]
    pub pages: Option<u32>,
    /// Publisher
    #[arg(long)]
    pub publisher: Option<String>,
    /// Summary text
    #[arg(long)]
    pub summary: Option<String>,
    /// Cover image file
    #[arg(long)]
    pub cover: Option<PathBuf>,
}

impl BookFields {
    fn is_empty(&self) -> bool {
        self.author.is_none()
            && self.year.is_none()
            && self.isbn.is_none()
            && self.pages.is_none()
            && self.publisher.is_none()
            && self.summary.is_none()
            && self.cover.is_none()
    }

    fn read_cover(&self) -> Result<Option<Vec<u8>>> {
        self.cover
            .as_ref()
            .map(|path| {
                std::fs::read(path).with_context(|| format!("Failed to read cover image: {:?}", path))
            })
            .transpose()
    }

    /// Overlay the given fields on a draft
    fn apply_to_draft(&self, draft: &mut BookDraft) -> Result<()> {
        if let Some(ref author) = self.author {
            draft.author = author.clone();
        }
        if self.year.is_some() {
            draft.year = self.year;
        }
        if self.isbn.is_some() {
            draft.isbn = self.isbn.clone();
        }
        if self.pages.is_some() {
            draft.pages = self.pages;
        }
        if self.publisher.is_some() {
            draft.publisher = self.publisher.clone();
        }
        if self.summary.is_some() {
            draft.summary = self.summary.clone();
        }
        if let Some(bytes) = self.read_cover()? {
            draft.cover = DraftCover::Bytes(bytes);
        }
        Ok(())
    }
}

/// Add a book, optionally prefilled from a catalog lookup
#[allow(clippy::too_many_arguments)]
pub async fn add(
    library: &mut Library,
    config: &Config,
    title: Option<String>,
    fields: BookFields,
    lookup: Option<String>,
    tags: Vec<String>,
    no_cover: bool,
    output: &Output,
) -> Result<()> {
    let mut draft = BookDraft::default();

    if let Some(code) = lookup {
        let pipeline = ScanPipeline::new(CatalogClient::from_config(config)?);
        match pipeline.process(&code).await.context("Catalog lookup failed")? {
            ScanOutcome::Found { suggestion, .. } => draft.fill_from(&suggestion),
            ScanOutcome::NotFound { notice, .. } => {
                output.notice(&notice);
                if title.is_none() {
                    bail!("Nothing to add: lookup found no book and no title was given");
                }
            }
        }
    }

    if let Some(title) = title {
        draft.title = title;
    }
    fields.apply_to_draft(&mut draft)?;

    if no_cover {
        draft.cover = DraftCover::None;
    } else if let DraftCover::Url(_) = draft.cover {
        let fetcher = CoverFetcher::new().context("Failed to create HTTP client")?;
        draft.resolve_cover(&fetcher).await;
        if draft.cover == DraftCover::None {
            debug!("No cover found for {:?}", draft.isbn);
        }
    }

    let book = library.add_book(&draft).context("Failed to add book")?;
    for tag in &tags {
        library.add_tag(book.id, tag).context("Failed to tag book")?;
    }
    let book = library.book(book.id)?;

    output.success(&format!("Added book: {}", book.id));
    output.print_book(&book, None, 0);

    Ok(())
}

/// List books, or one page of the collection grid
#[allow(clippy::too_many_arguments)]
pub fn list(
    library: &mut Library,
    search: Option<String>,
    status: Option<ReadingStatus>,
    tags: Vec<String>,
    any: bool,
    sort: BookSort,
    page: Option<usize>,
    output: &Output,
) -> Result<()> {
    if let Some(number) = page {
        if number == 0 {
            bail!("Pages are numbered from 1");
        }
        output.print_page(&library.page(number - 1)?);
        return Ok(());
    }

    let query = BookQuery {
        search: search.unwrap_or_default(),
        status,
        tags,
        tag_mode: if any { TagMode::Any } else { TagMode::All },
        sort,
    };
    let books = library.query_books(&query)?;
    output.print_books(&books);
    Ok(())
}

/// Show a single book with its review
pub fn show(library: &mut Library, id: String, output: &Output) -> Result<()> {
    let uuid = parse_book_id(&id, library)?;
    let book = library.book(uuid)?;
    let review = library.review_for(uuid)?;
    let annotations = library.query_annotations(&AnnotationQuery {
        book: Some(uuid),
        ..AnnotationQuery::default()
    })?;

    output.print_book(&book, review.as_ref(), annotations.len());
    Ok(())
}

/// Edit a book; prompts for each field when none is given
pub fn edit(
    library: &mut Library,
    id: String,
    title: Option<String>,
    fields: BookFields,
    output: &Output,
) -> Result<()> {
    let uuid = parse_book_id(&id, library)?;
    let book = library.book(uuid)?;
    let mut edit = BookEdit::from(&book);

    if title.is_none() && fields.is_empty() {
        if !output.should_prompt() {
            bail!("Nothing to change. Pass at least one field flag.");
        }

        println!("Editing book: {}", book.id);
        println!("Press Enter to keep current value, or type new value.\n");

        if let Some(value) = ask("Title", &edit.title)? {
            edit.title = value;
        }
        if let Some(value) = ask("Author", &edit.author)? {
            edit.author = value;
        }
        let year = edit.year.map(|y| y.to_string()).unwrap_or_default();
        if let Some(value) = ask("Year", &year)? {
            edit.year = Some(value.parse().context("Year must be a number")?);
        }
        let publisher = edit.publisher.clone().unwrap_or_default();
        if let Some(value) = ask("Publisher", &publisher)? {
            edit.publisher = Some(value);
        }
    } else {
        if let Some(title) = title {
            edit.title = title;
        }
        if let Some(author) = fields.author.clone() {
            edit.author = author;
        }
        if fields.year.is_some() {
            edit.year = fields.year;
        }
        if fields.isbn.is_some() {
            edit.isbn = fields.isbn.clone();
        }
        if fields.pages.is_some() {
            edit.pages = fields.pages;
        }
        if fields.publisher.is_some() {
            edit.publisher = fields.publisher.clone();
        }
        if fields.summary.is_some() {
            edit.summary = fields.summary.clone();
        }
        edit.cover = fields.read_cover()?;
    }

    let book = library
        .edit_book(uuid, edit)
        .context("Failed to update book")?;

    output.success("Book updated");
    output.print_book(&book, None, 0);

    Ok(())
}

/// Delete a book with its review and annotations
pub fn delete(library: &mut Library, id: String, output: &Output) -> Result<()> {
    let uuid = parse_book_id(&id, library)?;
    let book = library.book(uuid)?;

    if output.should_prompt() {
        println!("Delete book: {} - {}", &book.id.to_string()[..8], book.title);
        println!("Its review and annotations are deleted too.");
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    library.delete_book(uuid).context("Failed to delete book")?;

    output.success(&format!("Deleted book: {}", uuid));

    Ok(())
}

/// Change the reading status
pub fn status(
    library: &mut Library,
    id: String,
    status: ReadingStatus,
    output: &Output,
) -> Result<()> {
    let uuid = parse_book_id(&id, library)?;
    let book = library.set_status(uuid, status)?;

    output.success(&format!("{} is now {}", book.title, book.status));
    Ok(())
}

/// Set or clear the bookmark
pub fn bookmark(
    library: &mut Library,
    id: String,
    page: Option<String>,
    output: &Output,
) -> Result<()> {
    let uuid = parse_book_id(&id, library)?;
    let book = library.set_bookmark(uuid, page.as_deref().unwrap_or(""))?;

    match book.bookmark {
        Some(page) => output.success(&format!("Bookmarked {} at page {}", book.title, page)),
        None => output.success(&format!("Cleared bookmark of {}", book.title)),
    }
    Ok(())
}
