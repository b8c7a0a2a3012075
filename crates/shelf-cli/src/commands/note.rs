//! Annotation command handlers
//!
//! Annotations are quotes or notes attached to a book, optionally with a
//! page number and an image.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use uuid::Uuid;

use shelf_core::library::{AnnotationInput, AnnotationKind, AnnotationQuery, AnnotationSort};
use shelf_core::Library;

use super::parse_book_id;
use crate::prompt::{compose, confirm};
use crate::output::Output;

/// Build annotation input, opening the editor when no text is given
fn input(
    heading: &str,
    current: &str,
    text: Option<String>,
    quote: Option<String>,
    page: Option<u32>,
    image: Option<PathBuf>,
) -> Result<AnnotationInput> {
    let text = match text {
        Some(t) => t,
        None => compose(heading, current).context("Failed to edit annotation")?,
    };

    let image = image
        .map(|path| std::fs::read(&path).with_context(|| format!("Failed to read image: {:?}", path)))
        .transpose()?;

    Ok(AnnotationInput {
        text,
        quote,
        page,
        image,
    })
}

/// Annotate a book
pub fn add(
    library: &mut Library,
    book_id: String,
    text: Option<String>,
    quote: Option<String>,
    page: Option<u32>,
    image: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let uuid = parse_book_id(&book_id, library)?;
    let book = library.book(uuid)?;

    let heading = format!("Annotating: {}", book.title);
    let note = library
        .add_annotation(uuid, input(&heading, "", text, quote, page, image)?)
        .context("Failed to add annotation")?;

    output.success(&format!(
        "Added annotation #{} to {}",
        note.id.unwrap_or_default(),
        &uuid.to_string()[..8]
    ));
    Ok(())
}

/// List annotations
pub fn list(
    library: &mut Library,
    book_id: Option<String>,
    search: Option<String>,
    kind: AnnotationKind,
    sort: AnnotationSort,
    output: &Output,
) -> Result<()> {
    let book = book_id
        .map(|id| parse_book_id(&id, library))
        .transpose()?;

    let query = AnnotationQuery {
        book,
        search: search.unwrap_or_default(),
        kind,
        sort,
    };
    let notes = library.query_annotations(&query)?;

    let titles: HashMap<Uuid, String> = library
        .books()?
        .into_iter()
        .map(|b| (b.id, b.title))
        .collect();
    let rows: Vec<_> = notes
        .into_iter()
        .map(|note| {
            let title = titles.get(&note.book_id).cloned().unwrap_or_default();
            (note, title)
        })
        .collect();

    output.print_annotations(&rows);
    Ok(())
}

/// Replace an annotation's content
pub fn edit(
    library: &mut Library,
    id: i64,
    text: Option<String>,
    quote: Option<String>,
    page: Option<u32>,
    image: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let current = library
        .annotations()?
        .into_iter()
        .find(|a| a.id == Some(id))
        .map(|a| a.text)
        .unwrap_or_default();
    let heading = format!("Editing annotation #{}", id);
    library
        .edit_annotation(id, input(&heading, &current, text, quote, page, image)?)
        .context("Failed to update annotation")?;

    output.success(&format!("Updated annotation #{}", id));
    Ok(())
}

/// Delete an annotation
pub fn delete(library: &mut Library, id: i64, output: &Output) -> Result<()> {
    if output.should_prompt() && !confirm(&format!("Delete annotation #{}?", id))? {
        println!("Cancelled.");
        return Ok(());
    }

    library
        .delete_annotation(id)
        .context("Failed to delete annotation")?;

    output.success(&format!("Deleted annotation #{}", id));
    Ok(())
}
