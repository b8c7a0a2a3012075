//! Review command handler

use anyhow::{Context, Result};

use shelf_core::Library;

use super::parse_book_id;
use crate::output::Output;

/// Rate a book, replacing any earlier review
pub fn set(
    library: &mut Library,
    id: String,
    rating: u8,
    comment: Option<String>,
    output: &Output,
) -> Result<()> {
    let uuid = parse_book_id(&id, library)?;
    let review = library
        .upsert_review(uuid, rating, comment)
        .context("Failed to save review")?;

    output.success("Review saved");
    output.print_review(&review);
    Ok(())
}
