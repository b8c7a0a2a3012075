//! Tag command handlers

use std::collections::HashMap;

use anyhow::Result;

use shelf_core::Library;

use super::parse_book_id;
use crate::output::Output;

/// Tag a book
pub fn add(library: &mut Library, id: String, tag: String, output: &Output) -> Result<()> {
    let uuid = parse_book_id(&id, library)?;
    if library.add_tag(uuid, &tag)? {
        output.success(&format!("Tagged {}", &uuid.to_string()[..8]));
    } else {
        output.message("Book already carries that tag.");
    }
    Ok(())
}

/// Untag a book
pub fn remove(library: &mut Library, id: String, tag: String, output: &Output) -> Result<()> {
    let uuid = parse_book_id(&id, library)?;
    if library.remove_tag(uuid, &tag)? {
        output.success(&format!("Untagged {}", &uuid.to_string()[..8]));
    } else {
        output.message("Book does not carry that tag.");
    }
    Ok(())
}

/// List registered tags with usage counts
pub fn list(library: &mut Library, output: &Output) -> Result<()> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for book in library.books()? {
        for tag in book.tags {
            *counts.entry(tag).or_default() += 1;
        }
    }

    let mut tags: Vec<(String, usize)> = library
        .tags()?
        .into_iter()
        .map(|tag| {
            let count = counts.get(tag.name()).copied().unwrap_or(0);
            (tag.name().to_string(), count)
        })
        .collect();
    tags.sort();

    output.print_tags(&tags);
    Ok(())
}
