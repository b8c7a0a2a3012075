//! Command handlers

pub mod book;
pub mod config;
pub mod export;
pub mod note;
pub mod open;
pub mod review;
pub mod scan;
pub mod search;
pub mod tag;

use anyhow::{bail, Result};
use uuid::Uuid;

use shelf_core::Library;

/// Parse a book ID (supports full UUID or prefix)
pub fn parse_book_id(id: &str, library: &mut Library) -> Result<Uuid> {
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(uuid);
    }

    let books = library.books()?;
    let matches: Vec<_> = books
        .iter()
        .filter(|b| b.id.to_string().starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No book found matching: {}", id),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple books match '{}':", id);
            for book in &matches {
                eprintln!("  {} - {}", book.id, book.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::BookDraft;

    #[test]
    fn test_parse_book_id_by_prefix() {
        let mut library = Library::open_in_memory().unwrap();
        let book = library.add_book(&BookDraft::new("Dune")).unwrap();
        let prefix = &book.id.to_string()[..8];

        assert_eq!(parse_book_id(prefix, &mut library).unwrap(), book.id);
        assert_eq!(
            parse_book_id(&book.id.to_string(), &mut library).unwrap(),
            book.id
        );
        assert!(parse_book_id("zzzz", &mut library).is_err());
    }
}
