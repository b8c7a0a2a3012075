//! End-to-end library behavior against on-disk stores

use shelf_core::library::{BookQuery, TagMode};
use shelf_core::{Book, BookDraft, Library, ReadingStatus, Store};
use tempfile::TempDir;

#[test]
fn test_new_book_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let mut library = Library::new(Store::open_path(&temp_dir.path().join("shelf.db")).unwrap());

    let book = library.add_book(&BookDraft::new("Dune")).unwrap();

    assert_eq!(book.status, ReadingStatus::ToRead);
    assert_eq!(book.read_count, 0);
    assert!(book.tags.is_empty());
    assert!(book.bookmark.is_none());
    assert!(book.date_updated.is_none());
    assert_eq!(library.book(book.id).unwrap(), book);
}

#[test]
fn test_tag_case_variants_collapse() {
    let mut library = Library::open_in_memory().unwrap();
    let book = library.add_book(&BookDraft::new("Dune")).unwrap();

    assert!(library.add_tag(book.id, "fiction").unwrap());
    assert!(!library.add_tag(book.id, "Fiction").unwrap());

    let book = library.book(book.id).unwrap();
    assert_eq!(book.tags, vec!["Fiction"]);

    let registry: Vec<String> = library
        .tags()
        .unwrap()
        .iter()
        .map(|t| t.name().to_string())
        .collect();
    assert_eq!(registry, vec!["Fiction"]);
}

#[test]
fn test_records_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shelf.db");

    let id = {
        let mut library = Library::new(Store::open_path(&path).unwrap());
        let mut draft = BookDraft::new("The Left Hand of Darkness");
        draft.author = "Ursula K. Le Guin".into();
        draft.isbn = Some("0441478123".into());
        let book = library.add_book(&draft).unwrap();
        library.add_tag(book.id, "science fiction").unwrap();
        library.set_status(book.id, ReadingStatus::Finished).unwrap();
        library.upsert_review(book.id, 10, None).unwrap();
        book.id
    };

    let mut store = Store::open_path(&path).unwrap();
    let book: Book = store.get(&id.to_string()).unwrap().unwrap();
    assert_eq!(book.author, "Ursula K. Le Guin");
    assert_eq!(book.tags, vec!["Science fiction"]);
    assert_eq!(book.status, ReadingStatus::Finished);
    assert_eq!(book.read_count, 1);

    let mut library = Library::new(store);
    assert_eq!(library.review_for(id).unwrap().unwrap().rating, 10);
}

#[test]
fn test_filtering_by_tags_across_books() {
    let mut library = Library::open_in_memory().unwrap();
    let dune = library.add_book(&BookDraft::new("Dune")).unwrap();
    let emma = library.add_book(&BookDraft::new("Emma")).unwrap();
    library.add_tag(dune.id, "fiction").unwrap();
    library.add_tag(dune.id, "classic").unwrap();
    library.add_tag(emma.id, "classic").unwrap();

    let mut query = BookQuery {
        tags: vec!["fiction".into(), "classic".into()],
        ..BookQuery::default()
    };
    let titles = |books: Vec<Book>| books.into_iter().map(|b| b.title).collect::<Vec<_>>();

    assert_eq!(titles(library.query_books(&query).unwrap()), vec!["Dune"]);

    query.tag_mode = TagMode::Any;
    let mut any = titles(library.query_books(&query).unwrap());
    any.sort();
    assert_eq!(any, vec!["Dune", "Emma"]);
}

#[test]
fn test_delete_cascades_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let mut library = Library::new(Store::open_path(&temp_dir.path().join("shelf.db")).unwrap());
    let book = library.add_book(&BookDraft::new("Dune")).unwrap();
    library.upsert_review(book.id, 7, Some("Long".into())).unwrap();

    library.delete_book(book.id).unwrap();

    assert!(library.find_book(book.id).unwrap().is_none());
    assert!(library.reviews().unwrap().is_empty());
}
