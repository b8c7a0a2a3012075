//! Barcode scan through to a stored book

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use shelf_core::catalog::CatalogResult;
use shelf_core::scan::{CaptureDevice, ScannerController};
use shelf_core::{
    BookDraft, BookSuggestion, Catalog, Library, ReadingStatus, ScanOutcome, ScanSession,
    ScanState,
};

#[derive(Clone, Default)]
struct FakeCatalog {
    by_identifier: HashMap<String, BookSuggestion>,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl Catalog for FakeCatalog {
    fn search(&self, _query: &str) -> impl Future<Output = CatalogResult<Vec<BookSuggestion>>> + Send {
        async { Ok(Vec::new()) }
    }

    fn lookup_by_identifier(
        &self,
        identifier: &str,
    ) -> impl Future<Output = CatalogResult<Vec<BookSuggestion>>> + Send {
        self.lookups.lock().unwrap().push(identifier.to_string());
        let found = self.by_identifier.get(identifier).cloned();
        async move { Ok(found.into_iter().collect()) }
    }
}

#[derive(Clone, Default)]
struct FakeCamera {
    running: Arc<Mutex<bool>>,
}

impl CaptureDevice for FakeCamera {
    fn start(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            let mut running = self.running.lock().unwrap();
            anyhow::ensure!(!*running, "camera already running");
            *running = true;
            Ok(())
        })
    }

    fn stop(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            let mut running = self.running.lock().unwrap();
            anyhow::ensure!(*running, "camera not running");
            *running = false;
            Ok(())
        })
    }
}

fn matilda() -> BookSuggestion {
    BookSuggestion {
        title: "Matilda".into(),
        author: "Roald Dahl".into(),
        year: Some(1988),
        pages: Some(240),
        summary: "A girl who loves books.".into(),
        publisher: Some("Puffin".into()),
        isbn: Some("0140328726".into()),
    }
}

#[tokio::test(start_paused = true)]
async fn test_unknown_barcode_shows_notice_and_creates_nothing() {
    let catalog = FakeCatalog::default();
    let lookups = catalog.lookups.clone();
    let camera = FakeCamera::default();
    let running = camera.running.clone();
    let session = ScanSession::new(catalog, ScannerController::spawn(camera));
    let mut library = Library::open_in_memory().unwrap();
    let mut draft = BookDraft::default();

    session.begin().await.unwrap();
    let outcome = session.handle_code("9780140328721", &mut draft).await.unwrap();

    assert_eq!(
        *lookups.lock().unwrap(),
        vec!["9780140328721".to_string(), "0140328726".to_string()]
    );
    let ScanOutcome::NotFound { notice, .. } = outcome else {
        panic!("expected a miss");
    };
    assert_eq!(session.pipeline().state(), ScanState::NotFound);

    // Capture stays on for another attempt
    assert!(*running.lock().unwrap());

    // The notice dismisses itself after three seconds
    tokio::time::sleep(Duration::from_millis(2999)).await;
    assert!(!notice.is_expired(tokio::time::Instant::now()));
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(notice.is_expired(tokio::time::Instant::now()));

    // Saving the untouched draft is rejected; nothing is written
    assert!(library.add_book(&draft).is_err());
    assert!(library.books().unwrap().is_empty());

    session.end().await.unwrap();
    assert!(!*running.lock().unwrap());
}

#[tokio::test]
async fn test_fallback_match_fills_draft_and_saves_book() {
    let mut catalog = FakeCatalog::default();
    catalog
        .by_identifier
        .insert("0140328726".to_string(), matilda());
    let camera = FakeCamera::default();
    let running = camera.running.clone();
    let session = ScanSession::new(catalog, ScannerController::spawn(camera));
    let mut library = Library::open_in_memory().unwrap();
    let mut draft = BookDraft::default();

    session.begin().await.unwrap();
    let outcome = session.handle_code("978-0-14-032872-1", &mut draft).await.unwrap();

    assert!(matches!(
        outcome,
        ScanOutcome::Found { ref identifier, .. } if identifier == "0140328726"
    ));
    assert!(!*running.lock().unwrap());

    let book = library.add_book(&draft).unwrap();
    assert_eq!(book.title, "Matilda");
    assert_eq!(book.author, "Roald Dahl");
    assert_eq!(book.isbn.as_deref(), Some("0140328726"));
    assert_eq!(book.status, ReadingStatus::ToRead);
    // The remote cover was not resolved before saving
    assert!(book.cover.is_none());
}

#[tokio::test]
async fn test_stop_without_session_is_noop() {
    let session = ScanSession::new(
        FakeCatalog::default(),
        ScannerController::spawn(FakeCamera::default()),
    );

    session.end().await.unwrap();
    session.end().await.unwrap();
    assert!(!session.scanner().is_active());
}
