//! Barcode-to-suggestion lookup
//!
//! ```text
//! Idle -> Normalizing -> QueryingPrimary -> Found
//!                              |
//!                              +-> QueryingFallback -> Found | NotFound
//! ```
//!
//! The fallback is only taken for 13-digit input: the code is converted to
//! ISBN-10 and looked up once more.

use tokio::sync::watch;
use tracing::{debug, info};

use crate::catalog::{BookSuggestion, Catalog, CatalogResult};
use crate::isbn::{isbn13_to_isbn10, normalize};
use crate::notice::Notice;

/// Message shown when neither identifier matched
pub const NOT_FOUND_MESSAGE: &str = "No book found for this barcode";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Normalizing,
    QueryingPrimary,
    QueryingFallback,
    Found,
    NotFound,
}

/// Result of processing one scanned code
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Found {
        /// Identifier that produced the match
        identifier: String,
        suggestion: BookSuggestion,
    },
    NotFound {
        identifier: String,
        notice: Notice,
    },
}

/// Runs scanned codes through the catalog
pub struct ScanPipeline<C> {
    catalog: C,
    state: watch::Sender<ScanState>,
}

impl<C: Catalog> ScanPipeline<C> {
    pub fn new(catalog: C) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self { catalog, state }
    }

    pub fn state(&self) -> ScanState {
        *self.state.borrow()
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Process one scanned code
    ///
    /// Catalog failures return the pipeline to `Idle` and are passed up; no
    /// retry is attempted.
    pub async fn process(&self, raw_code: &str) -> CatalogResult<ScanOutcome> {
        let result = self.run(raw_code).await;
        if result.is_err() {
            self.transition(ScanState::Idle);
        }
        result
    }

    async fn run(&self, raw_code: &str) -> CatalogResult<ScanOutcome> {
        self.transition(ScanState::Normalizing);
        let identifier = normalize(raw_code);

        self.transition(ScanState::QueryingPrimary);
        if let Some(outcome) = self.lookup(&identifier).await? {
            return Ok(outcome);
        }

        let fallback = if identifier.len() == 13 {
            isbn13_to_isbn10(&identifier)
        } else {
            None
        };
        if let Some(isbn10) = fallback {
            self.transition(ScanState::QueryingFallback);
            debug!("Retrying {} as ISBN-10 {}", identifier, isbn10);
            if let Some(outcome) = self.lookup(&isbn10).await? {
                return Ok(outcome);
            }
        }

        self.transition(ScanState::NotFound);
        info!("No catalog record for {}", identifier);
        Ok(ScanOutcome::NotFound {
            identifier,
            notice: Notice::new(NOT_FOUND_MESSAGE),
        })
    }

    async fn lookup(&self, identifier: &str) -> CatalogResult<Option<ScanOutcome>> {
        let mut records = self.catalog.lookup_by_identifier(identifier).await?;
        if records.is_empty() {
            return Ok(None);
        }

        self.transition(ScanState::Found);
        Ok(Some(ScanOutcome::Found {
            identifier: identifier.to_string(),
            suggestion: records.swap_remove(0),
        }))
    }

    fn transition(&self, next: ScanState) {
        debug!("Scan: {:?} -> {:?}", self.state(), next);
        self.state.send_replace(next);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::CatalogError;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    /// Catalog answering identifier lookups from a fixed table
    #[derive(Clone, Default)]
    pub(crate) struct TableCatalog {
        pub records: HashMap<String, BookSuggestion>,
        pub lookups: Arc<Mutex<Vec<String>>>,
        pub offline: bool,
    }

    impl TableCatalog {
        pub fn with(identifier: &str, title: &str) -> Self {
            let mut catalog = Self::default();
            catalog.records.insert(identifier.into(), suggestion(title));
            catalog
        }
    }

    pub(crate) fn suggestion(title: &str) -> BookSuggestion {
        BookSuggestion {
            title: title.into(),
            author: "Roald Dahl".into(),
            year: Some(1988),
            pages: None,
            summary: "No summary available".into(),
            publisher: None,
            isbn: None,
        }
    }

    impl Catalog for TableCatalog {
        fn search(
            &self,
            _query: &str,
        ) -> impl Future<Output = CatalogResult<Vec<BookSuggestion>>> + Send {
            async { Ok(Vec::new()) }
        }

        fn lookup_by_identifier(
            &self,
            identifier: &str,
        ) -> impl Future<Output = CatalogResult<Vec<BookSuggestion>>> + Send {
            self.lookups.lock().unwrap().push(identifier.to_string());
            let result = if self.offline {
                Err(CatalogError::Status(503))
            } else {
                Ok(self.records.get(identifier).cloned().into_iter().collect())
            };
            async move { result }
        }
    }

    #[tokio::test]
    async fn test_primary_hit() {
        let catalog = TableCatalog::with("9780140328721", "Matilda");
        let lookups = catalog.lookups.clone();
        let pipeline = ScanPipeline::new(catalog);

        let outcome = pipeline.process("978-0-14-032872-1").await.unwrap();
        match outcome {
            ScanOutcome::Found {
                identifier,
                suggestion,
            } => {
                assert_eq!(identifier, "9780140328721");
                assert_eq!(suggestion.title, "Matilda");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(pipeline.state(), ScanState::Found);
        assert_eq!(*lookups.lock().unwrap(), vec!["9780140328721"]);
    }

    #[tokio::test]
    async fn test_fallback_to_isbn10() {
        let catalog = TableCatalog::with("0140328726", "Matilda");
        let lookups = catalog.lookups.clone();
        let pipeline = ScanPipeline::new(catalog);
        let mut states = pipeline.subscribe();

        let outcome = pipeline.process("9780140328721").await.unwrap();
        assert!(matches!(
            outcome,
            ScanOutcome::Found { ref identifier, .. } if identifier == "0140328726"
        ));
        assert_eq!(
            *lookups.lock().unwrap(),
            vec!["9780140328721", "0140328726"]
        );
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), ScanState::Found);
    }

    #[tokio::test]
    async fn test_miss_on_both_emits_notice() {
        let catalog = TableCatalog::default();
        let lookups = catalog.lookups.clone();
        let pipeline = ScanPipeline::new(catalog);

        let outcome = pipeline.process("9780140328721").await.unwrap();
        match outcome {
            ScanOutcome::NotFound { identifier, notice } => {
                assert_eq!(identifier, "9780140328721");
                assert_eq!(notice.message, NOT_FOUND_MESSAGE);
                assert_eq!(notice.duration, std::time::Duration::from_secs(3));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(pipeline.state(), ScanState::NotFound);
        assert_eq!(lookups.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_fallback_for_short_codes() {
        let catalog = TableCatalog::default();
        let lookups = catalog.lookups.clone();
        let pipeline = ScanPipeline::new(catalog);

        let outcome = pipeline.process("0140328726").await.unwrap();
        assert!(matches!(outcome, ScanOutcome::NotFound { .. }));
        assert_eq!(*lookups.lock().unwrap(), vec!["0140328726"]);
    }

    #[tokio::test]
    async fn test_no_fallback_for_979_prefix() {
        let catalog = TableCatalog::default();
        let lookups = catalog.lookups.clone();
        let pipeline = ScanPipeline::new(catalog);

        pipeline.process("9791032305690").await.unwrap();
        assert_eq!(lookups.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_catalog_failure_returns_to_idle() {
        let catalog = TableCatalog {
            offline: true,
            ..Default::default()
        };
        let pipeline = ScanPipeline::new(catalog);

        let err = pipeline.process("9780140328721").await.unwrap_err();
        assert!(matches!(err, CatalogError::Status(503)));
        assert_eq!(pipeline.state(), ScanState::Idle);
    }
}
