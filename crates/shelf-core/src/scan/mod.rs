//! Scan-to-record flow
//!
//! A [`ScanSession`] ties the capture device queue to the lookup pipeline:
//! a match fills the add-flow's draft and suspends capture, a miss leaves
//! capture running for another attempt.

pub mod pipeline;
pub mod scanner;

use thiserror::Error;
use tracing::warn;

use crate::catalog::{Catalog, CatalogError};
use crate::draft::BookDraft;

pub use pipeline::{ScanOutcome, ScanPipeline, ScanState, NOT_FOUND_MESSAGE};
pub use scanner::{CaptureDevice, ScannerController, ScannerError, ScannerResult};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Scanner(#[from] ScannerError),
}

pub struct ScanSession<C> {
    pipeline: ScanPipeline<C>,
    scanner: ScannerController,
}

impl<C: Catalog> ScanSession<C> {
    pub fn new(catalog: C, scanner: ScannerController) -> Self {
        Self {
            pipeline: ScanPipeline::new(catalog),
            scanner,
        }
    }

    pub fn pipeline(&self) -> &ScanPipeline<C> {
        &self.pipeline
    }

    pub fn scanner(&self) -> &ScannerController {
        &self.scanner
    }

    /// Begin capturing
    pub async fn begin(&self) -> Result<(), ScanError> {
        Ok(self.scanner.start().await?)
    }

    /// Handle one decoded barcode
    ///
    /// On a match the draft is filled and capture is stopped. A failure to
    /// stop the device is logged; the match still stands.
    pub async fn handle_code(
        &self,
        raw_code: &str,
        draft: &mut BookDraft,
    ) -> Result<ScanOutcome, ScanError> {
        let outcome = self.pipeline.process(raw_code).await?;

        if let ScanOutcome::Found { suggestion, .. } = &outcome {
            draft.fill_from(suggestion);
            if let Err(e) = self.scanner.stop().await {
                warn!("Could not suspend capture after a match: {}", e);
            }
        }
        Ok(outcome)
    }

    /// Release the capture device
    pub async fn end(&self) -> Result<(), ScanError> {
        Ok(self.scanner.stop().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::pipeline::tests::TableCatalog;
    use super::scanner::tests::FakeDevice;
    use super::*;

    #[tokio::test]
    async fn test_match_fills_draft_and_suspends_capture() {
        let session = ScanSession::new(
            TableCatalog::with("9780140328721", "Matilda"),
            ScannerController::spawn(FakeDevice::default()),
        );
        let mut draft = BookDraft::default();

        session.begin().await.unwrap();
        let outcome = session.handle_code("9780140328721", &mut draft).await.unwrap();

        assert!(matches!(outcome, ScanOutcome::Found { .. }));
        assert_eq!(draft.title, "Matilda");
        assert!(!session.scanner().is_active());
    }

    #[tokio::test]
    async fn test_miss_keeps_capture_running() {
        let session = ScanSession::new(
            TableCatalog::default(),
            ScannerController::spawn(FakeDevice::default()),
        );
        let mut draft = BookDraft::new("unchanged");

        session.begin().await.unwrap();
        let outcome = session.handle_code("9780140328721", &mut draft).await.unwrap();

        assert!(matches!(outcome, ScanOutcome::NotFound { .. }));
        assert_eq!(draft, BookDraft::new("unchanged"));
        assert!(session.scanner().is_active());

        session.end().await.unwrap();
        assert!(!session.scanner().is_active());
    }
}
