//! Barcode scan handler
//!
//! A handheld scanner in keyboard mode types each barcode followed by
//! Enter, so stdin stands in for the capture device.

use anyhow::{Context, Result};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use shelf_core::cover::CoverFetcher;
use shelf_core::scan::{CaptureDevice, ScannerController};
use shelf_core::{BookDraft, CatalogClient, Config, Library, ScanOutcome, ScanSession};

use crate::output::Output;

/// Capture device backed by the terminal
struct TerminalScanner {
    announce: bool,
}

impl CaptureDevice for TerminalScanner {
    fn start(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        async move {
            if std::mem::take(&mut self.announce) {
                eprintln!("Scanner ready: one barcode per line, empty line to finish.");
            }
            Ok(())
        }
        .boxed()
    }

    fn stop(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        async { Ok(()) }.boxed()
    }
}

/// Read barcodes until an empty line, looking each one up
pub async fn run(library: &mut Library, config: &Config, save: bool, output: &Output) -> Result<()> {
    let device = TerminalScanner {
        announce: output.should_prompt(),
    };
    let session = ScanSession::new(
        CatalogClient::from_config(config)?,
        ScannerController::spawn(device),
    );
    let fetcher = if save {
        Some(CoverFetcher::new().context("Failed to create HTTP client")?)
    } else {
        None
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut draft = BookDraft::default();
    let mut saved = 0;

    session.begin().await?;
    while let Some(line) = lines.next_line().await.context("Failed to read barcode")? {
        let code = line.trim();
        if code.is_empty() {
            break;
        }
        // A match suspends capture; the next code resumes it
        if !session.scanner().is_active() {
            session.begin().await?;
        }

        match session.handle_code(code, &mut draft).await {
            Ok(ScanOutcome::Found { suggestion, .. }) => {
                output.print_suggestions(std::slice::from_ref(&suggestion));
                if let Some(ref fetcher) = fetcher {
                    draft.resolve_cover(fetcher).await;
                    let book = library.add_book(&draft).context("Failed to add book")?;
                    output.success(&format!("Added book: {}", book.id));
                    saved += 1;
                }
                draft = BookDraft::default();
            }
            Ok(ScanOutcome::NotFound { notice, .. }) => output.notice(&notice),
            Err(e) => {
                warn!("Lookup of {} failed: {}", code, e);
                eprintln!("Lookup failed: {}", e);
            }
        }
    }
    session.end().await?;

    if save {
        output.message(&format!("{} book(s) added", saved));
    }
    Ok(())
}
