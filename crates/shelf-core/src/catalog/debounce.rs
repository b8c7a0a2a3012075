//! Search-as-you-type plumbing
//!
//! Keystrokes go through a [`debounce`] channel so the catalog only sees a
//! query once typing pauses for a full quiescence window.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{BookSuggestion, Catalog, MIN_QUERY_LEN};

/// Spawn a debouncer
///
/// Every value sent on the returned sender restarts the window; the most
/// recent value is emitted on the receiver once no new value arrived for
/// `window`. Closing the sender flushes any pending value.
pub fn debounce<T: Send + 'static>(
    window: Duration,
) -> (mpsc::UnboundedSender<T>, mpsc::UnboundedReceiver<T>) {
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<T>();
    let (output_tx, output_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(mut latest) = input_rx.recv().await {
            let closed = loop {
                match tokio::time::timeout(window, input_rx.recv()).await {
                    Ok(Some(value)) => latest = value,
                    Ok(None) => break true,
                    Err(_) => break false,
                }
            };
            if output_tx.send(latest).is_err() || closed {
                return;
            }
        }
    });

    (input_tx, output_rx)
}

/// What the suggestion list should show
#[derive(Debug, Clone, PartialEq)]
pub enum Suggestions {
    /// Query below the minimum length: hide the list
    Hidden,
    Results {
        query: String,
        items: Vec<BookSuggestion>,
    },
    Failed {
        query: String,
        message: String,
    },
}

/// Debounced catalog search for a text input
pub struct SearchSuggester {
    input: mpsc::UnboundedSender<String>,
    latest: watch::Sender<String>,
    results: mpsc::UnboundedReceiver<Suggestions>,
    worker: JoinHandle<()>,
}

impl SearchSuggester {
    pub fn spawn<C>(catalog: C, window: Duration) -> Self
    where
        C: Catalog + Send + Sync + 'static,
    {
        let catalog = Arc::new(catalog);
        let (input, mut settled) = debounce::<String>(window);
        let (latest, latest_rx) = watch::channel(String::new());
        let (results_tx, results) = mpsc::unbounded_channel();

        let worker = tokio::spawn(async move {
            while let Some(query) = settled.recv().await {
                if query.trim().chars().count() < MIN_QUERY_LEN {
                    if results_tx.send(Suggestions::Hidden).is_err() {
                        return;
                    }
                    continue;
                }

                debug!("Searching catalog for {:?}", query);
                let outcome = catalog.search(&query).await;

                // The input moved on while the request was in flight
                if *latest_rx.borrow() != query {
                    debug!("Dropping stale results for {:?}", query);
                    continue;
                }

                let update = match outcome {
                    Ok(items) => Suggestions::Results { query, items },
                    Err(e) => {
                        warn!("Catalog search failed: {}", e);
                        Suggestions::Failed {
                            query,
                            message: e.to_string(),
                        }
                    }
                };
                if results_tx.send(update).is_err() {
                    return;
                }
            }
        });

        Self {
            input,
            latest,
            results,
            worker,
        }
    }

    /// Report the current content of the text input
    pub fn input(&self, text: &str) {
        self.latest.send_replace(text.to_string());
        let _ = self.input.send(text.to_string());
    }

    /// Wait for the next update of the suggestion list
    pub async fn next(&mut self) -> Option<Suggestions> {
        self.results.recv().await
    }
}

impl Drop for SearchSuggester {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
