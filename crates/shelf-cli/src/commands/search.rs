//! Catalog search handlers

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use shelf_core::catalog::{SearchSuggester, Suggestions, MIN_QUERY_LEN};
use shelf_core::{CatalogClient, Config};

use crate::output::Output;

/// How long to wait for a last suggestion after input ends
const DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

/// One-shot catalog search
pub async fn search(config: &Config, query: String, output: &Output) -> Result<()> {
    let client = CatalogClient::from_config(config)?;
    let results = client
        .search(&query)
        .await
        .context("Catalog search failed")?;

    output.print_suggestions(&results);
    Ok(())
}

/// Search as you type: each line on stdin is the current content of the input
pub async fn live(config: &Config, output: &Output) -> Result<()> {
    let client = CatalogClient::from_config(config)?;
    let mut suggester = SearchSuggester::spawn(client, config.search_debounce());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    if output.should_prompt() {
        eprintln!("Type a title or author, one revision per line. Ctrl-D to finish.");
    }

    loop {
        tokio::select! {
            line = lines.next_line(), if input_open => match line.context("Failed to read input")? {
                Some(text) => suggester.input(text.trim()),
                None => input_open = false,
            },
            update = suggester.next() => match update {
                Some(Suggestions::Hidden) => {
                    output.message(&format!("(type at least {} characters)", MIN_QUERY_LEN));
                }
                Some(Suggestions::Results { query, items }) => {
                    output.message(&format!("── {} ──", query));
                    output.print_suggestions(&items);
                    if !input_open {
                        break;
                    }
                }
                Some(Suggestions::Failed { query, message }) => {
                    eprintln!("Search for {:?} failed: {}", query, message);
                    if !input_open {
                        break;
                    }
                }
                None => break,
            },
            _ = tokio::time::sleep(DRAIN_TIMEOUT), if !input_open => break,
        }
    }

    Ok(())
}
