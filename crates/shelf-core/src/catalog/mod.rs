//! Bibliographic catalog client
//!
//! Queries an SRU search service that answers with UNIMARC records, and
//! flattens each record into a [`BookSuggestion`].

pub mod debounce;
pub mod unimarc;

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

pub use debounce::{debounce, SearchSuggester, Suggestions};
pub use unimarc::parse_response;

/// Minimum query length before any request is issued
pub const MIN_QUERY_LEN: usize = 3;

/// Records requested per query
pub const MAX_RECORDS: u32 = 5;

/// Request timeout in seconds
const FETCH_TIMEOUT: u64 = 10;

/// Errors from the catalog service
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Query too short: at least 3 characters are required")]
    QueryTooShort,

    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),

    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned status {0}")]
    Status(u16),

    #[error("Malformed catalog response: {0}")]
    Malformed(String),
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// A flat book record extracted from one catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSuggestion {
    pub title: String,
    pub author: String,
    pub year: Option<i32>,
    pub pages: Option<u32>,
    pub summary: String,
    pub publisher: Option<String>,
    pub isbn: Option<String>,
}

/// Anything that can answer catalog queries
pub trait Catalog {
    /// Free-text search
    fn search(&self, query: &str)
        -> impl Future<Output = CatalogResult<Vec<BookSuggestion>>> + Send;

    /// Lookup filtered by canonical identifier
    fn lookup_by_identifier(
        &self,
        identifier: &str,
    ) -> impl Future<Output = CatalogResult<Vec<BookSuggestion>>> + Send;
}

/// HTTP client for an SRU endpoint
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> CatalogResult<Self> {
        let base_url = reqwest::Url::parse(base_url)
            .map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT))
            .user_agent(concat!("shelf/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &Config) -> CatalogResult<Self> {
        Self::new(&config.catalog_url)
    }

    /// Search the catalog
    ///
    /// Queries shorter than [`MIN_QUERY_LEN`] characters fail without a
    /// request being sent.
    pub async fn search(&self, query: &str) -> CatalogResult<Vec<BookSuggestion>> {
        if query.trim().chars().count() < MIN_QUERY_LEN {
            return Err(CatalogError::QueryTooShort);
        }
        let url = self.request_url(&format!("bib.anywhere all \"{}\"", escape_cql(query.trim())));
        self.fetch(url).await
    }

    /// Look up records by ISBN
    pub async fn lookup_by_identifier(
        &self,
        identifier: &str,
    ) -> CatalogResult<Vec<BookSuggestion>> {
        let url = self.request_url(&format!("bib.isbn all \"{}\"", escape_cql(identifier)));
        self.fetch(url).await
    }

    /// Build the searchRetrieve URL for a CQL query
    pub fn request_url(&self, cql: &str) -> reqwest::Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("version", "1.2")
            .append_pair("operation", "searchRetrieve")
            .append_pair("query", cql)
            .append_pair("recordSchema", "unimarcxchange")
            .append_pair("maximumRecords", &MAX_RECORDS.to_string());
        url
    }

    async fn fetch(&self, url: reqwest::Url) -> CatalogResult<Vec<BookSuggestion>> {
        debug!("Catalog request: {}", url);
        let response = self.http.get(url).send().await?;

        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let suggestions = parse_response(&body)?;
        debug!("Catalog returned {} record(s)", suggestions.len());
        Ok(suggestions)
    }
}

impl Catalog for CatalogClient {
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = CatalogResult<Vec<BookSuggestion>>> + Send {
        CatalogClient::search(self, query)
    }

    fn lookup_by_identifier(
        &self,
        identifier: &str,
    ) -> impl Future<Output = CatalogResult<Vec<BookSuggestion>>> + Send {
        CatalogClient::lookup_by_identifier(self, identifier)
    }
}

fn escape_cql(term: &str) -> String {
    term.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CatalogClient {
        CatalogClient::new("https://catalogue.bnf.fr/api/SRU").unwrap()
    }

    #[test]
    fn test_request_url_encodes_query() {
        let url = client().request_url("bib.anywhere all \"l'étranger camus\"");
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert!(query.contains(&("operation".into(), "searchRetrieve".into())));
        assert!(query.contains(&("recordSchema".into(), "unimarcxchange".into())));
        assert!(query.contains(&("maximumRecords".into(), "5".into())));
        assert!(query.contains(&(
            "query".into(),
            "bib.anywhere all \"l'étranger camus\"".into()
        )));

        let raw = url.as_str();
        assert!(!raw.contains(' '));
        assert!(!raw.contains('"'));
        assert!(raw.contains("%C3%A9"));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = CatalogClient::new("not a url").unwrap_err();
        assert!(matches!(err, CatalogError::InvalidUrl(_)));
    }

    #[test]
    fn test_escape_cql() {
        assert_eq!(escape_cql(r#"say "hi""#), r#"say \"hi\""#);
    }

    #[tokio::test]
    async fn test_short_query_sends_nothing() {
        // An unroutable endpoint: a request would fail with Http, not QueryTooShort
        let client = CatalogClient::new("http://127.0.0.1:9/SRU").unwrap();
        for query in ["", "ab", "  ab  ", "é"] {
            let err = client.search(query).await.unwrap_err();
            assert!(matches!(err, CatalogError::QueryTooShort), "query {:?}", query);
        }
    }
}
