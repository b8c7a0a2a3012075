//! Cover image resolution
//!
//! Covers are derived from the ISBN: Open Library first, then a Google Books
//! thumbnail substituted exactly once when the first one fails to load.

use std::time::Duration;

use tracing::debug;

/// Fetch timeout in seconds
const FETCH_TIMEOUT: u64 = 10;

/// Open Library cover URL; `default=false` turns a missing cover into a 404
pub fn primary_cover_url(isbn: &str) -> String {
    format!(
        "https://covers.openlibrary.org/b/isbn/{}-M.jpg?default=false",
        isbn
    )
}

/// Google Books thumbnail URL
pub fn secondary_cover_url(isbn: &str) -> String {
    format!(
        "https://books.google.com/books/content?vid=ISBN{}&printsec=frontcover&img=1&zoom=1",
        isbn
    )
}

/// Cover URLs to try for one identifier, in order
///
/// Yields the primary URL, then the secondary URL once, then nothing.
#[derive(Debug, Clone)]
pub struct CoverCandidates {
    isbn: String,
    tried: u8,
}

impl CoverCandidates {
    pub fn new(isbn: impl Into<String>) -> Self {
        Self {
            isbn: isbn.into(),
            tried: 0,
        }
    }

    pub fn isbn(&self) -> &str {
        &self.isbn
    }
}

impl Iterator for CoverCandidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let url = match self.tried {
            0 => primary_cover_url(&self.isbn),
            1 => secondary_cover_url(&self.isbn),
            _ => return None,
        };
        self.tried += 1;
        Some(url)
    }
}

/// Downloads cover images for storage
#[derive(Debug, Clone)]
pub struct CoverFetcher {
    http: reqwest::Client,
}

impl CoverFetcher {
    pub fn new() -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT))
            .user_agent(concat!("shelf/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    /// Cover bytes for an ISBN, or `None` when no provider has one
    pub async fn fetch_for_isbn(&self, isbn: &str) -> Option<Vec<u8>> {
        self.fetch_first(CoverCandidates::new(isbn)).await
    }

    /// Bytes of the first URL that loads as an image
    pub async fn fetch_first<I>(&self, urls: I) -> Option<Vec<u8>>
    where
        I: IntoIterator<Item = String>,
    {
        for url in urls {
            match self.fetch_url(&url).await {
                Ok(Some(bytes)) => return Some(bytes),
                Ok(None) => debug!("No cover at {}", url),
                Err(e) => debug!("Cover fetch failed for {}: {}", url, e),
            }
        }
        None
    }

    /// Fetch one image; `Ok(None)` when the server has no image there
    pub async fn fetch_url(&self, url: &str) -> reqwest::Result<Option<Vec<u8>>> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Ok(None);
        }

        let is_image = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        Ok((!bytes.is_empty()).then(|| bytes.to_vec()))
    }
}
