//! View bundle loading

use std::path::{Path, PathBuf};

use anyhow::Context;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tracing::debug;

/// Fetches the markup of a view bundle by source name
pub trait BundleLoader: Send + Sync {
    fn load(&self, source: &'static str) -> BoxFuture<'_, anyhow::Result<String>>;
}

/// Reads `{root}/{source}.html` from disk
#[derive(Debug, Clone)]
pub struct FsBundleLoader {
    root: PathBuf,
}

impl FsBundleLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn bundle_path(&self, source: &str) -> PathBuf {
        self.root.join(format!("{}.html", source))
    }
}

impl BundleLoader for FsBundleLoader {
    fn load(&self, source: &'static str) -> BoxFuture<'_, anyhow::Result<String>> {
        let path = self.bundle_path(source);
        async move {
            debug!("Loading view bundle {:?}", path);
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read view {:?}", path))
        }
        .boxed()
    }
}
