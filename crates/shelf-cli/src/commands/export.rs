//! Export command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use shelf_core::export::Snapshot;
use shelf_core::Library;

use crate::output::Output;

/// Write the whole library as one JSON document
pub fn json(library: &mut Library, path: PathBuf, output: &Output) -> Result<()> {
    let snapshot = Snapshot::read(library.store())?;
    snapshot
        .write_json(&path)
        .with_context(|| format!("Failed to export to {:?}", path))?;

    output.success(&format!(
        "Exported {} book(s) to {}",
        snapshot.books.len(),
        path.display()
    ));
    Ok(())
}

/// Write one CSV sheet per collection into a directory
pub fn sheets(library: &mut Library, dir: PathBuf, output: &Output) -> Result<()> {
    let snapshot = Snapshot::read(library.store())?;
    let paths = snapshot
        .write_sheets(&dir)
        .with_context(|| format!("Failed to export to {:?}", dir))?;

    output.success(&format!("Exported {} sheet(s) to {}", paths.len(), dir.display()));
    Ok(())
}
