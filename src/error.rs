use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds the pipeline distinguishes.
///
/// Document and record failures are tolerated (logged, skipped); a commit
/// failure aborts the whole run.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot read source document {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("record '{name}' failed: {source}")]
    RecordProcessing {
        name: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("run commit failed: {0}")]
    Commit(#[source] rusqlite::Error),

    #[error("{0}")]
    InvalidInput(String),
}
