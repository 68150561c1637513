use std::path::PathBuf;
use thiserror::Error;

/// Hard ingestion failures. Malformed lines are not errors; they are
/// skipped and counted in the ingest summary.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Data source does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
