use std::path::PathBuf;

use thiserror::Error;

/// Conditions that abort a run. Everything else degrades to defaults or fallbacks.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("style catalog is empty")]
    EmptyCatalog,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid JSON, leaving it untouched: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
