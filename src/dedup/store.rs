use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::dedup::{Fingerprint, FingerprintHistory};
use crate::PipelineError;

pub struct FingerprintStore {
    path: Option<PathBuf>,
    history: FingerprintHistory,
}

impl FingerprintStore {
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            path: None,
            history: FingerprintHistory::new(capacity),
        }
    }

    /// Missing, empty or unreadable storage starts an empty history.
    pub async fn load(path: PathBuf, capacity: usize) -> Self {
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(data) if data.trim().is_empty() => Vec::new(),
            Ok(data) => match serde_json::from_str::<Vec<Fingerprint>>(&data) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "malformed fingerprint history, starting empty");
                    Vec::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no fingerprint history yet");
                Vec::new()
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read fingerprint history, starting empty");
                Vec::new()
            }
        };

        Self {
            path: Some(path),
            history: FingerprintHistory::from_entries(entries, capacity),
        }
    }

    pub fn history(&self) -> &FingerprintHistory {
        &self.history
    }

    pub fn append(&mut self, fingerprint: Fingerprint) {
        self.history.append(fingerprint);
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub async fn persist(&self) -> Result<(), PipelineError> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        let payload = serde_json::to_string_pretty(&self.history.to_vec()).map_err(|source| {
            PipelineError::Serialize {
                what: "fingerprint history",
                source,
            }
        })?;
        write_atomic(path, payload).await
    }
}

pub(crate) async fn write_atomic(path: &Path, payload: String) -> Result<(), PipelineError> {
    let persist_err = |source| PipelineError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(persist_err)?;
        }
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, payload)
        .await
        .map_err(persist_err)?;
    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(persist_err)?;
    Ok(())
}
