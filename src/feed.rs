use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::dedup::store::write_atomic;
use crate::generator::PostPayload;
use crate::PipelineError;

pub const DEFAULT_CTA_TYPE: &str = "question";
const MAX_TAGS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub guid: String,
    pub title_text: String,
    pub description_text: String,
    pub style_id: String,
    pub cta_type: String,
    pub topic: String,
    pub published_at: i64,
}

impl FeedEntry {
    pub fn new(
        title_text: String,
        payload: &PostPayload,
        style_id: &str,
        topic: &str,
    ) -> Self {
        let cta_type = payload.cta_type.trim().to_lowercase();
        let published_at = current_timestamp();
        Self {
            guid: entry_guid(&title_text, published_at),
            title_text,
            description_text: compose_description(payload),
            style_id: style_id.to_string(),
            cta_type: if cta_type.is_empty() {
                DEFAULT_CTA_TYPE.to_string()
            } else {
                cta_type
            },
            topic: topic.to_string(),
            published_at,
        }
    }
}

pub fn compose_description(payload: &PostPayload) -> String {
    let mut sections = Vec::new();

    let hook = payload.desc_title.trim();
    if !hook.is_empty() {
        sections.push(hook.to_string());
    }

    let bullets: Vec<String> = payload
        .desc_points
        .iter()
        .map(|point| point.trim().trim_matches(|ch| ch == '•' || ch == '-' || ch == ' '))
        .filter(|point| !point.is_empty())
        .map(|point| format!("• {}", point))
        .collect();
    if !bullets.is_empty() {
        sections.push(bullets.join("\n"));
    }

    let cta = payload.desc_cta.trim();
    if !cta.is_empty() {
        sections.push(cta.to_string());
    }

    let tags: Vec<String> = payload
        .tags
        .iter()
        .map(|tag| tag.trim().trim_start_matches('#'))
        .filter(|tag| !tag.is_empty())
        .take(MAX_TAGS)
        .map(|tag| format!("#{}", tag))
        .collect();
    if !tags.is_empty() {
        sections.push(tags.join(" "));
    }

    sections.join("\n\n")
}

#[async_trait]
pub trait FeedEmitter: Send + Sync {
    async fn emit(&self, entry: &FeedEntry) -> Result<(), PipelineError>;
}

/// Newest-first JSON list of entries, capped at `max_entries`.
pub struct JsonFeedEmitter {
    path: PathBuf,
    max_entries: usize,
}

impl JsonFeedEmitter {
    pub fn new(path: PathBuf, max_entries: usize) -> Self {
        Self {
            path,
            max_entries: max_entries.max(1),
        }
    }

    /// Existing entries, newest first. A feed that does not parse is a `Parse` error.
    pub async fn entries(&self) -> Result<Vec<FeedEntry>, PipelineError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PipelineError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|source| PipelineError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

#[async_trait]
impl FeedEmitter for JsonFeedEmitter {
    async fn emit(&self, entry: &FeedEntry) -> Result<(), PipelineError> {
        let mut entries = self.entries().await?;
        entries.insert(0, entry.clone());
        entries.truncate(self.max_entries);

        let payload = serde_json::to_string_pretty(&entries).map_err(|source| {
            PipelineError::Serialize {
                what: "feed",
                source,
            }
        })?;
        write_atomic(&self.path, payload).await
    }
}

fn entry_guid(title_text: &str, published_at: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title_text.as_bytes());
    hasher.update(published_at.to_be_bytes());
    hex::encode(hasher.finalize())
}

fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0)
}
