use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::style::Style;

#[derive(Debug, Clone)]
pub struct GenerationRequest<'a> {
    pub topic: &'a str,
    pub style: &'a Style,
    pub hint: Option<&'a str>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostPayload {
    pub style: String,
    pub cta_type: String,
    pub x_line: String,
    pub desc_title: String,
    pub desc_points: Vec<String>,
    pub desc_cta: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),
    #[error("generator request failed: {0}")]
    Request(String),
    #[error("generator returned a malformed payload: {0}")]
    Malformed(String),
    #[error("generator returned empty copy")]
    Empty,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<PostPayload, GenerationError>;
}

/// Stands in when no model endpoint is configured; every call takes the fallback branch.
#[derive(Debug, Clone, Default)]
pub struct OfflineGenerator {
    pub reason: String,
}

impl OfflineGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ContentGenerator for OfflineGenerator {
    async fn generate(
        &self,
        _request: &GenerationRequest<'_>,
    ) -> Result<PostPayload, GenerationError> {
        Err(GenerationError::Unavailable(self.reason.clone()))
    }
}

pub fn parse_payload(content: &str) -> Result<PostPayload, GenerationError> {
    let json = extract_json(content)
        .ok_or_else(|| GenerationError::Malformed("response missing JSON object".to_string()))?;
    let payload: PostPayload =
        serde_json::from_str(json).map_err(|err| GenerationError::Malformed(err.to_string()))?;
    if payload.x_line.trim().is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(payload)
}

fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start >= end {
        return None;
    }
    Some(&text[start..=end])
}

pub fn fallback_payload(style: &Style) -> PostPayload {
    if style.id == "myth_vs_fact" {
        return PostPayload {
            style: style.id.clone(),
            cta_type: "question".to_string(),
            x_line: "Myth: ATS = keywords only. Fact: impact + context win. Try: role • action • metric • outcome. 📌✅".to_string(),
            desc_title: "ATS myth busted ✍️".to_string(),
            desc_points: vec![
                "Lead with impact (numbers) 📈".to_string(),
                "Name the lever you pulled ⚙️".to_string(),
                "Add brief context (scope) 🧠".to_string(),
                "Finish with outcome ✅".to_string(),
            ],
            desc_cta: "What part do you skip most: numbers, context, or lever? 🤔".to_string(),
            tags: vec!["resume".to_string(), "jobsearch".to_string()],
        };
    }

    PostPayload {
        style: style.id.clone(),
        cta_type: "question".to_string(),
        x_line: "Template: “I did X to achieve Y, measured by Z%.” Swap in role, scope, and 1 metric. ✅📌".to_string(),
        desc_title: "Steal this bullet template ✍️".to_string(),
        desc_points: vec![
            "Start with the action (X) ⚡".to_string(),
            "Name the outcome (Y) 🎯".to_string(),
            "Prove it with a number (Z%) 📈".to_string(),
            "Trim to 1 line, no fluff ✅".to_string(),
        ],
        desc_cta: "Drop a role and get a metric to use. 💬".to_string(),
        tags: vec!["resume".to_string(), "careerforge".to_string()],
    }
}
