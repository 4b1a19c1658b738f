use serde::{Deserialize, Serialize};

use crate::PipelineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub id: String,
    pub description: String,
}

impl Style {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
        }
    }
}

const BUILTIN_STYLES: [(&str, &str); 10] = [
    ("template_drop", "Share a fill-in-the-blank template + 1 tiny example."),
    ("myth_vs_fact", "Debunk 1 myth and replace with 1 fact + a quick how-to."),
    ("mistake_fix", "Name 1 common mistake and show the concise fix."),
    ("checklist", "Give a tight 4-item checklist for a narrow task."),
    ("data_bite", "One stat/number, why it matters, and what to do."),
    ("challenge", "Issue a 24–48h micro-challenge with clear steps."),
    ("hot_take", "A contrarian but respectful take with 1 actionable tip."),
    ("caselet", "A 1-sentence mini-case: role → action → result."),
    ("hook_lab", "Provide 3 alternative hooks for the same idea."),
    ("swipe_headlines", "Provide 3 headline angles anyone can reuse."),
];

#[derive(Debug, Clone)]
pub struct StyleCatalog {
    styles: Vec<Style>,
}

impl StyleCatalog {
    pub fn new(styles: Vec<Style>) -> Result<Self, PipelineError> {
        if styles.is_empty() {
            return Err(PipelineError::EmptyCatalog);
        }
        Ok(Self { styles })
    }

    pub fn builtin() -> Self {
        Self {
            styles: BUILTIN_STYLES
                .iter()
                .map(|(id, description)| Style::new(*id, *description))
                .collect(),
        }
    }

    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    pub fn get(&self, style_id: &str) -> Option<&Style> {
        self.styles.iter().find(|style| style.id == style_id)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}
