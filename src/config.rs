use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::dedup::DuplicateGuardConfig;
use crate::pipeline::DEFAULT_DUPLICATE_PENALTY;
use crate::quality::QualityRules;
use crate::style::{Style, StyleCatalog, StyleWeights};
use crate::{PipelineError, DEFAULT_LINE_LIMIT};

pub const DEFAULT_TOPICS: [&str; 3] = [
    "Job search systems",
    "Interview frameworks",
    "Resume quant tactics",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub api_base: String,
    pub model: String,
    pub fallback_models: Vec<String>,
    pub temperature: f64,
    pub timeout_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            fallback_models: vec!["gpt-4o".to_string(), "gpt-4o-mini".to_string()],
            temperature: 0.6,
            timeout_ms: 30_000,
        }
    }
}

impl GeneratorConfig {
    /// Primary model first, then fallbacks, without repeats.
    pub fn model_sequence(&self) -> Vec<String> {
        let mut models: Vec<String> = Vec::new();
        for model in std::iter::once(&self.model).chain(self.fallback_models.iter()) {
            let model = model.trim();
            if !model.is_empty() && !models.iter().any(|seen| seen == model) {
                models.push(model.to_string());
            }
        }
        models
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub rules: PathBuf,
    pub fingerprints: PathBuf,
    pub topics: PathBuf,
    pub feed: PathBuf,
    pub feature_summary: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            rules: PathBuf::from("ops/rules.json"),
            fingerprints: PathBuf::from("analytics/fingerprints.json"),
            topics: PathBuf::from("content/seeds_topics.txt"),
            feed: PathBuf::from("feed.json"),
            feature_summary: PathBuf::from("analytics/feature_summary.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub line_limit: usize,
    pub duplicate_penalty: f64,
    pub feed_max_entries: usize,
    pub styles: Option<Vec<Style>>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            line_limit: DEFAULT_LINE_LIMIT,
            duplicate_penalty: DEFAULT_DUPLICATE_PENALTY,
            feed_max_entries: 50,
            styles: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub generator: GeneratorConfig,
    pub paths: PathsConfig,
    pub content: ContentConfig,
}

impl PipelineConfig {
    pub fn load(path: Option<PathBuf>) -> (Self, Option<PathBuf>) {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => Self::read(path).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "using default pipeline config");
                PipelineConfig::default()
            }),
            _ => PipelineConfig::default(),
        };

        config.apply_env_overrides();
        (config, config_path)
    }

    fn read(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|err| format!("failed to read config: {}", err))?;
        toml::from_str(&contents).map_err(|err| format!("failed to parse config: {}", err))
    }

    pub fn write(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create config dir: {}", err))?;
        }
        let payload = toml::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        std::fs::write(path, payload).map_err(|err| format!("failed to write config: {}", err))?;
        Ok(())
    }

    pub fn catalog(&self) -> Result<StyleCatalog, PipelineError> {
        match self.content.styles.as_ref() {
            Some(styles) => StyleCatalog::new(styles.clone()),
            None => Ok(StyleCatalog::builtin()),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(model) = env::var("MODEL") {
            if !model.trim().is_empty() {
                self.generator.model = model.trim().to_string();
            }
        }
        if let Ok(api_base) = env::var("OPENAI_API_BASE") {
            if !api_base.trim().is_empty() {
                self.generator.api_base = api_base;
            }
        }
        if let Some(path) = env_path("RULES_PATH") {
            self.paths.rules = path;
        }
        if let Some(path) = env_path("FINGERPRINTS_PATH") {
            self.paths.fingerprints = path;
        }
        if let Some(path) = env_path("FEED_PATH") {
            self.paths.feed = path;
        }
    }
}

/// Editorial rules, style weights and duplicate settings from the rules JSON file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RulesFile {
    pub quality: QualityRules,
    pub style_weights: StyleWeights,
    pub duplicate_guard: DuplicateGuardConfig,
}

impl RulesFile {
    pub fn from_value(value: &Value) -> Self {
        Self {
            quality: QualityRules::from_value(value),
            style_weights: StyleWeights::from_value(
                value.get("style_weights").unwrap_or(&Value::Null),
            ),
            duplicate_guard: DuplicateGuardConfig::from_value(
                value.get("duplicate_guard").unwrap_or(&Value::Null),
            ),
        }
    }

    pub fn from_json_str(data: &str) -> Self {
        if data.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Value>(data) {
            Ok(value) => Self::from_value(&value),
            Err(err) => {
                warn!(error = %err, "malformed rules file, using defaults");
                Self::default()
            }
        }
    }

    pub async fn load(path: &Path) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(data) => Self::from_json_str(&data),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "rules file unavailable, using defaults");
                Self::default()
            }
        }
    }
}

pub async fn load_topics(path: &Path) -> Vec<String> {
    let topics: Vec<String> = match tokio::fs::read_to_string(path).await {
        Ok(data) => data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Err(err) => {
            debug!(path = %path.display(), error = %err, "topics file unavailable");
            Vec::new()
        }
    };

    if topics.is_empty() {
        return DEFAULT_TOPICS.iter().map(|topic| topic.to_string()).collect();
    }
    topics
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

fn default_config_path() -> Option<PathBuf> {
    env_path("PIPELINE_CONFIG_PATH").or_else(|| Some(PathBuf::from("config/pipeline.toml")))
}
