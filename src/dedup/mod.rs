pub mod guard;
pub mod history;
pub mod store;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use guard::{fingerprint, is_duplicate, jaccard, shingles, tokenize, DuplicateGuard, DuplicateMatch};
pub use history::{Fingerprint, FingerprintHistory};
pub use store::FingerprintStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateGuardConfig {
    pub enabled: bool,
    pub ngram: usize,
    pub threshold: f64,
    pub history_size: usize,
}

impl Default for DuplicateGuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ngram: 5,
            threshold: 0.8,
            history_size: 200,
        }
    }
}

impl DuplicateGuardConfig {
    pub fn from_value(value: &Value) -> Self {
        let mut config = Self::default();
        if let Some(enabled) = value.get("enabled").and_then(Value::as_bool) {
            config.enabled = enabled;
        }
        if let Some(ngram) = value.get("ngram").and_then(Value::as_u64) {
            if ngram >= 1 {
                config.ngram = ngram as usize;
            }
        }
        if let Some(threshold) = value.get("threshold").and_then(Value::as_f64) {
            if threshold.is_finite() {
                config.threshold = threshold.clamp(0.0, 1.0);
            }
        }
        if let Some(history_size) = value.get("history_size").and_then(Value::as_u64) {
            config.history_size = history_size as usize;
        }
        config
    }

    pub fn guard(&self) -> DuplicateGuard {
        DuplicateGuard::new(self.ngram, self.threshold)
    }
}
