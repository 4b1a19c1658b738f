use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::dedup::store::write_atomic;
use crate::PipelineError;

pub const BANDIT_MIN_WEIGHT: f64 = 0.6;
pub const BANDIT_MAX_WEIGHT: f64 = 1.6;

const STYLE_FEATURE: &str = "style";
// An average engagement score of half this maps to weight 1.0.
const SCORE_SCALE: f64 = 50.0;
const SCORE_GAIN: f64 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub struct StyleScore {
    pub style_id: String,
    pub avg_eng_score: f64,
}

pub fn weight_for_score(avg_eng_score: f64) -> f64 {
    let avg = if avg_eng_score.is_finite() {
        avg_eng_score
    } else {
        0.0
    };
    let delta = (avg / SCORE_SCALE - 0.5) * SCORE_GAIN;
    let weight = (1.0 + delta).clamp(BANDIT_MIN_WEIGHT, BANDIT_MAX_WEIGHT);
    (weight * 100.0).round() / 100.0
}

/// Style rows of the analytics summary. Columns are located by header name.
pub fn parse_style_scores(summary: &str) -> Vec<StyleScore> {
    let mut lines = summary.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let columns = split_row(header);
    let position = |name: &str| columns.iter().position(|column| column == name);
    let (Some(feature_idx), Some(bucket_idx), Some(score_idx)) = (
        position("feature"),
        position("bucket"),
        position("avg_eng_score"),
    ) else {
        warn!("analytics summary is missing feature/bucket/avg_eng_score columns");
        return Vec::new();
    };

    lines
        .map(split_row)
        .filter(|row| row.get(feature_idx).map(String::as_str) == Some(STYLE_FEATURE))
        .filter_map(|row| {
            let style_id = row.get(bucket_idx)?.clone();
            if style_id.is_empty() {
                return None;
            }
            let avg_eng_score = row
                .get(score_idx)
                .and_then(|raw| raw.parse::<f64>().ok())
                .unwrap_or(0.0);
            Some(StyleScore {
                style_id,
                avg_eng_score,
            })
        })
        .collect()
}

fn split_row(line: &str) -> Vec<String> {
    line.split(',')
        .map(|field| field.trim().trim_matches('"').trim().to_string())
        .collect()
}

pub fn style_weight_updates(scores: &[StyleScore]) -> BTreeMap<String, f64> {
    scores
        .iter()
        .map(|score| (score.style_id.clone(), weight_for_score(score.avg_eng_score)))
        .collect()
}

/// Overwrites the updated styles in `style_weights`, keeping every other key.
pub fn merge_style_weights(rules: Value, updates: &BTreeMap<String, f64>) -> Value {
    let mut rules = match rules {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        _ => {
            warn!("rules document is not an object, starting a new one");
            Map::new()
        }
    };

    let weights = rules
        .entry("style_weights")
        .or_insert_with(|| Value::Object(Map::new()));
    if !weights.is_object() {
        warn!("style_weights is not an object, replacing it");
        *weights = Value::Object(Map::new());
    }
    if let Value::Object(weights) = weights {
        for (style_id, weight) in updates {
            weights.insert(style_id.clone(), Value::from(*weight));
        }
    }
    Value::Object(rules)
}

pub async fn update_rules_file(
    rules_path: &Path,
    summary_path: &Path,
) -> Result<BTreeMap<String, f64>, PipelineError> {
    let summary = match tokio::fs::read_to_string(summary_path).await {
        Ok(summary) => summary,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %summary_path.display(), "no analytics summary yet");
            return Ok(BTreeMap::new());
        }
        Err(source) => {
            return Err(PipelineError::Read {
                path: summary_path.to_path_buf(),
                source,
            })
        }
    };

    let updates = style_weight_updates(&parse_style_scores(&summary));
    if updates.is_empty() {
        debug!(path = %summary_path.display(), "analytics summary has no style rows");
        return Ok(updates);
    }

    let rules = match tokio::fs::read_to_string(rules_path).await {
        Ok(data) if data.trim().is_empty() => Value::Null,
        Ok(data) => serde_json::from_str(&data).map_err(|source| PipelineError::Parse {
            path: rules_path.to_path_buf(),
            source,
        })?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Value::Null,
        Err(source) => {
            return Err(PipelineError::Read {
                path: rules_path.to_path_buf(),
                source,
            })
        }
    };

    let merged = merge_style_weights(rules, &updates);
    let payload =
        serde_json::to_string_pretty(&merged).map_err(|source| PipelineError::Serialize {
            what: "rules",
            source,
        })?;
    write_atomic(rules_path, payload).await?;
    info!(path = %rules_path.display(), styles = updates.len(), "style weights updated");
    Ok(updates)
}
