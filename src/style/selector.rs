use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::style::{Style, StyleCatalog};

pub const DEFAULT_STYLE_WEIGHT: f64 = 1.0;
pub const MIN_STYLE_WEIGHT: f64 = 0.01;
// Keeps the running total of a catalog finite.
pub const MAX_STYLE_WEIGHT: f64 = 1e6;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleWeights {
    weights: BTreeMap<String, f64>,
}

impl StyleWeights {
    pub fn uniform() -> Self {
        Self::default()
    }

    pub fn from_value(value: &Value) -> Self {
        let mut weights = Self::uniform();
        let Some(entries) = value.as_object() else {
            if !value.is_null() {
                warn!("style_weights is not an object, using uniform weights");
            }
            return weights;
        };

        for (style_id, raw) in entries {
            let parsed = match raw {
                Value::Number(number) => number.as_f64(),
                Value::String(text) => text.trim().parse::<f64>().ok(),
                _ => None,
            };
            match parsed {
                Some(weight) => weights.set(style_id.clone(), weight),
                None => warn!(style = %style_id, "ignoring non-numeric style weight"),
            }
        }
        weights
    }

    pub fn set(&mut self, style_id: impl Into<String>, weight: f64) {
        let style_id = style_id.into();
        if !weight.is_finite() {
            self.weights.remove(&style_id);
            return;
        }
        self.weights
            .insert(style_id, weight.clamp(MIN_STYLE_WEIGHT, MAX_STYLE_WEIGHT));
    }

    pub fn weight(&self, style_id: &str) -> f64 {
        self.weights
            .get(style_id)
            .copied()
            .unwrap_or(DEFAULT_STYLE_WEIGHT)
            .clamp(MIN_STYLE_WEIGHT, MAX_STYLE_WEIGHT)
    }

    /// Uniform weights except for `style_id`, which keeps its own weight scaled by `factor`.
    pub fn penalized(&self, style_id: &str, factor: f64) -> Self {
        let mut weights = Self::uniform();
        weights.set(style_id, self.weight(style_id) * factor);
        weights
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights
            .iter()
            .map(|(style_id, weight)| (style_id.as_str(), *weight))
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl FromIterator<(String, f64)> for StyleWeights {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        let mut weights = Self::uniform();
        for (style_id, weight) in iter {
            weights.set(style_id, weight);
        }
        weights
    }
}

#[derive(Debug, Clone)]
pub struct StyleSelector {
    catalog: StyleCatalog,
}

impl StyleSelector {
    pub fn new(catalog: StyleCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn select<R: Rng + ?Sized>(&self, weights: &StyleWeights, rng: &mut R) -> (&Style, f64) {
        let mut cumulative = Vec::with_capacity(self.catalog.len());
        let mut total = 0.0;
        for style in self.catalog.styles() {
            let weight = weights.weight(&style.id);
            total += weight;
            cumulative.push((style, weight, total));
        }

        let draw = rng.gen_range(0.0..total);
        // Float rounding can leave the draw above the final running total.
        let index = cumulative
            .iter()
            .position(|(_, _, running)| *running >= draw)
            .unwrap_or(cumulative.len() - 1);
        let (style, weight, _) = cumulative[index];
        (style, weight)
    }

    pub fn probabilities(&self, weights: &StyleWeights) -> Vec<(&Style, f64, f64)> {
        let total: f64 = self
            .catalog
            .styles()
            .iter()
            .map(|style| weights.weight(&style.id))
            .sum();

        self.catalog
            .styles()
            .iter()
            .map(|style| {
                let weight = weights.weight(&style.id);
                (style, weight, weight / total)
            })
            .collect()
    }
}
