use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

use crate::dedup::{Fingerprint, FingerprintHistory};
use crate::normalize_text;

const FINGERPRINT_ID_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    pub fingerprint_id: String,
    pub similarity: f64,
}

pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Contiguous `ngram`-token windows. Texts shorter than one window collapse to a single shingle.
pub fn shingles(text: &str, ngram: usize) -> BTreeSet<String> {
    let tokens = tokenize(text);
    let width = ngram.max(1);
    if tokens.is_empty() {
        return BTreeSet::new();
    }
    if tokens.len() < width {
        return BTreeSet::from([tokens.join(" ")]);
    }
    tokens.windows(width).map(|window| window.join(" ")).collect()
}

pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

pub fn fingerprint(text: &str, ngram: usize) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(normalize_text(text).as_bytes());
    let digest = hex::encode(hasher.finalize());

    Fingerprint {
        id: digest[..FINGERPRINT_ID_LEN].to_string(),
        ngrams: shingles(text, ngram),
    }
}

pub fn is_duplicate(text: &str, history: &FingerprintHistory, ngram: usize, threshold: f64) -> bool {
    DuplicateGuard::new(ngram, threshold)
        .find_match(text, history)
        .is_some()
}

#[derive(Debug, Clone, Copy)]
pub struct DuplicateGuard {
    ngram: usize,
    threshold: f64,
}

impl DuplicateGuard {
    pub fn new(ngram: usize, threshold: f64) -> Self {
        Self {
            ngram: ngram.max(1),
            threshold,
        }
    }

    pub fn ngram(&self) -> usize {
        self.ngram
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn find_match(&self, text: &str, history: &FingerprintHistory) -> Option<DuplicateMatch> {
        let candidate = shingles(text, self.ngram);
        history.iter().find_map(|stored| {
            let similarity = jaccard(&candidate, &stored.ngrams);
            (similarity >= self.threshold).then(|| DuplicateMatch {
                fingerprint_id: stored.id.clone(),
                similarity,
            })
        })
    }

    pub fn closest(&self, text: &str, history: &FingerprintHistory) -> Option<DuplicateMatch> {
        let candidate = shingles(text, self.ngram);
        history
            .iter()
            .map(|stored| DuplicateMatch {
                fingerprint_id: stored.id.clone(),
                similarity: jaccard(&candidate, &stored.ngrams),
            })
            .max_by(|a, b| a.similarity.total_cmp(&b.similarity))
    }
}
