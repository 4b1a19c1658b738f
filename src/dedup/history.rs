use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub id: String,
    pub ngrams: BTreeSet<String>,
}

/// Insertion-ordered fingerprints, never longer than `capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintHistory {
    entries: VecDeque<Fingerprint>,
    capacity: usize,
}

impl FingerprintHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Keeps the newest `capacity` entries of an oldest-first list.
    pub fn from_entries(entries: Vec<Fingerprint>, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        for fingerprint in entries {
            history.append(fingerprint);
        }
        history
    }

    pub fn append(&mut self, fingerprint: Fingerprint) {
        self.entries.push_back(fingerprint);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fingerprint> {
        self.entries.iter()
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.entries.iter().any(|fingerprint| fingerprint.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<Fingerprint> {
        self.entries.iter().cloned().collect()
    }
}
