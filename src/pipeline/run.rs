use rand::Rng;
use tracing::{info, warn};

use crate::dedup::{fingerprint, DuplicateGuardConfig, Fingerprint, FingerprintStore};
use crate::feed::{FeedEmitter, FeedEntry};
use crate::generator::ContentGenerator;
use crate::pipeline::orchestrator::{AttemptOutcome, RetryOrchestrator};
use crate::quality::QualityRules;
use crate::style::{Style, StyleSelector, StyleWeights};
use crate::{PipelineError, DEFAULT_LINE_LIMIT};

pub const DEFAULT_DUPLICATE_PENALTY: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DuplicateStatus {
    Disabled,
    Unique,
    /// The first candidate matched history; the reroll did not.
    Rerolled { similarity: f64 },
    /// Both the first candidate and the reroll matched history.
    AcceptedDuplicate { similarity: f64 },
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub entry: FeedEntry,
    pub style: Style,
    pub style_weight: f64,
    pub outcome: AttemptOutcome,
    pub duplicate: DuplicateStatus,
    pub fingerprint: Fingerprint,
}

pub struct Pipeline<'a, G: ?Sized> {
    generator: &'a G,
    selector: &'a StyleSelector,
    rules: &'a QualityRules,
    dedup: &'a DuplicateGuardConfig,
    duplicate_penalty: f64,
    line_limit: usize,
}

impl<'a, G: ContentGenerator + ?Sized> Pipeline<'a, G> {
    pub fn new(
        generator: &'a G,
        selector: &'a StyleSelector,
        rules: &'a QualityRules,
        dedup: &'a DuplicateGuardConfig,
    ) -> Self {
        Self {
            generator,
            selector,
            rules,
            dedup,
            duplicate_penalty: DEFAULT_DUPLICATE_PENALTY,
            line_limit: DEFAULT_LINE_LIMIT,
        }
    }

    pub fn with_duplicate_penalty(mut self, penalty: f64) -> Self {
        self.duplicate_penalty = penalty;
        self
    }

    pub fn with_line_limit(mut self, line_limit: usize) -> Self {
        self.line_limit = line_limit;
        self
    }

    pub async fn run<R: Rng + ?Sized>(
        &self,
        topic: &str,
        weights: &StyleWeights,
        store: &mut FingerprintStore,
        rng: &mut R,
    ) -> RunReport {
        let orchestrator =
            RetryOrchestrator::new(self.generator, self.rules).with_line_limit(self.line_limit);

        let (style, mut style_weight) = self.selector.select(weights, rng);
        let mut style = style.clone();
        info!(style = %style.id, weight = style_weight, topic, "style selected");

        let mut produced = orchestrator.produce(topic, &style, rng).await;

        let duplicate = if !self.dedup.enabled {
            DuplicateStatus::Disabled
        } else {
            let guard = self.dedup.guard();
            match guard.find_match(&produced.text, store.history()) {
                None => DuplicateStatus::Unique,
                Some(first) => {
                    warn!(
                        style = %style.id,
                        similarity = first.similarity,
                        matched = %first.fingerprint_id,
                        "duplicate of recent post, rerolling once"
                    );
                    let penalized = weights.penalized(&style.id, self.duplicate_penalty);
                    let (alternate, alternate_weight) = self.selector.select(&penalized, rng);
                    style = alternate.clone();
                    style_weight = alternate_weight;
                    produced = orchestrator.produce(topic, &style, rng).await;

                    match guard.find_match(&produced.text, store.history()) {
                        None => DuplicateStatus::Rerolled {
                            similarity: first.similarity,
                        },
                        Some(second) => {
                            warn!(
                                style = %style.id,
                                similarity = second.similarity,
                                "reroll is still a duplicate, accepting it"
                            );
                            DuplicateStatus::AcceptedDuplicate {
                                similarity: second.similarity,
                            }
                        }
                    }
                }
            }
        };

        let fingerprint = fingerprint(&produced.text, self.dedup.ngram);
        store.append(fingerprint.clone());

        let entry = FeedEntry::new(
            produced.text.clone(),
            &produced.payload,
            &style.id,
            topic,
        );

        RunReport {
            entry,
            style,
            style_weight,
            outcome: produced.outcome,
            duplicate,
            fingerprint,
        }
    }
}

/// Writes the fingerprint history, then the feed. A failed history write publishes nothing.
pub async fn publish<E: FeedEmitter + ?Sized>(
    entry: &FeedEntry,
    store: &FingerprintStore,
    emitter: &E,
) -> Result<(), PipelineError> {
    store.persist().await?;
    emitter.emit(entry).await
}
