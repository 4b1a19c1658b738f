use rand::Rng;
use tracing::{debug, info, warn};

use crate::generator::{fallback_payload, ContentGenerator, GenerationRequest, PostPayload};
use crate::quality::{self, QualityRules, RejectReason, Verdict};
use crate::style::Style;
use crate::{add_minimum_emojis, fit_x_line, sanitize_line, DEFAULT_LINE_LIMIT};

/// One entry per attempt; the budget is the length of this table.
pub const ATTEMPT_HINTS: [Option<&str>; 3] = [
    None,
    Some(
        "Rewrite: fix tense conflicts. Do not pair 'when <verb>ing' with 'I achieved/delivered/shipped'. Speak to the reader as 'you'.",
    ),
    Some(
        "Rewrite: remove unquoted first person. 'I' may only appear inside a quoted template such as Use: \"I ...\". No dialogue labels, no meta references.",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Accepted { attempt: usize },
    ExhaustedFallback { attempts: usize, last_reason: RejectReason },
}

impl AttemptOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, AttemptOutcome::Accepted { .. })
    }

    pub fn attempts(self) -> usize {
        match self {
            AttemptOutcome::Accepted { attempt } => attempt,
            AttemptOutcome::ExhaustedFallback { attempts, .. } => attempts,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProducedPost {
    pub text: String,
    pub payload: PostPayload,
    pub outcome: AttemptOutcome,
    /// Set when the built-in payload replaced the generator's output.
    pub substituted: bool,
}

pub struct RetryOrchestrator<'a, G: ?Sized> {
    generator: &'a G,
    rules: &'a QualityRules,
    line_limit: usize,
}

impl<'a, G: ContentGenerator + ?Sized> RetryOrchestrator<'a, G> {
    pub fn new(generator: &'a G, rules: &'a QualityRules) -> Self {
        Self {
            generator,
            rules,
            line_limit: DEFAULT_LINE_LIMIT,
        }
    }

    pub fn with_line_limit(mut self, line_limit: usize) -> Self {
        self.line_limit = line_limit;
        self
    }

    pub async fn produce<R: Rng + ?Sized>(
        &self,
        topic: &str,
        style: &Style,
        rng: &mut R,
    ) -> ProducedPost {
        let mut attempt = 0;
        loop {
            let hint = ATTEMPT_HINTS[attempt];
            attempt += 1;

            let (payload, substituted) = self.request_payload(topic, style, hint).await;
            let (text, payload, substituted) = self.finish_line(payload, substituted, style, rng);

            match quality::evaluate(&text, self.rules) {
                Verdict::Accepted => {
                    info!(style = %style.id, attempt, "candidate accepted");
                    return ProducedPost {
                        text,
                        payload,
                        outcome: AttemptOutcome::Accepted { attempt },
                        substituted,
                    };
                }
                Verdict::Rejected(reason) if attempt >= ATTEMPT_HINTS.len() => {
                    warn!(
                        style = %style.id,
                        attempts = attempt,
                        reason = %reason,
                        "attempt budget exhausted, keeping last candidate"
                    );
                    return ProducedPost {
                        text,
                        payload,
                        outcome: AttemptOutcome::ExhaustedFallback {
                            attempts: attempt,
                            last_reason: reason,
                        },
                        substituted,
                    };
                }
                Verdict::Rejected(reason) => {
                    info!(style = %style.id, attempt, reason = %reason, "candidate rejected");
                }
            }
        }
    }

    async fn request_payload(
        &self,
        topic: &str,
        style: &Style,
        hint: Option<&str>,
    ) -> (PostPayload, bool) {
        let request = GenerationRequest { topic, style, hint };
        match self.generator.generate(&request).await {
            Ok(payload) if !payload.x_line.trim().is_empty() => (payload, false),
            Ok(_) => {
                warn!(style = %style.id, "generator returned empty copy, using built-in payload");
                (fallback_payload(style), true)
            }
            Err(err) => {
                warn!(style = %style.id, error = %err, "generation failed, using built-in payload");
                (fallback_payload(style), true)
            }
        }
    }

    fn finish_line<R: Rng + ?Sized>(
        &self,
        payload: PostPayload,
        substituted: bool,
        style: &Style,
        rng: &mut R,
    ) -> (String, PostPayload, bool) {
        let min_emojis = self.rules.min_emojis;
        let text = fit_x_line(&payload.x_line, min_emojis, self.line_limit, rng);
        if !text.is_empty() {
            return (text, payload, substituted);
        }

        debug!(style = %style.id, "sanitized copy was empty, using built-in payload");
        let fallback = fallback_payload(style);
        let mut text = fit_x_line(&fallback.x_line, min_emojis, self.line_limit, rng);
        if text.is_empty() {
            text = add_minimum_emojis(&sanitize_line(&fallback.x_line), min_emojis, rng);
        }
        (text, fallback, true)
    }
}
