use async_trait::async_trait;
use post_forge::count_emojis;
use post_forge::dedup::{fingerprint, DuplicateGuardConfig, FingerprintStore};
use post_forge::generator::{
    ContentGenerator, GenerationError, GenerationRequest, OfflineGenerator, PostPayload,
};
use post_forge::feed::JsonFeedEmitter;
use post_forge::pipeline::{
    publish, AttemptOutcome, DuplicateStatus, Pipeline, RetryOrchestrator, ATTEMPT_HINTS,
};
use post_forge::PipelineError;
use post_forge::quality::{QualityRules, RejectReason};
use post_forge::style::{Style, StyleCatalog, StyleSelector, StyleWeights};
use rand::{rngs::StdRng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

const CLEAN_LINE: &str = "You can add 3 metrics to your resume today ✅📌";
const FIRST_PERSON_LINE: &str = "I think you should add metrics to every bullet ✅📌";
const QUOTED_LINE: &str = "Use: \"I grew revenue 25% in 2 quarters\" and you can too ✅📌";

fn payload(x_line: &str) -> PostPayload {
    PostPayload {
        style: "data_bite".to_string(),
        cta_type: "Question".to_string(),
        x_line: x_line.to_string(),
        desc_title: "Numbers beat adjectives".to_string(),
        desc_points: vec!["Lead with the metric".to_string()],
        desc_cta: "Which metric do you use?".to_string(),
        tags: vec!["resume".to_string()],
    }
}

struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<PostPayload, GenerationError>>>,
    hints: Mutex<Vec<Option<String>>>,
}

impl ScriptedGenerator {
    fn new(script: Vec<Result<PostPayload, GenerationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            hints: Mutex::new(Vec::new()),
        }
    }

    fn lines(lines: &[&str]) -> Self {
        Self::new(lines.iter().map(|line| Ok(payload(line))).collect())
    }

    fn hints(&self) -> Vec<Option<String>> {
        self.hints.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<PostPayload, GenerationError> {
        self.hints
            .lock()
            .unwrap()
            .push(request.hint.map(str::to_string));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Unavailable("script exhausted".to_string())))
    }
}

struct FixedGenerator {
    line: String,
    styles: Mutex<Vec<String>>,
}

impl FixedGenerator {
    fn new(line: &str) -> Self {
        Self {
            line: line.to_string(),
            styles: Mutex::new(Vec::new()),
        }
    }

    fn styles(&self) -> Vec<String> {
        self.styles.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentGenerator for FixedGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<PostPayload, GenerationError> {
        self.styles.lock().unwrap().push(request.style.id.clone());
        Ok(payload(&self.line))
    }
}

fn data_bite() -> Style {
    Style::new("data_bite", "One stat/number, why it matters, and what to do.")
}

fn single_style_selector() -> StyleSelector {
    StyleSelector::new(StyleCatalog::new(vec![data_bite()]).expect("catalog"))
}

fn quotes_only() -> QualityRules {
    QualityRules {
        allow_first_person_in_quotes_only: true,
        ..QualityRules::default()
    }
}

#[tokio::test]
async fn accepts_first_clean_candidate() {
    let generator = ScriptedGenerator::lines(&[CLEAN_LINE]);
    let rules = QualityRules::default();
    let mut rng = StdRng::seed_from_u64(1);

    let produced = RetryOrchestrator::new(&generator, &rules)
        .produce("resume metrics", &data_bite(), &mut rng)
        .await;

    assert_eq!(produced.outcome, AttemptOutcome::Accepted { attempt: 1 });
    assert_eq!(produced.text, CLEAN_LINE);
    assert!(!produced.substituted);
    assert_eq!(generator.hints(), vec![None]);
}

#[tokio::test]
async fn escalating_hints_until_accepted() {
    let generator = ScriptedGenerator::lines(&[FIRST_PERSON_LINE, FIRST_PERSON_LINE, QUOTED_LINE]);
    let rules = quotes_only();
    let mut rng = StdRng::seed_from_u64(2);

    let produced = RetryOrchestrator::new(&generator, &rules)
        .produce("resume metrics", &data_bite(), &mut rng)
        .await;

    assert_eq!(produced.outcome, AttemptOutcome::Accepted { attempt: 3 });
    assert_eq!(produced.text, QUOTED_LINE);
    let expected: Vec<Option<String>> = ATTEMPT_HINTS
        .iter()
        .map(|hint| hint.map(str::to_string))
        .collect();
    assert_eq!(generator.hints(), expected);
}

#[tokio::test]
async fn exhausted_budget_keeps_last_candidate() {
    let generator =
        ScriptedGenerator::lines(&[FIRST_PERSON_LINE, FIRST_PERSON_LINE, FIRST_PERSON_LINE]);
    let rules = quotes_only();
    let mut rng = StdRng::seed_from_u64(3);

    let produced = RetryOrchestrator::new(&generator, &rules)
        .produce("resume metrics", &data_bite(), &mut rng)
        .await;

    assert_eq!(
        produced.outcome,
        AttemptOutcome::ExhaustedFallback {
            attempts: 3,
            last_reason: RejectReason::UnquotedFirstPerson,
        }
    );
    assert_eq!(produced.outcome.attempts(), ATTEMPT_HINTS.len());
    assert_eq!(produced.text, FIRST_PERSON_LINE);
    assert!(!produced.substituted);
}

#[tokio::test]
async fn unavailable_generator_uses_builtin_payload() {
    let generator = OfflineGenerator::new("no key");
    let rules = QualityRules::default();
    let mut rng = StdRng::seed_from_u64(4);

    let produced = RetryOrchestrator::new(&generator, &rules)
        .produce("resume metrics", &data_bite(), &mut rng)
        .await;

    assert!(produced.substituted);
    assert!(produced.outcome.is_accepted());
    assert!(produced.text.starts_with("Template:"));
    assert!(count_emojis(&produced.text) >= 2);
}

#[tokio::test]
async fn empty_copy_uses_builtin_payload() {
    let generator = ScriptedGenerator::lines(&["   "]);
    let rules = QualityRules::default();
    let mut rng = StdRng::seed_from_u64(5);

    let produced = RetryOrchestrator::new(&generator, &rules)
        .produce("resume metrics", &data_bite(), &mut rng)
        .await;

    assert!(produced.substituted);
    assert!(!produced.text.is_empty());
}

#[tokio::test]
async fn copy_that_sanitizes_away_uses_builtin_payload() {
    let generator = ScriptedGenerator::lines(&["#career https://example.com/jobs"]);
    let rules = QualityRules::default();
    let mut rng = StdRng::seed_from_u64(6);

    let produced = RetryOrchestrator::new(&generator, &rules)
        .produce("resume metrics", &data_bite(), &mut rng)
        .await;

    assert!(produced.substituted);
    assert!(produced.text.starts_with("Template:"));
    assert_eq!(produced.payload.style, "data_bite");
}

#[tokio::test]
async fn builtin_payload_can_exhaust_the_gate() {
    let generator = OfflineGenerator::new("no key");
    let rules = QualityRules {
        enforce_second_person: true,
        ..QualityRules::default()
    };
    let mut rng = StdRng::seed_from_u64(7);

    let produced = RetryOrchestrator::new(&generator, &rules)
        .produce("resume metrics", &data_bite(), &mut rng)
        .await;

    assert_eq!(
        produced.outcome,
        AttemptOutcome::ExhaustedFallback {
            attempts: 3,
            last_reason: RejectReason::MissingSecondPerson,
        }
    );
    assert!(!produced.text.is_empty());
}

#[tokio::test]
async fn large_emoji_minimum_keeps_generated_copy() {
    let generator = ScriptedGenerator::lines(&["You can add 3 metrics to your resume today"]);
    let rules = QualityRules {
        min_emojis: 80,
        ..QualityRules::default()
    };
    let mut rng = StdRng::seed_from_u64(14);

    let produced = RetryOrchestrator::new(&generator, &rules)
        .produce("resume metrics", &data_bite(), &mut rng)
        .await;

    assert!(!produced.substituted);
    assert!(produced.text.contains("You can add 3 metrics"));
    assert!(count_emojis(&produced.text) > 2);
}

#[tokio::test]
async fn offline_run_produces_a_publishable_line() {
    let generator = OfflineGenerator::new("no key");
    let selector = single_style_selector();
    let rules = QualityRules::default();
    let dedup = DuplicateGuardConfig::default();
    let mut store = FingerprintStore::in_memory(dedup.history_size);
    let mut rng = StdRng::seed_from_u64(8);

    let report = Pipeline::new(&generator, &selector, &rules, &dedup)
        .run("salary negotiation", &StyleWeights::uniform(), &mut store, &mut rng)
        .await;

    let text = &report.entry.title_text;
    assert!(!text.is_empty());
    assert!(count_emojis(text) >= 2);
    assert!(!text.contains('#'));
    assert!(!text.contains("http"));
    assert!(text.chars().count() <= 230);
    assert_eq!(report.duplicate, DuplicateStatus::Unique);
    assert_eq!(report.style.id, "data_bite");
    assert_eq!(report.entry.topic, "salary negotiation");
    assert_eq!(report.entry.cta_type, "question");
    assert_eq!(store.history().len(), 1);
    assert!(store.history().contains_id(&report.fingerprint.id));
}

#[tokio::test]
async fn repeated_copy_is_accepted_as_duplicate() {
    let generator = FixedGenerator::new(CLEAN_LINE);
    let selector = single_style_selector();
    let rules = QualityRules::default();
    let dedup = DuplicateGuardConfig::default();
    let mut store = FingerprintStore::in_memory(dedup.history_size);
    let mut rng = StdRng::seed_from_u64(9);
    let pipeline = Pipeline::new(&generator, &selector, &rules, &dedup);
    let weights = StyleWeights::uniform();

    let first = pipeline.run("resume", &weights, &mut store, &mut rng).await;
    let second = pipeline.run("resume", &weights, &mut store, &mut rng).await;

    assert_eq!(first.duplicate, DuplicateStatus::Unique);
    match second.duplicate {
        DuplicateStatus::AcceptedDuplicate { similarity } => {
            assert!((similarity - 1.0).abs() < 1e-9)
        }
        other => panic!("expected accepted duplicate, got {:?}", other),
    }
    assert_eq!(second.entry.title_text, CLEAN_LINE);
    assert_eq!(store.history().len(), 2);
    assert_eq!(generator.styles().len(), 3);
}

#[tokio::test]
async fn duplicate_triggers_one_reroll() {
    let generator = ScriptedGenerator::lines(&[CLEAN_LINE, QUOTED_LINE]);
    let selector = single_style_selector();
    let rules = QualityRules::default();
    let dedup = DuplicateGuardConfig::default();
    let mut store = FingerprintStore::in_memory(dedup.history_size);
    store.append(fingerprint(CLEAN_LINE, dedup.ngram));
    let mut rng = StdRng::seed_from_u64(10);

    let report = Pipeline::new(&generator, &selector, &rules, &dedup)
        .run("resume", &StyleWeights::uniform(), &mut store, &mut rng)
        .await;

    assert!(matches!(report.duplicate, DuplicateStatus::Rerolled { .. }));
    assert_eq!(report.entry.title_text, QUOTED_LINE);
    assert_eq!(generator.hints(), vec![None, None]);
    assert_eq!(store.history().len(), 2);
}

#[tokio::test]
async fn reroll_favours_the_other_style() {
    let generator = FixedGenerator::new(CLEAN_LINE);
    let selector = StyleSelector::new(
        StyleCatalog::new(vec![
            Style::new("a", "first"),
            Style::new("b", "second"),
        ])
        .expect("catalog"),
    );
    let rules = QualityRules::default();
    let dedup = DuplicateGuardConfig::default();
    let weights = StyleWeights::uniform();
    let mut rng = StdRng::seed_from_u64(11);
    let runs = 400;

    for _ in 0..runs {
        let mut store = FingerprintStore::in_memory(dedup.history_size);
        store.append(fingerprint(CLEAN_LINE, dedup.ngram));
        Pipeline::new(&generator, &selector, &rules, &dedup)
            .run("resume", &weights, &mut store, &mut rng)
            .await;
    }

    let styles = generator.styles();
    assert_eq!(styles.len(), runs * 2);
    let switched = styles
        .chunks(2)
        .filter(|pair| pair[0] != pair[1])
        .count();
    // 1 / (1 + 0.35) of rerolls should land on the other style.
    let share = switched as f64 / runs as f64;
    assert!((share - 0.7407).abs() < 0.1, "switched share {}", share);
}

#[tokio::test]
async fn disabled_guard_skips_matching() {
    let generator = FixedGenerator::new(CLEAN_LINE);
    let selector = single_style_selector();
    let rules = QualityRules::default();
    let dedup = DuplicateGuardConfig {
        enabled: false,
        ..DuplicateGuardConfig::default()
    };
    let mut store = FingerprintStore::in_memory(dedup.history_size);
    let mut rng = StdRng::seed_from_u64(12);
    let pipeline = Pipeline::new(&generator, &selector, &rules, &dedup);
    let weights = StyleWeights::uniform();

    let first = pipeline.run("resume", &weights, &mut store, &mut rng).await;
    let second = pipeline.run("resume", &weights, &mut store, &mut rng).await;

    assert_eq!(first.duplicate, DuplicateStatus::Disabled);
    assert_eq!(second.duplicate, DuplicateStatus::Disabled);
    assert_eq!(generator.styles().len(), 2);
}

#[tokio::test]
async fn history_stays_bounded_across_runs() {
    let lines: Vec<String> = (1..=5)
        .map(|n| format!("You can ask for {} extra review slots ✅📌", n))
        .collect();
    let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let generator = ScriptedGenerator::lines(&line_refs);
    let selector = single_style_selector();
    let rules = QualityRules::default();
    let dedup = DuplicateGuardConfig {
        history_size: 3,
        ..DuplicateGuardConfig::default()
    };
    let mut store = FingerprintStore::in_memory(dedup.history_size);
    let mut rng = StdRng::seed_from_u64(13);
    let pipeline = Pipeline::new(&generator, &selector, &rules, &dedup);
    let weights = StyleWeights::uniform();

    let mut reports = Vec::new();
    for _ in 0..5 {
        reports.push(pipeline.run("resume", &weights, &mut store, &mut rng).await);
    }

    assert!(reports
        .iter()
        .all(|report| report.duplicate == DuplicateStatus::Unique));
    assert_eq!(store.history().len(), 3);
    assert!(!store.history().contains_id(&reports[0].fingerprint.id));
    assert!(store.history().contains_id(&reports[4].fingerprint.id));
}

#[tokio::test]
async fn publish_writes_history_and_feed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let history_path = dir.path().join("fingerprints.json");
    let emitter = JsonFeedEmitter::new(dir.path().join("feed.json"), 10);
    let generator = OfflineGenerator::new("no key");
    let selector = single_style_selector();
    let rules = QualityRules::default();
    let dedup = DuplicateGuardConfig::default();
    let mut store = FingerprintStore::load(history_path.clone(), dedup.history_size).await;
    let mut rng = StdRng::seed_from_u64(15);

    let report = Pipeline::new(&generator, &selector, &rules, &dedup)
        .run("resume", &StyleWeights::uniform(), &mut store, &mut rng)
        .await;
    publish(&report.entry, &store, &emitter)
        .await
        .expect("publish");

    let reloaded = FingerprintStore::load(history_path, dedup.history_size).await;
    assert!(reloaded.history().contains_id(&report.fingerprint.id));
    let entries = emitter.entries().await.expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].guid, report.entry.guid);
}

#[tokio::test]
async fn failed_history_write_publishes_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file, not a directory").expect("write");
    let feed_path = dir.path().join("feed.json");
    let emitter = JsonFeedEmitter::new(feed_path.clone(), 10);
    let generator = OfflineGenerator::new("no key");
    let selector = single_style_selector();
    let rules = QualityRules::default();
    let dedup = DuplicateGuardConfig::default();
    let mut store =
        FingerprintStore::load(blocker.join("fingerprints.json"), dedup.history_size).await;
    let mut rng = StdRng::seed_from_u64(16);

    let report = Pipeline::new(&generator, &selector, &rules, &dedup)
        .run("resume", &StyleWeights::uniform(), &mut store, &mut rng)
        .await;
    let result = publish(&report.entry, &store, &emitter).await;

    assert!(matches!(result, Err(PipelineError::Persist { .. })));
    assert!(!feed_path.exists());
}
