pub mod quotes;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::MARKER_RE;

pub use quotes::{contains_unquoted_first_person, strip_quoted, QUOTE_GLYPHS};

static TENSE_CONFLICT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bwhen\s+\w+ing\b.*\bI\b.*\b(?:achieved|led to|delivered|shipped)\b")
        .expect("tense conflict pattern compiles")
});

static SECOND_PERSON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\byour?\b").expect("second person pattern compiles"));

// A percentage or a dollar amount, e.g. "40%" or "$5k".
static QUANTITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d\s?%|\$\s?\d").expect("quantity pattern compiles"));

const QUOTED_TEMPLATE_INTRO: &str = "Use: \"";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityRules {
    pub min_emojis: usize,
    pub require_number_in_title: bool,
    pub enforce_second_person: bool,
    pub allow_first_person_in_quotes_only: bool,
    pub banned_phrases: Vec<String>,
}

impl Default for QualityRules {
    fn default() -> Self {
        Self {
            min_emojis: 2,
            require_number_in_title: false,
            enforce_second_person: false,
            allow_first_person_in_quotes_only: false,
            banned_phrases: Vec::new(),
        }
    }
}

impl QualityRules {
    /// Reads each field on its own; a missing or mistyped field keeps its default.
    pub fn from_value(value: &Value) -> Self {
        let mut rules = Self::default();
        if let Some(min_emojis) = value.get("min_emojis").and_then(Value::as_u64) {
            rules.min_emojis = min_emojis as usize;
        }
        if let Some(flag) = value.get("require_number_in_title").and_then(Value::as_bool) {
            rules.require_number_in_title = flag;
        }
        if let Some(flag) = value.get("enforce_second_person").and_then(Value::as_bool) {
            rules.enforce_second_person = flag;
        }
        if let Some(flag) = value
            .get("allow_first_person_in_quotes_only")
            .and_then(Value::as_bool)
        {
            rules.allow_first_person_in_quotes_only = flag;
        }
        if let Some(phrases) = value.get("banned_phrases").and_then(Value::as_array) {
            for phrase in phrases.iter().filter_map(Value::as_str) {
                let phrase = phrase.trim();
                if phrase.is_empty() || rules.banned_phrases.iter().any(|p| p == phrase) {
                    continue;
                }
                rules.banned_phrases.push(phrase.to_string());
            }
        }
        rules
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    DialogueOrMeta,
    BannedPhrase,
    TenseConflict,
    MissingSecondPerson,
    UnquotedFirstPerson,
    MissingNumber,
}

impl RejectReason {
    pub fn code(self) -> &'static str {
        match self {
            RejectReason::DialogueOrMeta => "dialogue_or_meta",
            RejectReason::BannedPhrase => "banned_phrase",
            RejectReason::TenseConflict => "tense_conflict",
            RejectReason::MissingSecondPerson => "missing_second_person",
            RejectReason::UnquotedFirstPerson => "unquoted_first_person",
            RejectReason::MissingNumber => "missing_number",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    pub fn reason(self) -> Option<RejectReason> {
        match self {
            Verdict::Accepted => None,
            Verdict::Rejected(reason) => Some(reason),
        }
    }
}

pub struct QualityRule {
    pub reason: RejectReason,
    passes: fn(&str, &QualityRules) -> bool,
}

impl QualityRule {
    pub fn passes(&self, text: &str, rules: &QualityRules) -> bool {
        (self.passes)(text, rules)
    }
}

/// Evaluation order is significant: the first failing rule names the rejection.
pub const QUALITY_RULES: [QualityRule; 6] = [
    QualityRule {
        reason: RejectReason::DialogueOrMeta,
        passes: no_dialogue_or_meta,
    },
    QualityRule {
        reason: RejectReason::BannedPhrase,
        passes: no_banned_phrase,
    },
    QualityRule {
        reason: RejectReason::TenseConflict,
        passes: no_tense_conflict,
    },
    QualityRule {
        reason: RejectReason::MissingSecondPerson,
        passes: has_second_person,
    },
    QualityRule {
        reason: RejectReason::UnquotedFirstPerson,
        passes: first_person_only_in_quotes,
    },
    QualityRule {
        reason: RejectReason::MissingNumber,
        passes: has_number,
    },
];

pub fn evaluate(text: &str, rules: &QualityRules) -> Verdict {
    QUALITY_RULES
        .iter()
        .find(|rule| !rule.passes(text, rules))
        .map_or(Verdict::Accepted, |rule| Verdict::Rejected(rule.reason))
}

pub fn has_banned_phrase(text: &str, phrases: &[String]) -> bool {
    let lowered = text.to_lowercase();
    phrases
        .iter()
        .map(|phrase| phrase.trim().to_lowercase())
        .filter(|phrase| !phrase.is_empty())
        .any(|phrase| lowered.contains(&phrase))
}

fn no_dialogue_or_meta(text: &str, _rules: &QualityRules) -> bool {
    !MARKER_RE.is_match(text)
}

fn no_banned_phrase(text: &str, rules: &QualityRules) -> bool {
    !has_banned_phrase(text, &rules.banned_phrases)
}

fn no_tense_conflict(text: &str, _rules: &QualityRules) -> bool {
    !TENSE_CONFLICT_RE.is_match(text)
}

fn has_second_person(text: &str, rules: &QualityRules) -> bool {
    if !rules.enforce_second_person {
        return true;
    }
    SECOND_PERSON_RE.is_match(text) || text.contains(QUOTED_TEMPLATE_INTRO)
}

fn first_person_only_in_quotes(text: &str, rules: &QualityRules) -> bool {
    if !rules.allow_first_person_in_quotes_only {
        return true;
    }
    !contains_unquoted_first_person(text)
}

fn has_number(text: &str, rules: &QualityRules) -> bool {
    if !rules.require_number_in_title {
        return true;
    }
    QUANTITY_RE.is_match(text)
}
