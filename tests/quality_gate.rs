use post_forge::quality::{
    contains_unquoted_first_person, evaluate, has_banned_phrase, strip_quoted, QualityRules,
    RejectReason, Verdict, QUALITY_RULES,
};
use serde_json::json;

fn rules() -> QualityRules {
    QualityRules::default()
}

fn quotes_only() -> QualityRules {
    QualityRules {
        allow_first_person_in_quotes_only: true,
        ..QualityRules::default()
    }
}

fn second_person() -> QualityRules {
    QualityRules {
        enforce_second_person: true,
        ..QualityRules::default()
    }
}

#[test]
fn rejects_dialogue_markers() {
    let lines = [
        "You: send me your resume. Them: okay!",
        "Q: What should I do? A: Apply now!",
        "\"You: tell me more\u{201D}",
        "\u{201C}Them: here it is\u{201D}",
    ];

    for line in lines {
        assert_eq!(
            evaluate(line, &rules()),
            Verdict::Rejected(RejectReason::DialogueOrMeta),
            "{}",
            line
        );
    }
}

#[test]
fn rejects_meta_references() {
    for line in ["Check the details in this thread", "See below for more info"] {
        assert_eq!(
            evaluate(line, &rules()),
            Verdict::Rejected(RejectReason::DialogueOrMeta),
            "{}",
            line
        );
    }
}

#[test]
fn rejects_banned_phrases_case_insensitively() {
    let mut rules = rules();
    rules.banned_phrases = vec![
        "click here".to_string(),
        "amazing opportunity".to_string(),
        "game changer".to_string(),
    ];

    assert_eq!(
        evaluate("This is an Amazing Opportunity for your career!", &rules),
        Verdict::Rejected(RejectReason::BannedPhrase)
    );
    assert!(has_banned_phrase("Click Here for more info", &rules.banned_phrases));
    assert!(!has_banned_phrase("Focus on metrics and outcomes", &rules.banned_phrases));
}

#[test]
fn blank_banned_phrase_matches_nothing() {
    let phrases = vec!["   ".to_string()];
    assert!(!has_banned_phrase("Anything at all", &phrases));
}

#[test]
fn rejects_tense_conflict() {
    let lines = [
        "When pitching to investors, I achieved a 50% close rate.",
        "When negotiating salary, I delivered strong results.",
        "when shipping v2 I finally shipped on time",
    ];

    for line in lines {
        assert_eq!(
            evaluate(line, &rules()),
            Verdict::Rejected(RejectReason::TenseConflict),
            "{}",
            line
        );
    }
}

#[test]
fn accepts_clean_second_person() {
    let lines = [
        "You can improve your resume by adding metrics.",
        "Your pitch should lead with outcomes.",
        "Focus on what you achieved in numbers.",
    ];

    for line in lines {
        assert_eq!(evaluate(line, &second_person()), Verdict::Accepted, "{}", line);
    }
}

#[test]
fn rejects_missing_second_person_when_enforced() {
    assert_eq!(
        evaluate("The resume should have metrics and achievements.", &second_person()),
        Verdict::Rejected(RejectReason::MissingSecondPerson)
    );
    assert_eq!(
        evaluate("Youth programs need mentors.", &second_person()),
        Verdict::Rejected(RejectReason::MissingSecondPerson)
    );
    assert_eq!(
        evaluate("The resume should have metrics and achievements.", &rules()),
        Verdict::Accepted
    );
}

#[test]
fn quoted_template_intro_counts_as_second_person() {
    assert_eq!(
        evaluate("Use: \"Grew revenue 25% in 2 quarters.\"", &second_person()),
        Verdict::Accepted
    );
}

#[test]
fn quoted_first_person_is_exempt() {
    assert_eq!(
        evaluate("Use: \"I achieved 20% growth.\"", &quotes_only()),
        Verdict::Accepted
    );
    assert_eq!(
        evaluate("Use: \"I improved revenue by 25% through automation.\"", &quotes_only()),
        Verdict::Accepted
    );
}

#[test]
fn unquoted_first_person_is_rejected() {
    assert_eq!(
        evaluate("I think you should improve your resume.", &quotes_only()),
        Verdict::Rejected(RejectReason::UnquotedFirstPerson)
    );
    assert_eq!(
        evaluate("I think you should improve your resume.", &rules()),
        Verdict::Accepted
    );
}

#[test]
fn number_rule_only_applies_when_enabled() {
    let mut rules = rules();
    assert_eq!(evaluate("Ship your resume today.", &rules), Verdict::Accepted);

    rules.require_number_in_title = true;
    assert_eq!(
        evaluate("Ship your resume today.", &rules),
        Verdict::Rejected(RejectReason::MissingNumber)
    );
    assert_eq!(
        evaluate("Cut screening time 40% this week.", &rules),
        Verdict::Accepted
    );
}

#[test]
fn number_rule_wants_a_percent_or_dollar_figure() {
    let rules = QualityRules {
        require_number_in_title: true,
        ..QualityRules::default()
    };

    assert_eq!(
        evaluate("Ship 3 resume versions today.", &rules),
        Verdict::Rejected(RejectReason::MissingNumber)
    );
    assert_eq!(evaluate("Ask for $5k more.", &rules), Verdict::Accepted);
    assert_eq!(evaluate("Grow pipeline 25 % faster.", &rules), Verdict::Accepted);
}

#[test]
fn first_failing_rule_names_the_rejection() {
    let mut rules = quotes_only();
    rules.banned_phrases = vec!["click here".to_string()];

    assert_eq!(
        evaluate("You: click here", &rules),
        Verdict::Rejected(RejectReason::DialogueOrMeta)
    );
    assert_eq!(
        evaluate("When pitching, I shipped it. click here", &rules),
        Verdict::Rejected(RejectReason::BannedPhrase)
    );
    assert_eq!(
        evaluate("When pitching, I shipped it", &rules),
        Verdict::Rejected(RejectReason::TenseConflict)
    );
}

#[test]
fn rule_table_order_is_fixed() {
    let order: Vec<&str> = QUALITY_RULES.iter().map(|rule| rule.reason.code()).collect();
    assert_eq!(
        order,
        vec![
            "dialogue_or_meta",
            "banned_phrase",
            "tense_conflict",
            "missing_second_person",
            "unquoted_first_person",
            "missing_number",
        ]
    );
}

#[test]
fn detects_unquoted_first_person() {
    assert!(contains_unquoted_first_person("I think this is good"));
    assert!(contains_unquoted_first_person("When I was working there"));
    assert!(contains_unquoted_first_person("Did I mention that?"));
}

#[test]
fn ignores_quoted_first_person() {
    assert!(!contains_unquoted_first_person("\"I improved metrics by 20%\""));
    assert!(!contains_unquoted_first_person("Use: 'I achieved great results'"));
    assert!(!contains_unquoted_first_person("Template: \"I led the team\""));
    assert!(!contains_unquoted_first_person(
        "Template: \u{201C}I led the team\u{201D}"
    ));
}

#[test]
fn detects_first_person_next_to_quotes() {
    assert!(contains_unquoted_first_person(
        "I think you should say \"I improved X\""
    ));
    assert!(contains_unquoted_first_person("\"I did this\" but I also did that"));
}

#[test]
fn odd_quote_glyph_hides_the_remainder() {
    assert!(!contains_unquoted_first_person("Here's the move I use"));
}

#[test]
fn strip_quoted_drops_spans_and_glyphs() {
    let remainder = strip_quoted("say \u{201C}I improved X\u{201D} now");
    assert!(!remainder.contains("improved"));
    assert!(remainder.starts_with("say"));
    assert!(remainder.ends_with("now"));
}

#[test]
fn rules_parse_each_field_leniently() {
    let value = json!({
        "min_emojis": "three",
        "enforce_second_person": true,
        "allow_first_person_in_quotes_only": "yes",
        "banned_phrases": ["click here", "", 5, "click here", " game changer "]
    });

    let rules = QualityRules::from_value(&value);

    assert_eq!(rules.min_emojis, 2);
    assert!(rules.enforce_second_person);
    assert!(!rules.allow_first_person_in_quotes_only);
    assert!(!rules.require_number_in_title);
    assert_eq!(
        rules.banned_phrases,
        vec!["click here".to_string(), "game changer".to_string()]
    );
}

#[test]
fn reject_reasons_render_as_codes() {
    assert_eq!(RejectReason::DialogueOrMeta.to_string(), "dialogue_or_meta");
    assert_eq!(
        Verdict::Rejected(RejectReason::UnquotedFirstPerson).reason(),
        Some(RejectReason::UnquotedFirstPerson)
    );
    assert!(Verdict::Accepted.is_accepted());
}
