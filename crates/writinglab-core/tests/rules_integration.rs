//! Integration tests for rule progression.
//!
//! These drive the rule engine through whole stories rather than single
//! transitions.

use proptest::prelude::*;
use writinglab_core::rules::{catalog, word_count};
use writinglab_core::{RuleEngine, RuleError, RuleState};

const SCENARIO: &str = "Once upon a time in a quiet room, Anna faced a difficult \
problem she never expected, and she finally resolved it.";

fn evaluate(engine: &mut RuleEngine, text: &str) {
    engine.evaluate(text, word_count(text));
}

fn padded(words: usize, tail: &str) -> String {
    let mut text = vec!["lorem"; words].join(" ");
    if !tail.is_empty() {
        text.push(' ');
        text.push_str(tail);
    }
    text
}

#[test]
fn scenario_text_meets_the_opening_rules() {
    let mut engine = RuleEngine::new();
    assert_eq!(word_count(SCENARIO), 21);

    evaluate(&mut engine, SCENARIO);
    assert_eq!(engine.state_of(catalog::INTRO), Some(RuleState::Met));
    assert_eq!(engine.state_of(catalog::CHARACTER), Some(RuleState::Met));
    assert_eq!(engine.state_of(catalog::SETTING), Some(RuleState::Met));
    assert_eq!(engine.state_of(catalog::CONFLICT), Some(RuleState::Inactive));
    assert_eq!(engine.state_of(catalog::RESOLUTION), Some(RuleState::Inactive));
}

#[test]
fn scenario_keywords_complete_later_rules_once_revealed() {
    let mut engine = RuleEngine::new();
    let text = padded(200, &format!("{SCENARIO} Suddenly everything changed."));
    evaluate(&mut engine, &text);

    assert_eq!(engine.state_of(catalog::CONFLICT), Some(RuleState::Met));
    assert_eq!(engine.state_of(catalog::TWIST), Some(RuleState::Met));
    assert_eq!(engine.state_of(catalog::RESOLUTION), Some(RuleState::Met));
    assert_eq!(engine.state_of(catalog::DIALOG), Some(RuleState::Active));
    assert!(engine.unmet_required().is_empty());
}

#[test]
fn full_story_progression() {
    let mut engine = RuleEngine::new();

    evaluate(&mut engine, "At night she walked home.");
    assert_eq!(engine.visible().count(), 3);

    evaluate(&mut engine, &padded(60, "She was afraid."));
    assert_eq!(engine.state_of(catalog::CONFLICT), Some(RuleState::Met));
    assert_eq!(engine.visible().count(), 4);

    evaluate(&mut engine, &padded(120, ""));
    assert_eq!(engine.state_of(catalog::DIALOG), Some(RuleState::Active));
    engine.skip(catalog::DIALOG).unwrap();

    evaluate(&mut engine, &padded(160, "\"Hello,\" he said."));
    assert_eq!(engine.state_of(catalog::DIALOG), Some(RuleState::Skipped));
    assert_eq!(engine.state_of(catalog::TWIST), Some(RuleState::Active));

    evaluate(&mut engine, &padded(210, ""));
    let unmet: Vec<&str> = engine
        .unmet_required()
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(unmet, vec![catalog::RESOLUTION]);

    evaluate(&mut engine, &padded(210, "They learned to live with it."));
    assert!(engine.unmet_required().is_empty());
    assert_eq!(engine.resolved().count(), 6);
}

#[test]
fn skipping_is_only_for_active_optional_rules() {
    let mut engine = RuleEngine::new();
    let before = engine.clone();

    assert_eq!(
        engine.skip(catalog::CONFLICT),
        Err(RuleError::RequiredRule(catalog::CONFLICT.to_string()))
    );
    assert!(matches!(
        engine.skip(catalog::TWIST),
        Err(RuleError::NotActive { .. })
    ));
    assert_eq!(
        engine.skip("epilogue"),
        Err(RuleError::UnknownRule("epilogue".to_string()))
    );
    assert_eq!(engine, before);
}

proptest! {
    #[test]
    fn short_texts_never_meet_intro(words in proptest::collection::vec("[a-zA-Z]{1,8}", 0..20)) {
        let text = words.join(" ");
        let mut engine = RuleEngine::new();
        evaluate(&mut engine, &text);
        prop_assert_eq!(engine.state_of(catalog::INTRO), Some(RuleState::Active));
    }

    #[test]
    fn met_rules_stay_met(extra in "[a-z ]{0,200}") {
        let mut engine = RuleEngine::new();
        evaluate(&mut engine, &padded(200, "In the end she finally resolved the problem."));
        prop_assert_eq!(engine.state_of(catalog::RESOLUTION), Some(RuleState::Met));

        // Later edits can remove every keyword; states never go backwards.
        evaluate(&mut engine, &extra);
        prop_assert_eq!(engine.state_of(catalog::RESOLUTION), Some(RuleState::Met));
        prop_assert_eq!(engine.state_of(catalog::CONFLICT), Some(RuleState::Met));
        prop_assert_eq!(engine.state_of(catalog::INTRO), Some(RuleState::Met));
    }

    #[test]
    fn long_texts_without_keywords_leave_resolution_active(n in 200usize..400) {
        let mut engine = RuleEngine::new();
        evaluate(&mut engine, &padded(n, ""));
        prop_assert_eq!(engine.state_of(catalog::RESOLUTION), Some(RuleState::Active));
    }
}
