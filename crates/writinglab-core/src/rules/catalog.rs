//! The built-in rule catalog.
//!
//! Order matters: it is both the display order and the order in which rules
//! are evaluated and reported.

use super::{Completion, Heuristic, Rule, RuleKind, Trigger};

pub const INTRO: &str = "intro";
pub const CHARACTER: &str = "character";
pub const SETTING: &str = "setting";
pub const CONFLICT: &str = "conflict";
pub const DIALOG: &str = "dialog";
pub const TWIST: &str = "twist";
pub const RESOLUTION: &str = "resolution";

fn pattern(heuristic: Heuristic) -> Completion {
    Completion::Pattern { heuristic }
}

/// A fresh copy of the catalog, every rule in its initial state.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            INTRO,
            "Begin with an intriguing opening",
            "Start your story with something that immediately hooks the reader",
            RuleKind::Required,
            Trigger::Immediate,
            Completion::WordCount { min: 20 },
        ),
        Rule::new(
            CHARACTER,
            "Introduce a main character",
            "Create a character with a clear desire or motivation",
            RuleKind::Required,
            Trigger::Immediate,
            pattern(Heuristic::Character),
        ),
        Rule::new(
            SETTING,
            "Establish a vivid setting",
            "Describe where and when your story takes place",
            RuleKind::Required,
            Trigger::Immediate,
            pattern(Heuristic::Setting),
        ),
        Rule::new(
            CONFLICT,
            "Introduce a conflict",
            "Add tension or an obstacle for your character to overcome",
            RuleKind::Required,
            Trigger::WordCount { min: 50 },
            pattern(Heuristic::Conflict),
        ),
        Rule::new(
            DIALOG,
            "Include some dialogue",
            "Let your characters speak to reveal more about them",
            RuleKind::Optional,
            Trigger::WordCount { min: 100 },
            pattern(Heuristic::Dialogue),
        ),
        Rule::new(
            TWIST,
            "Add an unexpected element",
            "Surprise the reader with something they didn't see coming",
            RuleKind::Optional,
            Trigger::WordCount { min: 150 },
            pattern(Heuristic::Twist),
        ),
        Rule::new(
            RESOLUTION,
            "Work toward a resolution",
            "Begin wrapping up the story elements you've introduced",
            RuleKind::Required,
            Trigger::WordCount { min: 200 },
            pattern(Heuristic::Resolution),
        ),
    ]
}

/// Number of whitespace-separated words; blank text counts as zero.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleState;

    #[test]
    fn catalog_order_and_kinds() {
        let rules = default_rules();
        let ids: Vec<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![INTRO, CHARACTER, SETTING, CONFLICT, DIALOG, TWIST, RESOLUTION]
        );

        let optional: Vec<&str> = rules
            .iter()
            .filter(|r| !r.is_required())
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(optional, vec![DIALOG, TWIST]);
    }

    #[test]
    fn only_immediate_rules_start_active() {
        let active: Vec<String> = default_rules()
            .into_iter()
            .filter(|r| r.state == RuleState::Active)
            .map(|r| r.id)
            .collect();
        assert_eq!(active, vec![INTRO, CHARACTER, SETTING]);
    }

    #[test]
    fn word_count_splits_on_whitespace_runs() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("   \n\t "), 0);
        assert_eq!(word_count("one"), 1);
        assert_eq!(word_count("  one   two\nthree\t four  "), 4);
    }
}
