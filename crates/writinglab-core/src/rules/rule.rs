//! Rule definition for the rule engine.
//!
//! A rule is one progression checkpoint: a prompt the writer is nudged
//! toward, with a trigger, a completion check and a lifecycle state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Completion, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Must be met before the story can be submitted.
    Required,
    /// May be skipped by the writer.
    Optional,
}

/// Lifecycle of a rule: `Inactive -> Active -> (Met | Skipped)`.
///
/// `Met` and `Skipped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleState {
    Inactive,
    Active,
    Met,
    Skipped,
}

impl RuleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RuleState::Met | RuleState::Skipped)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleState::Inactive => "inactive",
            RuleState::Active => "active",
            RuleState::Met => "met",
            RuleState::Skipped => "skipped",
        }
    }
}

impl fmt::Display for RuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A writing rule with its trigger and completion heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identifier, unique within a catalog
    pub id: String,

    /// Short prompt shown to the writer
    pub title: String,

    /// Longer explanation of the prompt
    pub description: String,

    #[serde(rename = "type")]
    pub kind: RuleKind,

    pub state: RuleState,

    /// Condition that reveals the rule
    pub trigger: Trigger,

    /// Condition that marks the rule as met
    pub completion: Completion,
}

impl Rule {
    /// Build a rule in its initial state: `Active` for immediate triggers,
    /// `Inactive` otherwise.
    pub fn new(
        id: &str,
        title: &str,
        description: &str,
        kind: RuleKind,
        trigger: Trigger,
        completion: Completion,
    ) -> Self {
        let state = match trigger {
            Trigger::Immediate => RuleState::Active,
            Trigger::WordCount { .. } => RuleState::Inactive,
        };
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            kind,
            state,
            trigger,
            completion,
        }
    }

    pub fn is_required(&self) -> bool {
        self.kind == RuleKind::Required
    }

    /// Whether the writer can skip this rule right now.
    pub fn can_skip(&self) -> bool {
        self.kind == RuleKind::Optional && self.state == RuleState::Active
    }

    /// Promote `Inactive` to `Active` if the trigger holds.
    pub(crate) fn try_activate(&mut self, word_count: usize) -> bool {
        if self.state == RuleState::Inactive && self.trigger.holds(word_count) {
            self.state = RuleState::Active;
            return true;
        }
        false
    }

    /// Promote `Active` to `Met` if the completion heuristic holds.
    pub(crate) fn try_complete(&mut self, text: &str, word_count: usize) -> bool {
        if self.state == RuleState::Active && self.completion.is_met(text, word_count) {
            self.state = RuleState::Met;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Heuristic;

    fn dialog_rule() -> Rule {
        Rule::new(
            "dialog",
            "Include some dialogue",
            "Let your characters speak",
            RuleKind::Optional,
            Trigger::WordCount { min: 100 },
            Completion::Pattern {
                heuristic: Heuristic::Dialogue,
            },
        )
    }

    #[test]
    fn immediate_rules_start_active() {
        let rule = Rule::new(
            "intro",
            "Begin",
            "",
            RuleKind::Required,
            Trigger::Immediate,
            Completion::WordCount { min: 20 },
        );
        assert_eq!(rule.state, RuleState::Active);
        assert!(!rule.can_skip());
    }

    #[test]
    fn word_count_rules_start_inactive() {
        let mut rule = dialog_rule();
        assert_eq!(rule.state, RuleState::Inactive);
        assert!(!rule.can_skip());
        assert!(!rule.try_complete(r#""hi""#, 500));

        assert!(rule.try_activate(100));
        assert!(rule.can_skip());
        assert!(!rule.try_activate(100));
    }

    #[test]
    fn met_is_absorbing() {
        let mut rule = dialog_rule();
        rule.try_activate(120);
        assert!(rule.try_complete(r#"She said "go""#, 120));
        assert_eq!(rule.state, RuleState::Met);
        assert!(!rule.try_complete(r#"She said "go""#, 120));
        assert!(!rule.try_activate(0));
        assert_eq!(rule.state, RuleState::Met);
    }

    #[test]
    fn rule_serializes_kind_as_type() {
        let json = serde_json::to_value(dialog_rule()).unwrap();
        assert_eq!(json["type"], "optional");
        assert_eq!(json["state"], "inactive");
        assert_eq!(json["trigger"]["min"], 100);
        assert_eq!(json["completion"]["heuristic"], "dialogue");
    }
}
