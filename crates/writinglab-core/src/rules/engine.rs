//! Rule evaluation engine.
//!
//! Advances rule states against the current text and reports what changed.
//! The engine never logs; the session turns transitions into events.

use serde::{Deserialize, Serialize};

use super::{catalog, Rule, RuleState};
use crate::error::RuleError;

/// A single state change produced by evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTransition {
    Activated(String),
    Met(String),
}

impl RuleTransition {
    pub fn rule_id(&self) -> &str {
        match self {
            RuleTransition::Activated(id) | RuleTransition::Met(id) => id,
        }
    }
}

/// Outcome of one evaluation pass, in the order the changes happened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    pub transitions: Vec<RuleTransition>,
}

impl Evaluation {
    pub fn activated(&self) -> Vec<&str> {
        self.transitions
            .iter()
            .filter_map(|t| match t {
                RuleTransition::Activated(id) => Some(id.as_str()),
                RuleTransition::Met(_) => None,
            })
            .collect()
    }

    pub fn completed(&self) -> Vec<&str> {
        self.transitions
            .iter()
            .filter_map(|t| match t {
                RuleTransition::Met(id) => Some(id.as_str()),
                RuleTransition::Activated(_) => None,
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}

/// Ordered rule collection and its state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleEngine {
    rules: Vec<Rule>,
}

impl RuleEngine {
    /// Engine loaded with the built-in catalog.
    pub fn new() -> Self {
        Self::with_rules(catalog::default_rules())
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn state_of(&self, id: &str) -> Option<RuleState> {
        self.get(id).map(|r| r.state)
    }

    /// Rules the writer can see: everything no longer inactive.
    pub fn visible(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.state != RuleState::Inactive)
    }

    /// Rules that are met or skipped.
    pub fn resolved(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.state.is_terminal())
    }

    /// Advance every non-terminal rule against `text`.
    ///
    /// Each rule is activated and then checked for completion before moving
    /// on, so a rule can go from inactive to met in a single pass.
    pub fn evaluate(&mut self, text: &str, word_count: usize) -> Evaluation {
        let mut evaluation = Evaluation::default();

        for rule in self.rules.iter_mut().filter(|r| !r.state.is_terminal()) {
            if rule.try_activate(word_count) {
                evaluation
                    .transitions
                    .push(RuleTransition::Activated(rule.id.clone()));
            }
            if rule.try_complete(text, word_count) {
                evaluation.transitions.push(RuleTransition::Met(rule.id.clone()));
            }
        }

        evaluation
    }

    /// Skip an active optional rule.
    pub fn skip(&mut self, id: &str) -> Result<(), RuleError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RuleError::UnknownRule(id.to_string()))?;

        if rule.is_required() {
            return Err(RuleError::RequiredRule(id.to_string()));
        }
        if rule.state != RuleState::Active {
            return Err(RuleError::NotActive {
                id: id.to_string(),
                state: rule.state.to_string(),
            });
        }

        rule.state = RuleState::Skipped;
        Ok(())
    }

    /// Required rules not yet met, in catalog order.
    pub fn unmet_required(&self) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| r.is_required() && r.state != RuleState::Met)
            .collect()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}
