//! Progressive writing rules.
//!
//! Rules are revealed by word-count triggers and marked met by keyword
//! heuristics over the story text.

pub mod catalog;
pub mod engine;
pub mod rule;
pub mod trigger;

pub use catalog::{default_rules, word_count};
pub use engine::{Evaluation, RuleEngine, RuleTransition};
pub use rule::{Rule, RuleKind, RuleState};
pub use trigger::{Completion, Heuristic, Trigger};
