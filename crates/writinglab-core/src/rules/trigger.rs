//! Trigger and completion conditions for writing rules.
//!
//! Triggers decide when an inactive rule is revealed; completions decide when
//! an active rule counts as met. Both are plain data so the catalog can be
//! serialized alongside the session.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Condition that promotes a rule from inactive to active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Active as soon as the rule is created.
    Immediate,

    /// Active once the story reaches `min` words.
    WordCount { min: usize },
}

impl Trigger {
    pub fn holds(&self, word_count: usize) -> bool {
        match self {
            Trigger::Immediate => true,
            Trigger::WordCount { min } => word_count >= *min,
        }
    }
}

/// Condition that promotes an active rule to met.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Completion {
    /// Met on length alone; the text itself is never inspected.
    WordCount { min: usize },

    /// Met when the keyword heuristic matches anywhere in the text.
    Pattern { heuristic: Heuristic },
}

impl Completion {
    pub fn is_met(&self, text: &str, word_count: usize) -> bool {
        match self {
            Completion::WordCount { min } => word_count >= *min,
            Completion::Pattern { heuristic } => heuristic.matches(text),
        }
    }
}

/// Keyword families used to guess whether a story element is present.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Heuristic {
    Character,
    Setting,
    Conflict,
    Dialogue,
    Twist,
    Resolution,
}

// ASCII-only word boundaries and letter classes: accented letters are not word
// characters, so "Émile" still yields the name "mile". Case-insensitive, so
// the capitalized-name branch accepts any word of two or more letters.
static CHARACTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i-u)\b(he|she|they|[A-Z][a-z]+)\b").expect("valid regex"));

static SETTING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u)\b(room|house|building|city|morning|night|day|time|place|at the|in the)\b")
        .expect("valid regex")
});

static CONFLICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i-u)\b(problem|trouble|challenge|difficult|struggle|conflict|afraid|worry|tension|obstacle)\b",
    )
    .expect("valid regex")
});

static DIALOGUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["'].*?["']"#).expect("valid regex"));

static TWIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i-u)\b(suddenly|surprise|unexpected|shocked|revealed|twist|turn|changed)\b")
        .expect("valid regex")
});

static RESOLUTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i-u)\b(finally|eventually|resolved|ended|conclusion|decided|realized|understood|learned)\b",
    )
    .expect("valid regex")
});

impl Heuristic {
    pub fn pattern(&self) -> &'static Regex {
        match self {
            Heuristic::Character => &CHARACTER,
            Heuristic::Setting => &SETTING,
            Heuristic::Conflict => &CONFLICT,
            Heuristic::Dialogue => &DIALOGUE,
            Heuristic::Twist => &TWIST,
            Heuristic::Resolution => &RESOLUTION,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern().is_match(text)
    }
}
