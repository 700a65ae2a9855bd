use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Answers to the post-submission questions, keyed by question.
pub type FormResponses = BTreeMap<String, String>;

/// Sentinel recorded when a paste carried no readable clipboard data.
pub const UNKNOWN_PASTE_CONTENT: &str = "unknown content";

/// Every observable step of a writing session produces an Event.
///
/// Serialized flat, the way the session document stores it:
/// `{"type": "rule_met", "timestamp": "...", "ruleId": "intro"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EventKind {
    SessionStarted,
    /// A debounced burst of typing.
    Typed {
        content: String,
    },
    Deleted {
        key: String,
    },
    Pasted {
        content: String,
    },
    /// Gap since the previous committed event, in milliseconds.
    Paused {
        duration: u64,
    },
    RuleActivated {
        rule_id: String,
    },
    RuleMet {
        rule_id: String,
    },
    RuleSkipped {
        rule_id: String,
    },
    StorySubmitted {
        word_count: usize,
    },
    FeedbackSubmitted {
        #[serde(flatten)]
        responses: FormResponses,
    },
    /// Length of the restored draft in characters.
    DraftLoaded {
        length: usize,
    },
    SessionExported,
}

impl Event {
    pub fn new(kind: EventKind, timestamp: DateTime<Utc>) -> Self {
        Self { timestamp, kind }
    }

    /// The `type` tag as written to the document.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            EventKind::SessionStarted => "session_started",
            EventKind::Typed { .. } => "typed",
            EventKind::Deleted { .. } => "deleted",
            EventKind::Pasted { .. } => "pasted",
            EventKind::Paused { .. } => "paused",
            EventKind::RuleActivated { .. } => "rule_activated",
            EventKind::RuleMet { .. } => "rule_met",
            EventKind::RuleSkipped { .. } => "rule_skipped",
            EventKind::StorySubmitted { .. } => "story_submitted",
            EventKind::FeedbackSubmitted { .. } => "feedback_submitted",
            EventKind::DraftLoaded { .. } => "draft_loaded",
            EventKind::SessionExported => "session_exported",
        }
    }
}

/// Append-only, chronologically ordered event log.
///
/// There is no way to edit or remove an entry once pushed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        tracing::debug!(event_type = event.type_name(), "event logged");
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Events whose `type` tag equals `type_name`, in log order.
    pub fn of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.type_name() == type_name)
    }
}

impl<'a> IntoIterator for &'a EventLog {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_event_serializes_flat_with_camel_case_fields() {
        let event = Event::new(
            EventKind::RuleMet {
                rule_id: "intro".to_string(),
            },
            Utc::now(),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "rule_met");
        assert_eq!(json["ruleId"], "intro");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn feedback_responses_are_spread_into_the_event() {
        let mut responses = FormResponses::new();
        responses.insert("emotionalResponse".into(), "proud".into());
        responses.insert("influentialRule".into(), "twist".into());
        let event = Event::new(EventKind::FeedbackSubmitted { responses }, Utc::now());

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "feedback_submitted");
        assert_eq!(json["emotionalResponse"], "proud");
        assert_eq!(json["influentialRule"], "twist");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn paused_event_roundtrip() {
        let event = Event::new(EventKind::Paused { duration: 4200 }, Utc::now());
        let text = serde_json::to_string(&event).unwrap();
        assert!(text.contains(r#""duration":4200"#));
        let back: Event = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn log_filters_by_type() {
        let mut log = EventLog::new();
        let now = Utc::now();
        log.push(Event::new(EventKind::SessionStarted, now));
        log.push(Event::new(EventKind::Typed { content: "a".into() }, now));
        log.push(Event::new(EventKind::Typed { content: "b".into() }, now));

        assert_eq!(log.len(), 3);
        assert_eq!(log.of_type("typed").count(), 2);
        assert_eq!(log.last().map(Event::type_name), Some("typed"));
    }
}
