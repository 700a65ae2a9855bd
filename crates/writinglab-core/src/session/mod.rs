//! Writing session state and lifecycle.
//!
//! ## State Transitions
//!
//! ```text
//! Drafting -> AwaitingFeedback -> Completed
//!     ^_____________ reset (new session) ______|
//! ```
//!
//! The session owns its event log and rule engine. Every mutation goes
//! through a method here, and each method validates before it changes
//! anything, so a rejected call leaves the session as it was.

mod record;

pub use record::{ExportDocument, SessionRecord};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PersistError, SessionError, ValidationError};
use crate::events::{Event, EventKind, EventLog, FormResponses};
use crate::ids::SessionId;
use crate::rules::{word_count, Evaluation, RuleEngine, RuleTransition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Text is editable and rules are live.
    Drafting,
    /// Story submitted; waiting for the feedback form to be saved.
    AwaitingFeedback,
    /// Feedback persisted.
    Completed,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPhase::Drafting => "drafting",
            SessionPhase::AwaitingFeedback => "awaiting feedback",
            SessionPhase::Completed => "completed",
        })
    }
}

/// One writing attempt.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    started_at: DateTime<Utc>,
    events: EventLog,
    rules: RuleEngine,
    current_text: String,
    final_story: String,
    form_responses: FormResponses,
    phase: SessionPhase,
    feedback_in_flight: bool,
}

impl Session {
    /// Create a session with a fresh rule catalog and log `session_started`.
    pub fn start(id: SessionId, now: DateTime<Utc>) -> Self {
        let mut session = Self {
            id,
            started_at: now,
            events: EventLog::new(),
            rules: RuleEngine::new(),
            current_text: String::new(),
            final_story: String::new(),
            form_responses: FormResponses::new(),
            phase: SessionPhase::Drafting,
            feedback_in_flight: false,
        };
        session.log(EventKind::SessionStarted, now);
        session
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.current_text)
    }

    pub fn final_story(&self) -> &str {
        &self.final_story
    }

    pub fn form_responses(&self) -> &FormResponses {
        &self.form_responses
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_feedback_in_flight(&self) -> bool {
        self.feedback_in_flight
    }

    /// Snapshot of everything that gets persisted.
    pub fn record(&self) -> SessionRecord {
        SessionRecord {
            session_id: self.id.clone(),
            started_at: self.started_at,
            events: self.events.clone(),
            rules: self.rules.rules().to_vec(),
            final_story: self.final_story.clone(),
            form_responses: self.form_responses.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub(crate) fn log(&mut self, kind: EventKind, now: DateTime<Utc>) {
        self.events.push(Event::new(kind, now));
    }

    /// Replace the writing-area contents.
    pub fn set_text(&mut self, text: &str) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::Drafting, "edit the story")?;
        self.current_text.clear();
        self.current_text.push_str(text);
        Ok(())
    }

    /// Run the rule engine over the current text and log what changed.
    ///
    /// Rules are frozen once the story is submitted; outside drafting this
    /// is a no-op.
    pub fn evaluate_rules(&mut self, now: DateTime<Utc>) -> Evaluation {
        if self.phase != SessionPhase::Drafting {
            return Evaluation::default();
        }

        let count = word_count(&self.current_text);
        let evaluation = self.rules.evaluate(&self.current_text, count);
        for transition in &evaluation.transitions {
            let kind = match transition {
                RuleTransition::Activated(id) => EventKind::RuleActivated {
                    rule_id: id.clone(),
                },
                RuleTransition::Met(id) => EventKind::RuleMet {
                    rule_id: id.clone(),
                },
            };
            self.events.push(Event::new(kind, now));
        }
        evaluation
    }

    /// Load saved draft text, evaluate rules against it and log `draft_loaded`.
    pub fn restore_draft(
        &mut self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Evaluation, SessionError> {
        self.set_text(text)?;
        let evaluation = self.evaluate_rules(now);
        self.log(
            EventKind::DraftLoaded {
                length: text.chars().count(),
            },
            now,
        );
        Ok(evaluation)
    }

    pub fn skip_rule(&mut self, rule_id: &str, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.require_phase(SessionPhase::Drafting, "skip a rule")?;
        self.rules.skip(rule_id)?;
        self.log(
            EventKind::RuleSkipped {
                rule_id: rule_id.to_string(),
            },
            now,
        );
        Ok(())
    }

    /// Validate and freeze the story. Returns its word count.
    ///
    /// # Errors
    /// `Validation` for blank text, `IncompleteRequiredRules` naming every
    /// unmet required rule in catalog order.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<usize, SessionError> {
        self.require_phase(SessionPhase::Drafting, "submit the story")?;

        let story = self.current_text.trim();
        if story.is_empty() {
            return Err(ValidationError::EmptyStory.into());
        }

        let unmet = self.rules.unmet_required();
        if !unmet.is_empty() {
            return Err(SessionError::IncompleteRequiredRules {
                titles: unmet.iter().map(|r| r.title.clone()).collect(),
            });
        }

        self.final_story = story.to_string();
        let count = word_count(&self.current_text);
        self.log(EventKind::StorySubmitted { word_count: count }, now);
        self.phase = SessionPhase::AwaitingFeedback;
        Ok(count)
    }

    /// Record feedback answers and mark a save as in flight.
    ///
    /// Returns the record to hand to the persistence gateway. A second call
    /// before [`finish_feedback`](Self::finish_feedback) is rejected without
    /// logging anything.
    pub fn begin_feedback(
        &mut self,
        responses: FormResponses,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, SessionError> {
        if self.feedback_in_flight {
            return Err(SessionError::FeedbackInFlight);
        }
        self.require_phase(SessionPhase::AwaitingFeedback, "submit feedback")?;

        self.feedback_in_flight = true;
        self.form_responses = responses.clone();
        self.log(EventKind::FeedbackSubmitted { responses }, now);
        Ok(self.record())
    }

    /// Apply the outcome of the gateway call started by `begin_feedback`.
    ///
    /// Success completes the session. Failure keeps it awaiting feedback so
    /// the save can be retried.
    pub fn finish_feedback(
        &mut self,
        outcome: Result<(), PersistError>,
    ) -> Result<(), SessionError> {
        if !self.feedback_in_flight {
            return Err(SessionError::InvalidPhase {
                operation: "finish feedback without a pending save",
                phase: self.phase,
            });
        }
        self.feedback_in_flight = false;

        match outcome {
            Ok(()) => {
                self.phase = SessionPhase::Completed;
                Ok(())
            }
            Err(e) => Err(SessionError::Persist(e)),
        }
    }

    /// Serialize the session, then log `session_exported`.
    pub fn export(&mut self, now: DateTime<Utc>) -> Result<ExportDocument, serde_json::Error> {
        let document = ExportDocument::from_record(&self.record())?;
        self.log(EventKind::SessionExported, now);
        Ok(document)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn require_phase(
        &self,
        expected: SessionPhase,
        operation: &'static str,
    ) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidPhase {
                operation,
                phase: self.phase,
            })
        }
    }
}
