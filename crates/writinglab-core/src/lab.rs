//! The writing lab: one live session plus the services around it.
//!
//! Like a polling timer, the lab has no threads of its own. The host forwards
//! input notifications and calls [`WritingLab::tick`] periodically; deferred
//! work (debounce, paste settle) runs from there.

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};
use crate::error::{CoreError, PersistError, SessionError};
use crate::events::FormResponses;
use crate::ids::{IdGenerator, SessionId, UuidGenerator};
use crate::input::{InputBatcher, InputEffect};
use crate::rules::Evaluation;
use crate::session::{ExportDocument, Session, SessionPhase, SessionRecord};
use crate::storage::{open_gateway, BatchingConfig, Config, Database, DraftCache, PersistenceGateway};

/// Services a lab is built from.
pub struct LabParts {
    pub clock: Box<dyn Clock>,
    pub ids: Box<dyn IdGenerator>,
    pub drafts: Box<dyn DraftCache>,
    pub gateway: Box<dyn PersistenceGateway>,
    pub batching: BatchingConfig,
}

/// A feedback save handed out by [`WritingLab::begin_feedback`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    pub session_id: SessionId,
    pub record: SessionRecord,
}

pub struct WritingLab {
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    drafts: Box<dyn DraftCache>,
    gateway: Box<dyn PersistenceGateway>,
    batching: BatchingConfig,
    session: Session,
    batcher: InputBatcher,
}

impl WritingLab {
    /// Start a session, restoring the cached draft if there is one.
    pub fn start(parts: LabParts) -> Self {
        let LabParts {
            clock,
            ids,
            drafts,
            gateway,
            batching,
        } = parts;

        let now = clock.now();
        let session = Session::start(ids.new_id(), now);
        let batcher = InputBatcher::new(batching, now);

        let mut lab = Self {
            clock,
            ids,
            drafts,
            gateway,
            batching,
            session,
            batcher,
        };
        tracing::info!(
            session_id = %lab.session.id(),
            backend = lab.gateway.name(),
            "session started"
        );
        lab.restore_draft(now);
        lab
    }

    /// System clock, UUIDs, the SQLite draft cache and the configured gateway.
    ///
    /// # Errors
    /// Returns an error if the local database or the configured gateway
    /// cannot be opened.
    pub fn with_defaults(config: &Config) -> Result<Self, CoreError> {
        Ok(Self::start(LabParts {
            clock: Box::new(SystemClock),
            ids: Box::new(UuidGenerator),
            drafts: Box::new(Database::open()?),
            gateway: open_gateway(&config.storage)?,
            batching: config.batching,
        }))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    pub fn gateway(&self) -> &dyn PersistenceGateway {
        self.gateway.as_ref()
    }

    /// Characters typed but not yet logged.
    pub fn pending_input(&self) -> &str {
        self.batcher.pending()
    }

    /// When the host should call [`tick`](Self::tick) next, if at all.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.batcher.next_deadline()
    }

    // ── Input ────────────────────────────────────────────────────────

    /// The writing area now holds `text`. `inserted` is the typed data, if any.
    pub fn input(&mut self, text: &str, inserted: Option<&str>) -> Result<(), SessionError> {
        self.session.set_text(text)?;
        self.batcher.text_changed(inserted, self.clock.now());
        Ok(())
    }

    pub fn key_down(&mut self, key: &str) -> Result<Evaluation, SessionError> {
        self.require_drafting("handle key input")?;
        let now = self.clock.now();
        let effects = self.batcher.key_down(key, now);
        Ok(self.apply(effects, now))
    }

    /// Clipboard contents were pasted; `None` when they were unreadable.
    pub fn paste(&mut self, content: Option<&str>) -> Result<Evaluation, SessionError> {
        self.require_drafting("paste")?;
        let now = self.clock.now();
        let effects = self.batcher.paste(content, now);
        Ok(self.apply(effects, now))
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Run deferred work that is due. Returns the rule changes it caused.
    pub fn tick(&mut self) -> Evaluation {
        let now = self.clock.now();
        let effects = self.batcher.poll(now);
        self.apply(effects, now)
    }

    /// Run all deferred work now, without waiting for its window.
    pub fn settle(&mut self) -> Evaluation {
        let now = self.clock.now();
        let effects = self.batcher.settle(now);
        self.apply(effects, now)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    pub fn skip_rule(&mut self, rule_id: &str) -> Result<(), SessionError> {
        let now = self.clock.now();
        self.session.skip_rule(rule_id, now)
    }

    /// Flush pending typing, then validate and freeze the story.
    pub fn submit(&mut self) -> Result<usize, SessionError> {
        self.require_drafting("submit the story")?;
        let now = self.clock.now();

        if let Some(typed) = self.batcher.flush() {
            self.session.log(typed, now);
        }
        let word_count = self.session.submit(now)?;
        self.batcher.cancel();

        tracing::info!(session_id = %self.session.id(), word_count, "story submitted");
        Ok(word_count)
    }

    /// Record feedback and hand back the save the host must perform.
    pub fn begin_feedback(&mut self, responses: FormResponses) -> Result<PendingSave, SessionError> {
        let now = self.clock.now();
        let record = self.session.begin_feedback(responses, now)?;
        Ok(PendingSave {
            session_id: record.session_id.clone(),
            record,
        })
    }

    /// Apply the result of a save started with `begin_feedback`.
    ///
    /// Success completes the session and clears the draft. Failure keeps both.
    pub fn finish_feedback(&mut self, outcome: Result<(), PersistError>) -> Result<(), SessionError> {
        match self.session.finish_feedback(outcome) {
            Ok(()) => {
                self.drafts.clear_draft();
                tracing::info!(
                    session_id = %self.session.id(),
                    backend = self.gateway.name(),
                    "session persisted"
                );
                Ok(())
            }
            Err(e) => {
                tracing::warn!(session_id = %self.session.id(), error = %e, "feedback not saved");
                Err(e)
            }
        }
    }

    /// Record feedback and save it through the configured gateway.
    pub fn submit_feedback(&mut self, responses: FormResponses) -> Result<(), SessionError> {
        let pending = self.begin_feedback(responses)?;
        let outcome = self.gateway.save(&pending.session_id, &pending.record);
        self.finish_feedback(outcome)
    }

    /// Replace the session with a fresh one. Works from any phase.
    pub fn reset(&mut self) {
        let now = self.clock.now();
        let previous = self.session.id().clone();
        self.batcher.cancel();
        self.batcher = InputBatcher::new(self.batching, now);
        self.session = Session::start(self.ids.new_id(), now);
        tracing::info!(
            previous = %previous,
            session_id = %self.session.id(),
            "session reset"
        );
    }

    /// Serialize the current session, then log `session_exported`.
    pub fn export(&mut self) -> Result<ExportDocument, CoreError> {
        let now = self.clock.now();
        Ok(self.session.export(now)?)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn restore_draft(&mut self, now: DateTime<Utc>) {
        let Some(draft) = self.drafts.load_draft() else {
            return;
        };
        if draft.is_empty() {
            return;
        }
        if let Err(e) = self.session.restore_draft(&draft, now) {
            tracing::warn!(error = %e, "could not restore draft");
        }
    }

    fn apply(&mut self, effects: Vec<InputEffect>, now: DateTime<Utc>) -> Evaluation {
        let mut evaluation = Evaluation::default();
        for effect in effects {
            match effect {
                InputEffect::Log(kind) => self.session.log(kind, now),
                InputEffect::SaveDraft => self.drafts.save_draft(self.session.current_text()),
                InputEffect::EvaluateRules => {
                    let changes = self.session.evaluate_rules(now);
                    evaluation.transitions.extend(changes.transitions);
                }
            }
        }
        evaluation
    }

    fn require_drafting(&self, operation: &'static str) -> Result<(), SessionError> {
        match self.session.phase() {
            SessionPhase::Drafting => Ok(()),
            phase => Err(SessionError::InvalidPhase { operation, phase }),
        }
    }
}

impl std::fmt::Debug for WritingLab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WritingLab")
            .field("gateway", &self.gateway.name())
            .field("batching", &self.batching)
            .field("session", &self.session)
            .field("batcher", &self.batcher)
            .finish()
    }
}
