//! Debounced input batching.
//!
//! Raw text-change notifications are folded into coarse events: a burst of
//! typing becomes one `typed` event once the writer stops for the debounce
//! window, and long gaps become `paused` events. Deletes and pastes bypass
//! the window and flush whatever is pending first.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Buffering -(quiet for debounce_ms)-> Idle
//!           |
//!           +-(delete / paste)-> Idle   (buffer flushed synchronously)
//! ```

use chrono::{DateTime, Utc};

use crate::clock::Deferred;
use crate::events::{EventKind, UNKNOWN_PASTE_CONTENT};
use crate::storage::BatchingConfig;

/// Something the owner of the batcher must do in response to input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEffect {
    /// Append this event to the session log.
    Log(EventKind),
    /// Re-run the rule engine against the current text.
    EvaluateRules,
    /// Write the current text to the draft cache.
    SaveDraft,
}

/// Keys that count as deletions.
pub fn is_delete_key(key: &str) -> bool {
    matches!(key, "Backspace" | "Delete")
}

/// Wall-clock batching state machine. The caller polls it; it owns no timers.
#[derive(Debug, Clone)]
pub struct InputBatcher {
    settings: BatchingConfig,
    pending: String,
    last_event_at: DateTime<Utc>,
    debounce: Deferred,
    paste_settle: Deferred,
}

impl InputBatcher {
    pub fn new(settings: BatchingConfig, now: DateTime<Utc>) -> Self {
        Self {
            settings,
            pending: String::new(),
            last_event_at: now,
            debounce: Deferred::new(),
            paste_settle: Deferred::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Characters typed since the last flush.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    pub fn last_event_at(&self) -> DateTime<Utc> {
        self.last_event_at
    }

    /// Earliest instant at which [`poll`](Self::poll) will have work to do.
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        match (self.debounce.due_at(), self.paste_settle.due_at()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.next_deadline().is_none()
    }

    // ── Notifications ────────────────────────────────────────────────

    /// The text changed. `inserted` is the typed data, if the change had any.
    pub fn text_changed(&mut self, inserted: Option<&str>, now: DateTime<Utc>) {
        if let Some(data) = inserted {
            self.pending.push_str(data);
        }
        self.debounce.schedule(now, self.settings.debounce_ms);
    }

    /// A key went down. Only deletions produce effects.
    pub fn key_down(&mut self, key: &str, now: DateTime<Utc>) -> Vec<InputEffect> {
        if !is_delete_key(key) {
            return Vec::new();
        }

        let mut effects = Vec::new();
        if let Some(typed) = self.flush() {
            effects.push(InputEffect::Log(typed));
        }
        effects.push(InputEffect::Log(EventKind::Deleted {
            key: key.to_string(),
        }));
        self.last_event_at = now;
        effects
    }

    /// Clipboard contents were pasted. `None` when they could not be read.
    pub fn paste(&mut self, content: Option<&str>, now: DateTime<Utc>) -> Vec<InputEffect> {
        let mut effects = Vec::new();
        if let Some(typed) = self.flush() {
            effects.push(InputEffect::Log(typed));
        }
        effects.push(InputEffect::Log(EventKind::Pasted {
            content: content.unwrap_or(UNKNOWN_PASTE_CONTENT).to_string(),
        }));
        self.last_event_at = now;
        self.paste_settle.schedule(now, self.settings.paste_settle_ms);
        effects
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Run whatever deferred work is due at `now`, earliest deadline first.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<InputEffect> {
        let mut effects = Vec::new();

        let paste_first = match (self.paste_settle.due_at(), self.debounce.due_at()) {
            (Some(paste), Some(debounce)) => paste <= debounce,
            _ => true,
        };

        if paste_first {
            if self.paste_settle.fire_if_due(now) {
                effects.push(InputEffect::EvaluateRules);
            }
            if self.debounce.fire_if_due(now) {
                self.quiet_period_elapsed(now, &mut effects);
            }
        } else {
            if self.debounce.fire_if_due(now) {
                self.quiet_period_elapsed(now, &mut effects);
            }
            if self.paste_settle.fire_if_due(now) {
                effects.push(InputEffect::EvaluateRules);
            }
        }

        effects
    }

    /// Run all deferred work immediately, as if every window had elapsed.
    pub fn settle(&mut self, now: DateTime<Utc>) -> Vec<InputEffect> {
        let mut effects = Vec::new();
        if self.paste_settle.fire_now() {
            effects.push(InputEffect::EvaluateRules);
        }
        if self.debounce.fire_now() {
            self.quiet_period_elapsed(now, &mut effects);
        }
        effects
    }

    /// Take the pending buffer as a `typed` event, if non-empty.
    pub fn flush(&mut self) -> Option<EventKind> {
        if self.pending.is_empty() {
            return None;
        }
        Some(EventKind::Typed {
            content: std::mem::take(&mut self.pending),
        })
    }

    /// Drop any scheduled work. The buffer is left untouched.
    pub fn cancel(&mut self) {
        self.debounce.cancel();
        self.paste_settle.cancel();
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn quiet_period_elapsed(&mut self, now: DateTime<Utc>, effects: &mut Vec<InputEffect>) {
        if let Some(typed) = self.flush() {
            effects.push(InputEffect::Log(typed));
        }

        let elapsed_ms = (now - self.last_event_at).num_milliseconds().max(0) as u64;
        if elapsed_ms > self.settings.pause_threshold_ms {
            effects.push(InputEffect::Log(EventKind::Paused {
                duration: elapsed_ms,
            }));
        }
        self.last_event_at = now;

        effects.push(InputEffect::SaveDraft);
        effects.push(InputEffect::EvaluateRules);
    }
}
