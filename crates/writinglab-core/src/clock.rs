//! Time source and the single-slot deferred action.
//!
//! Nothing here spawns threads or timers. Deadlines are wall-clock values the
//! caller compares against `now` when it polls, the same way the host drives
//! [`crate::WritingLab::tick`].

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-advanced clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now.set(self.now.get() + Duration::milliseconds(ms));
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

/// A cancellable action scheduled for a single point in time.
///
/// Scheduling again replaces the previous deadline, so at most one is ever
/// live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deferred {
    due: Option<DateTime<Utc>>,
}

impl Deferred {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start the window: fires `delay_ms` after `now`.
    ///
    /// Delays past the representable range saturate at the latest instant.
    pub fn schedule(&mut self, now: DateTime<Utc>, delay_ms: u64) {
        let due = i64::try_from(delay_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .and_then(|delay| now.checked_add_signed(delay))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.due = Some(due);
    }

    pub fn cancel(&mut self) {
        self.due = None;
    }

    pub fn is_pending(&self) -> bool {
        self.due.is_some()
    }

    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due
    }

    /// Consume the deadline if it has passed. Returns whether it fired.
    pub fn fire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }

    /// Consume the deadline regardless of time. Returns whether one was set.
    pub fn fire_now(&mut self) -> bool {
        self.due.take().is_some()
    }
}
