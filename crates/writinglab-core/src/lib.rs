//! # WritingLab Core Library
//!
//! Core logic for a guided creative-writing exercise: the writer drafts a
//! story while writing rules are revealed and checked off, every interaction
//! is logged, and the finished session is saved with a short feedback form.
//! The CLI binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Rule Engine**: ordered catalog of rules revealed by word count and
//!   completed by keyword heuristics
//! - **Input Batching**: a wall-clock state machine that folds keystrokes into
//!   coarse events; the host calls `tick()` to drive it
//! - **Session**: event log, rules and the Drafting → AwaitingFeedback →
//!   Completed lifecycle
//! - **Storage**: TOML configuration, SQLite local store and draft cache, and
//!   an HTTP document store
//!
//! ## Key Components
//!
//! - [`WritingLab`]: one live session plus its clock, ids, drafts and gateway
//! - [`RuleEngine`]: rule state machine
//! - [`Session`]: lifecycle and event log
//! - [`PersistenceGateway`]: where finished sessions go
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod ids;
pub mod input;
pub mod lab;
pub mod rules;
pub mod session;
pub mod storage;

pub use clock::{Clock, Deferred, ManualClock, SystemClock};
pub use error::{
    ConfigError, CoreError, PersistError, RuleError, SessionError, ValidationError,
};
pub use events::{Event, EventKind, EventLog, FormResponses};
pub use ids::{IdGenerator, SequentialIds, SessionId, UuidGenerator};
pub use input::{InputBatcher, InputEffect};
pub use lab::{LabParts, PendingSave, WritingLab};
pub use rules::{Evaluation, Rule, RuleEngine, RuleKind, RuleState, RuleTransition};
pub use session::{ExportDocument, Session, SessionPhase, SessionRecord};
pub use storage::{
    BatchingConfig, Config, Database, DraftCache, MemoryDrafts, MemoryStore, PersistenceGateway,
    RemoteStore, StorageBackend, StorageConfig, StoredSession,
};
