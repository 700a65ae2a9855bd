//! Core error types for writinglab-core.
//!
//! This module defines the error hierarchy using thiserror. Session
//! operations return [`SessionError`], which carries a user-facing message
//! for every variant; storage and configuration failures roll up into
//! [`CoreError`].

use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionPhase;

/// Core error type for writinglab-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Persistence gateway errors
    #[error("Persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Session operation errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Failures reported by a persistence gateway.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The remote store answered with a non-success status
    #[error("Remote store rejected the request (HTTP {status}): {body}")]
    Remote { status: u16, body: String },

    /// The request never produced a response
    #[error("Remote store unreachable: {0}")]
    Transport(String),

    /// Local database failure
    #[error("Local store error: {0}")]
    Database(String),

    /// The record could not be encoded or decoded
    #[error("Failed to encode session record: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for PersistError {
    fn from(err: rusqlite::Error) -> Self {
        PersistError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for PersistError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => PersistError::Remote {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => PersistError::Transport(err.to_string()),
        }
    }
}

/// User-correctable problems with the submitted story.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing but whitespace was submitted
    #[error("story text is empty")]
    EmptyStory,
}

/// Rejected rule operations. Never fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rule '{0}' not found")]
    UnknownRule(String),

    #[error("Rule '{0}' is required and cannot be skipped")]
    RequiredRule(String),

    #[error("Rule '{id}' is {state} and cannot be skipped")]
    NotActive { id: String, state: String },
}

/// Errors returned by session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Required rules not met: {}", titles.join(", "))]
    IncompleteRequiredRules { titles: Vec<String> },

    #[error("Invalid rule operation: {0}")]
    InvalidRuleOperation(#[from] RuleError),

    #[error("Failed to persist session: {0}")]
    Persist(#[from] PersistError),

    #[error("A feedback submission is already in flight")]
    FeedbackInFlight,

    #[error("Cannot {operation} while session is {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: SessionPhase,
    },
}

impl SessionError {
    /// Message suitable for showing to the writer.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Validation(ValidationError::EmptyStory) => {
                "Please write something before submitting.".to_string()
            }
            SessionError::IncompleteRequiredRules { titles } => {
                format!(
                    "Please complete all required elements: {}",
                    titles.join(", ")
                )
            }
            SessionError::InvalidRuleOperation(err) => err.to_string(),
            SessionError::Persist(_) => {
                "There was a problem saving your data. Please try again.".to_string()
            }
            SessionError::FeedbackInFlight => {
                "Your feedback is already being saved.".to_string()
            }
            SessionError::InvalidPhase { .. } => self.to_string(),
        }
    }

    /// Whether retrying the same operation later can succeed.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            SessionError::Persist(_) | SessionError::FeedbackInFlight
        )
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
