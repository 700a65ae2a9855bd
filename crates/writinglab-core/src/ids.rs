use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Produces unique session identifiers.
pub trait IdGenerator {
    fn new_id(&self) -> SessionId;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> SessionId {
        SessionId(uuid::Uuid::new_v4().to_string())
    }
}

/// Deterministic `{prefix}-{n}` identifiers, starting at 1.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: Cell<u64>,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Cell::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn new_id(&self) -> SessionId {
        let n = self.next.get();
        self.next.set(n + 1);
        SessionId(format!("{}-{}", self.prefix, n))
    }
}
