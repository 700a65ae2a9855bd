//! Persistence seams.
//!
//! A session is saved through exactly one [`PersistenceGateway`], chosen from
//! configuration when the lab starts. The draft cache is a separate, much
//! smaller contract: one string slot that survives restarts.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use super::config::{StorageBackend, StorageConfig};
use super::database::Database;
use super::remote::RemoteStore;
use crate::error::{ConfigError, CoreError, PersistError};
use crate::ids::SessionId;
use crate::session::SessionRecord;

/// Stores session records by id.
pub trait PersistenceGateway {
    /// Short backend name used in logs (e.g. "local", "remote").
    fn name(&self) -> &str;

    /// Write the full record, replacing any previous version.
    fn save(&self, id: &SessionId, record: &SessionRecord) -> Result<(), PersistError>;

    /// Read a record back. `Ok(None)` when nothing is stored under `id`.
    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, PersistError>;
}

/// Single-slot store for the in-progress story text.
///
/// Failures are swallowed by implementations; losing a draft must never
/// interrupt writing.
pub trait DraftCache {
    fn save_draft(&self, text: &str);
    fn load_draft(&self) -> Option<String>;
    fn clear_draft(&self);
}

impl<T: PersistenceGateway + ?Sized> PersistenceGateway for Rc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn save(&self, id: &SessionId, record: &SessionRecord) -> Result<(), PersistError> {
        (**self).save(id, record)
    }

    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, PersistError> {
        (**self).load(id)
    }
}

impl<T: DraftCache + ?Sized> DraftCache for Rc<T> {
    fn save_draft(&self, text: &str) {
        (**self).save_draft(text)
    }

    fn load_draft(&self) -> Option<String> {
        (**self).load_draft()
    }

    fn clear_draft(&self) {
        (**self).clear_draft()
    }
}

/// In-memory gateway for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<SessionId, SessionRecord>>,
    saves: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl PersistenceGateway for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn save(&self, id: &SessionId, record: &SessionRecord) -> Result<(), PersistError> {
        self.records.borrow_mut().insert(id.clone(), record.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }

    fn load(&self, id: &SessionId) -> Result<Option<SessionRecord>, PersistError> {
        Ok(self.records.borrow().get(id).cloned())
    }
}

/// In-memory draft slot.
#[derive(Debug, Default)]
pub struct MemoryDrafts {
    slot: RefCell<Option<String>>,
}

impl MemoryDrafts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot pre-filled with `text`, as if a previous run had saved it.
    pub fn with_draft(text: impl Into<String>) -> Self {
        Self {
            slot: RefCell::new(Some(text.into())),
        }
    }
}

impl DraftCache for MemoryDrafts {
    fn save_draft(&self, text: &str) {
        *self.slot.borrow_mut() = Some(text.to_string());
    }

    fn load_draft(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    fn clear_draft(&self) {
        self.slot.borrow_mut().take();
    }
}

/// Build the gateway selected by `config.backend`.
///
/// # Errors
/// `remote` without a `remote_url`, an unparseable URL, or a local database
/// that cannot be opened.
pub fn open_gateway(config: &StorageConfig) -> Result<Box<dyn PersistenceGateway>, CoreError> {
    match config.backend {
        StorageBackend::Local => {
            let db = Database::open()?;
            Ok(Box::new(db))
        }
        StorageBackend::Remote => {
            if config.remote_url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "storage.remote_url".to_string(),
                    message: "required when storage.backend = \"remote\"".to_string(),
                }
                .into());
            }
            Ok(Box::new(RemoteStore::new(config)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use chrono::Utc;

    #[test]
    fn memory_store_replaces_by_id() {
        let store = MemoryStore::new();
        let id = SessionId::new("a");
        let record = Session::start(id.clone(), Utc::now()).record();

        assert!(store.load(&id).unwrap().is_none());
        store.save(&id, &record).unwrap();
        store.save(&id, &record).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.load(&id).unwrap(), Some(record));
    }

    #[test]
    fn shared_handles_see_the_same_drafts() {
        let drafts = Rc::new(MemoryDrafts::new());
        let handle: Rc<MemoryDrafts> = Rc::clone(&drafts);

        handle.save_draft("once upon");
        assert_eq!(drafts.load_draft().as_deref(), Some("once upon"));
        drafts.clear_draft();
        assert!(handle.load_draft().is_none());
    }

    #[test]
    fn remote_backend_requires_url() {
        let config = StorageConfig {
            backend: StorageBackend::Remote,
            ..StorageConfig::default()
        };
        let err = open_gateway(&config).err().unwrap();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn remote_backend_is_selected_from_config() {
        let config = StorageConfig {
            backend: StorageBackend::Remote,
            remote_url: "http://127.0.0.1:9/api".to_string(),
            ..StorageConfig::default()
        };
        let gateway = open_gateway(&config).unwrap();
        assert_eq!(gateway.name(), "remote");
    }
}
