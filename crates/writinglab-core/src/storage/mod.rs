mod config;
pub mod database;
pub mod gateway;
pub mod migrations;
pub mod remote;

pub use config::{BatchingConfig, Config, StorageBackend, StorageConfig};
pub use database::{Database, StoredSession};
pub use gateway::{open_gateway, DraftCache, MemoryDrafts, MemoryStore, PersistenceGateway};
pub use remote::RemoteStore;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/writinglab[-dev]/` based on WRITINGLAB_ENV.
///
/// Set WRITINGLAB_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("WRITINGLAB_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("writinglab-dev")
    } else {
        base_dir.join("writinglab")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
