use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::CONFIG;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("API key must not be empty")]
    Empty,
    #[error("credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub trait CredentialStore {
    fn get(&self) -> Option<String>;
    fn set(&self, credential: &str) -> Result<(), CredentialError>;
    fn clear(&self) -> Result<(), CredentialError>;
}

fn normalize_credential(credential: &str) -> Result<String, CredentialError> {
    let trimmed = credential.trim();
    if trimmed.is_empty() {
        return Err(CredentialError::Empty);
    }
    Ok(trimmed.to_string())
}

/// Keeps the API key in a single local file.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config() -> Self {
        Self::new(CONFIG.credential_file_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> CredentialError {
        CredentialError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => normalize_credential(&raw).ok(),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                warn!(
                    "Failed to read credential file {}: {}",
                    self.path.display(),
                    err
                );
                None
            }
        }
    }

    fn set(&self, credential: &str) -> Result<(), CredentialError> {
        let credential = normalize_credential(credential)?;
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        fs::write(&self.path, credential).map_err(|err| self.io_error(err))?;
        info!("Stored API key at {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Cleared API key at {}", self.path.display());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn with_credential(credential: &str) -> Self {
        Self {
            credential: Mutex::new(normalize_credential(credential).ok()),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<String> {
        self.credential.lock().clone()
    }

    fn set(&self, credential: &str) -> Result<(), CredentialError> {
        *self.credential.lock() = Some(normalize_credential(credential)?);
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.credential.lock() = None;
        Ok(())
    }
}

/// Credential for a new session: the stored key, otherwise `env_key`
/// (normally `GEMINI_API_KEY`), which is then persisted.
pub fn resolve_session_credential_with(
    store: &impl CredentialStore,
    env_key: &str,
) -> Option<String> {
    if let Some(credential) = store.get() {
        return Some(credential);
    }
    let from_env = env_key.trim();
    if from_env.is_empty() {
        return None;
    }
    if let Err(err) = store.set(from_env) {
        warn!("Failed to persist GEMINI_API_KEY: {}", err);
    }
    Some(from_env.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("key"));
        assert_eq!(store.get(), None);

        store.set("  AIza-test-key \n").unwrap();
        assert_eq!(store.get().as_deref(), Some("AIza-test-key"));

        store.clear().unwrap();
        assert_eq!(store.get(), None);
        store.clear().unwrap();
    }

    #[test]
    fn blank_keys_are_rejected() {
        let store = MemoryCredentialStore::default();
        assert!(matches!(store.set("   "), Err(CredentialError::Empty)));
        assert_eq!(store.get(), None);
    }

    #[test]
    fn memory_store_clears() {
        let store = MemoryCredentialStore::with_credential("key-1");
        assert_eq!(store.get().as_deref(), Some("key-1"));
        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn stored_credential_wins_over_environment() {
        let store = MemoryCredentialStore::with_credential("stored");
        assert_eq!(
            resolve_session_credential_with(&store, "env-key").as_deref(),
            Some("stored")
        );
    }

    #[test]
    fn environment_key_seeds_an_empty_store() {
        let store = MemoryCredentialStore::default();
        assert_eq!(
            resolve_session_credential_with(&store, " env-key ").as_deref(),
            Some("env-key")
        );
        assert_eq!(store.get().as_deref(), Some("env-key"));
        assert_eq!(
            resolve_session_credential_with(&MemoryCredentialStore::default(), ""),
            None
        );
    }
}
