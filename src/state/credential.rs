//! Process-wide credential slot.
//!
//! DESIGN
//! ======
//! The session only needs read/write/clear of one bearer token, so storage is
//! a small trait. An absent token means "logged out". The file store plays the
//! role a browser's local storage plays for a web front end: it survives
//! restarts of the client.
//!
//! ERROR HANDLING
//! ==============
//! Storage I/O failures are logged and swallowed at this boundary. A token
//! that cannot be read is treated as absent; logout must never fail.

#[cfg(test)]
#[path = "credential_test.rs"]
mod credential_test;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::net::types::Credential;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential store I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read/write contract for the held credential.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<Credential>;
    fn store(&self, credential: &Credential);
    fn clear(&self);
}

// =============================================================================
// MEMORY
// =============================================================================

/// Credential held only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self { slot: Mutex::new(Some(credential)) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<Credential> {
        self.slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn store(&self, credential: &Credential) {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(credential.clone());
    }

    fn clear(&self) {
        *self
            .slot
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

// =============================================================================
// FILE
// =============================================================================

/// Credential persisted as a single-line file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }

    /// Read the stored token; a missing file is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn try_load(&self) -> Result<Option<Credential>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok(if token.is_empty() { None } else { Some(Credential::new(token)) })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Write the token, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn try_store(&self, credential: &Credential) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, credential.as_str()).map_err(|e| self.io_error(e))
    }

    /// Remove the token file; a missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn try_clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<Credential> {
        self.try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "credential unreadable; treating as logged out");
            None
        })
    }

    fn store(&self, credential: &Credential) {
        if let Err(e) = self.try_store(credential) {
            tracing::warn!(error = %e, "credential not persisted; session lasts until exit");
        }
    }

    fn clear(&self) {
        if let Err(e) = self.try_clear() {
            tracing::warn!(error = %e, "stale credential file could not be removed");
        }
    }
}
