use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::digits::{normalize_phone, NumberError};
use super::domain::{ListingId, OwnerId};
use super::province::Language;

/// Per-user state that survives restarts: who is signed in, which listings
/// they bookmarked, and the preferred display language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub saved: BTreeSet<ListingId>,
    #[serde(default)]
    pub language: Language,
}

impl SessionContext {
    pub fn current_user(&self) -> OwnerId {
        match &self.phone {
            Some(phone) => OwnerId::new(phone.clone()),
            None => OwnerId::guest(),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.phone.is_some()
    }

    pub fn login(&mut self, raw_phone: &str) -> Result<&str, SessionError> {
        let phone = normalize_phone(raw_phone)?;
        Ok(self.phone.insert(phone).as_str())
    }

    /// Saved ids and language stay with the device.
    pub fn logout(&mut self) {
        self.phone = None;
    }

    /// Returns whether the listing is saved after the toggle.
    pub fn toggle_saved(&mut self, id: ListingId) -> bool {
        if self.saved.remove(&id) {
            false
        } else {
            self.saved.insert(id);
            true
        }
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }
}

/// Load/save lifecycle for a session context.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<SessionContext, SessionError>;
    fn save(&self, session: &SessionContext) -> Result<(), SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] NumberError),
    #[error("session file {path} unavailable: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// JSON file next to the working directory. A missing file is an empty session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<SessionContext, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(SessionContext::default()),
            Err(err) => return Err(self.io_error(err)),
        };

        serde_json::from_str(&raw).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, session: &SessionContext) -> Result<(), SessionError> {
        let payload = serde_json::to_vec_pretty(session).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        std::fs::write(&self.path, payload).map_err(|err| self.io_error(err))
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<SessionContext>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<SessionContext, SessionError> {
        Ok(self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, session: &SessionContext) -> Result<(), SessionError> {
        *self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = session.clone();
        Ok(())
    }
}
