//! Session persistence. The token and its permission map are always written and
//! cleared as one unit so a cleared session never exposes stale permissions.

use crate::auth::{error::AuthError, permissions::PermissionMap, token::SessionToken};
use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};

pub trait SessionStore: Send + Sync {
    /// Persists a token together with its permissions, replacing any previous session.
    ///
    /// # Errors
    /// Returns an error if the session cannot be persisted; the previous session is
    /// left untouched in that case.
    fn save(&self, token: &SessionToken, permissions: &PermissionMap) -> Result<(), AuthError>;

    /// Removes token and permissions. Clearing an empty store is not an error.
    ///
    /// # Errors
    /// Returns an error if persisted state cannot be removed.
    fn clear(&self) -> Result<(), AuthError>;

    fn current_token(&self) -> Option<SessionToken>;

    /// Cached permissions, or an empty map when there is no session.
    fn current_permissions(&self) -> PermissionMap;
}

#[derive(Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<(SessionToken, PermissionMap)>>,
}

impl MemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn save(&self, token: &SessionToken, permissions: &PermissionMap) -> Result<(), AuthError> {
        *self.session.write() = Some((token.clone(), permissions.clone()));
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.session.write() = None;
        Ok(())
    }

    fn current_token(&self) -> Option<SessionToken> {
        self.session.read().as_ref().map(|(token, _)| token.clone())
    }

    fn current_permissions(&self) -> PermissionMap {
        self.session
            .read()
            .as_ref()
            .map(|(_, permissions)| permissions.clone())
            .unwrap_or_default()
    }
}

/// On-disk form of a session.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    token: String,
    permissions: PermissionMap,
}

/// Keeps the session in a single JSON file, replaced atomically on save.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Option<(SessionToken, PermissionMap)> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read session file {}: {}", self.path.display(), e);
                return None;
            }
        };

        let stored: StoredSession = match serde_json::from_slice(&contents) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", self.path.display(), e);
                return None;
            }
        };

        match SessionToken::parse(SecretString::from(stored.token)) {
            Ok(token) => Some((token, stored.permissions)),
            Err(e) => {
                warn!("Ignoring stored session: {}", e);
                None
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    #[instrument(skip(self, token, permissions), fields(path = %self.path.display()))]
    fn save(&self, token: &SessionToken, permissions: &PermissionMap) -> Result<(), AuthError> {
        let stored = StoredSession {
            token: token.secret().expose_secret().to_string(),
            permissions: permissions.clone(),
        };
        let payload = serde_json::to_vec_pretty(&stored)
            .map_err(|e| AuthError::Storage(format!("Failed to encode session: {e}")))?;

        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        // unique name, created exclusively and readable by the owner only
        let mut file = tempfile::Builder::new()
            .prefix(".session-")
            .suffix(".tmp")
            .tempfile_in(parent)?;
        file.write_all(&payload)?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| AuthError::from(e.error))?;

        debug!("session saved");

        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn current_token(&self) -> Option<SessionToken> {
        self.load().map(|(token, _)| token)
    }

    fn current_permissions(&self) -> PermissionMap {
        self.load()
            .map(|(_, permissions)| permissions)
            .unwrap_or_default()
    }
}
