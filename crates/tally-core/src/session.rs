//! # Session
//!
//! Login state for the register, owned explicitly by the application.
//!
//! ## Lifecycle
//! ```text
//! startup ──► Session::hydrate(storage) ──► logged in?  ──► yes: use token
//!                     │                           │
//!                     │ unreadable / corrupt      └──► no: prompt login
//!                     ▼
//!               logged out (warning logged)
//!
//! login(credentials)  ──► state set, storage written
//! logout()            ──► state cleared, storage cleared
//!                         (caller drops catalog cache and cart)
//! ```

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{Credentials, User};

#[derive(Debug, Error)]
pub enum SessionError {
    /// The backing store could not be read or written.
    #[error("Session storage failed: {0}")]
    Storage(String),

    /// The stored session is not valid credentials JSON.
    #[error("Stored session is corrupt: {0}")]
    Corrupt(String),
}

/// Where a session persists between runs.
pub trait SessionStorage {
    /// Returns the stored credentials, `None` if nothing is stored.
    fn load(&self) -> Result<Option<Credentials>, SessionError>;

    fn save(&mut self, credentials: &Credentials) -> Result<(), SessionError>;

    fn clear(&mut self) -> Result<(), SessionError>;
}

/// Keeps the serialized session in memory. Used by tests and one-off runs.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStorage {
    raw: Option<String>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        MemorySessionStorage::default()
    }

    /// Pre-loads raw stored text, as if written by an earlier run.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        MemorySessionStorage {
            raw: Some(raw.into()),
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<Credentials>, SessionError> {
        self.raw
            .as_deref()
            .map(|raw| serde_json::from_str(raw).map_err(|e| SessionError::Corrupt(e.to_string())))
            .transpose()
    }

    fn save(&mut self, credentials: &Credentials) -> Result<(), SessionError> {
        let raw =
            serde_json::to_string(credentials).map_err(|e| SessionError::Storage(e.to_string()))?;
        self.raw = Some(raw);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        self.raw = None;
        Ok(())
    }
}

/// The current login session.
#[derive(Debug)]
pub struct Session<S: SessionStorage> {
    storage: S,
    credentials: Option<Credentials>,
}

impl<S: SessionStorage> Session<S> {
    /// Restores the session persisted in `storage`.
    ///
    /// Never fails: unreadable or corrupt storage yields a logged-out session.
    pub fn hydrate(storage: S) -> Self {
        let credentials = match storage.load() {
            Ok(credentials) => credentials,
            Err(e) => {
                warn!(error = %e, "Ignoring stored session");
                None
            }
        };

        debug!(logged_in = credentials.is_some(), "Session hydrated");
        Session {
            storage,
            credentials,
        }
    }

    /// Sets the session and persists it.
    ///
    /// The in-memory session is updated even if persisting fails; the error
    /// only means the login will not survive a restart.
    pub fn login(&mut self, credentials: Credentials) -> Result<(), SessionError> {
        let result = self.storage.save(&credentials);
        self.credentials = Some(credentials);
        result
    }

    /// Clears the session in memory and in storage.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.credentials = None;
        self.storage.clear()
    }

    pub fn is_logged_in(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.credentials.as_ref().map(|c| &c.user)
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            token: "jwt-token".to_string(),
            user: User {
                id: "u-1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
        }
    }

    #[test]
    fn test_hydrate_empty_storage() {
        let session = Session::hydrate(MemorySessionStorage::new());
        assert!(!session.is_logged_in());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_login_persists_and_rehydrates() {
        let mut session = Session::hydrate(MemorySessionStorage::new());
        session.login(credentials()).unwrap();
        assert_eq!(session.token(), Some("jwt-token"));

        let storage = session.storage().clone();
        let restored = Session::hydrate(storage);
        assert_eq!(restored.credentials(), Some(&credentials()));
        assert_eq!(restored.user().map(|u| u.email.as_str()), Some("ada@example.com"));
    }

    #[test]
    fn test_corrupt_storage_is_logged_out() {
        let session = Session::hydrate(MemorySessionStorage::with_raw("{not json"));
        assert!(!session.is_logged_in());
    }

    #[test]
    fn test_logout_clears_storage() {
        let mut session = Session::hydrate(MemorySessionStorage::new());
        session.login(credentials()).unwrap();
        session.logout().unwrap();

        assert!(!session.is_logged_in());
        assert!(session.storage().raw().is_none());
    }
}
