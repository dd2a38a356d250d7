//! Session persistence in a JSON file, so a restarted register stays logged in.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tally_core::session::{SessionError, SessionStorage};
use tally_core::Credentials;

#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSessionStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage_error(err: std::io::Error) -> SessionError {
    SessionError::Storage(err.to_string())
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<Credentials>, SessionError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(e)),
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| SessionError::Corrupt(e.to_string()))
    }

    fn save(&mut self, credentials: &Credentials) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(storage_error)?;
        }
        let raw = serde_json::to_string_pretty(credentials)
            .map_err(|e| SessionError::Storage(e.to_string()))?;
        std::fs::write(&self.path, raw).map_err(storage_error)
    }

    fn clear(&mut self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(storage_error(e)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::session::Session;
    use tally_core::User;

    fn credentials() -> Credentials {
        Credentials {
            token: "t0ken".to_string(),
            user: User {
                id: "u-1".to_string(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
        }
    }

    #[test]
    fn test_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut session = Session::hydrate(FileSessionStorage::new(&path));
        assert!(!session.is_logged_in());
        session.login(credentials()).unwrap();

        let restored = Session::hydrate(FileSessionStorage::new(&path));
        assert_eq!(restored.token(), Some("t0ken"));
        assert_eq!(restored.user().map(|u| u.name.as_str()), Some("Ada"));
    }

    #[test]
    fn test_logout_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut session = Session::hydrate(FileSessionStorage::new(&path));
        session.login(credentials()).unwrap();
        assert!(path.exists());

        session.logout().unwrap();
        assert!(!path.exists());
        assert!(!Session::hydrate(FileSessionStorage::new(&path)).is_logged_in());

        // Clearing twice is fine.
        session.logout().unwrap();
    }

    #[test]
    fn test_corrupt_file_means_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").unwrap();

        let storage = FileSessionStorage::new(&path);
        assert!(matches!(storage.load(), Err(SessionError::Corrupt(_))));
        assert!(!Session::hydrate(storage).is_logged_in());
    }
}
