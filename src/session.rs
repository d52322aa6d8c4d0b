//! Durable session record: the signed-in user, stored under a single key.

use crate::error::SessionError;
use crate::types::User;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

/// Storage for the one persisted session.
pub trait SessionStore: Send {
    /// The stored user, or `None` when nothing is stored.
    fn load(&self) -> Result<Option<User>, SessionError>;
    fn save(&self, user: &User) -> Result<(), SessionError>;
    /// Remove the record. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Session kept as a JSON file holding the serialized user.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<User>, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, user: &User) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(user)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process session store for tests and ephemeral servers.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    user: Mutex<Option<User>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a user, as if a previous run had signed in.
    pub fn with_user(user: User) -> Self {
        Self {
            user: Mutex::new(Some(user)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<User>, SessionError> {
        Ok(self.user.lock().map(|u| u.clone()).unwrap_or_default())
    }

    fn save(&self, user: &User) -> Result<(), SessionError> {
        if let Ok(mut slot) = self.user.lock() {
            *slot = Some(user.clone());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        if let Ok(mut slot) = self.user.lock() {
            *slot = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixtures;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));
        let user = Fixtures::seed().unwrap().users.remove(1);

        assert!(store.load().unwrap().is_none());
        store.save(&user).unwrap();
        assert_eq!(store.load().unwrap(), Some(user));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            FileSessionStore::new(path).load(),
            Err(SessionError::Json(_))
        ));
    }
}
