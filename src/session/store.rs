//! Persisted session record.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::auth::now_millis;
use crate::error::GateResult;

/// The client-persisted session: the bearer token and its local expiry.
///
/// Created on login, overwritten on re-login, deleted on logout or when
/// expiry is detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: String,
    pub expires_at_ms: u64,
}

impl SessionRecord {
    /// Whether the record has expired by the local clock.
    pub fn is_expired(&self) -> bool {
        now_millis() >= self.expires_at_ms
    }
}

/// Storage for the session record.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> GateResult<Option<SessionRecord>>;
    fn save(&self, record: &SessionRecord) -> GateResult<()>;
    fn clear(&self) -> GateResult<()>;
}

/// Session record persisted as a JSON file.
///
/// The file is written with owner-only permissions; an unreadable or
/// corrupt file is treated as no session and removed.
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
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> GateResult<Option<SessionRecord>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(record) => Ok(Some(record)),
            Err(_) => {
                // Corrupt record; drop it rather than erroring forever.
                self.clear()?;
                Ok(None)
            }
        }
    }

    fn save(&self, record: &SessionRecord) -> GateResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec(record)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    fn clear(&self) -> GateResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FileSessionStore {
        FileSessionStore::new(dir.path().join("session.json"))
    }

    #[test]
    fn test_absent_record_loads_as_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(store_in(&dir).load().unwrap(), None);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let record = SessionRecord {
            token: "a.b.c".to_string(),
            expires_at_ms: u64::MAX,
        };
        store.save(&record).unwrap();

        assert_eq!(store.load().unwrap(), Some(record));
    }

    #[test]
    fn test_clear_removes_record() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store
            .save(&SessionRecord {
                token: "t".to_string(),
                expires_at_ms: u64::MAX,
            })
            .unwrap();
        store.clear().unwrap();

        assert_eq!(store.load().unwrap(), None);
        // Clearing an already-empty store is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_record_is_dropped() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        std::fs::write(store.path(), b"{definitely not json").unwrap();

        assert_eq!(store.load().unwrap(), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_expiry_by_local_clock() {
        let expired = SessionRecord {
            token: "t".to_string(),
            expires_at_ms: 1,
        };
        assert!(expired.is_expired());

        let live = SessionRecord {
            token: "t".to_string(),
            expires_at_ms: u64::MAX,
        };
        assert!(!live.is_expired());
    }
}
