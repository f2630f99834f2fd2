//! Durable key/value storage for the serialized session.
//!
//! [`KeyValueStore`] is the minimal contract: whole-value `get`, `set`,
//! and `remove` of string values by key. Two implementations:
//!
//! - [`MemoryStore`]: in-process, cloneable handle onto shared entries.
//!   Clones see the same data, which is how tests simulate a restart.
//! - [`FileStore`]: one file per key under a directory; writes go to a
//!   temporary file and are renamed into place so a crash never leaves a
//!   half-written session behind.
//!
//! [`SessionStorage`] sits on top and speaks in [`Session`]s: it owns the
//! session key, the JSON encoding, and the validation applied when a
//! stored value is read back.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tourdesk_protocol::{AgencyId, Codec, JsonCodec, Role};

use crate::{Identity, Session, SessionError};

// ---------------------------------------------------------------------------
// KeyValueStore
// ---------------------------------------------------------------------------

/// Whole-value string storage addressed by key.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Reads the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Replaces the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Deletes `key`. Deleting an absent key succeeds.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// File-backed [`KeyValueStore`]: `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Uses `dir` as the storage directory. The directory is created on
    /// the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        if !valid {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid store key {key:?}"),
            ));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStorage
// ---------------------------------------------------------------------------

/// On-disk shape of a session. Every field is optional so that a stored
/// value missing a field is reported as corrupt rather than failing
/// with a bare decode error.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSession {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    agency_scope: Option<AgencyId>,
}

impl From<&Session> for PersistedSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: Some(session.access_token().to_owned()),
            refresh_token: Some(session.refresh_token().to_owned()),
            role: Some(session.role().clone()),
            agency_scope: session.agency_scope().cloned(),
        }
    }
}

impl TryFrom<PersistedSession> for Session {
    type Error = SessionError;

    fn try_from(stored: PersistedSession) -> Result<Self, Self::Error> {
        let corrupt = |what: &str| {
            SessionError::CorruptPersistedSession(format!("missing {what}"))
        };
        let role = stored.role.ok_or_else(|| corrupt("role"))?;
        let access = stored.access_token.ok_or_else(|| corrupt("access token"))?;
        let refresh =
            stored.refresh_token.ok_or_else(|| corrupt("refresh token"))?;

        Identity::new(role, stored.agency_scope)
            .and_then(|identity| Session::new(access, refresh, identity))
            .map_err(|e| SessionError::CorruptPersistedSession(e.to_string()))
    }
}

/// Reads and writes the one persisted session.
#[derive(Debug)]
pub struct SessionStorage<S: KeyValueStore> {
    store: S,
    key: String,
    codec: JsonCodec,
}

impl<S: KeyValueStore> SessionStorage<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            codec: JsonCodec,
        }
    }

    /// Loads the stored session.
    ///
    /// # Errors
    /// - [`SessionError::CorruptPersistedSession`] if a value is present
    ///   but is not a valid session;
    /// - [`SessionError::Store`] if the store itself fails.
    pub fn load(&self) -> Result<Option<Session>, SessionError> {
        let Some(raw) = self.store.get(&self.key).map_err(SessionError::Store)?
        else {
            return Ok(None);
        };

        let stored: PersistedSession = self
            .codec
            .decode(raw.as_bytes())
            .map_err(|e| SessionError::CorruptPersistedSession(e.to_string()))?;
        Session::try_from(stored).map(Some)
    }

    /// Replaces the stored session.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        let bytes = self
            .codec
            .encode(&PersistedSession::from(session))
            .map_err(|e| {
                SessionError::Store(io::Error::new(io::ErrorKind::InvalidData, e))
            })?;
        let text = String::from_utf8(bytes).map_err(|e| {
            SessionError::Store(io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        self.store.set(&self.key, &text).map_err(SessionError::Store)
    }

    /// Removes the stored session. Succeeds when nothing is stored.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.store.remove(&self.key).map_err(SessionError::Store)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agence_session() -> Session {
        let identity =
            Identity::new(Role::Agence, Some(AgencyId::new("A1"))).unwrap();
        Session::new("a-1", "r-1", identity).unwrap()
    }

    fn storage() -> SessionStorage<MemoryStore> {
        SessionStorage::new(MemoryStore::new(), "session")
    }

    // =====================================================================
    // MemoryStore
    // =====================================================================

    #[test]
    fn test_memory_store_clones_share_entries() {
        let a = MemoryStore::new();
        let b = a.clone();

        a.set("k", "v").unwrap();

        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
        b.remove("k").unwrap();
        assert!(a.get("k").unwrap().is_none());
    }

    // =====================================================================
    // FileStore
    // =====================================================================

    #[test]
    fn test_file_store_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert!(store.get("session").unwrap().is_none());

        store.set("session", "{}").unwrap();
        assert_eq!(store.get("session").unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("nested/session.json").exists());
        assert!(!dir.path().join("nested/session.json.tmp").exists());

        store.remove("session").unwrap();
        assert!(store.get("session").unwrap().is_none());
    }

    #[test]
    fn test_file_store_remove_missing_key_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.remove("session").unwrap();
        store.remove("session").unwrap();
    }

    #[test]
    fn test_file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        for key in ["", "../escape", "a/b", "dot.ted"] {
            let err = store.set(key, "x").unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "key {key:?}");
        }
    }

    // =====================================================================
    // SessionStorage
    // =====================================================================

    #[test]
    fn test_save_then_load_returns_same_session() {
        let storage = storage();
        let session = agence_session();

        storage.save(&session).unwrap();

        assert_eq!(storage.load().unwrap(), Some(session));
    }

    #[test]
    fn test_saved_value_uses_camel_case_fields() {
        let storage = storage();
        storage.save(&agence_session()).unwrap();

        let raw = storage.store().get("session").unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(json["accessToken"], "a-1");
        assert_eq!(json["refreshToken"], "r-1");
        assert_eq!(json["role"], "agence");
        assert_eq!(json["agencyScope"], "A1");
    }

    #[test]
    fn test_load_empty_store_returns_none() {
        assert_eq!(storage().load().unwrap(), None);
    }

    #[test]
    fn test_load_malformed_json_is_corrupt() {
        let storage = storage();
        storage.store().set("session", "{not json").unwrap();

        let result = storage.load();

        assert!(matches!(result, Err(SessionError::CorruptPersistedSession(_))));
    }

    #[test]
    fn test_load_scoped_role_without_scope_is_corrupt() {
        let storage = storage();
        storage
            .store()
            .set(
                "session",
                r#"{"accessToken":"a","refreshToken":"r","role":"agence"}"#,
            )
            .unwrap();

        assert!(matches!(
            storage.load(),
            Err(SessionError::CorruptPersistedSession(_))
        ));
    }

    #[test]
    fn test_load_without_refresh_token_is_corrupt() {
        let storage = storage();
        storage
            .store()
            .set("session", r#"{"accessToken":"a","role":"superadmin"}"#)
            .unwrap();

        assert!(matches!(
            storage.load(),
            Err(SessionError::CorruptPersistedSession(_))
        ));
    }

    #[test]
    fn test_clear_removes_value() {
        let storage = storage();
        storage.save(&agence_session()).unwrap();

        storage.clear().unwrap();
        storage.clear().unwrap();

        assert!(storage.store().get("session").unwrap().is_none());
    }
}
