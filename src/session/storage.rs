use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use parking_lot::{Mutex, RwLock};

/// Storage keys the session layer reads and writes.
pub mod keys {
    /// Bearer token.
    pub const TOKEN: &str = "token";
    /// Serialized [`UserRecord`](crate::types::UserRecord) JSON.
    pub const USER: &str = "user";
    /// Remember-me email prefill.
    pub const REMEMBERED_EMAIL: &str = "rememberedEmail";

    // Keys older front-end builds wrote. Never read, always cleared.
    pub const CACHED_EMAIL: &str = "email";
    pub const CACHED_ROLE: &str = "role";
    pub const CACHED_USER_ROLE: &str = "userRole";
    pub const CACHED_USERNAME: &str = "username";

    /// Everything beyond token/user that a logout sweep must remove.
    pub const LEGACY: &[&str] = &[
        REMEMBERED_EMAIL,
        CACHED_EMAIL,
        CACHED_ROLE,
        CACHED_USER_ROLE,
        CACHED_USERNAME,
    ];
}

pub type StorageError = Box<dyn std::error::Error + Send + Sync>;

/// One platform key-value storage tier.
///
/// Models browser-style storage: synchronous calls, each individually atomic
/// by platform contract, so implementations need no cross-call coordination.
///
/// # Example
///
/// ```rust,ignore
/// struct LocalStorageTier { /* bindings to the host storage */ }
///
/// impl StorageTier for LocalStorageTier {
///     fn get(&self, key: &str) -> Option<String> {
///         self.host.get_item(key)
///     }
///     fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
///         self.host.set_item(key, value).map_err(Into::into)
///     }
///     fn remove(&self, key: &str) -> Result<(), StorageError> {
///         self.host.remove_item(key).map_err(Into::into)
///     }
/// }
/// ```
pub trait StorageTier: Send + Sync {
    /// Read a value. Absent keys are `None`, not an error.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing an absent key is a successful no-op.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process tier. The ephemeral tier in most wirings, and the test double.
#[derive(Debug, Default)]
pub struct MemoryTier {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryTier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageTier for MemoryTier {
    fn get(&self, key: &str) -> Option<String> {
        self.map.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map.write().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.map.write().remove(key);
        Ok(())
    }
}

/// File-backed tier: one JSON file holding the whole key→value map.
///
/// Every mutation rewrites the file under an internal mutex. An unreadable or
/// unparseable file reads as empty (fail-closed: a corrupt session file means
/// no session); write failures surface as errors.
#[derive(Debug)]
pub struct FileTier {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTier {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_map(&self) -> HashMap<String, String> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                tracing::debug!(error = %e, path = %self.path.display(), "unreadable session file, treating as empty");
                HashMap::new()
            }
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string(map)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl StorageTier for FileTier {
    fn get(&self, key: &str) -> Option<String> {
        let _g = self.lock.lock();
        self.read_map().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _g = self.lock.lock();
        let mut map = self.read_map();
        map.insert(key.to_owned(), value.to_owned());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _g = self.lock.lock();
        let mut map = self.read_map();
        if map.remove(key).is_some() {
            self.write_map(&map)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_tier_roundtrip() {
        let tier = MemoryTier::new();
        assert_eq!(tier.get("k"), None);
        tier.set("k", "v").unwrap();
        assert_eq!(tier.get("k").as_deref(), Some("v"));
        tier.remove("k").unwrap();
        assert_eq!(tier.get("k"), None);
        // removing again is a no-op
        tier.remove("k").unwrap();
    }

    #[test]
    fn file_tier_roundtrip_and_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let tier = FileTier::new(&path);
        tier.set("token", "abc").unwrap();
        tier.set("user", "{}").unwrap();
        assert_eq!(tier.get("token").as_deref(), Some("abc"));

        // a fresh handle over the same file sees the data
        let reopened = FileTier::new(&path);
        assert_eq!(reopened.get("token").as_deref(), Some("abc"));

        reopened.remove("token").unwrap();
        assert_eq!(tier.get("token"), None);
        assert_eq!(tier.get("user").as_deref(), Some("{}"));
    }

    #[test]
    fn file_tier_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json at all").unwrap();

        let tier = FileTier::new(&path);
        assert_eq!(tier.get("token"), None);

        // writing over a corrupt file recovers it
        tier.set("token", "abc").unwrap();
        assert_eq!(tier.get("token").as_deref(), Some("abc"));
    }

    #[test]
    fn file_tier_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tier = FileTier::new(dir.path().join("never-created.json"));
        assert_eq!(tier.get("token"), None);
        tier.remove("token").unwrap();
    }
}
