//! Durable key-value storage backing the session store.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Minimal string key-value store, one entry per key.
pub trait KeyValueStore: Send + Sync + std::fmt::Debug {
    /// Read a value; `Ok(None)` when the key was never written or was removed.
    ///
    /// # Errors
    /// Returns the underlying I/O error when the entry exists but cannot be read.
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Write or replace a value.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Delete a value; removing an absent key succeeds.
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn remove(&self, key: &str) -> io::Result<()>;
}

/// Stores each key as a file under a directory, readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    ///
    /// # Errors
    /// Fails when the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(format!("{file}.entry"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let path = self.entry_path(key);
        fs::write(&path, value.as_bytes())?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.entry_path(key)) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

/// Process-local store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| io::Error::other("memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> io::Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("nested")).unwrap();

        assert_eq!(store.get("token").unwrap(), None);
        store.set("token", "abc").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));

        store.set("token", "def").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("def"));

        store.remove("token").unwrap();
        assert_eq!(store.get("token").unwrap(), None);
        store.remove("token").unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("user", "{}").unwrap();

        let mode = fs::metadata(store.entry_path("user"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn file_store_sanitizes_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.set("../escape", "x").unwrap();

        assert!(store.root().join("___escape.entry").exists());
    }

    #[test]
    fn memory_store_keys_are_independent() {
        let store = MemoryStore::new();
        store.set("token", "t").unwrap();
        store.set("user", "u").unwrap();
        store.remove("token").unwrap();

        assert_eq!(store.get("token").unwrap(), None);
        assert_eq!(store.get("user").unwrap().as_deref(), Some("u"));
    }
}
