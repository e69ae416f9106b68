use log::trace;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::KeyValueStore;
use crate::error::StoreError;

/// One file per key inside `data_dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir })
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.key_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key);
        // write-then-rename so readers never see a half-written value
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        trace!(target: "store", "Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.key_path(key)) {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("nested")).unwrap();

        assert_eq!(store.get("playerName").unwrap(), None);
        store.set("playerName", "Ava").unwrap();
        assert_eq!(store.get("playerName").unwrap().as_deref(), Some("Ava"));

        store.set("playerName", "Bo").unwrap();
        assert_eq!(store.get("playerName").unwrap().as_deref(), Some("Bo"));

        store.remove("playerName").unwrap();
        assert_eq!(store.get("playerName").unwrap(), None);
        // removing a missing key is fine
        store.remove("playerName").unwrap();
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileStore::open(dir.path())
            .unwrap()
            .set("leaderboard", "[]")
            .unwrap();

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.get("leaderboard").unwrap().as_deref(), Some("[]"));
        assert!(!dir.path().join("leaderboard.json.tmp").exists());
    }
}
