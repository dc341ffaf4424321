use std::{
    io::ErrorKind,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::{fs, sync::RwLock};
use tracing::{debug, error, warn};

pub const USERS_FILE: &str = "users.json";
pub const CHIRPS_FILE: &str = "chirps.json";
pub const REVOKED_TOKENS_FILE: &str = "revoked_tokens.json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed collection in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode collection for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// JSON file holding one ordered collection of records.
///
/// Every handle cloned from the same store shares one lock, so readers and
/// writers of a collection never overlap. Read-modify-write sequences must go
/// through [`FileStore::update`], which holds the write lock for the whole cycle.
pub struct FileStore<T> {
    path: Arc<PathBuf>,
    lock: Arc<RwLock<()>>,
    _records: PhantomData<fn() -> T>,
}

impl<T> Clone for FileStore<T> {
    fn clone(&self) -> Self {
        Self {
            path: Arc::clone(&self.path),
            lock: Arc::clone(&self.lock),
            _records: PhantomData,
        }
    }
}

impl<T> FileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Open the store at `path`, creating an empty backing file if missing.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, StorageError> {
        let path = path.into();
        ensure_exists(&path).await?;
        Ok(Self {
            path: Arc::new(path),
            lock: Arc::new(RwLock::new(())),
            _records: PhantomData,
        })
    }

    /// Read the whole collection under the shared lock.
    pub async fn load(&self) -> Result<Vec<T>, StorageError> {
        let _guard = self.lock.read().await;
        read_records(&self.path).await
    }

    /// Overwrite the whole collection under the exclusive lock.
    pub async fn save(&self, records: &[T]) -> Result<(), StorageError> {
        let _guard = self.lock.write().await;
        write_records(&self.path, records).await
    }

    /// Load, mutate and save while holding the exclusive lock throughout.
    ///
    /// Nothing is written when `f` returns an error.
    pub async fn update<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, E>,
        E: From<StorageError>,
    {
        let _guard = self.lock.write().await;
        let mut records = read_records(&self.path).await?;
        let out = f(&mut records)?;
        write_records(&self.path, &records).await?;
        Ok(out)
    }
}

/// Create an empty collection file (and its directory) if it does not exist yet.
pub async fn ensure_exists(path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))?;
    }

    match fs::try_exists(path).await {
        Ok(true) => Ok(()),
        Ok(false) => {
            debug!(path = %path.display(), "creating collection file");
            fs::write(path, b"[]")
                .await
                .map_err(|e| StorageError::io(path, e))
        }
        Err(e) => Err(StorageError::io(path, e)),
    }
}

/// Delete and recreate every named collection file. Debug bootstrap only.
pub async fn reset<P: AsRef<Path>>(paths: &[P]) -> Result<(), StorageError> {
    for path in paths {
        let path = path.as_ref();
        match fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StorageError::io(path, e)),
        }
        ensure_exists(path).await?;
        warn!(path = %path.display(), "collection reset");
    }
    Ok(())
}

async fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
    let bytes = match fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            error!(path = %path.display(), error = %e, "read collection failed");
            return Err(StorageError::io(path, e));
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    serde_json::from_slice(&bytes).map_err(|e| {
        error!(path = %path.display(), error = %e, "collection is not valid json");
        StorageError::Corrupt {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

async fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StorageError> {
    let data = serde_json::to_vec(records).map_err(|e| StorageError::Encode {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, data).await.map_err(|e| {
        error!(path = %path.display(), error = %e, "write collection failed");
        StorageError::io(path, e)
    })?;
    debug!(path = %path.display(), count = records.len(), "collection saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u64,
        name: String,
    }

    #[tokio::test]
    async fn open_creates_missing_file_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rows.json");
        let store = FileStore::<Row>::open(&path).await.unwrap();

        assert!(path.exists());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_file_loads_as_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, b"").unwrap();

        let store = FileStore::<Row>::open(&path).await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_overwrites_and_load_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::<Row>::open(dir.path().join("rows.json"))
            .await
            .unwrap();

        let rows = vec![
            Row { id: 1, name: "a".into() },
            Row { id: 2, name: "b".into() },
        ];
        store.save(&rows).await.unwrap();
        store.save(&rows[..1]).await.unwrap();

        assert_eq!(store.load().await.unwrap(), rows[..1].to_vec());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileStore::<Row>::open(&path).await.unwrap();
        let err = store.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn failed_update_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::<Row>::open(dir.path().join("rows.json"))
            .await
            .unwrap();

        let res: Result<(), anyhow::Error> = store
            .update(|rows| {
                rows.push(Row { id: 1, name: "x".into() });
                anyhow::bail!("rejected")
            })
            .await;

        assert!(res.is_err());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_updates_assign_unique_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::<Row>::open(dir.path().join("rows.json"))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update(|rows| {
                        let id = rows.len() as u64 + 1;
                        rows.push(Row { id, name: format!("row-{i}") });
                        Ok::<_, StorageError>(id)
                    })
                    .await
                    .unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let ids: Vec<u64> = store.load().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, (1..=16).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn reset_truncates_collections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        let store = FileStore::<Row>::open(&path).await.unwrap();
        store.save(&[Row { id: 1, name: "a".into() }]).await.unwrap();

        reset(&[&path]).await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }
}
