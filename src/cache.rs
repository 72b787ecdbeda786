use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::KeyValueStore;
use crate::error::CacheError;

/// One file per key under `base_path`.
#[derive(Debug, Clone)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self { base_path: base_path.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", name))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                debug!(path = %path.display(), bytes = bytes.len(), "Cache hit");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        fs::create_dir_all(&self.base_path).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&value).await?;
        file.flush().await?;
        drop(file);

        // Rename so readers never observe a partially written value.
        fs::rename(&tmp, &path).await?;
        debug!(path = %path.display(), bytes = value.len(), "Cache written");
        Ok(())
    }
}

/// In-process store. The failure switches simulate an unavailable device store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("reads disabled".to_string()));
        }
        Ok(self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("writes disabled".to_string()));
        }
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).insert(key.to_string(), value);
        Ok(())
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.as_ref().get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.as_ref().set(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_overwrites_whole_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert!(store.get("quiz_cache_5_easy_any").await.unwrap().is_none());
        store.set("quiz_cache_5_easy_any", b"first value".to_vec()).await.unwrap();
        store.set("quiz_cache_5_easy_any", b"second".to_vec()).await.unwrap();

        let got = store.get("quiz_cache_5_easy_any").await.unwrap();
        assert_eq!(got.as_deref(), Some(&b"second"[..]));
    }

    #[test]
    fn file_store_sanitizes_keys() {
        let store = FileStore::new("/cache");
        assert_eq!(store.path_for("a/../b c"), PathBuf::from("/cache/a____b_c.json"));
    }

    #[tokio::test]
    async fn memory_store_failure_switches() {
        let store = MemoryStore::new();
        store.set("k", vec![1]).await.unwrap();
        store.set_fail_reads(true);
        assert!(store.get("k").await.is_err());
        store.set_fail_reads(false);
        store.set_fail_writes(true);
        assert!(store.set("k", vec![2]).await.is_err());
        assert_eq!(store.get("k").await.unwrap(), Some(vec![1]));
    }

    #[tokio::test]
    async fn memory_store_survives_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryStore::new());
        store.set("k", vec![1]).await.unwrap();

        let poisoner = store.clone();
        let result = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("poison the entries lock");
        })
        .join();
        assert!(result.is_err());
        assert!(store.entries.is_poisoned());

        assert_eq!(store.get("k").await.unwrap(), Some(vec![1]));
        store.set("k", vec![2]).await.unwrap();
        assert_eq!(store.len(), 1);
    }
}
