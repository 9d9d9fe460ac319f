//! Durable storage for rolling performance logs.
//!
//! Each operation's log lives under its own `perf_<operation>` key as a JSON
//! array and is overwritten wholesale on every write.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use parking_lot::Mutex;

use super::PerformanceRecord;

/// Prefix for every key written by the performance monitor.
pub const PERF_KEY_PREFIX: &str = "perf_";

pub fn perf_key(operation: &str) -> String {
    format!("{}{}", PERF_KEY_PREFIX, operation)
}

pub trait PerfStore: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<Vec<PerformanceRecord>>>;
    fn save(&self, key: &str, records: &[PerformanceRecord]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    /// All stored keys that start with [`PERF_KEY_PREFIX`].
    fn keys(&self) -> Result<Vec<String>>;
}

/// One JSON file per key inside a directory.
pub struct FilePerfStore {
    dir: PathBuf,
}

impl FilePerfStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create perf directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Operation names are free-form. Bytes outside `[A-Za-z0-9_-]` are
    /// written as `%XX` so distinct keys never share a file.
    fn file_stem(key: &str) -> String {
        let mut stem = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
                stem.push(byte as char);
            } else {
                stem.push_str(&format!("%{:02X}", byte));
            }
        }
        stem
    }

    /// Inverse of [`file_stem`](Self::file_stem). `None` for names this
    /// store did not write.
    fn key_from_stem(stem: &str) -> Option<String> {
        let bytes = stem.as_bytes();
        let mut key = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' {
                let hex = stem.get(i + 1..i + 3)?;
                key.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            } else {
                key.push(bytes[i]);
                i += 1;
            }
        }
        String::from_utf8(key).ok()
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::file_stem(key)))
    }
}

impl PerfStore for FilePerfStore {
    fn load(&self, key: &str) -> Result<Option<Vec<PerformanceRecord>>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read perf log: {}", key))?;
        let records = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse perf log: {}", key))?;
        Ok(Some(records))
    }

    fn save(&self, key: &str, records: &[PerformanceRecord]) -> Result<()> {
        let contents = serde_json::to_string(records)?;
        std::fs::write(self.path(key), contents)
            .with_context(|| format!("Failed to write perf log: {}", key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove perf log: {}", key))?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(Self::key_from_stem);
            if let Some(key) = key {
                if key.starts_with(PERF_KEY_PREFIX) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Process-local store, used in tests and when no perf directory is available.
#[derive(Default)]
pub struct MemoryPerfStore {
    logs: Mutex<BTreeMap<String, Vec<PerformanceRecord>>>,
}

impl MemoryPerfStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PerfStore for MemoryPerfStore {
    fn load(&self, key: &str) -> Result<Option<Vec<PerformanceRecord>>> {
        Ok(self.logs.lock().get(key).cloned())
    }

    fn save(&self, key: &str, records: &[PerformanceRecord]) -> Result<()> {
        self.logs.lock().insert(key.to_string(), records.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.logs.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self
            .logs
            .lock()
            .keys()
            .filter(|k| k.starts_with(PERF_KEY_PREFIX))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perf::Classification;
    use chrono::Utc;

    fn record(op: &str, ms: u64) -> PerformanceRecord {
        PerformanceRecord {
            operation: op.to_string(),
            duration_ms: ms,
            classification: Classification::from_millis(ms),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_file_store_round_trip_and_overwrite() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = FilePerfStore::new(dir.path().join("perf")).unwrap();
        let key = perf_key("fetch:stocks");

        assert!(store.load(&key).unwrap().is_none());

        store.save(&key, &[record("fetch:stocks", 100), record("fetch:stocks", 200)]).unwrap();
        store.save(&key, &[record("fetch:stocks", 900)]).unwrap();

        let loaded = store.load(&key).unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].duration_ms, 900);
        assert_eq!(store.keys().unwrap(), vec!["perf_fetch:stocks".to_string()]);
        assert!(dir.path().join("perf").join("perf_fetch%3Astocks.json").exists());

        store.remove(&key).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_keeps_similar_keys_apart() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePerfStore::new(dir.path().to_path_buf()).unwrap();
        let slash = perf_key("fetch:projects:a/b");
        let colon = perf_key("fetch:projects:a:b");
        let underscore = perf_key("fetch_projects_a_b");

        store.save(&slash, &[record("fetch:projects:a/b", 100)]).unwrap();
        store.save(&colon, &[record("fetch:projects:a:b", 3000)]).unwrap();
        store.save(&underscore, &[record("fetch_projects_a_b", 700)]).unwrap();

        assert_eq!(store.load(&slash).unwrap().unwrap()[0].duration_ms, 100);
        assert_eq!(store.load(&colon).unwrap().unwrap()[0].duration_ms, 3000);
        assert_eq!(store.load(&underscore).unwrap().unwrap()[0].duration_ms, 700);

        let mut expected = vec![slash, colon, underscore];
        expected.sort();
        assert_eq!(store.keys().unwrap(), expected);
    }

    #[test]
    fn test_file_stem_decoding_rejects_bad_escapes() {
        assert_eq!(FilePerfStore::key_from_stem("perf_a%2Fb").as_deref(), Some("perf_a/b"));
        assert_eq!(FilePerfStore::key_from_stem("perf_%ZZ"), None);
        assert_eq!(FilePerfStore::key_from_stem("perf_%4"), None);
    }

    #[test]
    fn test_file_store_ignores_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.json"), "[]").unwrap();
        std::fs::write(dir.path().join("perf_readme.txt"), "x").unwrap();
        let store = FilePerfStore::new(dir.path().to_path_buf()).unwrap();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePerfStore::new(dir.path().to_path_buf()).unwrap();
        std::fs::write(dir.path().join("perf_broken.json"), "{not json").unwrap();
        assert!(store.load("perf_broken").is_err());
    }

    #[test]
    fn test_memory_store_lists_only_perf_keys() {
        let store = MemoryPerfStore::new();
        store.save("perf_a", &[record("a", 1)]).unwrap();
        store.save("other", &[record("b", 1)]).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["perf_a".to_string()]);
    }
}
