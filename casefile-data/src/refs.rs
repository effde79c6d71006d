//! Shared reference payload store.
//!
//! Reference files live under the `common` subdirectory of a data
//! directory and are read at most once per store. The byte cache is
//! shared by every case of a run and stays correct when parallel cases
//! race to resolve the same path.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Subdirectory of the data directory that holds reference payloads.
pub const REF_DIR: &str = "common";

/// Errors from resolving reference payloads.
#[derive(Debug, Error)]
pub enum RefError {
    #[error("failed reading reference file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Cache of reference payload bytes keyed by resolved path.
///
/// Populated on first access and never evicted. Constructed once per
/// harness and handed to every case, so cases that name the same
/// reference share one read.
#[derive(Debug, Default)]
pub struct RefStore {
    cache: RwLock<HashMap<PathBuf, Arc<[u8]>>>,
}

impl RefStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `name` against `<dir>/common/<name>` and return its
    /// contents. After the first successful read the cached bytes are
    /// returned without touching the filesystem again.
    pub fn resolve(&self, dir: &Path, name: &str) -> Result<Arc<[u8]>, RefError> {
        let path = dir.join(REF_DIR).join(name);

        {
            let cache = self.cache.read().expect("reference cache lock poisoned");
            if let Some(bytes) = cache.get(&path) {
                return Ok(Arc::clone(bytes));
            }
        }

        // Read outside the lock; a racing resolver may do the same.
        let bytes: Arc<[u8]> = fs::read(&path)
            .map_err(|source| RefError::Io {
                path: path.clone(),
                source,
            })?
            .into();

        let mut cache = self.cache.write().expect("reference cache lock poisoned");
        // First insert wins, so every racer observes the same bytes.
        Ok(Arc::clone(cache.entry(path).or_insert(bytes)))
    }

    /// Number of distinct resolved paths currently cached.
    pub fn len(&self) -> usize {
        self.cache.read().expect("reference cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached payload. Subsequent resolves read from disk
    /// again; useful for long-lived stores spanning several suites.
    pub fn clear(&self) {
        self.cache
            .write()
            .expect("reference cache lock poisoned")
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::tempdir;

    fn write_ref(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let common = dir.join(REF_DIR);
        fs::create_dir_all(&common).expect("create common dir");
        let path = common.join(name);
        fs::write(&path, content).expect("write ref");
        path
    }

    // ===========================================
    // Resolution
    // ===========================================

    #[test]
    fn test_resolve_reads_common_subdirectory() {
        let dir = tempdir().expect("create temp dir");
        write_ref(dir.path(), "kvs.json", b"{\"a\": \"b\"}");

        let store = RefStore::new();
        let bytes = store.resolve(dir.path(), "kvs.json").expect("resolve");

        assert_eq!(&bytes[..], b"{\"a\": \"b\"}");
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = tempdir().expect("create temp dir");
        let store = RefStore::new();

        let result = store.resolve(dir.path(), "absent.json");

        let err = result.expect_err("missing reference must fail");
        assert!(matches!(err, RefError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_resolve_distinct_names_cached_separately() {
        let dir = tempdir().expect("create temp dir");
        write_ref(dir.path(), "one.json", b"1");
        write_ref(dir.path(), "two.json", b"2");

        let store = RefStore::new();
        let one = store.resolve(dir.path(), "one.json").expect("one");
        let two = store.resolve(dir.path(), "two.json").expect("two");

        assert_eq!(&one[..], b"1");
        assert_eq!(&two[..], b"2");
        assert_eq!(store.len(), 2);
    }

    // ===========================================
    // Cache behavior
    // ===========================================

    #[test]
    fn test_resolve_does_not_reread_after_first_hit() {
        let dir = tempdir().expect("create temp dir");
        let path = write_ref(dir.path(), "kvs.json", b"cached");

        let store = RefStore::new();
        let first = store.resolve(dir.path(), "kvs.json").expect("first");

        // Removing the file proves later resolves come from the cache.
        fs::remove_file(&path).expect("remove ref");
        let second = store.resolve(dir.path(), "kvs.json").expect("second");

        assert_eq!(first, second);
        assert_eq!(&second[..], b"cached");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_failed_resolve_not_cached() {
        let dir = tempdir().expect("create temp dir");
        let store = RefStore::new();

        assert!(store.resolve(dir.path(), "late.json").is_err());
        assert!(store.is_empty());

        // The file appearing afterwards makes the same name resolvable.
        write_ref(dir.path(), "late.json", b"now present");
        let bytes = store.resolve(dir.path(), "late.json").expect("resolve");
        assert_eq!(&bytes[..], b"now present");
    }

    #[test]
    fn test_clear_forces_reread() {
        let dir = tempdir().expect("create temp dir");
        let path = write_ref(dir.path(), "kvs.json", b"original");

        let store = RefStore::new();
        store.resolve(dir.path(), "kvs.json").expect("first");

        store.clear();
        assert!(store.is_empty());

        fs::write(&path, b"updated").expect("rewrite ref");
        let bytes = store.resolve(dir.path(), "kvs.json").expect("second");
        assert_eq!(&bytes[..], b"updated");
    }

    // ===========================================
    // Concurrency
    // ===========================================

    #[test]
    fn test_concurrent_resolution_yields_identical_bytes() {
        let dir = tempdir().expect("create temp dir");
        write_ref(dir.path(), "shared.json", b"{\"payload\": true}");

        let store = RefStore::new();
        let results: Vec<Arc<[u8]>> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| store.resolve(dir.path(), "shared.json").expect("resolve")))
                .collect();
            handles.into_iter().map(|h| h.join().expect("join")).collect()
        });

        for bytes in &results {
            assert_eq!(&bytes[..], b"{\"payload\": true}");
        }
        // All racers landed on one cache entry.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_distinct_references() {
        let dir = tempdir().expect("create temp dir");
        write_ref(dir.path(), "a.json", b"a");
        write_ref(dir.path(), "b.json", b"b");

        let store = RefStore::new();
        thread::scope(|s| {
            s.spawn(|| {
                let bytes = store.resolve(dir.path(), "a.json").expect("a");
                assert_eq!(&bytes[..], b"a");
            });
            s.spawn(|| {
                let bytes = store.resolve(dir.path(), "b.json").expect("b");
                assert_eq!(&bytes[..], b"b");
            });
        });

        assert_eq!(store.len(), 2);
    }
}
