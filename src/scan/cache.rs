// src/scan/cache.rs

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::fs::FileSystem;
use crate::scan::hash::compute_file_hash;

#[derive(Debug, Clone)]
struct CachedHash {
    size: u64,
    modified: SystemTime,
    hash: String,
}

/// In-memory cache of file content hashes.
///
/// An entry is reused as long as the file's size and modification time are
/// unchanged, so a steady tree is only read once.
#[derive(Debug, Default)]
pub struct HashCache {
    hashes: HashMap<PathBuf, CachedHash>,
}

impl HashCache {
    pub fn new() -> Self {
        Self {
            hashes: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// Get the hash for a file, recomputing it if the file changed since it
    /// was cached.
    pub fn get_or_compute(
        &mut self,
        fs: &dyn FileSystem,
        path: &Path,
        size: u64,
        modified: SystemTime,
    ) -> io::Result<String> {
        if let Some(cached) = self.hashes.get(path) {
            if cached.size == size && cached.modified == modified {
                return Ok(cached.hash.clone());
            }
        }

        debug!("cache miss: computing hash for {:?}", path);
        let hash = compute_file_hash(fs, path)?;
        self.hashes.insert(
            path.to_path_buf(),
            CachedHash {
                size,
                modified,
                hash: hash.clone(),
            },
        );
        Ok(hash)
    }

    /// Drop entries for files that were not seen by the latest scan.
    pub fn retain_seen(&mut self, seen: &HashSet<PathBuf>) {
        let before = self.hashes.len();
        self.hashes.retain(|path, _| seen.contains(path));
        let pruned = before - self.hashes.len();
        if pruned > 0 {
            debug!(pruned, "pruned stale hash cache entries");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn reuses_hash_while_stamp_is_unchanged() {
        let fs = MockFileSystem::new();
        fs.add_file("./a", "one");
        let stamp = fs.modified("./a").unwrap();
        let mut cache = HashCache::new();

        let first = cache.get_or_compute(&fs, Path::new("./a"), 3, stamp).unwrap();

        // Same size and mtime: the stale cached hash is returned.
        fs.add_file("./a", "two");
        fs.set_modified("./a", stamp);
        let second = cache.get_or_compute(&fs, Path::new("./a"), 3, stamp).unwrap();
        assert_eq!(first, second);

        // New stamp forces a re-read.
        let newer = fs.modified("./a").unwrap() + std::time::Duration::from_secs(1);
        let third = cache.get_or_compute(&fs, Path::new("./a"), 3, newer).unwrap();
        assert_ne!(first, third);
    }

    #[test]
    fn retain_seen_prunes_missing_paths() {
        let fs = MockFileSystem::new();
        fs.add_file("./a", "a");
        fs.add_file("./b", "b");
        let mut cache = HashCache::new();
        for p in ["./a", "./b"] {
            let stamp = fs.modified(p).unwrap();
            cache.get_or_compute(&fs, Path::new(p), 1, stamp).unwrap();
        }
        assert_eq!(cache.len(), 2);

        let seen: HashSet<PathBuf> = [PathBuf::from("./a")].into_iter().collect();
        cache.retain_seen(&seen);
        assert_eq!(cache.len(), 1);
    }
}
