// src/scan/path_scanner.rs

use std::collections::HashSet;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::ScanError;
use crate::fs::{EntryKind, FileSystem};
use crate::scan::cache::HashCache;
use crate::scan::path_utils::identity_for;
use crate::scan::{ItemMeta, PatternSet, Scanner, Snapshot};

/// Walks a directory tree and records every matching regular file.
///
/// Item errors are handled as follows:
/// - an entry that disappears between listing and inspection is skipped;
/// - any other failure (unreadable directory, failing `stat`, unreadable
///   file while hashing) aborts the whole scan, since a missing subtree
///   would otherwise be reported as a mass removal.
pub struct PathScanner {
    fs: Arc<dyn FileSystem>,
    hash_contents: bool,
    cache: HashCache,
}

impl fmt::Debug for PathScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathScanner")
            .field("hash_contents", &self.hash_contents)
            .field("cached_hashes", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl PathScanner {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            hash_contents: false,
            cache: HashCache::new(),
        }
    }

    /// Record a `blake3` content hash for every item.
    pub fn with_content_hashing(mut self, enabled: bool) -> Self {
        self.hash_contents = enabled;
        self
    }
}

impl Scanner for PathScanner {
    fn scan(&mut self, root: &Path, patterns: &PatternSet) -> Result<Snapshot, ScanError> {
        let root_meta = self.fs.metadata(root).map_err(|e| ScanError::io(root, e))?;
        if root_meta.kind != EntryKind::Dir {
            return Err(ScanError::RootNotDirectory(root.to_path_buf()));
        }

        let mut snapshot = Snapshot::new();
        let mut hashed: HashSet<PathBuf> = HashSet::new();
        let mut stack = vec![root.to_path_buf()];

        while let Some(dir) = stack.pop() {
            let entries = self.fs.read_dir(&dir).map_err(|e| ScanError::io(&dir, e))?;

            for path in entries {
                let meta = match self.fs.metadata(&path) {
                    Ok(meta) => meta,
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        debug!(?path, "entry vanished during scan; skipping");
                        continue;
                    }
                    Err(err) => return Err(ScanError::io(&path, err)),
                };

                match meta.kind {
                    // Symlinked directories are not followed, so link cycles
                    // cannot make a scan run forever.
                    EntryKind::Dir if meta.symlink => continue,
                    EntryKind::Dir => {
                        stack.push(path);
                        continue;
                    }
                    EntryKind::Other => continue,
                    EntryKind::File => {}
                }

                let Some(identity) = identity_for(root, &path) else {
                    warn!(?path, ?root, "could not relativize path against root");
                    continue;
                };

                if !patterns.matches(&identity) {
                    continue;
                }

                let mut item =
                    ItemMeta::new(meta.len, meta.modified).with_readonly(meta.readonly);

                if self.hash_contents {
                    match self
                        .cache
                        .get_or_compute(self.fs.as_ref(), &path, meta.len, meta.modified)
                    {
                        Ok(hash) => item.content_hash = Some(hash),
                        Err(err) if err.kind() == ErrorKind::NotFound => {
                            debug!(?path, "file vanished before hashing; skipping");
                            continue;
                        }
                        Err(err) => return Err(ScanError::io(&path, err)),
                    }
                    hashed.insert(path);
                }

                snapshot.insert(identity, item);
            }
        }

        if self.hash_contents {
            self.cache.retain_seen(&hashed);
        }

        debug!(root = ?root, items = snapshot.len(), "path scan finished");
        Ok(snapshot)
    }
}
