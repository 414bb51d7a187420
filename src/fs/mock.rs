// src/fs/mock.rs

use super::{EntryKind, EntryMetadata, FileSystem};
use std::collections::{HashMap, HashSet};
use std::io::{self, Cursor, ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File {
        content: Vec<u8>,
        modified: SystemTime,
        readonly: bool,
    },
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    failing: HashSet<PathBuf>,
    /// Seconds since the epoch handed out to the next write.
    clock: u64,
}

/// In-memory filesystem for deterministic scanner tests.
///
/// Every write advances an internal clock by one second, so successive
/// writes always produce strictly newer modification times. Paths can be
/// marked as failing to simulate permission problems on mounted volumes.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        // Ensure root exists
        entries.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            state: Arc::new(Mutex::new(MockState {
                entries,
                failing: HashSet::new(),
                clock: 1_000_000,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create or overwrite a file, stamping it with the next clock tick.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.lock();
        state.clock += 1;
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(state.clock);
        let readonly = matches!(
            state.entries.get(&path),
            Some(MockEntry::File { readonly: true, .. })
        );
        insert_entry(
            &mut state.entries,
            path,
            MockEntry::File {
                content: content.into(),
                modified,
                readonly,
            },
        );
    }

    /// Create an empty directory (and its parents).
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        ensure_dir_entry(&mut state.entries, path.as_ref());
    }

    /// Overwrite a file's modification time without touching its content.
    pub fn set_modified(&self, path: impl AsRef<Path>, modified: SystemTime) {
        let mut state = self.lock();
        if let Some(MockEntry::File { modified: m, .. }) = state.entries.get_mut(path.as_ref()) {
            *m = modified;
        }
    }

    pub fn set_readonly(&self, path: impl AsRef<Path>, readonly: bool) {
        let mut state = self.lock();
        if let Some(MockEntry::File { readonly: r, .. }) = state.entries.get_mut(path.as_ref()) {
            *r = readonly;
        }
    }

    /// Current modification time of a file, if it exists.
    pub fn modified(&self, path: impl AsRef<Path>) -> Option<SystemTime> {
        match self.lock().entries.get(path.as_ref()) {
            Some(MockEntry::File { modified, .. }) => Some(*modified),
            _ => None,
        }
    }

    /// Remove a file or a whole directory subtree.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.lock();
        state.entries.retain(|p, _| !p.starts_with(path));
        if let (Some(parent), Some(name)) = (parent_of(path), path.file_name()) {
            let name = name.to_string_lossy().into_owned();
            if let Some(MockEntry::Dir(children)) = state.entries.get_mut(&parent) {
                children.retain(|c| *c != name);
            }
        }
    }

    /// Move a file, keeping its content and modification time.
    pub fn rename(&self, from: impl AsRef<Path>, to: impl AsRef<Path>) {
        let entry = self.lock().entries.get(from.as_ref()).cloned();
        if let Some(entry) = entry {
            self.remove(from.as_ref());
            let mut state = self.lock();
            insert_entry(&mut state.entries, to.as_ref().to_path_buf(), entry);
        }
    }

    /// Make every operation on `path` fail with `PermissionDenied`.
    pub fn fail_path(&self, path: impl AsRef<Path>) {
        self.lock().failing.insert(path.as_ref().to_path_buf());
    }

    pub fn clear_failures(&self) {
        self.lock().failing.clear();
    }
}

fn parent_of(path: &Path) -> Option<PathBuf> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            parent.to_path_buf()
        }
    })
}

fn insert_entry(entries: &mut HashMap<PathBuf, MockEntry>, path: PathBuf, entry: MockEntry) {
    if let Some(parent) = parent_of(&path) {
        ensure_dir_entry(entries, &parent);
        link_child(entries, &parent, &path);
    }
    entries.insert(path, entry);
}

fn ensure_dir_entry(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if entries.contains_key(path) {
        return;
    }
    entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    if let Some(parent) = parent_of(path) {
        if parent != path {
            // Avoid infinite loop at root
            ensure_dir_entry(entries, &parent);
            link_child(entries, &parent, path);
        }
    }
}

fn link_child(entries: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
    if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
        if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(ErrorKind::PermissionDenied, format!("access denied: {path:?}"))
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(ErrorKind::NotFound, format!("not found: {path:?}"))
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let mut reader = self.open_read(path)?;
        let mut out = String::new();
        reader.read_to_string(&mut out)?;
        Ok(out)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let state = self.lock();
        if state.failing.contains(path) {
            return Err(denied(path));
        }
        match state.entries.get(path) {
            Some(MockEntry::File { content, .. }) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir(_)) => Err(io::Error::new(
                ErrorKind::Other,
                format!("is a directory: {path:?}"),
            )),
            None => Err(not_found(path)),
        }
    }

    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        let state = self.lock();
        if state.failing.contains(path) {
            return Err(denied(path));
        }
        match state.entries.get(path) {
            Some(MockEntry::File {
                content,
                modified,
                readonly,
            }) => Ok(EntryMetadata {
                kind: EntryKind::File,
                len: content.len() as u64,
                modified: *modified,
                readonly: *readonly,
                symlink: false,
            }),
            Some(MockEntry::Dir(_)) => Ok(EntryMetadata {
                kind: EntryKind::Dir,
                len: 0,
                modified: SystemTime::UNIX_EPOCH,
                readonly: false,
                symlink: false,
            }),
            None => Err(not_found(path)),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let state = self.lock();
        if state.failing.contains(path) {
            return Err(denied(path));
        }
        match state.entries.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            Some(MockEntry::File { .. }) => Err(io::Error::new(
                ErrorKind::Other,
                format!("not a directory: {path:?}"),
            )),
            None => Err(not_found(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_advance_the_clock() {
        let fs = MockFileSystem::new();
        fs.add_file("./a.txt", "one");
        let first = fs.modified("./a.txt").unwrap();
        fs.add_file("./a.txt", "two");
        assert!(fs.modified("./a.txt").unwrap() > first);
    }

    #[test]
    fn nested_files_create_parent_dirs() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/bin/main.rs", "fn main() {}");

        assert_eq!(fs.read_dir(Path::new(".")).unwrap(), vec![PathBuf::from("./src")]);
        assert_eq!(
            fs.metadata(Path::new("./src/bin")).unwrap().kind,
            EntryKind::Dir
        );
        assert_eq!(fs.metadata(Path::new("./src/bin/main.rs")).unwrap().len, 12);
    }

    #[test]
    fn remove_and_rename_update_parent_listing() {
        let fs = MockFileSystem::new();
        fs.add_file("./a.txt", "a");
        fs.add_file("./b.txt", "b");
        let stamp = fs.modified("./a.txt").unwrap();

        fs.rename("./a.txt", "./moved/a.txt");
        fs.remove("./b.txt");

        assert_eq!(fs.read_dir(Path::new(".")).unwrap(), vec![PathBuf::from("./moved")]);
        assert_eq!(fs.modified("./moved/a.txt"), Some(stamp));
        assert_eq!(
            fs.metadata(Path::new("./b.txt")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn failing_paths_report_permission_denied() {
        let fs = MockFileSystem::new();
        fs.add_file("./locked/secret", "x");
        fs.fail_path("./locked");

        let err = fs.read_dir(Path::new("./locked")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        fs.clear_failures();
        assert!(fs.read_dir(Path::new("./locked")).is_ok());
    }
}
