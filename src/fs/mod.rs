// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub mod mock;

/// What kind of entry a path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Sockets, devices, FIFOs. Never reported as items.
    Other,
}

/// The subset of file metadata the scanners care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMetadata {
    pub kind: EntryKind,
    pub len: u64,
    pub modified: SystemTime,
    pub readonly: bool,
    /// The path itself is a symbolic link; the other fields describe its
    /// target.
    pub symlink: bool,
}

/// Abstract filesystem interface.
///
/// All errors are plain `io::Error`s so scanners can tell a vanished entry
/// (`ErrorKind::NotFound`) from a real failure.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;
    /// Metadata of `path`, following symlinks.
    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path)?;
        Ok(Box::new(file))
    }

    fn metadata(&self, path: &Path) -> io::Result<EntryMetadata> {
        let link = fs::symlink_metadata(path)?;
        let meta = if link.file_type().is_symlink() {
            fs::metadata(path)?
        } else {
            link.clone()
        };
        let kind = if meta.is_dir() {
            EntryKind::Dir
        } else if meta.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        };
        Ok(EntryMetadata {
            kind,
            len: meta.len(),
            // Some platforms cannot report mtime; fall back to the epoch so
            // size comparison still detects rewrites.
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            readonly: meta.permissions().readonly(),
            symlink: link.file_type().is_symlink(),
        })
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}
