// src/scan/listing.rs

//! A scanner that treats a plain-text listing as a virtual file system.
//!
//! Each non-blank line that does not start with `#` describes one entry:
//!
//! ```text
//! # size  mtime (unix seconds)  path
//! 1024    1700000000            logs/app.log
//! 0       1700000000            logs/
//! 17      1700000123            notes/meeting minutes.txt
//! ```
//!
//! Paths may contain spaces, including trailing ones: everything after the
//! mtime field up to the end of the line is the path. A trailing `/` marks a
//! directory, which is never an item. Useful for resources that can export a listing but cannot
//! be mounted, or for replaying recorded trees.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

use crate::errors::ScanError;
use crate::fs::FileSystem;
use crate::scan::{ItemMeta, PatternSet, Scanner, Snapshot};

pub struct ListingScanner {
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for ListingScanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListingScanner").finish_non_exhaustive()
    }
}

impl ListingScanner {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl Scanner for ListingScanner {
    fn scan(&mut self, listing: &Path, patterns: &PatternSet) -> Result<Snapshot, ScanError> {
        let text = self
            .fs
            .read_to_string(listing)
            .map_err(|e| ScanError::io(listing, e))?;
        let snapshot = parse_listing(&text, patterns)?;
        debug!(listing = ?listing, items = snapshot.len(), "listing scan finished");
        Ok(snapshot)
    }
}

/// Parse listing text into a snapshot. Any malformed line fails the whole
/// parse; duplicate paths keep the last entry.
pub fn parse_listing(text: &str, patterns: &PatternSet) -> Result<Snapshot, ScanError> {
    let mut snapshot = Snapshot::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim_start();
        if trimmed.trim_end().is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let malformed = |reason: &str| ScanError::Listing {
            line,
            reason: reason.to_string(),
        };

        let (size, rest) = split_field(trimmed).ok_or_else(|| malformed("missing mtime and path"))?;
        let (mtime, path) = split_field(rest).ok_or_else(|| malformed("missing path"))?;

        let size: u64 = size
            .parse()
            .map_err(|_| malformed(&format!("invalid size '{size}'")))?;
        let mtime: u64 = mtime
            .parse()
            .map_err(|_| malformed(&format!("invalid mtime '{mtime}'")))?;

        let path = path.replace('\\', "/");
        if path.ends_with('/') {
            continue;
        }
        let identity = path.strip_prefix("./").unwrap_or(&path);
        if identity.is_empty() {
            return Err(malformed("empty path"));
        }

        if !patterns.matches(identity) {
            continue;
        }

        let meta = ItemMeta::new(size, SystemTime::UNIX_EPOCH + Duration::from_secs(mtime));
        if snapshot.insert(identity, meta).is_some() {
            warn!(line, identity, "duplicate listing entry; keeping the last one");
        }
    }

    Ok(snapshot)
}

/// Split off the first whitespace-delimited field, returning it and the
/// trimmed remainder. `None` if there is no remainder.
fn split_field(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    let end = s.find(char::is_whitespace)?;
    let rest = s[end..].trim_start();
    if rest.is_empty() {
        return None;
    }
    Some((&s[..end], rest))
}
