// src/scan/mod.rs

//! Snapshot scanning.
//!
//! This module is responsible for:
//! - Compiling include/exclude patterns into a [`PatternSet`].
//! - Producing a complete point-in-time [`Snapshot`] of a resource through a
//!   [`Scanner`] implementation.
//! - (Optionally) hashing file contents so renames can be recognised.
//!
//! It does **not** diff snapshots or schedule scans; see [`crate::detect`]
//! and [`crate::engine`].

pub mod cache;
pub mod hash;
pub mod listing;
pub mod path_scanner;
pub mod path_utils;
pub mod patterns;
pub mod snapshot;

use std::path::Path;
use std::sync::Arc;

use crate::errors::ScanError;
use crate::fs::FileSystem;
use crate::types::ScannerKind;

pub use cache::HashCache;
pub use hash::compute_file_hash;
pub use listing::{ListingScanner, parse_listing};
pub use path_scanner::PathScanner;
pub use patterns::PatternSet;
pub use snapshot::{ItemMeta, Snapshot};

/// A scan strategy.
///
/// `scan` must be a complete, blocking traversal of the resource at
/// `locator`: either every matched item ends up in the returned snapshot, or
/// an error is returned. A partially populated snapshot must never be
/// returned, because the caller installs it as the baseline for the next
/// cycle.
///
/// Scanners run on the monitor's dedicated worker thread and are owned by
/// it exclusively, so `&mut self` state (caches etc.) needs no locking.
pub trait Scanner: Send {
    fn scan(&mut self, locator: &Path, patterns: &PatternSet) -> Result<Snapshot, ScanError>;
}

impl<S: Scanner + ?Sized> Scanner for Box<S> {
    fn scan(&mut self, locator: &Path, patterns: &PatternSet) -> Result<Snapshot, ScanError> {
        (**self).scan(locator, patterns)
    }
}

/// Build one of the built-in scanners.
///
/// `hash_contents` only affects scanners that can read file contents
/// (`ScannerKind::Path`); a listing carries no contents.
pub fn build_scanner(
    kind: ScannerKind,
    fs: Arc<dyn FileSystem>,
    hash_contents: bool,
) -> Box<dyn Scanner> {
    match kind {
        ScannerKind::Path => Box::new(PathScanner::new(fs).with_content_hashing(hash_contents)),
        ScannerKind::Listing => Box::new(ListingScanner::new(fs)),
    }
}
