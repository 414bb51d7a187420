// src/scan/snapshot.rs

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::time::SystemTime;

/// Metadata recorded for every item in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMeta {
    pub size: u64,
    pub modified: SystemTime,
    pub readonly: bool,
    /// `blake3` hex digest of the content, when hashing is enabled.
    pub content_hash: Option<String>,
}

impl ItemMeta {
    pub fn new(size: u64, modified: SystemTime) -> Self {
        Self {
            size,
            modified,
            readonly: false,
            content_hash: None,
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }
}

/// Complete point-in-time mapping of matched items to their metadata.
///
/// Iteration is ordered by identity, which is also the order the change
/// detector reports notices in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    items: BTreeMap<String, ItemMeta>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item, returning the metadata it replaced.
    pub fn insert(&mut self, identity: impl Into<String>, meta: ItemMeta) -> Option<ItemMeta> {
        self.items.insert(identity.into(), meta)
    }

    pub fn get(&self, identity: &str) -> Option<&ItemMeta> {
        self.items.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.items.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ItemMeta> {
        self.items.iter()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }
}

impl FromIterator<(String, ItemMeta)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, ItemMeta)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = (&'a String, &'a ItemMeta);
    type IntoIter = btree_map::Iter<'a, String, ItemMeta>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
