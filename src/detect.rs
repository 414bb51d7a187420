// src/detect.rs

//! Change detection: diffing two snapshots into notices.
//!
//! The detector is a pure function of the previous and current snapshot. It
//! has no channels, no IO and no clock other than the timestamp stamped on
//! each notice, so it is unit tested directly.

use std::collections::{HashMap, HashSet};

use crate::notice::{Event, Notice};
use crate::scan::Snapshot;

/// Diff two snapshots with rename detection disabled.
pub fn diff(previous: Option<&Snapshot>, current: &Snapshot) -> Vec<Notice> {
    ChangeDetector::default().diff(previous, current)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    detect_renames: bool,
}

impl ChangeDetector {
    pub fn new(detect_renames: bool) -> Self {
        Self { detect_renames }
    }

    /// Produce the notices for one cycle.
    ///
    /// - `previous == None` (first successful scan): silent baseline, no
    ///   notices.
    /// - In both: `Update` if the current mtime is strictly newer, or else if
    ///   the size differs.
    /// - Only in current: `Create`.
    /// - Only in previous: `Remove`, carrying the last known metadata.
    ///
    /// Creates and updates come first, in current-snapshot order, followed by
    /// removals in previous-snapshot order. With rename detection on, a
    /// create and a removal with equal content hash and size collapse into a
    /// single `Rename` at the create's position.
    pub fn diff(&self, previous: Option<&Snapshot>, current: &Snapshot) -> Vec<Notice> {
        let Some(previous) = previous else {
            return Vec::new();
        };

        let rename_sources = if self.detect_renames {
            removal_candidates(previous, current)
        } else {
            HashMap::new()
        };
        let mut renamed: HashSet<&str> = HashSet::new();

        let mut notices = Vec::new();

        for (identity, meta) in current {
            match previous.get(identity) {
                Some(old) => {
                    if meta.modified > old.modified || meta.size != old.size {
                        notices.push(Notice::new(identity.as_str(), Event::Update, meta.clone()));
                    }
                }
                None => {
                    let source = meta.content_hash.as_deref().and_then(|hash| {
                        rename_sources
                            .get(&(hash, meta.size))
                            .and_then(|candidates| {
                                candidates.iter().find(|c| !renamed.contains(*c)).copied()
                            })
                    });
                    match source {
                        Some(from) => {
                            renamed.insert(from);
                            notices.push(Notice::renamed(identity.as_str(), from, meta.clone()));
                        }
                        None => {
                            notices.push(Notice::new(identity.as_str(), Event::Create, meta.clone()))
                        }
                    }
                }
            }
        }

        // Removal needs the complete current snapshot, hence the second pass.
        for (identity, meta) in previous {
            if !current.contains(identity) && !renamed.contains(identity.as_str()) {
                notices.push(Notice::new(identity.as_str(), Event::Remove, meta.clone()));
            }
        }

        notices
    }
}

/// Removed items that carry a content hash, keyed by (hash, size), in
/// previous-snapshot order.
fn removal_candidates<'a>(
    previous: &'a Snapshot,
    current: &Snapshot,
) -> HashMap<(&'a str, u64), Vec<&'a str>> {
    let mut map: HashMap<(&str, u64), Vec<&str>> = HashMap::new();
    for (identity, meta) in previous {
        if current.contains(identity) {
            continue;
        }
        if let Some(hash) = meta.content_hash.as_deref() {
            map.entry((hash, meta.size)).or_default().push(identity.as_str());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use super::*;
    use crate::scan::ItemMeta;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn snap(items: &[(&str, u64, u64)]) -> Snapshot {
        items
            .iter()
            .map(|(id, mtime, size)| (id.to_string(), ItemMeta::new(*size, at(*mtime))))
            .collect()
    }

    fn hashed(items: &[(&str, u64, u64, &str)]) -> Snapshot {
        items
            .iter()
            .map(|(id, mtime, size, hash)| {
                (id.to_string(), ItemMeta::new(*size, at(*mtime)).with_hash(*hash))
            })
            .collect()
    }

    fn summary(notices: &[Notice]) -> Vec<(String, Event)> {
        notices
            .iter()
            .map(|n| (n.identity().to_string(), n.kind()))
            .collect()
    }

    #[test]
    fn newer_mtime_is_one_update() {
        let prev = snap(&[("a", 1, 10)]);
        let cur = snap(&[("a", 2, 10)]);
        assert_eq!(summary(&diff(Some(&prev), &cur)), vec![("a".to_string(), Event::Update)]);
    }

    #[test]
    fn size_change_with_same_mtime_is_an_update() {
        let prev = snap(&[("a", 5, 10)]);
        let cur = snap(&[("a", 5, 11)]);
        assert_eq!(summary(&diff(Some(&prev), &cur)), vec![("a".to_string(), Event::Update)]);
    }

    #[test]
    fn older_mtime_with_same_size_is_not_an_update() {
        let prev = snap(&[("a", 5, 10)]);
        let cur = snap(&[("a", 4, 10)]);
        assert!(diff(Some(&prev), &cur).is_empty());
    }

    #[test]
    fn missing_item_is_one_remove() {
        let prev = snap(&[("a", 1, 1), ("b", 1, 1)]);
        let cur = snap(&[("a", 1, 1)]);
        let notices = diff(Some(&prev), &cur);
        assert_eq!(summary(&notices), vec![("b".to_string(), Event::Remove)]);
        assert_eq!(notices[0].meta().size, 1);
    }

    #[test]
    fn first_scan_is_a_silent_baseline() {
        let cur = snap(&[("x", 1, 1)]);
        assert!(diff(None, &cur).is_empty());
    }

    #[test]
    fn empty_previous_reports_everything_as_created() {
        let prev = Snapshot::new();
        let cur = snap(&[("x", 1, 1)]);
        assert_eq!(summary(&diff(Some(&prev), &cur)), vec![("x".to_string(), Event::Create)]);
    }

    #[test]
    fn creates_and_updates_precede_removes() {
        let prev = snap(&[("a", 1, 1), ("c", 1, 1), ("d", 1, 1)]);
        let cur = snap(&[("a", 2, 1), ("b", 1, 1), ("d", 1, 1)]);
        assert_eq!(
            summary(&diff(Some(&prev), &cur)),
            vec![
                ("a".to_string(), Event::Update),
                ("b".to_string(), Event::Create),
                ("c".to_string(), Event::Remove),
            ]
        );
    }

    #[test]
    fn renames_pair_by_hash_and_size() {
        let prev = hashed(&[("old.txt", 1, 4, "h1"), ("gone.txt", 1, 4, "h2")]);
        let cur = hashed(&[("new.txt", 1, 4, "h1")]);

        let notices = ChangeDetector::new(true).diff(Some(&prev), &cur);
        assert_eq!(
            summary(&notices),
            vec![("new.txt".to_string(), Event::Rename), ("gone.txt".to_string(), Event::Remove)]
        );
        assert_eq!(notices[0].renamed_from(), Some("old.txt"));
    }

    #[test]
    fn each_removed_item_is_paired_at_most_once() {
        let prev = hashed(&[("a", 1, 4, "h")]);
        let cur = hashed(&[("b", 1, 4, "h"), ("c", 1, 4, "h")]);

        let notices = ChangeDetector::new(true).diff(Some(&prev), &cur);
        assert_eq!(
            summary(&notices),
            vec![("b".to_string(), Event::Rename), ("c".to_string(), Event::Create)]
        );
    }

    #[test]
    fn renames_are_not_reported_when_disabled_or_unhashed() {
        let prev = hashed(&[("old", 1, 4, "h")]);
        let cur = hashed(&[("new", 1, 4, "h")]);
        assert_eq!(
            summary(&ChangeDetector::new(false).diff(Some(&prev), &cur)),
            vec![("new".to_string(), Event::Create), ("old".to_string(), Event::Remove)]
        );

        let prev = snap(&[("old", 1, 4)]);
        let cur = snap(&[("new", 1, 4)]);
        assert_eq!(
            summary(&ChangeDetector::new(true).diff(Some(&prev), &cur)),
            vec![("new".to_string(), Event::Create), ("old".to_string(), Event::Remove)]
        );
    }

    #[test]
    fn same_hash_different_size_is_not_a_rename() {
        let prev = hashed(&[("old", 1, 4, "h")]);
        let cur = hashed(&[("new", 1, 5, "h")]);
        let kinds: Vec<Event> = ChangeDetector::new(true)
            .diff(Some(&prev), &cur)
            .iter()
            .map(Notice::kind)
            .collect();
        assert_eq!(kinds, vec![Event::Create, Event::Remove]);
    }
}
