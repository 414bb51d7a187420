// src/notice.rs

//! Change notices and the event kinds subscribers filter on.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;
use std::time::SystemTime;

use serde::Deserialize;

use crate::scan::ItemMeta;

/// Kind of change reported by a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Event {
    Create,
    Update,
    Remove,
    /// Only produced when content hashing is enabled.
    Rename,
}

impl Event {
    pub const ALL: [Event; 4] = [Event::Create, Event::Update, Event::Remove, Event::Rename];

    const fn bit(self) -> u32 {
        match self {
            Event::Create => 0x01,
            Event::Update => 0x02,
            Event::Remove => 0x04,
            Event::Rename => 0x08,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Event::Create => "create",
            Event::Update => "update",
            Event::Remove => "remove",
            Event::Rename => "rename",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(Event::Create),
            "update" => Ok(Event::Update),
            "remove" => Ok(Event::Remove),
            "rename" => Ok(Event::Rename),
            other => Err(format!(
                "invalid event: {other} (expected create, update, remove or rename)"
            )),
        }
    }
}

/// A set of [`Event`] kinds, used as a subscriber's interest filter.
///
/// ```
/// use pollwatch::notice::{Event, EventSet};
///
/// let interest = Event::Create | Event::Remove;
/// assert!(interest.contains(Event::Create));
/// assert!(!interest.contains(Event::Update));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventSet(u32);

impl EventSet {
    pub const fn empty() -> Self {
        EventSet(0)
    }

    pub const fn all() -> Self {
        EventSet(0x0f)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, event: Event) -> bool {
        self.0 & event.bit() != 0
    }

    pub const fn intersects(self, other: EventSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn insert(&mut self, event: Event) {
        self.0 |= event.bit();
    }

    pub fn iter(self) -> impl Iterator<Item = Event> {
        Event::ALL.into_iter().filter(move |e| self.contains(*e))
    }
}

impl From<Event> for EventSet {
    fn from(event: Event) -> Self {
        EventSet(event.bit())
    }
}

impl FromIterator<Event> for EventSet {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut set = EventSet::empty();
        for event in iter {
            set.insert(event);
        }
        set
    }
}

impl BitOr for EventSet {
    type Output = EventSet;

    fn bitor(self, rhs: EventSet) -> EventSet {
        EventSet(self.0 | rhs.0)
    }
}

impl BitOr<Event> for EventSet {
    type Output = EventSet;

    fn bitor(self, rhs: Event) -> EventSet {
        EventSet(self.0 | rhs.bit())
    }
}

impl BitOr for Event {
    type Output = EventSet;

    fn bitor(self, rhs: Event) -> EventSet {
        EventSet(self.bit() | rhs.bit())
    }
}

impl BitOrAssign<Event> for EventSet {
    fn bitor_assign(&mut self, rhs: Event) {
        self.insert(rhs);
    }
}

impl fmt::Display for EventSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Event::as_str).collect();
        f.write_str(&names.join("|"))
    }
}

impl fmt::Debug for EventSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventSet({self})")
    }
}

/// A single reported change.
///
/// Notices are built by the change detector at the moment a difference is
/// found and are never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    identity: String,
    kind: Event,
    timestamp: SystemTime,
    meta: ItemMeta,
    renamed_from: Option<String>,
}

impl Notice {
    pub(crate) fn new(identity: impl Into<String>, kind: Event, meta: ItemMeta) -> Self {
        Self {
            identity: identity.into(),
            kind,
            timestamp: SystemTime::now(),
            meta,
            renamed_from: None,
        }
    }

    pub(crate) fn renamed(identity: impl Into<String>, from: impl Into<String>, meta: ItemMeta) -> Self {
        Self {
            renamed_from: Some(from.into()),
            ..Self::new(identity, Event::Rename, meta)
        }
    }

    /// Item identity: path relative to the scanned root, `/`-separated.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn kind(&self) -> Event {
        self.kind
    }

    /// When the difference was detected.
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Metadata of the item. For removals this is the last metadata seen.
    pub fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    /// Previous identity, set only on `Rename` notices.
    pub fn renamed_from(&self) -> Option<&str> {
        self.renamed_from.as_deref()
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.renamed_from {
            Some(from) => write!(f, "{{{from} -> {} : {}}}", self.identity, self.kind),
            None => write!(f, "{{{} : {}}}", self.identity, self.kind),
        }
    }
}
