//! Run-scoped style cache: media → content hash → content.
//!
//! A slot is reserved synchronously before any resolution work starts, so a
//! second reference to the same `(media, hash)` sees the reservation and never
//! triggers another read or fetch. Media values are independent namespaces.

use rustc_hash::FxHashMap;

use crate::hash::ContentHash;

/// State of one registry slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Reserved, remote fetch in flight.
    Pending,
    /// Content known.
    Resolved(String),
    /// Local reference that matched nothing. Bundles treat it as empty.
    Missing,
}

impl Slot {
    /// Content used when concatenating a bundle.
    pub fn content(&self) -> &str {
        match self {
            Self::Resolved(content) => content,
            Self::Pending | Self::Missing => "",
        }
    }
}

/// Outcome of [`StyleRegistry::reserve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// Caller reserved the slot and must resolve it.
    First,
    /// Slot already existed (resolved, pending or missing).
    AlreadyPresent,
}

impl Reservation {
    pub fn is_first(self) -> bool {
        self == Self::First
    }
}

#[derive(Debug, Default)]
pub struct StyleRegistry {
    styles: FxHashMap<String, FxHashMap<ContentHash, Slot>>,
}

impl StyleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate-or-get: reserve `(media, hash)` as pending if unseen.
    pub fn reserve(&mut self, media: &str, hash: ContentHash) -> Reservation {
        let slots = self.styles.entry(media.to_string()).or_default();
        if slots.contains_key(&hash) {
            return Reservation::AlreadyPresent;
        }
        slots.insert(hash, Slot::Pending);
        Reservation::First
    }

    /// Fill a slot (overwrites the pending marker).
    pub fn resolve(&mut self, media: &str, hash: ContentHash, content: String) {
        self.set(media, hash, Slot::Resolved(content));
    }

    /// Mark a slot as permanently unresolved.
    pub fn mark_missing(&mut self, media: &str, hash: ContentHash) {
        self.set(media, hash, Slot::Missing);
    }

    fn set(&mut self, media: &str, hash: ContentHash, slot: Slot) {
        self.styles
            .entry(media.to_string())
            .or_default()
            .insert(hash, slot);
    }

    pub fn get(&self, media: &str, hash: &ContentHash) -> Option<&Slot> {
        self.styles.get(media)?.get(hash)
    }

    /// Content for concatenation; unknown and unresolved slots read as `""`.
    pub fn content(&self, media: &str, hash: &ContentHash) -> &str {
        self.get(media, hash).map_or("", Slot::content)
    }

    /// Number of distinct `(media, hash)` entries.
    pub fn len(&self) -> usize {
        self.styles.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots still waiting on a fetch.
    pub fn pending(&self) -> usize {
        self.styles
            .values()
            .flat_map(FxHashMap::values)
            .filter(|slot| **slot == Slot::Pending)
            .count()
    }
}
