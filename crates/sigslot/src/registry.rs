#![forbid(unsafe_code)]

//! Per-signal ordered collection of bindings.
//!
//! # Invariants
//!
//! 1. Entries are sorted by [`SlotKey`]; keys are handed out in increasing
//!    order, so sorted-by-key is connection order.
//! 2. A connect either appends one entry or leaves the registry untouched:
//!    growth is reserved before anything is pushed.
//! 3. Removal by key is idempotent.
//!
//! The registry never calls into bindings or trackers itself. Callers move
//! removed entries out of the lock before dropping them, since dropping a
//! free-standing handler may run arbitrary destructors.
//!
//! # Performance
//!
//! | Operation          | Complexity |
//! |--------------------|------------|
//! | `push`             | O(1) amortized |
//! | `remove`           | O(log n) lookup + O(n) shift |
//! | `remove_all_for`   | O(n) |
//! | `snapshot`         | O(n) pointer clones |

use std::mem;

use crate::binding::BindingId;
use crate::error::Result;
use crate::handle::{ReceiverId, SlotKey};
use crate::policy::Policy;
use crate::tracker::TrackerCell;

/// One registered binding.
pub(crate) struct Entry<A: 'static, P: Policy> {
    pub(crate) key: SlotKey,
    pub(crate) target: BindingId,
    pub(crate) slot: P::Shared<P::Slot<A>>,
    /// Tracker of the targeted receiver; `None` for free-standing handlers.
    pub(crate) tracker: Option<P::WeakRef<TrackerCell<P>>>,
}

pub(crate) struct Registry<A: 'static, P: Policy> {
    entries: Vec<Entry<A, P>>,
    next_key: u64,
}

impl<A: 'static, P: Policy> Registry<A, P> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut entries = Vec::new();
        // Capacity is a hint; growth failures surface on `reserve`.
        let _ = entries.try_reserve(capacity);
        Self {
            entries,
            next_key: 0,
        }
    }

    /// Make room for one more binding.
    ///
    /// Split from [`Registry::push`] so that a failed reservation hands the
    /// slot back to the caller instead of dropping it under the lock.
    pub(crate) fn reserve(&mut self) -> Result<()> {
        self.entries.try_reserve(1)?;
        Ok(())
    }

    /// Append a binding and return its key. Call [`Registry::reserve`]
    /// first.
    pub(crate) fn push(
        &mut self,
        target: BindingId,
        slot: P::Shared<P::Slot<A>>,
        tracker: Option<P::WeakRef<TrackerCell<P>>>,
    ) -> SlotKey {
        let key = SlotKey::new(self.next_key);
        self.next_key += 1;
        self.entries.push(Entry {
            key,
            target,
            slot,
            tracker,
        });
        key
    }

    fn position(&self, key: SlotKey) -> Option<usize> {
        self.entries.binary_search_by_key(&key, |e| e.key).ok()
    }

    /// Remove the entry with `key`, if still present.
    pub(crate) fn remove(&mut self, key: SlotKey) -> Option<Entry<A, P>> {
        let index = self.position(key)?;
        Some(self.entries.remove(index))
    }

    /// Remove every entry targeting `receiver`, preserving the order of the
    /// rest.
    pub(crate) fn remove_all_for(&mut self, receiver: ReceiverId) -> Vec<Entry<A, P>> {
        let (removed, kept): (Vec<_>, Vec<_>) = mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.target.targets(receiver));
        self.entries = kept;
        removed
    }

    pub(crate) fn take_all(&mut self) -> Vec<Entry<A, P>> {
        mem::take(&mut self.entries)
    }

    /// Copy of the current binding sequence, in connection order.
    pub(crate) fn snapshot(&self) -> Result<Vec<P::Shared<P::Slot<A>>>> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(self.entries.len())?;
        slots.extend(self.entries.iter().map(|e| e.slot.clone()));
        Ok(slots)
    }

    pub(crate) fn contains(&self, target: &BindingId) -> bool {
        self.entries.iter().any(|e| e.target == *target)
    }

    pub(crate) fn contains_key(&self, key: SlotKey) -> bool {
        self.position(key).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entry<A, P>> {
        self.entries.iter()
    }
}
