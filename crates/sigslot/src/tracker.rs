#![forbid(unsafe_code)]

//! Receiver-side back-references.
//!
//! Each receiver owns one tracker listing every (signal, key) pair that
//! currently targets it. The list mirrors the registries exactly: `connect`
//! adds to both sides under the signal-then-receiver lock order, and every
//! removal path removes from both.
//!
//! # Teardown
//!
//! On receiver drop the tracker is emptied and closed under its own lock,
//! the lock is released, and then each recorded signal is asked to detach
//! the key. A closed tracker refuses new back-references, so a connect that
//! races with the drop is rolled back instead of outliving the receiver. A
//! signal that is already gone fails to upgrade and is skipped: its own drop
//! path has already emptied (or is emptying) its registry.

use crate::error::{Result, SignalError};
use crate::handle::{ReceiverId, SignalId, SlotKey};
use crate::policy::{Locked, Policy};

/// Signal-side operations reachable from a receiver's back-references.
///
/// Implemented by the signal core; the receiver only ever sees it through
/// a weak, type-erased link.
pub trait Detach {
    fn signal_id(&self) -> SignalId;

    /// Remove the binding at `key` without touching any tracker.
    fn detach(&self, key: SlotKey);
}

pub(crate) type TrackerCell<P> = Locked<Tracker<P>, P>;

/// One back-reference: "signal `signal` holds a binding to us at `key`".
pub(crate) struct BackRef<P: Policy> {
    pub(crate) signal: SignalId,
    pub(crate) key: SlotKey,
    pub(crate) link: P::WeakRef<P::Link>,
}

pub(crate) struct Tracker<P: Policy> {
    receiver: ReceiverId,
    back_refs: Vec<BackRef<P>>,
    closed: bool,
}

impl<P: Policy> Tracker<P> {
    pub(crate) fn new(receiver: ReceiverId, capacity: usize) -> Self {
        let mut back_refs = Vec::new();
        let _ = back_refs.try_reserve(capacity);
        Self {
            receiver,
            back_refs,
            closed: false,
        }
    }

    pub(crate) fn receiver(&self) -> ReceiverId {
        self.receiver
    }

    /// Record a new back-reference.
    ///
    /// Fails with [`SignalError::ReceiverDropped`] once the tracker is
    /// closed.
    pub(crate) fn register(&mut self, back_ref: BackRef<P>) -> Result<()> {
        if self.closed {
            return Err(SignalError::ReceiverDropped {
                receiver: self.receiver,
            });
        }
        self.back_refs.try_reserve(1)?;
        self.back_refs.push(back_ref);
        Ok(())
    }

    /// Drop the record for (`signal`, `key`). Returns whether it existed.
    pub(crate) fn unregister(&mut self, signal: SignalId, key: SlotKey) -> bool {
        match self
            .back_refs
            .iter()
            .position(|b| b.signal == signal && b.key == key)
        {
            Some(index) => {
                self.back_refs.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Drop every record for `signal`. Returns how many were removed.
    pub(crate) fn unregister_signal(&mut self, signal: SignalId) -> usize {
        let before = self.back_refs.len();
        self.back_refs.retain(|b| b.signal != signal);
        before - self.back_refs.len()
    }

    pub(crate) fn take_all(&mut self) -> Vec<BackRef<P>> {
        std::mem::take(&mut self.back_refs)
    }

    /// Refuse every later [`Tracker::register`].
    pub(crate) fn close(&mut self) {
        self.closed = true;
    }

    pub(crate) fn len(&self) -> usize {
        self.back_refs.len()
    }

    pub(crate) fn is_connected_to(&self, signal: SignalId) -> bool {
        self.back_refs.iter().any(|b| b.signal == signal)
    }
}

/// Detach this receiver from every signal it is registered with.
///
/// With `close` set the tracker also stops accepting new back-references;
/// the receiver's drop path passes `true`, `disconnect_all` passes `false`.
///
/// Returns the number of back-references visited.
pub(crate) fn teardown<P: Policy>(tracker: &TrackerCell<P>, close: bool) -> usize {
    let (receiver, back_refs) = tracker.with(|t| {
        if close {
            t.close();
        }
        (t.receiver(), t.take_all())
    });
    let count = back_refs.len();
    for back_ref in back_refs {
        match P::upgrade::<P::Link>(&back_ref.link) {
            Some(link) => link.detach(back_ref.key),
            None => {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    receiver = %receiver,
                    signal = %back_ref.signal,
                    "signal already dropped; skipping detach"
                );
            }
        }
    }
    #[cfg(feature = "tracing")]
    tracing::trace!(receiver = %receiver, count, "receiver torn down");
    #[cfg(not(feature = "tracing"))]
    let _ = receiver;
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SingleThreaded;
    use std::cell::RefCell;
    use std::rc::{self, Rc};

    /// Stand-in for a signal core that records detach calls.
    struct FakeSignal {
        id: SignalId,
        detached: RefCell<Vec<SlotKey>>,
    }

    impl Detach for FakeSignal {
        fn signal_id(&self) -> SignalId {
            self.id
        }

        fn detach(&self, key: SlotKey) {
            self.detached.borrow_mut().push(key);
        }
    }

    fn fake() -> Rc<FakeSignal> {
        Rc::new(FakeSignal {
            id: SignalId::next(),
            detached: RefCell::new(Vec::new()),
        })
    }

    fn back_ref(signal: &Rc<FakeSignal>, key: u64) -> BackRef<SingleThreaded> {
        let link: rc::Weak<FakeSignal> = Rc::downgrade(signal);
        BackRef {
            signal: signal.signal_id(),
            key: SlotKey::new(key),
            link,
        }
    }

    #[test]
    fn register_and_unregister() {
        let s = fake();
        let mut tracker = Tracker::<SingleThreaded>::new(ReceiverId::next(), 0);
        tracker.register(back_ref(&s, 0)).unwrap();
        tracker.register(back_ref(&s, 1)).unwrap();
        assert_eq!(tracker.len(), 2);
        assert!(tracker.is_connected_to(s.id));

        assert!(tracker.unregister(s.id, SlotKey::new(0)));
        assert!(!tracker.unregister(s.id, SlotKey::new(0)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn unregister_signal_removes_all_of_it() {
        let a = fake();
        let b = fake();
        let mut tracker = Tracker::<SingleThreaded>::new(ReceiverId::next(), 0);
        tracker.register(back_ref(&a, 0)).unwrap();
        tracker.register(back_ref(&b, 0)).unwrap();
        tracker.register(back_ref(&a, 3)).unwrap();
        assert_eq!(tracker.unregister_signal(a.id), 2);
        assert!(!tracker.is_connected_to(a.id));
        assert!(tracker.is_connected_to(b.id));
    }

    #[test]
    fn teardown_detaches_live_signals_and_skips_dead_ones() {
        let live = fake();
        let dead = fake();
        let cell: TrackerCell<SingleThreaded> =
            Locked::new(Tracker::new(ReceiverId::next(), 0));
        cell.with(|t| {
            t.register(back_ref(&live, 4)).unwrap();
            t.register(back_ref(&dead, 7)).unwrap();
            t.register(back_ref(&live, 9)).unwrap();
        });
        drop(dead);

        assert_eq!(teardown(&cell, false), 3);
        assert_eq!(
            *live.detached.borrow(),
            vec![SlotKey::new(4), SlotKey::new(9)]
        );
        assert_eq!(cell.with(|t| t.len()), 0);
        cell.with(|t| t.register(back_ref(&live, 10))).unwrap();
    }

    #[test]
    fn closed_tracker_refuses_new_back_refs() {
        let s = fake();
        let receiver = ReceiverId::next();
        let cell: TrackerCell<SingleThreaded> = Locked::new(Tracker::new(receiver, 0));
        cell.with(|t| t.register(back_ref(&s, 1))).unwrap();

        assert_eq!(teardown(&cell, true), 1);
        let err = cell.with(|t| t.register(back_ref(&s, 2))).unwrap_err();
        assert!(matches!(err, SignalError::ReceiverDropped { receiver: r } if r == receiver));
        assert_eq!(cell.with(|t| t.len()), 0);
    }
}
