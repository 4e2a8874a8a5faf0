#![forbid(unsafe_code)]

//! Opaque identities for signals, receivers, and connections.
//!
//! Signals and receivers never hold pointers to each other's state directly;
//! they refer to one another by id plus a weak link. Ids are allocated from
//! process-wide counters and are never reused.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SIGNAL_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_RECEIVER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one [`Signal`](crate::Signal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u64);

impl SignalId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SIGNAL_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sig#{}", self.0)
    }
}

/// Identity of one [`Receiver`](crate::Receiver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReceiverId(u64);

impl ReceiverId {
    pub(crate) fn next() -> Self {
        Self(NEXT_RECEIVER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReceiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rcv#{}", self.0)
    }
}

/// Position of a binding inside one signal's registry.
///
/// Keys are strictly increasing per registry, so ordering by key is
/// connection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey(u64);

impl SlotKey {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to one registered binding, returned by `connect`.
///
/// A `Connection` is plain data: it keeps nothing alive, and using it after
/// the binding is gone (explicit disconnect, receiver drop, signal drop) is
/// a harmless no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    signal: SignalId,
    receiver: Option<ReceiverId>,
    key: SlotKey,
}

impl Connection {
    pub(crate) const fn new(signal: SignalId, receiver: Option<ReceiverId>, key: SlotKey) -> Self {
        Self {
            signal,
            receiver,
            key,
        }
    }

    /// The signal this connection was made on.
    #[must_use]
    pub const fn signal(&self) -> SignalId {
        self.signal
    }

    /// The receiver targeted by this connection, or `None` for a
    /// free-standing handler connected with `connect_fn`.
    #[must_use]
    pub const fn receiver(&self) -> Option<ReceiverId> {
        self.receiver
    }

    /// Registry key of the binding.
    #[must_use]
    pub const fn key(&self) -> SlotKey {
        self.key
    }
}
