#![forbid(unsafe_code)]

//! Receiver-capable objects.
//!
//! A [`Receiver<T, P>`] wraps the user's state `T` together with a tracker
//! of every signal currently bound to it. Methods are bound as
//! `fn(&T, ...)`: receivers are shared between the owner and in-flight
//! emissions, so state that changes in response to a signal uses interior
//! mutability (`Cell`, `RefCell`, atomics, `Mutex`).
//!
//! # Lifetime
//!
//! Dropping a receiver detaches it from every signal before the state is
//! released. If another thread is running one of its methods at that moment
//! (thread-safe policy only), that call keeps the state alive until it
//! returns; bindings that have not started yet are skipped.

use std::fmt;
use std::ops::Deref;

use crate::args::Args;
use crate::config::ReceiverConfig;
use crate::handle::ReceiverId;
use crate::policy::{Locked, Policy, SingleThreaded, ThreadSafe};
use crate::signal::Signal;
use crate::tracker::{self, Tracker, TrackerCell};

/// User state that can be the target of signal bindings.
///
/// Dereferences to `T`.
pub struct Receiver<T: 'static, P: Policy = SingleThreaded> {
    id: ReceiverId,
    name: Option<String>,
    state: P::Shared<T>,
    tracker: P::Shared<TrackerCell<P>>,
}

impl<T: 'static> Receiver<T, SingleThreaded> {
    /// Wrap `state` as a single-threaded receiver.
    #[must_use]
    pub fn new(state: T) -> Self {
        Self::with_config(state, ReceiverConfig::default())
    }
}

impl<T: 'static> Receiver<T, ThreadSafe> {
    /// Wrap `state` as a thread-safe receiver.
    #[must_use]
    pub fn new_sync(state: T) -> Self {
        Self::with_config(state, ReceiverConfig::default())
    }
}

impl<T: 'static, P: Policy> Receiver<T, P> {
    #[must_use]
    pub fn with_config(state: T, config: ReceiverConfig) -> Self {
        let id = ReceiverId::next();
        let tracker = Tracker::new(id, config.initial_capacity);
        Self {
            id,
            name: config.name,
            state: P::share(state),
            tracker: P::share(Locked::new(tracker)),
        }
    }

    #[must_use]
    pub fn id(&self) -> ReceiverId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of bindings currently targeting this receiver, across all
    /// signals.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.tracker.with(|t| t.len())
    }

    /// Whether any binding of `signal` targets this receiver.
    #[must_use]
    pub fn is_connected_to<A: Args>(&self, signal: &Signal<A, P>) -> bool {
        let id = signal.id();
        self.tracker.with(|t| t.is_connected_to(id))
    }

    /// Detach from every signal while staying alive. Returns how many
    /// bindings were removed.
    pub fn disconnect_all(&self) -> usize {
        tracker::teardown::<P>(&self.tracker, false)
    }

    pub(crate) fn tracker(&self) -> &P::Shared<TrackerCell<P>> {
        &self.tracker
    }

    pub(crate) fn downgrade_state(&self) -> P::WeakRef<T> {
        P::downgrade::<T>(&self.state)
    }
}

impl<T: 'static, P: Policy> Deref for Receiver<T, P> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.state
    }
}

impl<T: Default + 'static, P: Policy> Default for Receiver<T, P> {
    fn default() -> Self {
        Self::with_config(T::default(), ReceiverConfig::default())
    }
}

impl<T: 'static, P: Policy> Drop for Receiver<T, P> {
    fn drop(&mut self) {
        tracker::teardown::<P>(&self.tracker, true);
    }
}

impl<T: fmt::Debug + 'static, P: Policy> fmt::Debug for Receiver<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &**self)
            .field("policy", &P::NAME)
            .field("connections", &self.connection_count())
            .finish()
    }
}
