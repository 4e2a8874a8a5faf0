#![forbid(unsafe_code)]

//! Multicast emission points.
//!
//! # Design
//!
//! A [`Signal<A, P>`] exclusively owns a registry of bindings that accept
//! the argument tuple `A`. Receivers are referenced weakly and tracked from
//! their side through back-references, so either side can be dropped first.
//!
//! # Emission
//!
//! `emit` copies the binding list under the registry lock, releases the
//! lock, then invokes every binding of the copy in connection order. A bound
//! method may therefore connect, disconnect, emit, or drop receivers freely;
//! such changes are visible from the next emission on.
//!
//! # Failure Modes
//!
//! - **Failing method**: with [`FailureMode::Abort`] (the default) the
//!   emission stops at the first `Err` and returns
//!   [`SignalError::SlotFailed`]; earlier methods keep their effects. With
//!   [`FailureMode::Continue`] every binding runs and the first failure is
//!   returned afterwards.
//! - **Panicking method**: the panic is not caught and unwinds out of
//!   `emit`. No lock is held, so the signal stays usable.
//! - **Receiver dropped mid-emission**: its bindings that have not run yet
//!   are skipped and counted in [`EmitReport::dropped`].

use std::fmt;

use crate::args::{Args, Handler, Method};
use crate::binding::{BindingId, Delivery, FnBinding, Invoke, MethodBinding};
use crate::config::{FailureMode, SignalConfig};
use crate::error::{Result, SignalError};
use crate::handle::{Connection, SignalId, SlotKey};
use crate::policy::{Erase, Locked, Policy, SingleThreaded, ThreadSafe};
use crate::receiver::Receiver;
use crate::registry::Registry;
use crate::tracker::{BackRef, Detach, TrackerCell};

/// Shared state of a signal, reachable weakly from receivers.
#[doc(hidden)]
pub struct SignalCore<A: 'static, P: Policy> {
    id: SignalId,
    config: SignalConfig,
    registry: Locked<Registry<A, P>, P>,
}

impl<A: 'static, P: Policy> Detach for SignalCore<A, P> {
    fn signal_id(&self) -> SignalId {
        self.id
    }

    fn detach(&self, key: SlotKey) {
        let removed = self.registry.with(|registry| registry.remove(key));
        #[cfg(feature = "tracing")]
        if removed.is_some() {
            tracing::trace!(signal = %self.id, key = %key, "binding detached by receiver teardown");
        }
        drop(removed);
    }
}

/// Counts for one successful emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Bindings whose method ran and succeeded.
    pub delivered: usize,
    /// Bindings skipped because their receiver was already gone.
    pub dropped: usize,
}

/// A typed multicast emission point.
///
/// `A` is the argument tuple (`()`, `(T,)`, `(T, U)`, ...); `P` the
/// concurrency policy.
///
/// Dropping a signal removes its back-references from every receiver it
/// was connected to.
pub struct Signal<A: Args, P: Policy = SingleThreaded> {
    core: P::Shared<SignalCore<A, P>>,
}

impl<A: Args> Signal<A, SingleThreaded> {
    /// Create a single-threaded signal with default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A: Args> Signal<A, ThreadSafe> {
    /// Create a thread-safe signal with default config.
    #[must_use]
    pub fn new_sync() -> Self {
        Self::default()
    }
}

impl<A: Args, P: Policy> Default for Signal<A, P> {
    fn default() -> Self {
        Self::with_config(SignalConfig::default())
    }
}

impl<A: Args, P: Policy> Signal<A, P> {
    /// Create a signal with the given config.
    #[must_use]
    pub fn with_config(config: SignalConfig) -> Self {
        let registry = Registry::with_capacity(config.initial_capacity);
        Self {
            core: P::share(SignalCore {
                id: SignalId::next(),
                config,
                registry: Locked::new(registry),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> SignalId {
        self.core.id
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.core.config.name.as_deref()
    }

    #[must_use]
    pub fn config(&self) -> &SignalConfig {
        &self.core.config
    }

    /// Number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.core.registry.with(|registry| registry.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `connection` is still registered on this signal.
    #[must_use]
    pub fn is_connected(&self, connection: Connection) -> bool {
        connection.signal() == self.id()
            && self
                .core
                .registry
                .with(|registry| registry.contains_key(connection.key()))
    }

    /// Connect `method` on `receiver`.
    ///
    /// The binding is added to this signal's registry and recorded in the
    /// receiver's tracker in one step; if either side fails nothing is
    /// registered.
    ///
    /// # Errors
    ///
    /// - [`SignalError::DuplicateConnection`] when the signal rejects
    ///   duplicates and this (receiver, method) pair is already connected.
    /// - [`SignalError::AllocationFailure`] when either side cannot grow.
    /// - [`SignalError::ReceiverDropped`] when the receiver's drop has
    ///   already started on another thread.
    pub fn connect<T, M>(&self, receiver: &Receiver<T, P>, method: M) -> Result<Connection>
    where
        T: 'static,
        M: Method<T, A>,
        P: Erase<MethodBinding<T, M, P>, A>,
    {
        let target = BindingId::method::<M>(receiver.id());
        let slot = P::erase(MethodBinding::new(receiver.downgrade_state(), method));
        self.attach(target, slot, Some(receiver.tracker()))
    }

    /// Connect a free-standing handler that targets no receiver.
    ///
    /// It stays connected until disconnected or the signal is dropped.
    ///
    /// # Errors
    ///
    /// Same as [`Signal::connect`].
    pub fn connect_fn<H>(&self, handler: H) -> Result<Connection>
    where
        H: Handler<A>,
        P: Erase<FnBinding<H>, A>,
    {
        let target = BindingId::handler::<H>();
        self.attach(target, P::erase(FnBinding::new(handler)), None)
    }

    /// Register an already-erased slot. Lock order: registry, then tracker.
    pub(crate) fn attach(
        &self,
        target: BindingId,
        slot: P::Shared<P::Slot<A>>,
        tracker: Option<&P::Shared<TrackerCell<P>>>,
    ) -> Result<Connection> {
        let id = self.id();
        let reject_duplicates = self.core.config.reject_duplicates;

        let outcome: std::result::Result<SlotKey, (SignalError, Option<P::Shared<P::Slot<A>>>)> =
            self.core.registry.with(|registry| {
                if reject_duplicates && registry.contains(&target) {
                    let err = SignalError::DuplicateConnection {
                        signal: id,
                        receiver: target.receiver(),
                    };
                    return Err((err, Some(slot)));
                }
                if let Err(err) = registry.reserve() {
                    return Err((err, Some(slot)));
                }
                let weak_tracker = tracker.map(|t| P::downgrade::<TrackerCell<P>>(t));
                let key = registry.push(target, slot, weak_tracker);
                if let Some(tracker) = tracker {
                    let back_ref = BackRef {
                        signal: id,
                        key,
                        link: P::link::<A>(&self.core),
                    };
                    if let Err(err) = tracker.with(|t| t.register(back_ref)) {
                        let rolled_back = registry.remove(key).map(|entry| entry.slot);
                        return Err((err, rolled_back));
                    }
                }
                Ok(key)
            });

        match outcome {
            Ok(key) => {
                #[cfg(feature = "tracing")]
                tracing::trace!(
                    signal = %id,
                    receiver = ?target.receiver(),
                    key = %key,
                    "connected"
                );
                Ok(Connection::new(id, target.receiver(), key))
            }
            Err((err, unused)) => {
                drop(unused);
                #[cfg(feature = "tracing")]
                tracing::debug!(signal = %id, error = %err, "connect rejected");
                Err(err)
            }
        }
    }

    /// Remove one connection. Returns whether it was still registered.
    ///
    /// Disconnecting twice, or with a handle from another signal, is a
    /// no-op.
    pub fn disconnect(&self, connection: Connection) -> bool {
        let id = self.id();
        if connection.signal() != id {
            return false;
        }
        let removed = self.core.registry.with(|registry| {
            let entry = registry.remove(connection.key())?;
            if let Some(tracker) = entry
                .tracker
                .as_ref()
                .and_then(|weak| P::upgrade::<TrackerCell<P>>(weak))
            {
                tracker.with(|t| t.unregister(id, entry.key));
            }
            Some(entry)
        });
        #[cfg(feature = "tracing")]
        if removed.is_some() {
            tracing::trace!(signal = %id, key = %connection.key(), "disconnected");
        }
        removed.is_some()
    }

    /// Remove every binding that targets `receiver`. Returns how many were
    /// removed.
    pub fn disconnect_receiver<T: 'static>(&self, receiver: &Receiver<T, P>) -> usize {
        let id = self.id();
        let removed = self.core.registry.with(|registry| {
            let removed = registry.remove_all_for(receiver.id());
            if !removed.is_empty() {
                receiver.tracker().with(|t| t.unregister_signal(id));
            }
            removed
        });
        #[cfg(feature = "tracing")]
        tracing::trace!(
            signal = %id,
            receiver = %receiver.id(),
            count = removed.len(),
            "receiver disconnected"
        );
        removed.len()
    }

    /// Remove every binding. Returns how many were removed.
    pub fn disconnect_all(&self) -> usize {
        let id = self.id();
        let entries = self.core.registry.with(Registry::take_all);
        for entry in &entries {
            if let Some(tracker) = entry
                .tracker
                .as_ref()
                .and_then(|weak| P::upgrade::<TrackerCell<P>>(weak))
            {
                tracker.with(|t| t.unregister(id, entry.key));
            }
        }
        #[cfg(feature = "tracing")]
        if !entries.is_empty() {
            tracing::trace!(signal = %id, count = entries.len(), "all bindings disconnected");
        }
        entries.len()
    }

    /// Deliver `args` to every binding, in connection order.
    ///
    /// Each binding receives its own clone of `args`. Emitting on a signal
    /// with no bindings does nothing.
    ///
    /// # Errors
    ///
    /// - [`SignalError::AllocationFailure`] if the snapshot cannot be
    ///   allocated; no binding ran.
    /// - [`SignalError::SlotFailed`] if a bound method returned `Err`, per
    ///   the signal's [`FailureMode`].
    pub fn emit(&self, args: A) -> Result<EmitReport> {
        let id = self.id();
        let snapshot = self.core.registry.with(|registry| registry.snapshot())?;
        if snapshot.is_empty() {
            return Ok(EmitReport::default());
        }

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "signal_emit",
            signal = %id,
            name = self.name().unwrap_or(""),
            slots = snapshot.len()
        )
        .entered();

        let mut report = EmitReport::default();
        let mut first_failure = None;
        for (index, slot) in snapshot.iter().enumerate() {
            match slot.invoke(args.clone()) {
                Delivery::Delivered => report.delivered += 1,
                Delivery::Dropped => {
                    report.dropped += 1;
                    #[cfg(feature = "tracing")]
                    tracing::debug!(index, "receiver gone; binding skipped");
                }
                Delivery::Failed(source) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(index, error = %source, "slot failed");
                    let err = SignalError::SlotFailed {
                        signal: id,
                        index,
                        source,
                    };
                    match self.core.config.failure_mode {
                        FailureMode::Abort => return Err(err),
                        FailureMode::Continue => {
                            if first_failure.is_none() {
                                first_failure = Some(err);
                            }
                        }
                    }
                }
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Create a new signal carrying copies of every current connection.
    ///
    /// The copy has its own id and registry; each copied binding is also
    /// recorded in its receiver's tracker, so dropping either signal leaves
    /// the other intact.
    ///
    /// # Errors
    ///
    /// [`SignalError::AllocationFailure`]; the partial copy is dropped and
    /// leaves no back-references behind.
    pub fn try_clone(&self) -> Result<Self> {
        let copy = Self::with_config(self.core.config.clone());
        let entries: Vec<_> = self.core.registry.with(|registry| {
            registry
                .iter()
                .map(|e| (e.target, e.slot.clone(), e.tracker.clone()))
                .collect()
        });
        for (target, slot, tracker) in entries {
            match tracker {
                None => {
                    copy.attach(target, slot, None)?;
                }
                Some(weak) => {
                    let Some(tracker) = P::upgrade::<TrackerCell<P>>(&weak) else {
                        continue;
                    };
                    // The receiver may be torn down between the snapshot
                    // and here; its binding is then left out of the copy.
                    match copy.attach(target, slot, Some(&tracker)) {
                        Ok(_) | Err(SignalError::ReceiverDropped { .. }) => {}
                        Err(err) => return Err(err),
                    }
                }
            }
        }
        Ok(copy)
    }
}

impl<A: Args, P: Policy> Drop for Signal<A, P> {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

impl<A: Args, P: Policy> fmt::Debug for Signal<A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("args", &std::any::type_name::<A>())
            .field("policy", &P::NAME)
            .field("len", &self.len())
            .finish()
    }
}
