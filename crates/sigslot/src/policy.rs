#![forbid(unsafe_code)]

//! Concurrency policies.
//!
//! A policy decides how signals and receivers share and guard their state:
//!
//! | Policy | Sharing | Guard | `Send`/`Sync` |
//! |--------|---------|-------|---------------|
//! | [`SingleThreaded`] | `Rc` / `rc::Weak` | `RefCell` | no |
//! | [`ThreadSafe`] | `Arc` / `sync::Weak` | `Mutex` | yes, when receiver state and methods are |
//!
//! # Lock discipline
//!
//! Every operation that touches both sides takes the signal's registry lock
//! before the receiver's tracker lock. Teardown paths (receiver drop, signal
//! drop, `disconnect_all`) first empty their own side under their own lock,
//! release it, and only then visit the other side, so they never hold the
//! two locks in the reverse order. No lock is ever held while a bound method
//! runs.

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::{self, Rc};
use std::sync::{self, Arc, Mutex, PoisonError};

use crate::args::Args;
use crate::binding::Invoke;
use crate::signal::SignalCore;
use crate::tracker::Detach;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::SingleThreaded {}
    impl Sealed for super::ThreadSafe {}
}

/// Sharing and locking strategy for signals and receivers.
///
/// Sealed: the two implementations are [`SingleThreaded`] and
/// [`ThreadSafe`].
pub trait Policy: sealed::Sealed + Sized + 'static {
    /// Strong shared pointer.
    type Shared<T: ?Sized + 'static>: Clone + Deref<Target = T> + 'static;
    /// Weak counterpart of [`Policy::Shared`].
    type WeakRef<T: ?Sized + 'static>: Clone + 'static;
    /// Interior-mutability guard.
    type Lock<T: 'static>;
    /// Type-erased binding for argument tuple `A`.
    type Slot<A: 'static>: ?Sized + Invoke<A> + 'static;
    /// Type-erased signal, as seen from a receiver's back-references.
    type Link: ?Sized + Detach + 'static;

    /// Name shown in `Debug` output.
    const NAME: &'static str;

    fn share<T: 'static>(value: T) -> Self::Shared<T>;

    fn downgrade<T: ?Sized + 'static>(this: &Self::Shared<T>) -> Self::WeakRef<T>;

    fn upgrade<T: ?Sized + 'static>(weak: &Self::WeakRef<T>) -> Option<Self::Shared<T>>;

    fn new_lock<T: 'static>(value: T) -> Self::Lock<T>;

    /// Run `f` with exclusive access to the guarded value.
    fn with_lock<T: 'static, R>(lock: &Self::Lock<T>, f: impl FnOnce(&mut T) -> R) -> R;

    /// Weak, type-erased link to a signal's core.
    #[doc(hidden)]
    fn link<A: Args>(core: &Self::Shared<SignalCore<A, Self>>) -> Self::WeakRef<Self::Link>;
}

/// A value guarded by the policy's lock.
pub(crate) struct Locked<T: 'static, P: Policy> {
    inner: P::Lock<T>,
}

impl<T: 'static, P: Policy> Locked<T, P> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: P::new_lock::<T>(value),
        }
    }

    /// Run `f` with exclusive access. Never call user code from `f`.
    #[inline]
    pub(crate) fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        P::with_lock::<T, R>(&self.inner, f)
    }
}

/// Erasure of a concrete binding `S` into the policy's slot type.
///
/// [`ThreadSafe`] only accepts bindings that are `Send + Sync`, which in turn
/// requires receiver state and bound methods to be `Send + Sync`.
pub trait Erase<S, A: 'static>: Policy {
    fn erase(slot: S) -> Self::Shared<Self::Slot<A>>;
}

/// No locking. All use of a signal or receiver stays on one thread, which
/// the compiler enforces because nothing built on this policy is `Send`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleThreaded;

impl Policy for SingleThreaded {
    type Shared<T: ?Sized + 'static> = Rc<T>;
    type WeakRef<T: ?Sized + 'static> = rc::Weak<T>;
    type Lock<T: 'static> = RefCell<T>;
    type Slot<A: 'static> = dyn Invoke<A> + 'static;
    type Link = dyn Detach + 'static;

    const NAME: &'static str = "single-threaded";

    #[inline]
    fn share<T: 'static>(value: T) -> Rc<T> {
        Rc::new(value)
    }

    #[inline]
    fn downgrade<T: ?Sized + 'static>(this: &Rc<T>) -> rc::Weak<T> {
        Rc::downgrade(this)
    }

    #[inline]
    fn upgrade<T: ?Sized + 'static>(weak: &rc::Weak<T>) -> Option<Rc<T>> {
        weak.upgrade()
    }

    #[inline]
    fn new_lock<T: 'static>(value: T) -> RefCell<T> {
        RefCell::new(value)
    }

    #[inline]
    fn with_lock<T: 'static, R>(lock: &RefCell<T>, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut lock.borrow_mut())
    }

    fn link<A: Args>(core: &Rc<SignalCore<A, Self>>) -> rc::Weak<dyn Detach> {
        let weak: rc::Weak<SignalCore<A, Self>> = Rc::downgrade(core);
        weak
    }
}

impl<S, A> Erase<S, A> for SingleThreaded
where
    S: Invoke<A> + 'static,
    A: 'static,
{
    #[inline]
    fn erase(slot: S) -> Rc<dyn Invoke<A>> {
        Rc::new(slot)
    }
}

/// One mutex per signal registry and per receiver tracker.
///
/// Lock poisoning is ignored: no user code runs while either lock is held,
/// so a poisoned guard still protects a consistent collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThreadSafe;

impl Policy for ThreadSafe {
    type Shared<T: ?Sized + 'static> = Arc<T>;
    type WeakRef<T: ?Sized + 'static> = sync::Weak<T>;
    type Lock<T: 'static> = Mutex<T>;
    type Slot<A: 'static> = dyn Invoke<A> + Send + Sync + 'static;
    type Link = dyn Detach + Send + Sync + 'static;

    const NAME: &'static str = "thread-safe";

    #[inline]
    fn share<T: 'static>(value: T) -> Arc<T> {
        Arc::new(value)
    }

    #[inline]
    fn downgrade<T: ?Sized + 'static>(this: &Arc<T>) -> sync::Weak<T> {
        Arc::downgrade(this)
    }

    #[inline]
    fn upgrade<T: ?Sized + 'static>(weak: &sync::Weak<T>) -> Option<Arc<T>> {
        weak.upgrade()
    }

    #[inline]
    fn new_lock<T: 'static>(value: T) -> Mutex<T> {
        Mutex::new(value)
    }

    #[inline]
    fn with_lock<T: 'static, R>(lock: &Mutex<T>, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn link<A: Args>(core: &Arc<SignalCore<A, Self>>) -> sync::Weak<dyn Detach + Send + Sync> {
        let weak: sync::Weak<SignalCore<A, Self>> = Arc::downgrade(core);
        weak
    }
}

impl<S, A> Erase<S, A> for ThreadSafe
where
    S: Invoke<A> + Send + Sync + 'static,
    A: 'static,
{
    #[inline]
    fn erase(slot: S) -> Arc<dyn Invoke<A> + Send + Sync> {
        Arc::new(slot)
    }
}
