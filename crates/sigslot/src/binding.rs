#![forbid(unsafe_code)]

//! Callable bindings: "invoke method M on receiver R" as one opaque unit.
//!
//! A binding never retargets. It holds the receiver state weakly, so a
//! binding that outlives its receiver (for example inside an emission
//! snapshot taken just before the receiver was dropped) reports
//! [`Delivery::Dropped`] instead of touching freed state.

use std::any::TypeId;
use std::fmt;

use crate::args::{Handler, Method};
use crate::error::BoxError;
use crate::handle::ReceiverId;
use crate::policy::Policy;

/// Outcome of invoking one binding.
#[derive(Debug)]
pub enum Delivery {
    /// The method ran and returned success.
    Delivered,
    /// The receiver was already gone; nothing ran.
    Dropped,
    /// The method ran and returned an error.
    Failed(BoxError),
}

/// Something invokable with a signal's argument tuple.
pub trait Invoke<A> {
    fn invoke(&self, args: A) -> Delivery;
}

/// Comparable identity of a binding: receiver plus method type.
///
/// Every function item and closure has its own type, so two bindings of
/// `Light::turn_on` to the same light compare equal while `Light::turn_on`
/// and `Light::turn_off` do not. Methods passed as plain `fn` pointers of
/// the same signature share one type and therefore one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId {
    receiver: Option<ReceiverId>,
    method: TypeId,
}

impl BindingId {
    /// Identity of method `M` bound to `receiver`.
    #[must_use]
    pub fn method<M: 'static>(receiver: ReceiverId) -> Self {
        Self {
            receiver: Some(receiver),
            method: TypeId::of::<M>(),
        }
    }

    /// Identity of a free-standing handler `H`.
    #[must_use]
    pub fn handler<H: 'static>() -> Self {
        Self {
            receiver: None,
            method: TypeId::of::<H>(),
        }
    }

    #[must_use]
    pub fn receiver(&self) -> Option<ReceiverId> {
        self.receiver
    }

    #[must_use]
    pub fn targets(&self, receiver: ReceiverId) -> bool {
        self.receiver == Some(receiver)
    }
}

/// A method bound to a weakly held receiver state.
pub struct MethodBinding<T: 'static, M, P: Policy> {
    receiver: P::WeakRef<T>,
    method: M,
}

impl<T: 'static, M, P: Policy> MethodBinding<T, M, P> {
    pub(crate) fn new(receiver: P::WeakRef<T>, method: M) -> Self {
        Self { receiver, method }
    }
}

impl<T, M, P, A> Invoke<A> for MethodBinding<T, M, P>
where
    T: 'static,
    M: Method<T, A>,
    P: Policy,
{
    fn invoke(&self, args: A) -> Delivery {
        let Some(state) = P::upgrade::<T>(&self.receiver) else {
            return Delivery::Dropped;
        };
        match self.method.call(&*state, args) {
            Ok(()) => Delivery::Delivered,
            Err(err) => Delivery::Failed(err),
        }
    }
}

impl<T: 'static, M, P: Policy> fmt::Debug for MethodBinding<T, M, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodBinding")
            .field("method", &std::any::type_name::<M>())
            .field("policy", &P::NAME)
            .finish_non_exhaustive()
    }
}

/// A free-standing handler with no receiver.
pub struct FnBinding<H> {
    handler: H,
}

impl<H> FnBinding<H> {
    pub(crate) fn new(handler: H) -> Self {
        Self { handler }
    }
}

impl<H: Handler<A>, A> Invoke<A> for FnBinding<H> {
    fn invoke(&self, args: A) -> Delivery {
        match self.handler.call(args) {
            Ok(()) => Delivery::Delivered,
            Err(err) => Delivery::Failed(err),
        }
    }
}

impl<H> fmt::Debug for FnBinding<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBinding")
            .field("handler", &std::any::type_name::<H>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::SingleThreaded;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Switch {
        on: Cell<bool>,
    }

    impl Switch {
        fn flip(&self) {
            self.on.set(!self.on.get());
        }

        fn turn_off(&self) {
            self.on.set(false);
        }
    }

    #[test]
    fn method_binding_invokes_live_receiver() {
        let state = Rc::new(Switch { on: Cell::new(false) });
        let binding: MethodBinding<_, _, SingleThreaded> =
            MethodBinding::new(Rc::downgrade(&state), Switch::flip);
        assert!(matches!(binding.invoke(()), Delivery::Delivered));
        assert!(state.on.get());
    }

    #[test]
    fn method_binding_drops_dead_receiver() {
        let state = Rc::new(Switch { on: Cell::new(false) });
        let binding: MethodBinding<_, _, SingleThreaded> =
            MethodBinding::new(Rc::downgrade(&state), Switch::flip);
        drop(state);
        assert!(matches!(binding.invoke(()), Delivery::Dropped));
    }

    #[test]
    fn fn_binding_reports_failure() {
        let binding = FnBinding::new(|n: u32| -> Result<(), BoxError> {
            if n > 3 { Err("too big".into()) } else { Ok(()) }
        });
        assert!(matches!(binding.invoke((1,)), Delivery::Delivered));
        match binding.invoke((9,)) {
            Delivery::Failed(err) => assert_eq!(err.to_string(), "too big"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn binding_identity() {
        let r1 = ReceiverId::next();
        let r2 = ReceiverId::next();

        fn id_of<M: 'static>(_: &M, receiver: ReceiverId) -> BindingId {
            BindingId::method::<M>(receiver)
        }

        let flip_a = id_of(&Switch::flip, r1);
        let flip_b = id_of(&Switch::flip, r1);
        let off = id_of(&Switch::turn_off, r1);
        let flip_other = id_of(&Switch::flip, r2);

        assert_eq!(flip_a, flip_b);
        assert_ne!(flip_a, off);
        assert_ne!(flip_a, flip_other);
        assert!(flip_a.targets(r1));
        assert!(!flip_a.targets(r2));
        assert_eq!(BindingId::handler::<fn()>().receiver(), None);
    }
}
