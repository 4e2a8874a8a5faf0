#![forbid(unsafe_code)]

//! Signals with the argument type checked at registration time.
//!
//! [`DynSignal`] is an object-safe view of any [`Signal`], so signals of
//! different argument types can be stored together (for example in a map
//! keyed by name) and wired up from code that does not know their types
//! statically. Bindings and arguments travel as [`ErasedBinding`] and
//! [`DynArgs`], each tagged with the [`Signature`] they were built for; a
//! mismatch fails with [`SignalError::IncompatibleSignature`] and registers
//! nothing.

use std::any::{self, Any, TypeId};
use std::fmt;

use crate::args::{Args, Handler, Method};
use crate::binding::{BindingId, FnBinding, MethodBinding};
use crate::error::{Result, SignalError};
use crate::handle::{Connection, ReceiverId, SignalId};
use crate::policy::{Erase, Policy};
use crate::receiver::Receiver;
use crate::signal::{EmitReport, Signal};
use crate::tracker::TrackerCell;

/// Runtime description of an argument tuple type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    id: TypeId,
    name: &'static str,
}

impl Signature {
    #[must_use]
    pub fn of<A: 'static>() -> Self {
        Self {
            id: TypeId::of::<A>(),
            name: any::type_name::<A>(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    fn check(self, expected: Signature) -> Result<()> {
        if self.id == expected.id {
            Ok(())
        } else {
            Err(SignalError::IncompatibleSignature {
                expected: expected.name,
                found: self.name,
            })
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A binding whose argument type is only known at runtime.
///
/// Holds its receiver weakly. Connecting it after the receiver is gone
/// fails with [`SignalError::ReceiverDropped`].
pub struct ErasedBinding<P: Policy> {
    signature: Signature,
    target: BindingId,
    /// Holds a `P::Shared<P::Slot<A>>` for the signature's `A`.
    slot: Box<dyn Any>,
    receiver: Option<(ReceiverId, P::WeakRef<TrackerCell<P>>)>,
}

impl<P: Policy> ErasedBinding<P> {
    /// Bind `method` on `receiver` for argument tuple `A`.
    pub fn method<A, T, M>(receiver: &Receiver<T, P>, method: M) -> Self
    where
        A: Args,
        T: 'static,
        M: Method<T, A>,
        P: Erase<MethodBinding<T, M, P>, A>,
    {
        let slot = P::erase(MethodBinding::new(receiver.downgrade_state(), method));
        Self {
            signature: Signature::of::<A>(),
            target: BindingId::method::<M>(receiver.id()),
            slot: Box::new(slot),
            receiver: Some((
                receiver.id(),
                P::downgrade::<TrackerCell<P>>(receiver.tracker()),
            )),
        }
    }

    /// Wrap a free-standing handler for argument tuple `A`.
    pub fn handler<A, H>(handler: H) -> Self
    where
        A: Args,
        H: Handler<A>,
        P: Erase<FnBinding<H>, A>,
    {
        let slot = P::erase(FnBinding::new(handler));
        Self {
            signature: Signature::of::<A>(),
            target: BindingId::handler::<H>(),
            slot: Box::new(slot),
            receiver: None,
        }
    }

    #[must_use]
    pub fn signature(&self) -> Signature {
        self.signature
    }
}

impl<P: Policy> fmt::Debug for ErasedBinding<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedBinding")
            .field("signature", &self.signature)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Emission arguments whose type is only known at runtime.
pub struct DynArgs {
    signature: Signature,
    value: Box<dyn Any>,
}

impl DynArgs {
    pub fn new<A: Args>(args: A) -> Self {
        Self {
            signature: Signature::of::<A>(),
            value: Box::new(args),
        }
    }

    #[must_use]
    pub fn signature(&self) -> Signature {
        self.signature
    }
}

impl fmt::Debug for DynArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynArgs")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// Object-safe view of a [`Signal`] of any argument type.
pub trait DynSignal<P: Policy> {
    fn signal_id(&self) -> SignalId;

    /// The argument tuple type this signal delivers.
    fn signature(&self) -> Signature;

    /// Register a binding built for some argument type.
    ///
    /// # Errors
    ///
    /// [`SignalError::IncompatibleSignature`] when the binding was built for
    /// a different argument type, plus every error of
    /// [`Signal::connect`].
    fn connect_dyn(&self, binding: ErasedBinding<P>) -> Result<Connection>;

    /// # Errors
    ///
    /// [`SignalError::IncompatibleSignature`] when `args` do not match,
    /// plus every error of [`Signal::emit`].
    fn emit_dyn(&self, args: &DynArgs) -> Result<EmitReport>;

    fn disconnect_dyn(&self, connection: Connection) -> bool;

    fn connection_count(&self) -> usize;
}

impl<A: Args, P: Policy> DynSignal<P> for Signal<A, P> {
    fn signal_id(&self) -> SignalId {
        self.id()
    }

    fn signature(&self) -> Signature {
        Signature::of::<A>()
    }

    fn connect_dyn(&self, binding: ErasedBinding<P>) -> Result<Connection> {
        let expected = Signature::of::<A>();
        binding.signature.check(expected)?;
        let ErasedBinding {
            signature,
            target,
            slot,
            receiver,
        } = binding;
        let slot = slot
            .downcast::<P::Shared<P::Slot<A>>>()
            .map_err(|_| SignalError::IncompatibleSignature {
                expected: expected.name,
                found: signature.name,
            })?;
        let tracker = match receiver {
            None => None,
            Some((id, weak)) => Some(
                P::upgrade::<TrackerCell<P>>(&weak)
                    .ok_or(SignalError::ReceiverDropped { receiver: id })?,
            ),
        };
        self.attach(target, *slot, tracker.as_ref())
    }

    fn emit_dyn(&self, args: &DynArgs) -> Result<EmitReport> {
        let expected = Signature::of::<A>();
        args.signature.check(expected)?;
        let value = args
            .value
            .downcast_ref::<A>()
            .ok_or(SignalError::IncompatibleSignature {
                expected: expected.name,
                found: args.signature.name,
            })?;
        self.emit(value.clone())
    }

    fn disconnect_dyn(&self, connection: Connection) -> bool {
        self.disconnect(connection)
    }

    fn connection_count(&self) -> usize {
        self.len()
    }
}
