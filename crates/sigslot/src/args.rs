#![forbid(unsafe_code)]

//! Argument lists and the callables that accept them.
//!
//! A signal's argument list is a tuple: `Signal<()>` carries nothing,
//! `Signal<(State,)>` one value, `Signal<(i32, i32)>` two. Receiver methods
//! take the tuple's elements positionally after `&self`, so
//! `fn on_moved(&self, x: i32, y: i32)` connects to `Signal<(i32, i32)>`.
//! Arities 0 through 8 are supported, matching [`Signal0`] to [`Signal8`].
//!
//! A method may return `()` or `Result<(), E>`; any other value is
//! discarded by ignoring it in a wrapper closure. An `Err` is reported to
//! the emitter as [`SignalError::SlotFailed`](crate::SignalError::SlotFailed).

use crate::error::BoxError;
use crate::policy::SingleThreaded;
use crate::signal::Signal;

/// An argument tuple that can be delivered to every connected slot.
///
/// Each binding receives its own clone.
pub trait Args: Clone + 'static {}

impl<T: Clone + 'static> Args for T {}

/// Return type of a bound method.
pub trait SlotResult {
    fn into_result(self) -> Result<(), BoxError>;
}

impl SlotResult for () {
    #[inline]
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> SlotResult for Result<(), E> {
    #[inline]
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

/// A method callable on a receiver of type `T` with argument tuple `A`.
pub trait Method<T, A>: 'static {
    fn call(&self, receiver: &T, args: A) -> Result<(), BoxError>;
}

/// A free-standing callable with argument tuple `A` (no receiver).
pub trait Handler<A>: 'static {
    fn call(&self, args: A) -> Result<(), BoxError>;
}

macro_rules! impl_callables {
    ($($arg:ident),*) => {
        impl<F, T, R, $($arg,)*> Method<T, ($($arg,)*)> for F
        where
            F: Fn(&T, $($arg),*) -> R + 'static,
            R: SlotResult,
        {
            #[inline]
            #[allow(non_snake_case)]
            fn call(&self, receiver: &T, ($($arg,)*): ($($arg,)*)) -> Result<(), BoxError> {
                self(receiver, $($arg),*).into_result()
            }
        }

        impl<F, R, $($arg,)*> Handler<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + 'static,
            R: SlotResult,
        {
            #[inline]
            #[allow(non_snake_case)]
            fn call(&self, ($($arg,)*): ($($arg,)*)) -> Result<(), BoxError> {
                self($($arg),*).into_result()
            }
        }
    };
}

impl_callables!();
impl_callables!(A1);
impl_callables!(A1, A2);
impl_callables!(A1, A2, A3);
impl_callables!(A1, A2, A3, A4);
impl_callables!(A1, A2, A3, A4, A5);
impl_callables!(A1, A2, A3, A4, A5, A6);
impl_callables!(A1, A2, A3, A4, A5, A6, A7);
impl_callables!(A1, A2, A3, A4, A5, A6, A7, A8);

pub type Signal0<P = SingleThreaded> = Signal<(), P>;
pub type Signal1<A1, P = SingleThreaded> = Signal<(A1,), P>;
pub type Signal2<A1, A2, P = SingleThreaded> = Signal<(A1, A2), P>;
pub type Signal3<A1, A2, A3, P = SingleThreaded> = Signal<(A1, A2, A3), P>;
pub type Signal4<A1, A2, A3, A4, P = SingleThreaded> = Signal<(A1, A2, A3, A4), P>;
pub type Signal5<A1, A2, A3, A4, A5, P = SingleThreaded> = Signal<(A1, A2, A3, A4, A5), P>;
pub type Signal6<A1, A2, A3, A4, A5, A6, P = SingleThreaded> =
    Signal<(A1, A2, A3, A4, A5, A6), P>;
pub type Signal7<A1, A2, A3, A4, A5, A6, A7, P = SingleThreaded> =
    Signal<(A1, A2, A3, A4, A5, A6, A7), P>;
pub type Signal8<A1, A2, A3, A4, A5, A6, A7, A8, P = SingleThreaded> =
    Signal<(A1, A2, A3, A4, A5, A6, A7, A8), P>;
