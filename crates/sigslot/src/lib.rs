#![forbid(unsafe_code)]

//! Typed multicast signal/slot dispatch.
//!
//! # Role
//! `sigslot` wires emission points ([`Signal`]) to methods on receiver
//! objects ([`Receiver`]) that otherwise know nothing about each other's
//! lifetimes. A signal delivers its arguments to every connected method, in
//! connection order, synchronously on the caller's thread.
//!
//! # Primary responsibilities
//! - **Binding**: "call method M on receiver R" stored as one opaque callable.
//! - **Registry**: per-signal ordered list of bindings, snapshotted on emit.
//! - **Tracker**: per-receiver back-references, torn down on drop so no
//!   signal ever holds a binding to a destroyed receiver.
//! - **Policy**: [`SingleThreaded`] (`Rc` + `RefCell`) or [`ThreadSafe`]
//!   (`Arc` + `Mutex`), chosen as a type parameter.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use sigslot::{Receiver, Signal};
//!
//! #[derive(Default)]
//! struct Light {
//!     lit: Cell<bool>,
//! }
//!
//! impl Light {
//!     fn toggle(&self) {
//!         self.lit.set(!self.lit.get());
//!     }
//! }
//!
//! let clicked: Signal<()> = Signal::new();
//! let light = Receiver::new(Light::default());
//! clicked.connect(&light, Light::toggle).unwrap();
//!
//! clicked.emit(()).unwrap();
//! assert!(light.lit.get());
//!
//! drop(light);
//! assert!(clicked.is_empty());
//! ```
//!
//! # Invariants
//!
//! 1. Bindings run in connection order within one emission.
//! 2. Connects and disconnects made during an emission take effect from the
//!    next emission (snapshot-then-invoke).
//! 3. A signal's registry and each receiver's tracker mirror each other at
//!    every quiescent point.
//! 4. Disconnecting twice, disconnecting an unknown handle, and emitting on
//!    an empty signal are no-ops.

pub mod args;
pub mod binding;
pub mod config;
pub mod dynamic;
pub mod error;
pub mod handle;
pub mod logging;
pub mod policy;
pub mod receiver;
mod registry;
pub mod signal;
mod tracker;

pub use args::{
    Args, Handler, Method, Signal0, Signal1, Signal2, Signal3, Signal4, Signal5, Signal6, Signal7,
    Signal8, SlotResult,
};
pub use binding::{BindingId, Delivery, FnBinding, Invoke, MethodBinding};
pub use config::{FailureMode, ReceiverConfig, SignalConfig};
pub use dynamic::{DynArgs, DynSignal, ErasedBinding, Signature};
pub use error::{BoxError, Result, SignalError};
pub use handle::{Connection, ReceiverId, SignalId, SlotKey};
pub use logging::LogFormat;
pub use policy::{Erase, Policy, SingleThreaded, ThreadSafe};
pub use receiver::Receiver;
pub use signal::{EmitReport, Signal};
#[doc(hidden)]
pub use tracker::Detach;
