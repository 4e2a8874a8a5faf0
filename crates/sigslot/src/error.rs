#![forbid(unsafe_code)]

//! Error taxonomy for connect and emit.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `IncompatibleSignature` | Dynamic connect/emit with the wrong argument types | Nothing registered |
//! | `AllocationFailure` | Registry, tracker, or snapshot could not grow | Prior state kept |
//! | `DuplicateConnection` | `reject_duplicates` set and pair already present | Nothing registered |
//! | `ReceiverDropped` | Connect raced with (or came after) the receiver's teardown | Nothing registered |
//! | `SlotFailed` | A bound method returned `Err` | Emission stops (or continues, per config) |
//!
//! Disconnecting twice, disconnecting an unknown handle, and emitting on an
//! empty signal are not errors.

use std::collections::TryReserveError;
use std::fmt;

use crate::handle::{ReceiverId, SignalId};

/// Error type carried by a failing bound method.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Convenience alias for results of signal operations.
pub type Result<T, E = SignalError> = std::result::Result<T, E>;

/// Errors from connecting to or emitting a signal.
#[derive(Debug)]
pub enum SignalError {
    /// The method's parameter list does not match the signal's arguments.
    IncompatibleSignature {
        expected: &'static str,
        found: &'static str,
    },
    /// Growing the registry, tracker, or emission snapshot failed.
    AllocationFailure,
    /// The (receiver, method) pair is already connected and the signal
    /// rejects duplicates.
    DuplicateConnection {
        signal: SignalId,
        receiver: Option<ReceiverId>,
    },
    /// The receiver was already torn down when the connection was made.
    ReceiverDropped { receiver: ReceiverId },
    /// A bound method reported failure during emission.
    SlotFailed {
        signal: SignalId,
        /// Position of the failing binding in the emission snapshot.
        index: usize,
        source: BoxError,
    },
}

impl SignalError {
    /// Whether this error came out of a bound method rather than the
    /// dispatch machinery.
    #[must_use]
    pub fn is_slot_failure(&self) -> bool {
        matches!(self, Self::SlotFailed { .. })
    }
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompatibleSignature { expected, found } => {
                write!(f, "incompatible signature: expected {expected}, found {found}")
            }
            Self::AllocationFailure => write!(f, "allocation failure while growing registry"),
            Self::DuplicateConnection { signal, receiver } => match receiver {
                Some(receiver) => write!(f, "{receiver} is already connected to {signal}"),
                None => write!(f, "handler is already connected to {signal}"),
            },
            Self::ReceiverDropped { receiver } => write!(f, "{receiver} has been dropped"),
            Self::SlotFailed {
                signal,
                index,
                source,
            } => write!(f, "slot {index} of {signal} failed: {source}"),
        }
    }
}

impl std::error::Error for SignalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SlotFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<TryReserveError> for SignalError {
    fn from(_: TryReserveError) -> Self {
        Self::AllocationFailure
    }
}
