#![forbid(unsafe_code)]

//! Test fixtures for sigslot dispatch.
//!
//! - [`call_log`]: a shareable, thread-safe record of slot invocations that
//!   can be asserted on in order and dumped as JSONL.
//! - [`probe`]: ready-made receiver state whose methods cover the common
//!   arities and the failing-slot path.
//!
//! Set `SIGSLOT_TEST_JSONL=1` to have [`CallLog::dump_if_requested`] print
//! the recorded calls, one JSON object per line, for CI artifacts.

pub mod call_log;
pub mod probe;

pub use call_log::{Call, CallLog};
pub use probe::{Probe, ProbeError};
