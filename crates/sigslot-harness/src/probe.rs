#![forbid(unsafe_code)]

//! Receiver state for dispatch tests.
//!
//! A [`Probe`] is `Send + Sync`, so it works as the state of both
//! single-threaded and thread-safe receivers. Every method records itself
//! in the probe's [`CallLog`] and bumps a hit counter.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use crate::call_log::CallLog;

/// Error returned by [`Probe::fail`] and [`Probe::fail_when`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeError {
    pub probe: String,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "probe {} failed", self.probe)
    }
}

impl std::error::Error for ProbeError {}

#[derive(Debug)]
pub struct Probe {
    name: String,
    log: CallLog,
    hits: AtomicUsize,
    last: AtomicI64,
    armed: AtomicBool,
}

impl Probe {
    /// A probe recording into `log` under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, log: &CallLog) -> Self {
        Self {
            name: name.into(),
            log: log.clone(),
            hits: AtomicUsize::new(0),
            last: AtomicI64::new(0),
            armed: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total number of slot invocations on this probe.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Last value delivered through [`Probe::value`] or [`Probe::sum`].
    #[must_use]
    pub fn last(&self) -> i64 {
        self.last.load(Ordering::SeqCst)
    }

    /// Make [`Probe::fail_when`] start failing.
    pub fn arm(&self, armed: bool) {
        self.armed.store(armed, Ordering::SeqCst);
    }

    fn note(&self, slot: &'static str, args: Vec<String>) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.log.record(&self.name, slot, args);
    }

    /// Zero-argument slot.
    pub fn hit(&self) {
        self.note("hit", Vec::new());
    }

    /// Second zero-argument slot, distinct from [`Probe::hit`].
    pub fn other(&self) {
        self.note("other", Vec::new());
    }

    pub fn value(&self, v: i32) {
        self.last.store(i64::from(v), Ordering::SeqCst);
        self.note("value", vec![v.to_string()]);
    }

    pub fn sum(&self, a: i32, b: i32) {
        self.last.store(i64::from(a) + i64::from(b), Ordering::SeqCst);
        self.note("sum", vec![a.to_string(), b.to_string()]);
    }

    pub fn text(&self, s: String) {
        self.note("text", vec![s]);
    }

    /// Always fails after recording the call.
    pub fn fail(&self) -> Result<(), ProbeError> {
        self.note("fail", Vec::new());
        Err(ProbeError {
            probe: self.name.clone(),
        })
    }

    /// Fails only while armed.
    pub fn fail_when(&self) -> Result<(), ProbeError> {
        self.note("fail_when", Vec::new());
        if self.armed.load(Ordering::SeqCst) {
            Err(ProbeError {
                probe: self.name.clone(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn probe_is_send_sync() {
        assert_send_sync::<Probe>();
    }

    #[test]
    fn methods_record_and_count() {
        let log = CallLog::new();
        let p = Probe::new("p", &log);
        p.hit();
        p.value(5);
        p.sum(2, 3);
        p.text("hi".into());
        assert_eq!(p.hits(), 4);
        assert_eq!(p.last(), 5);
        assert_eq!(log.labels(), vec!["p.hit", "p.value", "p.sum", "p.text"]);
    }

    #[test]
    fn fail_when_respects_arming() {
        let log = CallLog::new();
        let p = Probe::new("p", &log);
        assert!(p.fail_when().is_ok());
        p.arm(true);
        let err = p.fail_when().unwrap_err();
        assert_eq!(err.to_string(), "probe p failed");
        assert!(p.fail().is_err());
        assert_eq!(p.hits(), 3);
    }
}
