#![forbid(unsafe_code)]

//! Ordered record of slot invocations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Call {
    /// Position in the log, starting at 0.
    pub seq: u64,
    /// Who was called (receiver or handler name).
    pub target: String,
    /// Which slot ran.
    pub slot: &'static str,
    /// Rendered arguments.
    pub args: Vec<String>,
}

impl Call {
    /// `"target.slot"`, the form most assertions compare against.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}.{}", self.target, self.slot)
    }
}

#[derive(Debug, Default)]
struct Inner {
    next_seq: AtomicU64,
    calls: Mutex<Vec<Call>>,
}

/// Cheaply cloneable, thread-safe call recorder.
///
/// Clones share the same underlying log.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    inner: Arc<Inner>,
}

impl CallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call.
    pub fn record(&self, target: &str, slot: &'static str, args: Vec<String>) {
        let mut calls = self.lock();
        // Sequence is assigned under the lock so it matches log order.
        let seq = self.inner.next_seq.fetch_add(1, Ordering::Relaxed);
        calls.push(Call {
            seq,
            target: target.to_string(),
            slot,
            args,
        });
    }

    /// Copy of every call so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    /// `target.slot` labels in call order.
    #[must_use]
    pub fn labels(&self) -> Vec<String> {
        self.lock().iter().map(Call::label).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every call. Sequence numbers keep counting.
    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.lock())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Render the log as JSONL.
    #[must_use]
    pub fn to_jsonl(&self) -> String {
        let calls = self.lock();
        let mut out = String::new();
        for call in calls.iter() {
            // `Call` has only string and integer fields.
            if let Ok(line) = serde_json::to_string(call) {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }

    /// Print [`CallLog::to_jsonl`] to stderr when `SIGSLOT_TEST_JSONL` is set.
    pub fn dump_if_requested(&self, test: &str) {
        if jsonl_enabled() {
            eprintln!("{{\"test\":{}}}", serde_json::Value::from(test));
            eprint!("{}", self.to_jsonl());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Call>> {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn jsonl_enabled() -> bool {
    std::env::var("SIGSLOT_TEST_JSONL")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn records_in_order() {
        let log = CallLog::new();
        log.record("a", "on", vec![]);
        log.record("b", "moved", vec!["1".into(), "2".into()]);
        assert_eq!(log.labels(), vec!["a.on", "b.moved"]);
        let calls = log.calls();
        assert_eq!(calls[0].seq, 0);
        assert_eq!(calls[1].seq, 1);
        assert_eq!(calls[1].args, vec!["1", "2"]);
    }

    #[test]
    fn clones_share_storage() {
        let log = CallLog::new();
        let other = log.clone();
        other.record("x", "hit", vec![]);
        assert_eq!(log.len(), 1);
        log.clear();
        assert!(other.is_empty());
    }

    #[test]
    fn take_keeps_sequence_running() {
        let log = CallLog::new();
        log.record("x", "hit", vec![]);
        assert_eq!(log.take().len(), 1);
        log.record("x", "hit", vec![]);
        assert_eq!(log.calls()[0].seq, 1);
    }

    #[test]
    fn jsonl_has_one_object_per_line() {
        let log = CallLog::new();
        log.record("lamp", "on", vec![]);
        log.record("win", "resize", vec!["3".into()]);
        let out = log.to_jsonl();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed["target"], "win");
        assert_eq!(parsed["slot"], "resize");
        assert_eq!(parsed["args"][0], "3");
    }

    #[test]
    fn concurrent_records_get_unique_sequence() {
        let log = CallLog::new();
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let log = log.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        log.record(&format!("t{t}"), "hit", vec![]);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let calls = log.calls();
        assert_eq!(calls.len(), 400);
        for (i, call) in calls.iter().enumerate() {
            assert_eq!(call.seq, i as u64);
        }
    }
}
