//! Bound methods that report failure, under both failure modes.

use std::error::Error as _;

use sigslot::{EmitReport, FailureMode, Receiver, Signal, Signal0, SignalConfig, SignalError};
use sigslot_harness::{CallLog, Probe, ProbeError};

fn continuing<A: sigslot::Args>() -> Signal<A> {
    Signal::with_config(SignalConfig::new().with_failure_mode(FailureMode::Continue))
}

#[test]
fn abort_keeps_earlier_effects_and_skips_the_rest() {
    let log = CallLog::new();
    let first = Receiver::new(Probe::new("first", &log));
    let broken = Receiver::new(Probe::new("broken", &log));
    let last = Receiver::new(Probe::new("last", &log));

    let s = Signal0::new();
    s.connect(&first, Probe::hit).unwrap();
    s.connect(&broken, Probe::fail).unwrap();
    s.connect(&last, Probe::hit).unwrap();

    let err = s.emit(()).unwrap_err();
    let SignalError::SlotFailed { index, .. } = &err else {
        panic!("unexpected error {err}");
    };
    assert_eq!(*index, 1);
    let source = err
        .source()
        .and_then(|e| e.downcast_ref::<ProbeError>())
        .cloned();
    assert_eq!(
        source,
        Some(ProbeError {
            probe: "broken".into()
        })
    );

    assert_eq!(log.labels(), vec!["first.hit", "broken.fail"]);
    assert_eq!(last.hits(), 0);
    log.dump_if_requested("abort_keeps_earlier_effects_and_skips_the_rest");
}

#[test]
fn continue_runs_every_binding_and_reports_first_failure() {
    let log = CallLog::new();
    let a = Receiver::new(Probe::new("a", &log));
    let b = Receiver::new(Probe::new("b", &log));
    let third = Receiver::new(Probe::new("c", &log));

    let s: Signal<(i32, i32)> = continuing();
    s.connect_fn(|_: i32, _: i32| Err::<(), _>(ProbeError { probe: "handler".into() }))
        .unwrap();
    s.connect(&a, Probe::sum).unwrap();
    s.connect_fn(|_: i32, _: i32| Err::<(), _>(ProbeError { probe: "later".into() }))
        .unwrap();
    s.connect(&b, Probe::sum).unwrap();
    s.connect(&third, Probe::sum).unwrap();

    let err = s.emit((40, 2)).unwrap_err();
    assert!(matches!(err, SignalError::SlotFailed { index: 0, .. }));
    assert!(err.to_string().contains("probe handler failed"));

    let calls = log.take();
    let labels: Vec<_> = calls.iter().map(|c| c.label()).collect();
    assert_eq!(labels, vec!["a.sum", "b.sum", "c.sum"]);
    assert!(calls.iter().all(|c| c.args == vec!["40", "2"]));
    assert!(calls.windows(2).all(|w| w[0].seq < w[1].seq));
    assert_eq!(third.last(), 42);
    assert!(log.is_empty());
}

#[test]
fn armed_receiver_fails_only_while_armed() {
    let log = CallLog::new();
    let flaky = Receiver::new(Probe::new("flaky", &log));
    let steady = Receiver::new(Probe::new("steady", &log));

    let s = Signal0::new();
    s.connect(&flaky, Probe::fail_when).unwrap();
    s.connect(&steady, Probe::hit).unwrap();

    assert_eq!(
        s.emit(()).unwrap(),
        EmitReport {
            delivered: 2,
            dropped: 0
        }
    );
    flaky.arm(true);
    assert!(s.emit(()).unwrap_err().is_slot_failure());
    flaky.arm(false);
    s.emit(()).unwrap();

    assert_eq!(flaky.hits(), 3);
    assert_eq!(steady.hits(), 2);
    assert_eq!(
        log.calls().iter().filter(|c| c.target == "steady").count(),
        2
    );
}

#[test]
fn failed_emission_leaves_connections_in_place() {
    let log = CallLog::new();
    let echo = Receiver::new(Probe::new("echo", &log));
    let s: Signal<(String,)> = continuing();
    s.connect(&echo, Probe::text).unwrap();
    s.connect_fn(|_: String| Err::<(), _>(ProbeError { probe: "x".into() }))
        .unwrap();

    for word in ["one", "two"] {
        assert!(s.emit((word.to_string(),)).is_err());
    }
    assert_eq!(s.len(), 2);
    assert_eq!(echo.connection_count(), 1);
    let args: Vec<_> = log.calls().into_iter().flat_map(|c| c.args).collect();
    assert_eq!(args, vec!["one", "two"]);
}
