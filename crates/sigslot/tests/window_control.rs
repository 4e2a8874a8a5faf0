//! Window control scenario: one- and two-argument signals delivering to a
//! single controller, plus the same wiring done through the type-erased
//! [`DynSignal`] view.

use std::cell::RefCell;
use std::collections::BTreeMap;

use sigslot::{
    DynArgs, DynSignal, ErasedBinding, Receiver, Signal1, Signal2, SignalError, SingleThreaded,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowState {
    Minimized,
    Normal,
    Maximized,
}

#[derive(Default)]
struct Window {
    state_changed: Signal1<WindowState>,
    moved_to: Signal2<i32, i32>,
    resized: Signal2<i32, i32>,
}

#[derive(Default)]
struct Control {
    lines: RefCell<Vec<String>>,
}

impl Control {
    fn on_state_changed(&self, state: WindowState) {
        let name = match state {
            WindowState::Minimized => "minimized",
            WindowState::Normal => "normal",
            WindowState::Maximized => "maximized",
        };
        self.lines
            .borrow_mut()
            .push(format!("Window state changed to {name}"));
    }

    fn on_moved_to(&self, x: i32, y: i32) {
        self.lines
            .borrow_mut()
            .push(format!("Window moved to ({x}, {y})"));
    }

    fn on_resized(&self, w: i32, h: i32) {
        self.lines
            .borrow_mut()
            .push(format!("Window resized to {w}x{h}"));
    }

    fn take(&self) -> Vec<String> {
        std::mem::take(&mut self.lines.borrow_mut())
    }
}

#[test]
fn demo_sequence() {
    let w = Window::default();
    let c = Receiver::new(Control::default());

    w.state_changed.connect(&c, Control::on_state_changed).unwrap();
    w.moved_to.connect(&c, Control::on_moved_to).unwrap();
    w.resized.connect(&c, Control::on_resized).unwrap();

    w.state_changed.emit((WindowState::Maximized,)).unwrap();
    w.moved_to.emit((42, 47)).unwrap();
    w.resized.emit((800, 600)).unwrap();

    assert_eq!(
        c.take(),
        vec![
            "Window state changed to maximized",
            "Window moved to (42, 47)",
            "Window resized to 800x600",
        ]
    );
}

#[test]
fn same_signature_signals_stay_separate() {
    let w = Window::default();
    let c = Receiver::new(Control::default());
    w.moved_to.connect(&c, Control::on_moved_to).unwrap();
    w.resized.connect(&c, Control::on_resized).unwrap();

    w.resized.emit((1, 2)).unwrap();
    assert_eq!(c.take(), vec!["Window resized to 1x2"]);
}

#[test]
fn controller_drop_before_window() {
    let w = Window::default();
    {
        let c = Receiver::new(Control::default());
        w.state_changed.connect(&c, Control::on_state_changed).unwrap();
        w.moved_to.connect(&c, Control::on_moved_to).unwrap();
    }
    assert!(w.state_changed.is_empty());
    assert!(w.moved_to.is_empty());
    w.state_changed.emit((WindowState::Normal,)).unwrap();
}

#[test]
fn wired_by_name_through_dyn_signals() {
    let mut signals: BTreeMap<&str, Box<dyn DynSignal<SingleThreaded>>> = BTreeMap::new();
    signals.insert("stateChanged", Box::new(Signal1::<WindowState>::new()));
    signals.insert("movedTo", Box::new(Signal2::<i32, i32>::new()));
    signals.insert("resized", Box::new(Signal2::<i32, i32>::new()));

    let c = Receiver::new(Control::default());
    signals["stateChanged"]
        .connect_dyn(ErasedBinding::method::<(WindowState,), _, _>(
            &c,
            Control::on_state_changed,
        ))
        .unwrap();
    signals["movedTo"]
        .connect_dyn(ErasedBinding::method::<(i32, i32), _, _>(&c, Control::on_moved_to))
        .unwrap();

    // Wrong method for the signal's argument list.
    let err = signals["resized"]
        .connect_dyn(ErasedBinding::method::<(WindowState,), _, _>(
            &c,
            Control::on_state_changed,
        ))
        .unwrap_err();
    assert!(matches!(err, SignalError::IncompatibleSignature { .. }));
    assert_eq!(signals["resized"].connection_count(), 0);

    signals["stateChanged"]
        .emit_dyn(&DynArgs::new((WindowState::Minimized,)))
        .unwrap();
    signals["movedTo"].emit_dyn(&DynArgs::new((3, 4))).unwrap();
    assert_eq!(
        c.take(),
        vec!["Window state changed to minimized", "Window moved to (3, 4)"]
    );
    assert_eq!(c.connection_count(), 2);
}

#[test]
fn stale_erased_binding_does_not_register() {
    let w: Box<dyn DynSignal<SingleThreaded>> = Box::new(Signal2::<i32, i32>::new());
    let binding = {
        let c = Receiver::new(Control::default());
        ErasedBinding::method::<(i32, i32), _, _>(&c, Control::on_moved_to)
    };

    let err = w.connect_dyn(binding).unwrap_err();
    assert!(matches!(err, SignalError::ReceiverDropped { .. }));
    assert_eq!(w.connection_count(), 0);
    for _ in 0..3 {
        let report = w.emit_dyn(&DynArgs::new((1, 1))).unwrap();
        assert_eq!(report.dropped, 0);
    }
}
