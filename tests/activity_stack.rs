//! Integration tests for the activity stack: lifecycle ordering, result
//! delivery, deferred transitions and contract errors.

mod common;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use common::{Probe, RecordingHost, new_log, take};
use lecture_qanda::activity::diagnostics::set_fault_hook;
use lecture_qanda::activity::{
    Activity, ActivityRef, ActivityStack, Lifecycle, StackError, TerminalHost, result, take_result,
};
use proptest::prelude::*;

fn stack_with_log() -> (ActivityStack, common::Log, Rc<RecordingHost>) {
    let log = new_log();
    let host = RecordingHost::new(&log);
    (ActivityStack::new(host.clone()), log, host)
}

/// Push X, push Y, pop Y with a result: hooks, mounts and the callback run in
/// the documented order.
#[test]
fn test_push_push_pop_ordering() {
    let (stack, log, host) = stack_with_log();
    let x = Probe::new("X", &log);
    let y = Probe::new("Y", &log);

    stack.push(x.clone(), None).unwrap();
    assert_eq!(take(&log), ["X.attach", "X.start", "X.resume", "mount X"]);

    let sink = log.clone();
    stack
        .push_for_result(y.clone(), move |returned| {
            let value = take_result::<String>(returned).unwrap_or_default();
            sink.borrow_mut().push(format!("result {}", value));
        })
        .unwrap();
    assert_eq!(
        take(&log),
        ["X.pause", "unmount X", "Y.attach", "Y.start", "Y.resume", "mount Y"]
    );
    assert_eq!(x.lifecycle(), Lifecycle::Paused);
    assert_eq!(y.lifecycle(), Lifecycle::Resumed);

    stack.pop(&*y, result("r".to_string())).unwrap();
    assert_eq!(
        take(&log),
        [
            "unmount Y",
            "Y.pause",
            "Y.stop",
            "result r",
            "Y.detach",
            "X.resume",
            "mount X"
        ]
    );

    assert_eq!(y.lifecycle(), Lifecycle::Detached);
    assert!(!y.base().is_attached());
    assert_eq!(x.lifecycle(), Lifecycle::Resumed);
    assert!(host.mounted().is_some_and(|root| root.same_root(x.root())));
    assert_eq!(stack.len(), 1);
}

#[test]
fn test_pop_of_last_activity_empties_stack() {
    let (stack, log, host) = stack_with_log();
    let x = Probe::new("X", &log);

    stack.push(x.clone(), None).unwrap();
    take(&log);
    x.base().return_from_activity(None).unwrap();

    assert_eq!(take(&log), ["unmount X", "X.pause", "X.stop", "X.detach"]);
    assert!(stack.is_empty());
    assert!(stack.foreground().is_none());
    assert!(host.mounted().is_none());
}

#[test]
fn test_pop_of_non_foreground_is_rejected() {
    let (stack, log, _host) = stack_with_log();
    let x = Probe::new("X", &log);
    let y = Probe::new("Y", &log);
    stack.push(x.clone(), None).unwrap();
    stack.push(y.clone(), None).unwrap();
    take(&log);

    let err = stack.pop(&*x, None).unwrap_err();

    assert_eq!(
        err,
        StackError::NotForeground {
            requested: x.id().clone(),
            foreground: y.id().clone(),
        }
    );
    assert!(take(&log).is_empty());
    assert_eq!(stack.len(), 2);
    assert_eq!(x.lifecycle(), Lifecycle::Paused);
    assert_eq!(y.lifecycle(), Lifecycle::Resumed);
}

#[test]
fn test_pop_on_empty_stack() {
    let (stack, log, _host) = stack_with_log();
    let x = Probe::new("X", &log);

    assert_eq!(stack.pop(&*x, None), Err(StackError::EmptyStack));
    assert!(take(&log).is_empty());
}

#[test]
fn test_double_push_is_invalid() {
    let (stack, log, _host) = stack_with_log();
    let x = Probe::new("X", &log);
    stack.push(x.clone(), None).unwrap();
    take(&log);

    assert!(matches!(stack.push(x.clone(), None), Err(StackError::InvalidState(_))));

    let (other, _, _) = stack_with_log();
    assert!(matches!(other.push(x.clone(), None), Err(StackError::InvalidState(_))));

    assert!(take(&log).is_empty());
    assert_eq!(stack.len(), 1);
    assert!(other.is_empty());
}

#[test]
fn test_detached_activity_cannot_navigate() {
    let log = new_log();
    let x = Probe::new("X", &log);
    let y = Probe::new("Y", &log);

    assert!(matches!(
        x.base().start_activity(y, None),
        Err(StackError::InvalidState(_))
    ));
    assert!(matches!(
        x.base().return_from_activity(None),
        Err(StackError::InvalidState(_))
    ));
}

#[test]
fn test_activity_can_be_pushed_again_after_pop() {
    let (stack, log, _host) = stack_with_log();
    let x = Probe::new("X", &log);

    stack.push(x.clone(), None).unwrap();
    stack.pop(&*x, None).unwrap();
    stack.push(x.clone(), None).unwrap();

    assert_eq!(x.lifecycle(), Lifecycle::Resumed);
    assert_eq!(stack.len(), 1);
}

/// A push issued from a result callback waits until the pop has finished.
#[test]
fn test_push_from_result_callback_is_deferred() {
    let (stack, log, _host) = stack_with_log();
    let x = Probe::new("X", &log);
    let y = Probe::new("Y", &log);
    let z = Probe::new("Z", &log);
    stack.push(x.clone(), None).unwrap();

    let weak = stack.downgrade();
    let pushed_z = z.clone();
    let sink = log.clone();
    stack
        .push_for_result(y.clone(), move |_| {
            let stack = weak.upgrade().unwrap();
            assert!(stack.is_transitioning());
            let outcome = stack.push(pushed_z.clone(), None);
            sink.borrow_mut().push(format!("callback push ok={}", outcome.is_ok()));
        })
        .unwrap();
    take(&log);

    stack.pop(&*y, None).unwrap();

    assert_eq!(
        take(&log),
        [
            "unmount Y",
            "Y.pause",
            "Y.stop",
            "callback push ok=true",
            "Y.detach",
            "X.resume",
            "mount X",
            "X.pause",
            "unmount X",
            "Z.attach",
            "Z.start",
            "Z.resume",
            "mount Z"
        ]
    );
    let ids: Vec<_> = stack.activities().iter().map(|a| a.id().clone()).collect();
    assert_eq!(ids, vec![x.id().clone(), z.id().clone()]);
    assert!(!stack.is_transitioning());
}

/// A push that can only fail once queued is rejected when it is requested.
#[test]
fn test_queued_push_of_attached_activity_is_rejected() {
    let (stack, log, _host) = stack_with_log();
    let x = Probe::new("X", &log);
    let y = Probe::new("Y", &log);
    stack.push(x.clone(), None).unwrap();

    let outcome = Rc::new(RefCell::new(None));
    let sink = outcome.clone();
    let weak = stack.downgrade();
    let again = x.clone();
    stack
        .push_for_result(y.clone(), move |_| {
            *sink.borrow_mut() = Some(weak.upgrade().unwrap().push(again.clone(), None));
        })
        .unwrap();

    stack.pop(&*y, None).unwrap();

    assert!(matches!(
        outcome.borrow_mut().take(),
        Some(Err(StackError::InvalidState(_)))
    ));
    assert_eq!(stack.len(), 1);
    assert_eq!(x.lifecycle(), Lifecycle::Resumed);
}

#[test]
fn test_queued_pop_checks_the_projected_foreground() {
    let (stack, log, _host) = stack_with_log();
    let x = Probe::new("X", &log);
    let y = Probe::new("Y", &log);
    let z = Probe::new("Z", &log);
    stack.push(x.clone(), None).unwrap();

    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let sink = outcomes.clone();
    let weak = stack.downgrade();
    let (queued_x, queued_y, queued_z) = (x.clone(), y.clone(), z.clone());
    stack
        .push_for_result(y.clone(), move |_| {
            let stack = weak.upgrade().unwrap();
            let mut sink = sink.borrow_mut();
            sink.push(stack.pop(&*queued_y, None));
            sink.push(stack.push(queued_z.clone(), None));
            sink.push(stack.pop(&*queued_x, None));
            sink.push(stack.pop(&*queued_z, None));
        })
        .unwrap();

    stack.pop(&*y, None).unwrap();

    assert_eq!(
        *outcomes.borrow(),
        vec![
            Err(StackError::NotForeground {
                requested: y.id().clone(),
                foreground: x.id().clone(),
            }),
            Ok(()),
            Err(StackError::NotForeground {
                requested: x.id().clone(),
                foreground: z.id().clone(),
            }),
            Ok(()),
        ]
    );
    let ids: Vec<_> = stack.activities().iter().map(|a| a.id().clone()).collect();
    assert_eq!(ids, vec![x.id().clone()]);
}

#[test]
fn test_activity_can_push_itself_again_from_its_result_callback() {
    let (stack, log, _host) = stack_with_log();
    let x = Probe::new("X", &log);
    let y = Probe::new("Y", &log);
    stack.push(x.clone(), None).unwrap();

    let weak = stack.downgrade();
    let again = y.clone();
    stack
        .push_for_result(y.clone(), move |_| {
            weak.upgrade().unwrap().push(again.clone(), None).unwrap();
        })
        .unwrap();

    stack.pop(&*y, None).unwrap();

    let ids: Vec<_> = stack.activities().iter().map(|a| a.id().clone()).collect();
    assert_eq!(ids, vec![x.id().clone(), y.id().clone()]);
    assert_eq!(y.lifecycle(), Lifecycle::Resumed);
}

/// A queued push can still fail if the activity is claimed by another stack
/// before the queue drains; the failure goes to the fault hook.
#[test]
fn test_failed_deferred_transition_is_reported() {
    let (stack, log, _host) = stack_with_log();
    let (other, _, _) = stack_with_log();
    let x = Probe::new("X", &log);
    let y = Probe::new("Y", &log);
    let z = Probe::new("Z", &log);
    stack.push(x.clone(), None).unwrap();

    let faults = Rc::new(RefCell::new(Vec::new()));
    let fault_sink = faults.clone();
    let _hook = set_fault_hook(move |fault| fault_sink.borrow_mut().push(fault.message.clone()));

    let weak = stack.downgrade();
    let contested = z.clone();
    stack
        .push_for_result(y.clone(), move |_| {
            weak.upgrade().unwrap().push(contested.clone(), None).unwrap();
            other.push(contested.clone(), None).unwrap();
        })
        .unwrap();

    stack.pop(&*y, None).unwrap();

    assert_eq!(stack.len(), 1);
    assert_eq!(faults.borrow().len(), 1);
    assert!(faults.borrow()[0].starts_with(&format!("deferred push {} failed", z.id())));
}

/// A panic in the middle of a transition drops whatever was queued behind it.
#[test]
fn test_panic_discards_queued_transitions() {
    let (stack, log, _host) = stack_with_log();
    let x = Probe::new("X", &log);
    let y = Probe::new("Y", &log);
    let z = Probe::new("Z", &log);
    let w = Probe::new("W", &log);
    stack.push(x.clone(), None).unwrap();

    let weak = stack.downgrade();
    let queued = z.clone();
    stack
        .push_for_result(y.clone(), move |_| {
            weak.upgrade().unwrap().push(queued.clone(), None).unwrap();
            panic!("result handler failed");
        })
        .unwrap();

    let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| stack.pop(&*y, None)));
    assert!(unwound.is_err());
    assert!(!stack.is_transitioning());

    stack.push(w.clone(), None).unwrap();

    let ids: Vec<_> = stack.activities().iter().map(|a| a.id().clone()).collect();
    assert_eq!(ids, vec![x.id().clone(), w.id().clone()]);
    assert!(!z.base().is_attached());
}

#[test]
fn test_result_callback_fires_once() {
    let (stack, log, _host) = stack_with_log();
    let x = Probe::new("X", &log);
    let calls = Rc::new(Cell::new(0));

    let counter = calls.clone();
    stack
        .push_for_result(x.clone(), move |_| counter.set(counter.get() + 1))
        .unwrap();
    stack.pop(&*x, None).unwrap();
    assert_eq!(stack.pop(&*x, None), Err(StackError::EmptyStack));

    assert_eq!(calls.get(), 1);
}

#[test]
fn test_stack_changed_carries_the_activities() {
    let (stack, log, _host) = stack_with_log();
    let x = Probe::new("X", &log);
    let y = Probe::new("Y", &log);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let _listener = stack.on_stack_changed().listen("test", move |activities: &Vec<ActivityRef>| {
        let kinds: Vec<String> = activities.iter().map(|a| a.id().kind().to_string()).collect();
        sink.borrow_mut().push(kinds.join(","));
    });

    stack.push(x.clone(), None).unwrap();
    stack.push(y.clone(), None).unwrap();
    stack.pop(&*y, None).unwrap();
    stack.pop(&*x, None).unwrap();

    assert_eq!(*seen.borrow(), vec!["X", "X,Y", "X", ""]);
}

#[derive(Debug, Clone)]
enum Op {
    Push,
    Pop,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Push), Just(Op::Pop)]
}

proptest! {
    /// After any sequence of pushes and pops the stack matches a plain
    /// vector model: the last change event carries the same list, exactly
    /// the top activity is resumed, and the host shows the top's root.
    #[test]
    fn prop_stack_matches_model(ops in proptest::collection::vec(op(), 0..40)) {
        let host = Rc::new(TerminalHost::new());
        let stack = ActivityStack::new(host.clone());
        let log = new_log();

        let last_event = Rc::new(RefCell::new(Vec::new()));
        let sink = last_event.clone();
        let _listener = stack.on_stack_changed().listen("model", move |activities: &Vec<ActivityRef>| {
            *sink.borrow_mut() = activities.iter().map(|a| a.id().clone()).collect();
        });

        let mut model: Vec<Rc<Probe>> = Vec::new();
        for (step, op) in ops.iter().enumerate() {
            match op {
                Op::Push => {
                    let probe = Probe::new(&format!("P{}", step), &log);
                    stack.push(probe.clone(), None).unwrap();
                    model.push(probe);
                }
                Op::Pop => match model.pop() {
                    Some(top) => stack.pop(&*top, None).unwrap(),
                    None => {
                        let stray = Probe::new("stray", &log);
                        prop_assert_eq!(stack.pop(&*stray, None), Err(StackError::EmptyStack));
                    }
                },
            }

            let expected: Vec<_> = model.iter().map(|p| p.id().clone()).collect();
            let actual: Vec<_> = stack.activities().iter().map(|a| a.id().clone()).collect();
            prop_assert_eq!(&actual, &expected);
            prop_assert_eq!(&*last_event.borrow(), &expected);

            let resumed = model.iter().filter(|p| p.lifecycle() == Lifecycle::Resumed).count();
            prop_assert_eq!(resumed, usize::from(!model.is_empty()));
            for below in model.iter().rev().skip(1) {
                prop_assert_eq!(below.lifecycle(), Lifecycle::Paused);
            }

            match model.last() {
                Some(top) => prop_assert!(host.mounted().is_some_and(|root| root.same_root(top.root()))),
                None => prop_assert!(host.mounted().is_none()),
            }
        }
    }
}
