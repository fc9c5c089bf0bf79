//! The activity stack: ordering and lifecycle authority over the screens.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use log::debug;

use super::base::{ActivityId, ActivityRef, ActivityResult, ResultCallback};
use super::diagnostics;
use super::error::{ListenerFault, StackError};
use super::event::Event;
use super::host::RenderHost;
use super::lifecycle::Lifecycle;

struct StackEntry {
    activity: ActivityRef,
    on_result: Option<ResultCallback>,
}

enum Transition {
    Push {
        activity: ActivityRef,
        on_result: Option<ResultCallback>,
    },
    Pop {
        id: ActivityId,
        result: ActivityResult,
    },
}

impl Transition {
    fn describe(&self) -> String {
        match self {
            Transition::Push { activity, .. } => format!("push {}", activity.id()),
            Transition::Pop { id, .. } => format!("pop {}", id),
        }
    }
}

struct StackInner {
    entries: RefCell<Vec<StackEntry>>,
    host: Rc<dyn RenderHost>,
    on_stack_changed: Event<Vec<ActivityRef>>,
    pending: RefCell<VecDeque<Transition>>,
    in_transition: Cell<bool>,
    // Set while the top entry is being popped but not yet removed.
    leaving: RefCell<Option<ActivityId>>,
}

/// Ordered stack of activities bound to one render host.
///
/// Only the top activity is resumed and mounted. Every push and pop emits
/// the full list of activities, bottom first, on [`on_stack_changed`].
///
/// A push or pop requested while another transition is running (from a
/// lifecycle hook, a result callback or a change listener) is queued and
/// applied once the running transition has finished, so transitions never
/// interleave. A queued request is checked against the stack as it will be
/// once everything ahead of it has run, and a contract violation is returned
/// right away. A queued transition that still fails when applied is
/// reported through [`diagnostics::report`].
///
/// [`on_stack_changed`]: ActivityStack::on_stack_changed
#[derive(Clone)]
pub struct ActivityStack {
    inner: Rc<StackInner>,
}

/// Non-owning reference to an [`ActivityStack`].
#[derive(Clone)]
pub struct WeakActivityStack {
    inner: Weak<StackInner>,
}

impl WeakActivityStack {
    pub fn upgrade(&self) -> Option<ActivityStack> {
        self.inner.upgrade().map(|inner| ActivityStack { inner })
    }
}

impl fmt::Debug for WeakActivityStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WeakActivityStack")
    }
}

/// Clears the transition flag even if a hook panics. Transitions queued
/// behind a panicking one are discarded.
struct TransitionGuard<'a>(&'a StackInner);

impl<'a> TransitionGuard<'a> {
    fn enter(inner: &'a StackInner) -> Self {
        inner.in_transition.set(true);
        Self(inner)
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.leaving.borrow_mut().take();
            let dropped = std::mem::take(&mut *self.0.pending.borrow_mut());
            if !dropped.is_empty() {
                debug!("Discarding {} queued transition(s) after a panic", dropped.len());
            }
        }
        self.0.in_transition.set(false);
    }
}

impl ActivityStack {
    pub fn new(host: Rc<dyn RenderHost>) -> Self {
        Self {
            inner: Rc::new(StackInner {
                entries: RefCell::new(Vec::new()),
                host,
                on_stack_changed: Event::new(),
                pending: RefCell::new(VecDeque::new()),
                in_transition: Cell::new(false),
                leaving: RefCell::new(None),
            }),
        }
    }

    pub fn downgrade(&self) -> WeakActivityStack {
        WeakActivityStack {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Emits the activities, bottom first, after every push and pop.
    pub fn on_stack_changed(&self) -> &Event<Vec<ActivityRef>> {
        &self.inner.on_stack_changed
    }

    /// The resumed activity, if any.
    pub fn foreground(&self) -> Option<ActivityRef> {
        self.inner
            .entries
            .borrow()
            .last()
            .map(|entry| entry.activity.clone())
    }

    pub fn activities(&self) -> Vec<ActivityRef> {
        self.inner
            .entries
            .borrow()
            .iter()
            .map(|entry| entry.activity.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.borrow().is_empty()
    }

    pub fn is_transitioning(&self) -> bool {
        self.inner.in_transition.get()
    }

    /// Put `activity` on top, pausing the current foreground activity.
    ///
    /// Fails with [`StackError::InvalidState`] if the activity is already
    /// attached to a stack.
    pub fn push(
        &self,
        activity: ActivityRef,
        on_result: Option<ResultCallback>,
    ) -> Result<(), StackError> {
        self.submit(Transition::Push {
            activity,
            on_result,
        })
    }

    /// Push `activity` and call `callback` with whatever it returns.
    pub fn push_for_result(
        &self,
        activity: ActivityRef,
        callback: impl FnOnce(ActivityResult) + 'static,
    ) -> Result<(), StackError> {
        self.push(activity, Some(Box::new(callback)))
    }

    /// Remove `activity`, which must be the foreground activity, and resume
    /// the one below it.
    pub fn pop(&self, activity: &dyn super::Activity, result: ActivityResult) -> Result<(), StackError> {
        self.pop_by_id(activity.id(), result)
    }

    pub(crate) fn pop_by_id(&self, id: &ActivityId, result: ActivityResult) -> Result<(), StackError> {
        self.submit(Transition::Pop {
            id: id.clone(),
            result,
        })
    }

    fn submit(&self, transition: Transition) -> Result<(), StackError> {
        if self.inner.in_transition.get() {
            self.check_queued(&transition)?;
            debug!("Deferring {} until the running transition completes", transition.describe());
            self.inner.pending.borrow_mut().push_back(transition);
            return Ok(());
        }

        let _guard = TransitionGuard::enter(&self.inner);
        let outcome = self.apply(transition);
        self.drain_pending();
        outcome
    }

    fn drain_pending(&self) {
        loop {
            // The queue must not stay borrowed while the transition runs.
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(transition) = next else {
                break;
            };
            let description = transition.describe();
            if let Err(err) = self.apply(transition) {
                diagnostics::report(ListenerFault::new(
                    "activity-stack",
                    format!("deferred {} failed: {}", description, err),
                ));
            }
        }
    }

    /// The ids on the stack once every queued transition has run.
    fn projected_ids(&self) -> Vec<ActivityId> {
        let mut ids: Vec<ActivityId> = self
            .inner
            .entries
            .borrow()
            .iter()
            .map(|entry| entry.activity.id().clone())
            .collect();
        if let Some(leaving) = self.inner.leaving.borrow().as_ref()
            && ids.last() == Some(leaving)
        {
            ids.pop();
        }
        for transition in self.inner.pending.borrow().iter() {
            match transition {
                Transition::Push { activity, .. } => ids.push(activity.id().clone()),
                Transition::Pop { id, .. } => {
                    if ids.last() == Some(id) {
                        ids.pop();
                    }
                }
            }
        }
        ids
    }

    /// Validate a transition that is about to be queued.
    fn check_queued(&self, transition: &Transition) -> Result<(), StackError> {
        let projected = self.projected_ids();
        match transition {
            Transition::Push { activity, .. } => {
                let id = activity.id();
                let elsewhere = activity.base().is_attached()
                    && !activity
                        .base()
                        .stack()
                        .is_some_and(|other| Rc::ptr_eq(&other.inner, &self.inner));
                if elsewhere || projected.contains(id) {
                    return Err(StackError::InvalidState(format!(
                        "{} is already attached to a stack",
                        id
                    )));
                }
            }
            Transition::Pop { id, .. } => {
                let top = projected.last().ok_or(StackError::EmptyStack)?;
                if top != id {
                    return Err(StackError::NotForeground {
                        requested: id.clone(),
                        foreground: top.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn apply(&self, transition: Transition) -> Result<(), StackError> {
        match transition {
            Transition::Push {
                activity,
                on_result,
            } => self.apply_push(activity, on_result),
            Transition::Pop { id, result } => self.apply_pop(&id, result),
        }
    }

    fn apply_push(
        &self,
        activity: ActivityRef,
        on_result: Option<ResultCallback>,
    ) -> Result<(), StackError> {
        if activity.base().is_attached() || self.contains(activity.id()) {
            return Err(StackError::InvalidState(format!(
                "{} is already attached to a stack",
                activity.id()
            )));
        }

        if let Some(previous) = self.foreground() {
            enter(&previous, Lifecycle::Paused, "on_pause", |a| a.on_pause());
            self.inner.host.unmount(previous.root());
        }

        self.inner.entries.borrow_mut().push(StackEntry {
            activity: activity.clone(),
            on_result,
        });

        activity.base().attach(self.downgrade());
        debug!("{}.on_attach_to_stack()", activity.id());
        activity.on_attach_to_stack(self);
        enter(&activity, Lifecycle::Started, "on_start", |a| a.on_start());
        enter(&activity, Lifecycle::Resumed, "on_resume", |a| a.on_resume());

        self.inner.host.mount(activity.root());
        self.notify();
        Ok(())
    }

    fn apply_pop(&self, id: &ActivityId, result: ActivityResult) -> Result<(), StackError> {
        let top = self.foreground().ok_or(StackError::EmptyStack)?;
        if top.id() != id {
            return Err(StackError::NotForeground {
                requested: id.clone(),
                foreground: top.id().clone(),
            });
        }

        *self.inner.leaving.borrow_mut() = Some(top.id().clone());
        self.inner.host.unmount(top.root());
        enter(&top, Lifecycle::Paused, "on_pause", |a| a.on_pause());
        enter(&top, Lifecycle::Stopped, "on_stop", |a| a.on_stop());

        // Removed before the callback runs, so nothing can reach the entry
        // (or its callback) a second time.
        let entry = self.inner.entries.borrow_mut().pop();
        self.inner.leaving.borrow_mut().take();
        if let Some(callback) = entry.and_then(|entry| entry.on_result) {
            callback(result);
        }

        debug!("{}.on_detach_from_stack()", top.id());
        top.on_detach_from_stack();
        top.base().detach();
        top.base().set_lifecycle(Lifecycle::Detached);

        if let Some(next) = self.foreground() {
            enter(&next, Lifecycle::Resumed, "on_resume", |a| a.on_resume());
            self.inner.host.mount(next.root());
        }

        self.notify();
        Ok(())
    }

    fn contains(&self, id: &ActivityId) -> bool {
        self.inner
            .entries
            .borrow()
            .iter()
            .any(|entry| entry.activity.id() == id)
    }

    fn notify(&self) {
        let activities = self.activities();
        self.inner.on_stack_changed.emit(&activities);
    }
}

fn enter(activity: &ActivityRef, state: Lifecycle, hook: &str, call: impl FnOnce(&ActivityRef)) {
    debug!("{}.{}()", activity.id(), hook);
    activity.base().set_lifecycle(state);
    call(activity);
}

impl fmt::Debug for ActivityStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self
            .activities()
            .iter()
            .map(|activity| activity.id().to_string())
            .collect();
        f.debug_struct("ActivityStack").field("entries", &ids).finish()
    }
}
