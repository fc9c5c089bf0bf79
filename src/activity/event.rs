//! Minimal synchronous publish/subscribe primitive.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use anyhow::Result;

use super::diagnostics;
use super::error::ListenerFault;

struct Handler<T> {
    label: String,
    callback: Box<dyn Fn(&T) -> Result<()>>,
}

/// A subscriber handle.
///
/// Identity is the underlying allocation: clones of a `Listener` are the same
/// subscriber, two listeners built from identical closures are not.
pub struct Listener<T> {
    handler: Rc<Handler<T>>,
}

impl<T> Listener<T> {
    /// Build a listener that cannot fail.
    pub fn new(label: impl Into<String>, callback: impl Fn(&T) + 'static) -> Self {
        Self::fallible(label, move |value| {
            callback(value);
            Ok(())
        })
    }

    /// Build a listener whose errors are reported as [`ListenerFault`]s.
    pub fn fallible(label: impl Into<String>, callback: impl Fn(&T) -> Result<()> + 'static) -> Self {
        Self {
            handler: Rc::new(Handler {
                label: label.into(),
                callback: Box::new(callback),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.handler.label
    }

    pub fn same_as(&self, other: &Listener<T>) -> bool {
        Rc::ptr_eq(&self.handler, &other.handler)
    }

    fn invoke(&self, value: &T) -> Result<(), ListenerFault> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.handler.callback)(value)));
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(ListenerFault::new(self.label(), format!("{:#}", err))),
            Err(payload) => Err(ListenerFault::new(self.label(), panic_message(payload.as_ref()))),
        }
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.handler.label).finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

/// One signal with an ordered set of subscribers.
///
/// `emit` dispatches to a snapshot of the subscribers taken when the emission
/// starts, so handlers may subscribe or unsubscribe (themselves or others)
/// while it runs without affecting the in-flight dispatch.
pub struct Event<T> {
    listeners: RefCell<Vec<Listener<T>>>,
}

impl<T> Event<T> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Register `listener`. Returns `false` if it was already subscribed.
    pub fn subscribe(&self, listener: &Listener<T>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.iter().any(|existing| existing.same_as(listener)) {
            return false;
        }
        listeners.push(listener.clone());
        true
    }

    /// Remove `listener`. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, listener: &Listener<T>) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.iter().position(|existing| existing.same_as(listener)) {
            Some(index) => {
                listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Build a listener from `callback`, subscribe it and hand it back so the
    /// caller can unsubscribe later.
    pub fn listen(&self, label: impl Into<String>, callback: impl Fn(&T) + 'static) -> Listener<T> {
        let listener = Listener::new(label, callback);
        self.subscribe(&listener);
        listener
    }

    pub fn is_subscribed(&self, listener: &Listener<T>) -> bool {
        self.listeners.borrow().iter().any(|existing| existing.same_as(listener))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Invoke every subscriber in subscription order.
    ///
    /// A subscriber that returns an error or panics is reported through
    /// [`diagnostics::report`] and the emission carries on. Returns the number
    /// of subscribers that failed.
    pub fn emit(&self, value: &T) -> usize {
        let snapshot: Vec<Listener<T>> = self.listeners.borrow().clone();

        let mut faults = 0;
        for listener in &snapshot {
            if let Err(fault) = listener.invoke(value) {
                faults += 1;
                diagnostics::report(fault);
            }
        }
        faults
    }
}

impl<T> Default for Event<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
