use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crossterm::event::KeyEvent;
use uuid::Uuid;

use super::error::StackError;
use super::host::{RootHandle, View};
use super::lifecycle::Lifecycle;
use super::observable::Observable;
use super::stack::{ActivityStack, WeakActivityStack};

/// Stable identity of an activity instance, assigned at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityId(Rc<str>);

impl ActivityId {
    /// `kind` names the screen type; a random suffix keeps instances apart.
    pub fn generate(kind: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{}#{}", kind, &suffix[..8]).into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> &str {
        self.0.split('#').next().unwrap_or_default()
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type ActivityRef = Rc<dyn Activity>;

/// Value an activity hands back to whoever started it.
pub type ActivityResult = Option<Box<dyn Any>>;

/// Invoked once, with the result of the pop that removes its entry.
pub type ResultCallback = Box<dyn FnOnce(ActivityResult)>;

/// Wrap a value as an activity result.
pub fn result<T: Any>(value: T) -> ActivityResult {
    Some(Box::new(value))
}

/// Take a typed value out of an activity result.
pub fn take_result<T: Any>(result: ActivityResult) -> Option<T> {
    result.and_then(|value| value.downcast::<T>().ok()).map(|value| *value)
}

/// State every activity carries: identity, title, visual root and the
/// non-owning reference to the stack hosting it.
pub struct ActivityBase {
    id: ActivityId,
    title: Observable<String>,
    root: RootHandle,
    host: RefCell<Option<WeakActivityStack>>,
    lifecycle: Cell<Lifecycle>,
}

impl ActivityBase {
    pub fn new(kind: &str, title: impl Into<String>, view: Rc<dyn View>) -> Self {
        let id = ActivityId::generate(kind);
        Self {
            root: RootHandle::new(id.clone(), view),
            id,
            title: Observable::new(title.into()),
            host: RefCell::new(None),
            lifecycle: Cell::new(Lifecycle::Created),
        }
    }

    pub fn id(&self) -> &ActivityId {
        &self.id
    }

    pub fn title(&self) -> &Observable<String> {
        &self.title
    }

    pub fn root(&self) -> &RootHandle {
        &self.root
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.get()
    }

    pub fn is_attached(&self) -> bool {
        self.host.borrow().is_some()
    }

    /// The stack currently hosting this activity, if it is attached and the
    /// stack is still alive.
    pub fn stack(&self) -> Option<ActivityStack> {
        self.host.borrow().as_ref().and_then(WeakActivityStack::upgrade)
    }

    /// Push `activity` onto the stack hosting this one.
    pub fn start_activity(
        &self,
        activity: ActivityRef,
        on_result: Option<ResultCallback>,
    ) -> Result<(), StackError> {
        self.host_stack()?.push(activity, on_result)
    }

    /// Pop this activity off its stack, handing `result` to the callback
    /// registered when it was pushed.
    pub fn return_from_activity(&self, result: ActivityResult) -> Result<(), StackError> {
        self.host_stack()?.pop_by_id(&self.id, result)
    }

    fn host_stack(&self) -> Result<ActivityStack, StackError> {
        self.stack().ok_or_else(|| {
            StackError::InvalidState(format!("{} is not attached to a stack", self.id))
        })
    }

    pub(crate) fn attach(&self, stack: WeakActivityStack) {
        *self.host.borrow_mut() = Some(stack);
    }

    pub(crate) fn detach(&self) {
        self.host.borrow_mut().take();
    }

    pub(crate) fn set_lifecycle(&self, lifecycle: Lifecycle) {
        self.lifecycle.set(lifecycle);
    }
}

impl fmt::Debug for ActivityBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityBase")
            .field("id", &self.id)
            .field("title", &self.title.get())
            .field("lifecycle", &self.lifecycle.get())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// A navigable screen.
///
/// The lifecycle hooks are invoked by the hosting [`ActivityStack`] only.
/// Implementations keep their own state behind `Cell`/`RefCell`, since the
/// stack, the breadcrumb and pending async work all share the activity.
pub trait Activity {
    fn base(&self) -> &ActivityBase;

    fn id(&self) -> &ActivityId {
        self.base().id()
    }

    fn title(&self) -> &Observable<String> {
        self.base().title()
    }

    fn root(&self) -> &RootHandle {
        self.base().root()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.base().lifecycle()
    }

    /// The host reference is already recorded when this runs.
    fn on_attach_to_stack(&self, _stack: &ActivityStack) {}

    fn on_start(&self) {}

    fn on_resume(&self) {}

    fn on_pause(&self) {}

    fn on_stop(&self) {}

    /// The host reference is cleared right after this returns.
    fn on_detach_from_stack(&self) {}

    /// Asked by navigation UI to leave this activity. The default returns
    /// without a result.
    fn request_return(&self) -> Result<(), StackError> {
        self.base().return_from_activity(None)
    }

    /// Handle a key press while in the foreground. Returns `true` if consumed.
    fn handle_key(&self, _key: KeyEvent) -> bool {
        false
    }

    /// Key hints shown in the footer while in the foreground.
    fn key_hints(&self) -> Vec<(&'static str, &'static str)> {
        Vec::new()
    }
}
