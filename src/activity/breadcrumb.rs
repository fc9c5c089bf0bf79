use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;

use super::base::ActivityRef;
use super::error::StackError;
use super::event::Listener;
use super::observable::Observable;
use super::stack::ActivityStack;

#[derive(Default)]
struct Trail {
    observed: Option<ActivityRef>,
    labels: Vec<String>,
}

/// Navigation trail over an [`ActivityStack`].
///
/// Keeps one label per stacked activity and follows the foreground
/// activity's title, mirroring it into [`window_title`]. At most one title
/// subscription exists at any time: it moves to the new top on every stack
/// change and is removed when the breadcrumb is dropped.
///
/// [`window_title`]: StackBreadcrumb::window_title
pub struct StackBreadcrumb {
    stack: ActivityStack,
    trail: Rc<RefCell<Trail>>,
    stack_listener: Listener<Vec<ActivityRef>>,
    title_listener: Listener<String>,
    window_title: Rc<Observable<String>>,
}

impl StackBreadcrumb {
    pub fn attach(stack: &ActivityStack) -> Self {
        let trail = Rc::new(RefCell::new(Trail::default()));
        let window_title = Rc::new(Observable::new(String::new()));

        let title_listener = {
            let trail = Rc::downgrade(&trail);
            let window_title = Rc::downgrade(&window_title);
            Listener::new("breadcrumb.title", move |title: &String| {
                follow_title(&trail, &window_title, title)
            })
        };

        let stack_listener = {
            let trail = Rc::downgrade(&trail);
            let window_title = Rc::downgrade(&window_title);
            let title_listener = title_listener.clone();
            Listener::new("breadcrumb.stack", move |activities: &Vec<ActivityRef>| {
                if let (Some(trail), Some(window_title)) = (trail.upgrade(), window_title.upgrade()) {
                    rebuild(&trail, &window_title, &title_listener, activities);
                }
            })
        };

        stack.on_stack_changed().subscribe(&stack_listener);
        rebuild(&trail, &window_title, &title_listener, &stack.activities());

        Self {
            stack: stack.clone(),
            trail,
            stack_listener,
            title_listener,
            window_title,
        }
    }

    /// Titles of the stacked activities, bottom first.
    pub fn labels(&self) -> Vec<String> {
        self.trail.borrow().labels.clone()
    }

    /// Title of the foreground activity.
    pub fn window_title(&self) -> &Observable<String> {
        &self.window_title
    }

    /// The activity whose title is currently followed.
    pub fn observed(&self) -> Option<ActivityRef> {
        self.trail.borrow().observed.clone()
    }

    /// Ask the foreground activity to return, if there is something to go
    /// back to. Returns whether a return was requested.
    pub fn navigate_back(&self) -> Result<bool, StackError> {
        if self.stack.len() < 2 {
            return Ok(false);
        }
        match self.stack.foreground() {
            Some(top) => {
                debug!("Navigating back from {}", top.id());
                top.request_return()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Drop for StackBreadcrumb {
    fn drop(&mut self) {
        self.stack.on_stack_changed().unsubscribe(&self.stack_listener);
        let observed = self.trail.borrow_mut().observed.take();
        if let Some(activity) = observed {
            activity.title().on_change().unsubscribe(&self.title_listener);
        }
    }
}

fn rebuild(
    trail: &RefCell<Trail>,
    window_title: &Observable<String>,
    title_listener: &Listener<String>,
    activities: &[ActivityRef],
) {
    let previous = trail.borrow_mut().observed.take();
    if let Some(previous) = previous {
        previous.title().on_change().unsubscribe(title_listener);
    }

    let top = activities.last().cloned();
    if let Some(top) = &top {
        top.title().on_change().subscribe(title_listener);
    }

    let labels = activities.iter().map(|activity| activity.title().get()).collect();
    let title = top.as_ref().map(|activity| activity.title().get());
    {
        let mut trail = trail.borrow_mut();
        trail.observed = top;
        trail.labels = labels;
    }

    if let Some(title) = title {
        window_title.set(title);
    }
}

fn follow_title(trail: &Weak<RefCell<Trail>>, window_title: &Weak<Observable<String>>, title: &str) {
    if let Some(trail) = trail.upgrade()
        && let Some(last) = trail.borrow_mut().labels.last_mut()
    {
        *last = title.to_string();
    }
    if let Some(window_title) = window_title.upgrade() {
        window_title.set(title.to_string());
    }
}
