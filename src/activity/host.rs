//! The render host: a single slot that shows one activity's visuals at a time.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::{trace, warn};
use ratatui::Frame;
use ratatui::layout::Rect;

use super::base::ActivityId;
use crate::tui::theme::Theme;

/// Something that can draw itself into a terminal area.
pub trait View {
    fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme);
}

/// Handle to an activity's visual root. Opaque to the stack, which only
/// passes it to the host.
#[derive(Clone)]
pub struct RootHandle {
    owner: ActivityId,
    view: Rc<dyn View>,
}

impl RootHandle {
    pub fn new(owner: ActivityId, view: Rc<dyn View>) -> Self {
        Self { owner, view }
    }

    pub fn owner(&self) -> &ActivityId {
        &self.owner
    }

    pub fn view(&self) -> &Rc<dyn View> {
        &self.view
    }

    pub fn same_root(&self, other: &RootHandle) -> bool {
        Rc::ptr_eq(&self.view, &other.view)
    }
}

impl fmt::Debug for RootHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RootHandle").field(&self.owner).finish()
    }
}

/// The collaborator the stack attaches visuals to. The stack is its only
/// caller and always unmounts the current root before mounting the next.
pub trait RenderHost {
    fn mount(&self, root: &RootHandle);
    fn unmount(&self, root: &RootHandle);
}

/// Host backed by the terminal: holds the mounted root and draws it on
/// request.
#[derive(Default)]
pub struct TerminalHost {
    slot: RefCell<Option<RootHandle>>,
}

impl TerminalHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mounted(&self) -> Option<RootHandle> {
        self.slot.borrow().clone()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        // Clone out so a view may query the host while drawing.
        let mounted = self.mounted();
        if let Some(root) = mounted {
            root.view().render(frame, area, theme);
        }
    }
}

impl RenderHost for TerminalHost {
    fn mount(&self, root: &RootHandle) {
        let mut slot = self.slot.borrow_mut();
        if let Some(current) = slot.as_ref() {
            warn!(
                "Mounting {} while {} is still mounted; replacing it",
                root.owner(),
                current.owner()
            );
        }
        trace!("Mounted {}", root.owner());
        *slot = Some(root.clone());
    }

    fn unmount(&self, root: &RootHandle) {
        let mut slot = self.slot.borrow_mut();
        match slot.as_ref() {
            Some(current) if current.same_root(root) => {
                trace!("Unmounted {}", root.owner());
                *slot = None;
            }
            Some(current) => warn!(
                "Ignoring unmount of {}: {} is mounted",
                root.owner(),
                current.owner()
            ),
            None => warn!("Ignoring unmount of {}: nothing is mounted", root.owner()),
        }
    }
}
