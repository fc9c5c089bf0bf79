//! Process-wide channel for contained listener failures.
//!
//! Every fault is logged. A single optional hook can additionally observe
//! faults (the terminal shell shows them in its status line, tests collect
//! them). The core is single-threaded, so the hook lives in a thread local.

use std::cell::RefCell;
use std::rc::Rc;

use log::error;

use super::error::ListenerFault;

type FaultHook = Rc<dyn Fn(&ListenerFault)>;

thread_local! {
    static FAULT_HOOK: RefCell<Option<FaultHook>> = const { RefCell::new(None) };
}

/// Report a fault raised by an event subscriber.
pub fn report(fault: ListenerFault) {
    error!("{}", fault);

    // Clone out of the cell so the hook may itself install or report.
    let hook = FAULT_HOOK.with(|slot| slot.borrow().clone());
    if let Some(hook) = hook {
        hook(&fault);
    }
}

/// Install `hook` as the fault observer until the returned guard is dropped.
/// The previously installed hook is restored afterwards.
#[must_use = "the hook is removed as soon as the guard is dropped"]
pub fn set_fault_hook(hook: impl Fn(&ListenerFault) + 'static) -> FaultHookGuard {
    let previous = FAULT_HOOK.with(|slot| slot.borrow_mut().replace(Rc::new(hook)));
    FaultHookGuard { previous }
}

pub struct FaultHookGuard {
    previous: Option<FaultHook>,
}

impl Drop for FaultHookGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        FAULT_HOOK.with(|slot| *slot.borrow_mut() = previous);
    }
}
