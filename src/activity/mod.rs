//! Stack-based screen navigation.
//!
//! Activities are pushed onto an [`ActivityStack`], which drives their
//! lifecycle and mounts exactly one of them on a [`RenderHost`] at a time.
//! Changes flow out through [`Event`]s and [`Observable`]s, which the
//! [`StackBreadcrumb`] and the terminal shell subscribe to.

pub mod base;
pub mod breadcrumb;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod host;
pub mod lifecycle;
pub mod observable;
pub mod stack;

pub use base::{
    Activity, ActivityBase, ActivityId, ActivityRef, ActivityResult, ResultCallback, result,
    take_result,
};
pub use breadcrumb::StackBreadcrumb;
pub use error::{ListenerFault, StackError};
pub use event::{Event, Listener};
pub use host::{RenderHost, RootHandle, TerminalHost, View};
pub use lifecycle::Lifecycle;
pub use observable::Observable;
pub use stack::{ActivityStack, WeakActivityStack};
