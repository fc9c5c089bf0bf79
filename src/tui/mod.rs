pub mod activities;
pub mod context;
pub mod runtime;
pub mod theme;
pub mod time;
pub mod widgets;

pub use context::{AppContext, StatusLevel, StatusMessage};
pub use runtime::{QandaApp, launch};
pub use theme::{Theme, ThemeVariant};
