use thiserror::Error;

use super::base::ActivityId;

/// Contract violations raised by the activity stack.
///
/// These are programmer errors: they are returned to the caller immediately
/// and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StackError {
    /// The activity is attached somewhere already, or an operation needs a
    /// host stack the activity does not have.
    #[error("invalid activity state: {0}")]
    InvalidState(String),

    /// `pop` was called while no activity is on the stack.
    #[error("activity stack is empty")]
    EmptyStack,

    /// Only the foreground activity may return from itself.
    #[error("{requested} tried to return while {foreground} is in the foreground")]
    NotForeground {
        requested: ActivityId,
        foreground: ActivityId,
    },
}

/// A subscriber that failed while an event was being emitted.
///
/// The failure is contained: the remaining subscribers of the same emission
/// still run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("listener '{listener}' failed: {message}")]
pub struct ListenerFault {
    pub listener: String,
    pub message: String,
}

impl ListenerFault {
    pub fn new(listener: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            listener: listener.into(),
            message: message.into(),
        }
    }
}
