/// Lifecycle state of an activity instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Constructed, never pushed
    #[default]
    Created,

    /// Attached and started, about to be resumed
    Started,

    /// Foreground, receiving input
    Resumed,

    /// Attached below the top of the stack (or about to be popped)
    Paused,

    /// Being removed from the stack
    Stopped,

    /// Removed; the host reference has been cleared
    Detached,
}

impl Lifecycle {
    pub fn is_foreground(self) -> bool {
        self == Lifecycle::Resumed
    }

    /// Whether an activity in this state may still act on asynchronous
    /// results it requested earlier.
    pub fn accepts_results(self) -> bool {
        matches!(self, Lifecycle::Started | Lifecycle::Resumed | Lifecycle::Paused)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lifecycle::Created => "created",
            Lifecycle::Started => "started",
            Lifecycle::Resumed => "resumed",
            Lifecycle::Paused => "paused",
            Lifecycle::Stopped => "stopped",
            Lifecycle::Detached => "detached",
        }
    }
}

impl std::fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
