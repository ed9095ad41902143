use std::fmt;

/// Lifecycle of a supervised server.
///
/// ```text
/// Stopped -> Starting -> Running -> Crashed -> Restarting -> Starting
///                                           -> RefusingRestart -> Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerState {
    /// Not running and not trying to
    Stopped,
    /// Spawning the process
    Starting,
    /// The process is up and its channel published
    Running,
    /// The process exited without being asked to, or failed to spawn
    Crashed,
    /// The restart policy allowed another attempt
    Restarting,
    /// The restart policy gave up
    RefusingRestart,
}

impl ServerState {
    /// Returns true while a process is, or is about to be, running
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::Restarting)
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Crashed => "crashed",
            Self::Restarting => "restarting",
            Self::RefusingRestart => "refusing restart",
        };
        f.write_str(name)
    }
}
