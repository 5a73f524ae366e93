//! Emulation run state as seen from the shell

use std::fmt;

/// Run state of the external engine
///
/// Written only by the lifecycle coordinator. `Paused` is a transient halt
/// (application backgrounded or user pause), `Stopped` is an explicit stop
/// that needs a new `run` to leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RunState {
    /// `init` has not succeeded yet
    #[default]
    Uninitialized,
    /// Engine is initialized but has never run
    Initialized,
    /// Emulation is executing
    Running,
    /// Emulation is halted and may be resumed
    Paused,
    /// Emulation was stopped explicitly
    Stopped,
}

impl RunState {
    /// Check if `init` has completed
    pub fn is_initialized(self) -> bool {
        self != Self::Uninitialized
    }

    /// Check if emulation is executing
    pub fn is_running(self) -> bool {
        self == Self::Running
    }

    /// Check if a run request can take effect from this state
    pub fn is_runnable(self) -> bool {
        matches!(self, Self::Initialized | Self::Paused | Self::Stopped)
    }

    /// Encode for atomic publication
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Initialized => 1,
            Self::Running => 2,
            Self::Paused => 3,
            Self::Stopped => 4,
        }
    }

    /// Decode a value produced by [`RunState::as_u8`]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Uninitialized),
            1 => Some(Self::Initialized),
            2 => Some(Self::Running),
            3 => Some(Self::Paused),
            4 => Some(Self::Stopped),
            _ => None,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Initialized => write!(f, "initialized"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}
