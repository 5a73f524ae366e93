//! Error types for the lxshell application shell

use crate::state::RunState;
use crate::surface::SurfaceHandle;
use thiserror::Error;

/// Main error type for the shell
#[derive(Error, Debug)]
pub enum ShellError {
    /// The engine could not be brought up. Fatal: the engine is left in an
    /// undefined state and no further requests are accepted.
    #[error("Engine initialization failed: {0}")]
    Initialization(String),

    /// A request arrived in a state that does not allow it. Never forwarded
    /// to the engine.
    #[error("Invalid transition: {request} while {state}")]
    InvalidTransition {
        request: &'static str,
        state: RunState,
    },

    /// The engine refused a recoverable request.
    #[error("Engine rejected {operation}: {source}")]
    EngineRejected {
        operation: &'static str,
        #[source]
        source: EngineFault,
    },

    /// A surface call named a handle that is not the current one.
    #[error("Stale surface reference: {0}")]
    StaleSurface(SurfaceHandle),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShellError {
    /// Errors that must be surfaced to the host
    ///
    /// Transition and stale-surface errors are resolved inside the shell.
    pub fn is_host_visible(&self) -> bool {
        !matches!(
            self,
            Self::InvalidTransition { .. } | Self::StaleSurface(_)
        )
    }

    /// Check if this error is fatal for the session
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Initialization(_))
    }
}

/// Failure reported by the external engine across the call boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineFault {
    #[error("storage unavailable: {0}")]
    Storage(String),

    #[error("nothing runnable")]
    NotRunnable,

    #[error("disc image rejected: {0}")]
    MediaRejected(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for shell operations
pub type Result<T> = std::result::Result<T, ShellError>;
