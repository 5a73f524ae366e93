//! Lifecycle coordinator
//!
//! Owns the run-state machine. Every run-state-changing request goes through
//! [`LifecycleCoordinator::submit`], which checks the request against the
//! current state, forwards an accepted transition to the engine exactly once,
//! and publishes the new state to the [`RenderGate`].
//!
//! Requests are applied in the order they are submitted. Nothing is queued,
//! reordered or merged: a `stop` followed by a `run` reaches the engine as
//! `stop` then `run`.

use crate::gate::RenderGate;
use lx_core::{BackgroundPolicy, EngineFault, EngineHandle, Result, RunState, ShellError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A run-state request from the user or the host lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleRequest {
    /// Bring the engine up with the given storage directory
    Init(PathBuf),
    Run,
    Stop,
    Reset,
    ToggleRun,
    /// Host application left the foreground
    AppPause,
    /// Host application returned to the foreground
    AppResume,
    /// Insert a disc image
    Mount(PathBuf),
    Unmount,
}

impl LifecycleRequest {
    /// Short name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Run => "run",
            Self::Stop => "stop",
            Self::Reset => "reset",
            Self::ToggleRun => "toggle_run",
            Self::AppPause => "app_pause",
            Self::AppResume => "app_resume",
            Self::Mount(_) => "mount",
            Self::Unmount => "unmount",
        }
    }
}

impl fmt::Display for LifecycleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(path) => write!(f, "init({})", path.display()),
            Self::Mount(path) => write!(f, "mount({})", path.display()),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Result of an accepted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: RunState,
    pub to: RunState,
    /// Whether an engine call was issued
    pub forwarded: bool,
}

impl Transition {
    /// Run state changed
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Run-state machine in front of the engine
pub struct LifecycleCoordinator {
    engine: Arc<EngineHandle>,
    gate: Arc<RenderGate>,
    state: RunState,
    /// Host application is visible
    foreground: bool,
    /// Current pause was caused by the host going to the background
    host_paused: bool,
    policy: BackgroundPolicy,
    storage: Option<PathBuf>,
    disc: Option<PathBuf>,
    forwarded: u64,
}

impl LifecycleCoordinator {
    /// Create a coordinator for an engine that has not been initialized
    pub fn new(engine: Arc<EngineHandle>) -> Self {
        Self {
            engine,
            gate: RenderGate::new(),
            state: RunState::Uninitialized,
            foreground: true,
            host_paused: false,
            policy: BackgroundPolicy::default(),
            storage: None,
            disc: None,
            forwarded: 0,
        }
    }

    /// Select how a running engine reacts to the host going to the background
    pub fn with_policy(mut self, policy: BackgroundPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Gate to hand to the surface binding manager
    pub fn gate(&self) -> Arc<RenderGate> {
        Arc::clone(&self.gate)
    }

    /// Current run state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Check if the engine is running, without asking it
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Check if a run request could be accepted from the current state
    pub fn is_runnable(&self) -> bool {
        self.state.is_runnable()
    }

    /// Check if the host application is in the foreground
    pub fn is_foreground(&self) -> bool {
        self.foreground
    }

    /// Background policy in effect
    pub fn policy(&self) -> BackgroundPolicy {
        self.policy
    }

    /// Storage directory of the last successful init
    pub fn storage(&self) -> Option<&Path> {
        self.storage.as_deref()
    }

    /// Disc image currently mounted
    pub fn mounted(&self) -> Option<&Path> {
        self.disc.as_deref()
    }

    /// Number of requests forwarded to the engine so far
    pub fn forwarded_count(&self) -> u64 {
        self.forwarded
    }

    /// Initialize the engine with its storage directory
    pub fn init(&mut self, storage: impl AsRef<Path>) -> Result<Transition> {
        self.submit(LifecycleRequest::Init(storage.as_ref().to_path_buf()))
    }

    /// Start or resume emulation
    pub fn run(&mut self) -> Result<Transition> {
        self.submit(LifecycleRequest::Run)
    }

    /// Stop emulation
    pub fn stop(&mut self) -> Result<Transition> {
        self.submit(LifecycleRequest::Stop)
    }

    /// Reset the emulated machine, keeping the run state
    pub fn reset(&mut self) -> Result<Transition> {
        self.submit(LifecycleRequest::Reset)
    }

    /// Pause a running engine or run a paused one
    pub fn toggle_run(&mut self) -> Result<Transition> {
        self.submit(LifecycleRequest::ToggleRun)
    }

    /// Host application went to the background
    pub fn on_app_pause(&mut self) -> Result<Transition> {
        self.submit(LifecycleRequest::AppPause)
    }

    /// Host application came back to the foreground
    pub fn on_app_resume(&mut self) -> Result<Transition> {
        self.submit(LifecycleRequest::AppResume)
    }

    /// Insert a disc image
    pub fn mount(&mut self, image: impl AsRef<Path>) -> Result<Transition> {
        self.submit(LifecycleRequest::Mount(image.as_ref().to_path_buf()))
    }

    /// Eject the current disc image
    pub fn unmount(&mut self) -> Result<Transition> {
        self.submit(LifecycleRequest::Unmount)
    }

    /// Mark the start of process teardown. Every later request is rejected
    /// and the binding manager stops attaching surfaces.
    pub fn begin_teardown(&mut self) {
        if !self.gate.is_tearing_down() {
            tracing::info!("Teardown started in state {}", self.state);
            self.gate.begin_teardown();
        }
    }

    /// Give up on a session whose init could not even be attempted. The
    /// coordinator behaves as after a failed engine init.
    pub fn abandon(&mut self) {
        tracing::error!("Session abandoned before engine init");
        self.gate.poison();
    }

    /// Apply one request
    pub fn submit(&mut self, request: LifecycleRequest) -> Result<Transition> {
        let name = request.name();

        if self.gate.is_tearing_down() || self.gate.is_poisoned() {
            let err = self.invalid(name);
            tracing::warn!("Rejected {}: engine unavailable", request);
            return Err(err);
        }

        let result = match request {
            LifecycleRequest::Init(ref storage) => self.handle_init(storage),
            LifecycleRequest::Run => self.handle_run(),
            LifecycleRequest::Stop => self.handle_stop(),
            LifecycleRequest::Reset => self.handle_reset(),
            LifecycleRequest::ToggleRun => self.handle_toggle(),
            LifecycleRequest::AppPause => self.handle_app_pause(),
            LifecycleRequest::AppResume => self.handle_app_resume(),
            LifecycleRequest::Mount(ref image) => self.handle_mount(image),
            LifecycleRequest::Unmount => self.handle_unmount(),
        };

        match &result {
            Ok(transition) if transition.forwarded => {
                self.forwarded += 1;
                tracing::info!(
                    "{}: {} -> {}",
                    request,
                    transition.from,
                    transition.to
                );
            }
            Ok(transition) => {
                tracing::debug!("{} redundant in state {}", request, transition.from);
            }
            Err(err @ ShellError::InvalidTransition { .. }) => {
                tracing::warn!("Rejected {}: {}", request, err);
            }
            Err(err) => {
                tracing::error!("{} failed: {}", request, err);
            }
        }

        result
    }

    fn handle_init(&mut self, storage: &Path) -> Result<Transition> {
        if self.state.is_initialized() {
            return Err(self.invalid("init"));
        }

        if let Err(fault) = self.engine.init(storage) {
            // A half-initialized engine is undefined for every later call
            self.gate.poison();
            return Err(ShellError::Initialization(fault.to_string()));
        }

        self.storage = Some(storage.to_path_buf());
        Ok(self.enter(RunState::Initialized))
    }

    fn handle_run(&mut self) -> Result<Transition> {
        self.require_initialized("run")?;
        if self.state == RunState::Running {
            return Ok(self.unchanged(false));
        }
        self.require_foreground("run")?;

        self.engine.run().map_err(|source| rejected("run", source))?;
        self.host_paused = false;
        Ok(self.enter(RunState::Running))
    }

    fn handle_stop(&mut self) -> Result<Transition> {
        self.require_initialized("stop")?;
        match self.state {
            RunState::Running | RunState::Paused => {
                self.engine.stop();
                self.host_paused = false;
                Ok(self.enter(RunState::Stopped))
            }
            _ => Ok(self.unchanged(false)),
        }
    }

    fn handle_toggle(&mut self) -> Result<Transition> {
        self.require_initialized("toggle_run")?;
        let target = if self.state == RunState::Running {
            RunState::Paused
        } else {
            self.require_foreground("toggle_run")?;
            RunState::Running
        };

        self.engine
            .toggle_run()
            .map_err(|source| rejected("toggle_run", source))?;
        // A user pause is not undone by the host coming back
        self.host_paused = false;
        Ok(self.enter(target))
    }

    fn handle_reset(&mut self) -> Result<Transition> {
        match self.state {
            RunState::Running | RunState::Paused => {
                self.engine.reset().map_err(|source| rejected("reset", source))?;
                Ok(self.unchanged(true))
            }
            _ => Err(self.invalid("reset")),
        }
    }

    fn handle_app_pause(&mut self) -> Result<Transition> {
        self.foreground = false;
        if self.state != RunState::Running {
            return Ok(self.unchanged(false));
        }

        match self.policy {
            BackgroundPolicy::Pause => {
                self.engine.on_app_pause();
                self.host_paused = true;
                Ok(self.enter(RunState::Paused))
            }
            BackgroundPolicy::Stop => {
                self.engine.stop();
                Ok(self.enter(RunState::Stopped))
            }
        }
    }

    fn handle_app_resume(&mut self) -> Result<Transition> {
        self.foreground = true;
        if self.state == RunState::Paused && self.host_paused {
            self.engine.on_app_resume();
            self.host_paused = false;
            Ok(self.enter(RunState::Running))
        } else {
            Ok(self.unchanged(false))
        }
    }

    fn handle_mount(&mut self, image: &Path) -> Result<Transition> {
        self.require_initialized("mount")?;
        self.engine
            .mount(image)
            .map_err(|source| rejected("mount", source))?;
        self.disc = Some(image.to_path_buf());
        Ok(self.unchanged(true))
    }

    fn handle_unmount(&mut self) -> Result<Transition> {
        self.require_initialized("unmount")?;
        if self.disc.is_none() {
            return Ok(self.unchanged(false));
        }
        self.engine.unmount();
        self.disc = None;
        Ok(self.unchanged(true))
    }

    fn enter(&mut self, to: RunState) -> Transition {
        let from = self.state;
        self.state = to;
        self.gate.publish(to);
        Transition {
            from,
            to,
            forwarded: true,
        }
    }

    fn unchanged(&self, forwarded: bool) -> Transition {
        Transition {
            from: self.state,
            to: self.state,
            forwarded,
        }
    }

    fn require_initialized(&self, request: &'static str) -> Result<()> {
        if self.state.is_initialized() {
            Ok(())
        } else {
            Err(self.invalid(request))
        }
    }

    fn require_foreground(&self, request: &'static str) -> Result<()> {
        if self.foreground {
            Ok(())
        } else {
            Err(self.invalid(request))
        }
    }

    fn invalid(&self, request: &'static str) -> ShellError {
        ShellError::InvalidTransition {
            request,
            state: self.state,
        }
    }
}

fn rejected(operation: &'static str, source: EngineFault) -> ShellError {
    ShellError::EngineRejected { operation, source }
}
