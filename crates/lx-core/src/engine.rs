//! Engine call boundary
//!
//! The emulation core lives outside this repository. Everything the shell
//! may ask of it is expressed by the [`Engine`] trait; the shell never
//! reaches the core any other way.
//!
//! The engine runs its own execution thread(s) and may read the bound
//! surface while a `set_surface`/`clear_surface` call is in progress, so every
//! method must be thread-safe with respect to that internal thread. The shell
//! serializes its own calls through a single control thread and never issues
//! two boundary calls concurrently.

use crate::error::EngineFault;
use crate::surface::{SurfaceDesc, SurfaceHandle};
use std::fmt;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

/// Operations provided by the external emulation engine
pub trait Engine: Send + Sync {
    /// Bring the engine up using `storage` for its configuration and data.
    /// Returns once initialization negotiation completes.
    fn init(&self, storage: &Path) -> Result<(), EngineFault>;

    /// Start or continue emulation
    fn run(&self) -> Result<(), EngineFault>;

    /// Halt emulation. Returns after the engine has actually stopped.
    fn stop(&self);

    /// Reinitialize emulated hardware in place
    fn reset(&self) -> Result<(), EngineFault>;

    /// Flip between running and halted
    fn toggle_run(&self) -> Result<(), EngineFault>;

    fn is_running(&self) -> bool;

    fn is_runnable(&self) -> bool;

    /// Host application went to the background
    fn on_app_pause(&self);

    /// Host application came back to the foreground
    fn on_app_resume(&self);

    /// Insert a disc image
    fn mount(&self, image: &Path) -> Result<(), EngineFault>;

    fn unmount(&self);

    /// Atomically replace the current render target. The engine releases any
    /// previous surface itself.
    fn set_surface(&self, surface: &SurfaceDesc);

    /// Drop the render target. Must not return until the engine's internal
    /// thread has stopped touching `handle`.
    fn clear_surface(&self, handle: SurfaceHandle);
}

/// The process-wide engine capability
///
/// Constructed once and shared by reference with the coordinator and the
/// surface binding manager. It is deliberately not `Clone`.
pub struct EngineHandle {
    name: String,
    engine: Box<dyn Engine>,
}

impl EngineHandle {
    /// Wrap an engine implementation
    pub fn new<E: Engine + 'static>(name: impl Into<String>, engine: E) -> Arc<Self> {
        let name = name.into();
        tracing::info!("Engine handle created for {}", name);
        Arc::new(Self {
            name,
            engine: Box::new(engine),
        })
    }

    /// Engine name for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Deref for EngineHandle {
    type Target = dyn Engine;

    fn deref(&self) -> &Self::Target {
        self.engine.as_ref()
    }
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
