//! Surface binding manager
//!
//! Keeps the engine's render target in step with the host windowing
//! system. The host creates, resizes and destroys its surface on its own
//! schedule; this manager turns those events into `set_surface` /
//! `clear_surface` calls so that the engine never holds a handle the host
//! has already reclaimed.
//!
//! Rules:
//! - creation only records that a surface exists; the size arrives with the
//!   following change event, and attaching with a zero size would produce a
//!   broken first frame
//! - a change is a single atomic `set_surface`, never detach-then-attach,
//!   because the engine may be mid-frame on its own thread
//! - destruction calls `clear_surface` before returning, so the host may
//!   free the surface as soon as the handler returns

use crate::gate::RenderGate;
use lx_core::{EngineHandle, PixelFormat, ShellError, SurfaceDesc, SurfaceHandle};
use std::sync::Arc;

/// Current association between a host surface and the engine
///
/// `bound` implies `handle.is_some()` and that the engine received exactly
/// this handle and size on the last attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceBinding {
    pub handle: Option<SurfaceHandle>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub bound: bool,
}

impl SurfaceBinding {
    fn attached(desc: &SurfaceDesc) -> Self {
        Self {
            handle: Some(desc.handle),
            width: desc.width,
            height: desc.height,
            format: desc.format,
            bound: true,
        }
    }

    fn matches(&self, desc: &SurfaceDesc) -> bool {
        self.bound
            && self.handle == Some(desc.handle)
            && self.width == desc.width
            && self.height == desc.height
            && self.format == desc.format
    }
}

/// What a surface event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceOutcome {
    /// Noted without an engine call
    Recorded,
    /// `set_surface` was issued
    Attached,
    /// Same surface and size as the bound one; no call
    Unchanged,
    /// Held back until the engine is initialized or the size is known
    Deferred,
    /// `clear_surface` was issued
    Cleared,
    /// A deferred surface went away before it was ever attached
    Discarded,
    /// Event ignored: stale handle, failed init or teardown
    Dropped,
}

/// Owner of the [`SurfaceBinding`]
pub struct SurfaceBindingManager {
    engine: Arc<EngineHandle>,
    gate: Arc<RenderGate>,
    binding: SurfaceBinding,
    /// Host reported a surface that has not been destroyed since
    created: bool,
    /// Surface waiting for the engine or for a usable size
    pending: Option<SurfaceDesc>,
}

impl SurfaceBindingManager {
    pub fn new(engine: Arc<EngineHandle>, gate: Arc<RenderGate>) -> Self {
        Self {
            engine,
            gate,
            binding: SurfaceBinding::default(),
            created: false,
            pending: None,
        }
    }

    pub fn binding(&self) -> SurfaceBinding {
        self.binding
    }

    pub fn is_bound(&self) -> bool {
        self.binding.bound
    }

    /// Host reported a surface exists
    pub fn has_surface(&self) -> bool {
        self.created
    }

    pub fn pending(&self) -> Option<SurfaceDesc> {
        self.pending
    }

    /// Host created a surface. No engine call until its size is known.
    pub fn on_surface_created(&mut self) -> SurfaceOutcome {
        self.created = true;
        tracing::debug!("Surface created, waiting for size");
        SurfaceOutcome::Recorded
    }

    /// Host reported the surface with its size
    pub fn on_surface_changed(
        &mut self,
        handle: SurfaceHandle,
        width: u32,
        height: u32,
    ) -> SurfaceOutcome {
        self.on_surface_changed_desc(SurfaceDesc::new(handle, width, height))
    }

    /// Host reported the surface with its size and pixel format
    pub fn on_surface_changed_desc(&mut self, desc: SurfaceDesc) -> SurfaceOutcome {
        self.created = true;

        if self.gate.is_tearing_down() || self.gate.is_poisoned() {
            tracing::warn!("Not attaching {}: engine unavailable", desc);
            self.pending = None;
            return SurfaceOutcome::Dropped;
        }

        if !desc.has_area() {
            tracing::debug!("Deferring zero-area {}", desc);
            self.pending = Some(desc);
            return SurfaceOutcome::Deferred;
        }

        if !self.gate.run_state().is_initialized() {
            tracing::debug!("Deferring {} until engine init", desc);
            self.pending = Some(desc);
            return SurfaceOutcome::Deferred;
        }

        self.attach(desc)
    }

    /// Attach a surface deferred while the engine was uninitialized
    pub fn flush_pending(&mut self) -> Option<SurfaceOutcome> {
        let desc = self.pending?;
        if !desc.has_area() {
            return None;
        }
        if self.gate.is_poisoned() || self.gate.is_tearing_down() {
            tracing::warn!("Discarding deferred {}: engine unavailable", desc);
            self.pending = None;
            return Some(SurfaceOutcome::Dropped);
        }
        if !self.gate.run_state().is_initialized() {
            return None;
        }
        Some(self.attach(desc))
    }

    /// Host is about to reclaim a surface. Returns once the engine let go.
    pub fn on_surface_destroyed(&mut self, handle: SurfaceHandle) -> SurfaceOutcome {
        let pending_match = self.pending.map(|p| p.handle) == Some(handle);
        if pending_match {
            self.pending = None;
        }

        if let Err(err) = self.check_current(handle) {
            if pending_match {
                self.created = false;
                tracing::debug!("Deferred {} destroyed before attach", handle);
                return SurfaceOutcome::Discarded;
            }
            tracing::warn!("Ignoring destroy: {}", err);
            return SurfaceOutcome::Dropped;
        }

        self.engine.clear_surface(handle);
        self.binding = SurfaceBinding::default();
        self.created = false;
        tracing::info!("Cleared {}", handle);
        SurfaceOutcome::Cleared
    }

    /// Let go of the bound surface once no destroy can reach the shell
    /// anymore. Returns `None` if nothing was bound.
    pub fn release(&mut self) -> Option<SurfaceOutcome> {
        self.pending = None;
        let handle = self.binding.handle.filter(|_| self.binding.bound)?;

        self.engine.clear_surface(handle);
        self.binding = SurfaceBinding::default();
        tracing::info!("Released {}", handle);
        Some(SurfaceOutcome::Cleared)
    }

    fn attach(&mut self, desc: SurfaceDesc) -> SurfaceOutcome {
        self.pending = None;

        if self.binding.matches(&desc) {
            tracing::debug!("{} already bound", desc);
            return SurfaceOutcome::Unchanged;
        }

        if let Some(previous) = self.binding.handle.filter(|h| *h != desc.handle) {
            tracing::debug!("{} supersedes {}", desc.handle, previous);
        }

        self.engine.set_surface(&desc);
        self.binding = SurfaceBinding::attached(&desc);
        tracing::info!("Attached {}", desc);
        SurfaceOutcome::Attached
    }

    fn check_current(&self, handle: SurfaceHandle) -> Result<(), ShellError> {
        if self.binding.bound && self.binding.handle == Some(handle) {
            Ok(())
        } else {
            Err(ShellError::StaleSurface(handle))
        }
    }
}
