//! Headless engine
//!
//! Implements the call boundary without any emulation behind it. Used by
//! the `lxshell` binary to drive a session when no native core is linked.

use crate::engine::Engine;
use crate::error::EngineFault;
use crate::surface::{SurfaceDesc, SurfaceHandle};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Engine that only tracks the state the shell pushes into it
pub struct NullEngine {
    initialized: AtomicBool,
    running: AtomicBool,
    resets: AtomicU64,
    storage: Mutex<Option<PathBuf>>,
    disc: Mutex<Option<PathBuf>>,
    surface: Mutex<Option<SurfaceDesc>>,
}

impl NullEngine {
    pub fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            running: AtomicBool::new(false),
            resets: AtomicU64::new(0),
            storage: Mutex::new(None),
            disc: Mutex::new(None),
            surface: Mutex::new(None),
        }
    }

    /// Currently attached surface
    pub fn surface(&self) -> Option<SurfaceDesc> {
        *self.surface.lock()
    }

    /// Currently inserted disc image
    pub fn disc(&self) -> Option<PathBuf> {
        self.disc.lock().clone()
    }

    pub fn reset_count(&self) -> u64 {
        self.resets.load(Ordering::Acquire)
    }

    fn require_init(&self) -> Result<(), EngineFault> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(EngineFault::NotRunnable)
        }
    }
}

impl Default for NullEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine for NullEngine {
    fn init(&self, storage: &Path) -> Result<(), EngineFault> {
        if !storage.is_dir() {
            return Err(EngineFault::Storage(format!(
                "{} is not a directory",
                storage.display()
            )));
        }
        *self.storage.lock() = Some(storage.to_path_buf());
        self.initialized.store(true, Ordering::Release);
        tracing::info!("Null engine ready (storage {})", storage.display());
        Ok(())
    }

    fn run(&self) -> Result<(), EngineFault> {
        self.require_init()?;
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn reset(&self) -> Result<(), EngineFault> {
        self.require_init()?;
        self.resets.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn toggle_run(&self) -> Result<(), EngineFault> {
        self.require_init()?;
        self.running.fetch_xor(true, Ordering::AcqRel);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn is_runnable(&self) -> bool {
        self.initialized.load(Ordering::Acquire) && !self.is_running()
    }

    fn on_app_pause(&self) {
        self.running.store(false, Ordering::Release);
    }

    fn on_app_resume(&self) {
        self.running.store(true, Ordering::Release);
    }

    fn mount(&self, image: &Path) -> Result<(), EngineFault> {
        if !image.is_file() {
            return Err(EngineFault::MediaRejected(image.display().to_string()));
        }
        *self.disc.lock() = Some(image.to_path_buf());
        Ok(())
    }

    fn unmount(&self) {
        self.disc.lock().take();
    }

    fn set_surface(&self, surface: &SurfaceDesc) {
        *self.surface.lock() = Some(*surface);
    }

    fn clear_surface(&self, handle: SurfaceHandle) {
        let mut current = self.surface.lock();
        if current.map(|s| s.handle) == Some(handle) {
            *current = None;
        }
    }
}
