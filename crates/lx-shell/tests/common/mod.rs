//! Recording engine shared by the integration tests

#![allow(dead_code)]

use lx_core::{Engine, EngineFault, EngineHandle, SurfaceDesc, SurfaceHandle};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One call across the engine boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Init(PathBuf),
    Run,
    Stop,
    Reset,
    ToggleRun,
    IsRunning,
    IsRunnable,
    AppPause,
    AppResume,
    Mount(PathBuf),
    Unmount,
    SetSurface(SurfaceDesc),
    ClearSurface(SurfaceHandle),
}

impl Call {
    /// Surface handle this call refers to, if any
    pub fn surface(&self) -> Option<SurfaceHandle> {
        match self {
            Call::SetSurface(desc) => Some(desc.handle),
            Call::ClearSurface(handle) => Some(*handle),
            _ => None,
        }
    }
}

/// Shared view of the calls an engine received
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    fn push(&self, call: Call) {
        self.0.lock().push(call);
    }
}

/// Engine double that records every call in order
pub struct RecordingEngine {
    log: CallLog,
    running: AtomicBool,
    fail_init: bool,
    fail_run: Arc<AtomicBool>,
    fail_mount: bool,
    fail_reset: bool,
}

impl RecordingEngine {
    pub fn new() -> (Self, CallLog) {
        let log = CallLog::default();
        let engine = Self {
            log: log.clone(),
            running: AtomicBool::new(false),
            fail_init: false,
            fail_run: Arc::new(AtomicBool::new(false)),
            fail_mount: false,
            fail_reset: false,
        };
        (engine, log)
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn failing_mount(mut self) -> Self {
        self.fail_mount = true;
        self
    }

    pub fn failing_reset(mut self) -> Self {
        self.fail_reset = true;
        self
    }

    /// Switch that makes `run` and `toggle_run` fail while set
    pub fn run_failure_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fail_run)
    }

    fn start(&self) -> Result<(), EngineFault> {
        if self.fail_run.load(Ordering::Acquire) {
            Err(EngineFault::NotRunnable)
        } else {
            Ok(())
        }
    }
}

impl Engine for RecordingEngine {
    fn init(&self, storage: &Path) -> Result<(), EngineFault> {
        self.log.push(Call::Init(storage.to_path_buf()));
        if self.fail_init {
            Err(EngineFault::Storage("config unreadable".to_string()))
        } else {
            Ok(())
        }
    }

    fn run(&self) -> Result<(), EngineFault> {
        self.log.push(Call::Run);
        self.start()?;
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&self) {
        self.log.push(Call::Stop);
        self.running.store(false, Ordering::Release);
    }

    fn reset(&self) -> Result<(), EngineFault> {
        self.log.push(Call::Reset);
        if self.fail_reset {
            Err(EngineFault::Other("reset refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn toggle_run(&self) -> Result<(), EngineFault> {
        self.log.push(Call::ToggleRun);
        if !self.running.load(Ordering::Acquire) {
            self.start()?;
        }
        self.running.fetch_xor(true, Ordering::AcqRel);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.log.push(Call::IsRunning);
        self.running.load(Ordering::Acquire)
    }

    fn is_runnable(&self) -> bool {
        self.log.push(Call::IsRunnable);
        true
    }

    fn on_app_pause(&self) {
        self.log.push(Call::AppPause);
        self.running.store(false, Ordering::Release);
    }

    fn on_app_resume(&self) {
        self.log.push(Call::AppResume);
        self.running.store(true, Ordering::Release);
    }

    fn mount(&self, image: &Path) -> Result<(), EngineFault> {
        self.log.push(Call::Mount(image.to_path_buf()));
        if self.fail_mount {
            Err(EngineFault::MediaRejected(image.display().to_string()))
        } else {
            Ok(())
        }
    }

    fn unmount(&self) {
        self.log.push(Call::Unmount);
    }

    fn set_surface(&self, surface: &SurfaceDesc) {
        self.log.push(Call::SetSurface(*surface));
    }

    fn clear_surface(&self, handle: SurfaceHandle) {
        self.log.push(Call::ClearSurface(handle));
    }
}

/// Wrap a recording engine in the process handle
pub fn handle(engine: RecordingEngine) -> Arc<EngineHandle> {
    EngineHandle::new("recording", engine)
}

pub fn surface(raw: u64) -> SurfaceHandle {
    SurfaceHandle::new(raw).expect("non-null surface handle")
}
