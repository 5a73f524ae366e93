//! Host wiring
//!
//! [`HostShell`] is the plain set of event handlers a host registers with its
//! windowing and app-lifecycle layers. It owns the coordinator and the
//! binding manager, routes each [`HostEvent`] to one of them, and decides
//! which errors the host gets to see.

use crate::binding::{SurfaceBindingManager, SurfaceOutcome};
use crate::bridge::{Envelope, HostEventReceiver};
use crate::coordinator::{LifecycleCoordinator, LifecycleRequest, Transition};
use lx_core::{
    Config, EngineHandle, PixelFormat, Result, RunState, ShellError, SurfaceDesc, SurfaceHandle,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Event coming from the host windowing system, app lifecycle or user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    SurfaceCreated,
    SurfaceChanged(SurfaceDesc),
    SurfaceDestroyed(SurfaceHandle),
    AppPaused,
    AppResumed,
    RunRequested,
    StopRequested,
    ResetRequested,
    ToggleRequested,
    MountRequested(PathBuf),
    UnmountRequested,
    /// Process teardown has begun
    Teardown,
}

/// Reply to a handled host event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostReply {
    Lifecycle(Transition),
    Surface(SurfaceOutcome),
    /// Request was not valid in the current state and was not forwarded
    Rejected,
    TornDown,
}

/// Errors in a host event line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseEventError {
    #[error("empty event")]
    Empty,

    #[error("unknown event '{0}'")]
    Unknown(String),

    #[error("{event}: missing {field}")]
    Missing {
        event: &'static str,
        field: &'static str,
    },

    #[error("{event}: invalid {field} '{value}'")]
    Invalid {
        event: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<ParseEventError>,
    },
}

impl FromStr for HostEvent {
    type Err = ParseEventError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let name = words.next().ok_or(ParseEventError::Empty)?;

        let event = match name {
            "surface-created" => HostEvent::SurfaceCreated,
            "surface-changed" => {
                const EVENT: &str = "surface-changed";
                let handle = parse_handle(EVENT, words.next())?;
                let width = parse_field(EVENT, "width", words.next())?;
                let height = parse_field(EVENT, "height", words.next())?;
                let mut desc = SurfaceDesc::new(handle, width, height);
                if let Some(format) = words.next() {
                    desc = desc.with_format(format.parse::<PixelFormat>().map_err(|_| {
                        ParseEventError::Invalid {
                            event: EVENT,
                            field: "format",
                            value: format.to_string(),
                        }
                    })?);
                }
                HostEvent::SurfaceChanged(desc)
            }
            "surface-destroyed" => {
                HostEvent::SurfaceDestroyed(parse_handle("surface-destroyed", words.next())?)
            }
            "app-pause" => HostEvent::AppPaused,
            "app-resume" => HostEvent::AppResumed,
            "run" => HostEvent::RunRequested,
            "stop" => HostEvent::StopRequested,
            "reset" => HostEvent::ResetRequested,
            "toggle" => HostEvent::ToggleRequested,
            "mount" => {
                // Paths may contain spaces
                let rest: Vec<&str> = words.by_ref().collect();
                if rest.is_empty() {
                    return Err(ParseEventError::Missing {
                        event: "mount",
                        field: "path",
                    });
                }
                HostEvent::MountRequested(PathBuf::from(rest.join(" ")))
            }
            "unmount" => HostEvent::UnmountRequested,
            "teardown" => HostEvent::Teardown,
            other => return Err(ParseEventError::Unknown(other.to_string())),
        };

        Ok(event)
    }
}

fn parse_handle(
    event: &'static str,
    value: Option<&str>,
) -> std::result::Result<SurfaceHandle, ParseEventError> {
    let raw: u64 = parse_field(event, "handle", value)?;
    SurfaceHandle::new(raw).ok_or(ParseEventError::Invalid {
        event,
        field: "handle",
        value: raw.to_string(),
    })
}

fn parse_field<T: FromStr>(
    event: &'static str,
    field: &'static str,
    value: Option<&str>,
) -> std::result::Result<T, ParseEventError> {
    let value = value.ok_or(ParseEventError::Missing { event, field })?;
    value.parse().map_err(|_| ParseEventError::Invalid {
        event,
        field,
        value: value.to_string(),
    })
}

/// Parse a session script: one event per line, `#` starts a comment
pub fn parse_script(text: &str) -> std::result::Result<Vec<HostEvent>, ParseEventError> {
    let mut events = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let event = line.parse().map_err(|err| ParseEventError::Line {
            line: index + 1,
            source: Box::new(err),
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Outcome of starting the shell
#[derive(Debug)]
pub struct StartReport {
    pub state: RunState,
    /// Deferred surface attached during start
    pub surface: Option<SurfaceOutcome>,
    /// Non-fatal failures (autoload, run on start)
    pub failures: Vec<ShellError>,
}

/// Outcome of one pump of the host bridge
#[derive(Debug, Default)]
pub struct PumpReport {
    pub processed: usize,
    /// Host-visible errors of posted events. Errors of sent events go back
    /// to their sender instead.
    pub failures: Vec<ShellError>,
}

/// The shell as seen by the host
pub struct HostShell {
    coordinator: LifecycleCoordinator,
    surfaces: SurfaceBindingManager,
    config: Config,
}

impl HostShell {
    pub fn new(engine: Arc<EngineHandle>, config: &Config) -> Self {
        let coordinator = LifecycleCoordinator::new(Arc::clone(&engine))
            .with_policy(config.general.background_policy);
        let surfaces = SurfaceBindingManager::new(engine, coordinator.gate());

        Self {
            coordinator,
            surfaces,
            config: config.clone(),
        }
    }

    pub fn coordinator(&self) -> &LifecycleCoordinator {
        &self.coordinator
    }

    pub fn surfaces(&self) -> &SurfaceBindingManager {
        &self.surfaces
    }

    pub fn state(&self) -> RunState {
        self.coordinator.state()
    }

    /// Prepare storage, initialize the engine, then attach any surface the
    /// host announced early and apply the media and run-on-start settings
    ///
    /// Only initialization failures are returned as errors; they are fatal
    /// and leave the shell refusing every surface.
    pub fn start(&mut self) -> Result<StartReport> {
        let storage = match self.config.paths.ensure_storage() {
            Ok(path) => path.to_path_buf(),
            Err(err) => {
                self.coordinator.abandon();
                return Err(ShellError::Initialization(format!(
                    "cannot prepare storage {}: {}",
                    self.config.paths.storage.display(),
                    err
                )));
            }
        };

        self.coordinator.init(&storage)?;
        let surface = self.surfaces.flush_pending();

        let mut failures = Vec::new();
        if let Some(image) = self.config.media.autoload.clone() {
            if let Err(err) = self.coordinator.mount(&image) {
                tracing::warn!("Autoload of {} failed: {}", image.display(), err);
                failures.push(err);
            }
        }
        if self.config.general.run_on_start {
            if let Err(err) = self.coordinator.run() {
                failures.push(err);
            }
        }

        Ok(StartReport {
            state: self.coordinator.state(),
            surface,
            failures,
        })
    }

    /// Handle one host event
    ///
    /// Invalid transitions and stale surfaces are resolved here and come back
    /// as `Rejected` / `Dropped`. Engine rejections are returned as errors.
    pub fn handle(&mut self, event: HostEvent) -> Result<HostReply> {
        match event {
            HostEvent::SurfaceCreated => Ok(HostReply::Surface(self.surfaces.on_surface_created())),
            HostEvent::SurfaceChanged(desc) => Ok(HostReply::Surface(
                self.surfaces.on_surface_changed_desc(desc),
            )),
            HostEvent::SurfaceDestroyed(handle) => Ok(HostReply::Surface(
                self.surfaces.on_surface_destroyed(handle),
            )),
            HostEvent::AppPaused => self.lifecycle(LifecycleRequest::AppPause),
            HostEvent::AppResumed => self.lifecycle(LifecycleRequest::AppResume),
            HostEvent::RunRequested => self.lifecycle(LifecycleRequest::Run),
            HostEvent::StopRequested => self.lifecycle(LifecycleRequest::Stop),
            HostEvent::ResetRequested => self.lifecycle(LifecycleRequest::Reset),
            HostEvent::ToggleRequested => self.lifecycle(LifecycleRequest::ToggleRun),
            HostEvent::MountRequested(image) => self.lifecycle(LifecycleRequest::Mount(image)),
            HostEvent::UnmountRequested => self.lifecycle(LifecycleRequest::Unmount),
            HostEvent::Teardown => {
                self.shutdown();
                Ok(HostReply::TornDown)
            }
        }
    }

    /// Process every event queued on the bridge, oldest first
    pub fn pump(&mut self, receiver: &HostEventReceiver) -> PumpReport {
        let mut report = PumpReport::default();
        for envelope in receiver.drain() {
            self.deliver(envelope, &mut report);
        }
        report
    }

    /// Close the bridge before the control thread exits
    ///
    /// Queued surface destroys are still handled and answered, and a surface
    /// that is still bound is released before the bridge stops accepting
    /// events, so no host thread reclaims a surface the engine holds. Every
    /// other leftover event is dropped.
    pub fn close_bridge(&mut self, receiver: &HostEventReceiver) -> PumpReport {
        let mut report = PumpReport::default();
        self.settle(receiver.drain(), &mut report);
        if self.surfaces.release().is_some() {
            report.processed += 1;
        }
        self.settle(receiver.close(), &mut report);
        report
    }

    /// Begin process teardown. No surface is attached afterwards.
    pub fn shutdown(&mut self) {
        self.coordinator.begin_teardown();
    }

    fn settle(&mut self, envelopes: Vec<Envelope>, report: &mut PumpReport) {
        for envelope in envelopes {
            if matches!(envelope.event, HostEvent::SurfaceDestroyed(_)) {
                self.deliver(envelope, report);
            } else {
                tracing::debug!("Dropping {:?} on bridge close", envelope.event);
            }
        }
    }

    fn deliver(&mut self, envelope: Envelope, report: &mut PumpReport) {
        let result = self.handle(envelope.event);
        report.processed += 1;

        match envelope.reply {
            Some(reply) => {
                // The sender only disappears if its thread is gone
                let _ = reply.send(result);
            }
            None => {
                if let Err(err) = result {
                    report.failures.push(err);
                }
            }
        }
    }

    fn lifecycle(&mut self, request: LifecycleRequest) -> Result<HostReply> {
        match self.coordinator.submit(request) {
            Ok(transition) => Ok(HostReply::Lifecycle(transition)),
            Err(err) if !err.is_host_visible() => Ok(HostReply::Rejected),
            Err(err) => Err(err),
        }
    }
}
