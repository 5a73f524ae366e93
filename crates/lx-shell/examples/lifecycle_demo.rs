//! Lifecycle demo
//!
//! Drives the shell through a typical host session against the null engine:
//! start, surface arrival, run, backgrounding, resume and teardown.

use lx_core::{Config, EngineHandle, NullEngine, SurfaceDesc, SurfaceHandle};
use lx_shell::{HostEvent, HostShell};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let storage = tempfile::tempdir()?;
    let mut config = Config::default();
    config.paths.storage = storage.path().join("lxdream");

    let engine = EngineHandle::new("null", NullEngine::new());
    let mut shell = HostShell::new(engine, &config);

    // The host often hands over a surface before the engine is up
    let surface = SurfaceHandle::new(1).ok_or("null surface handle")?;
    shell.handle(HostEvent::SurfaceCreated)?;
    shell.handle(HostEvent::SurfaceChanged(SurfaceDesc::new(surface, 800, 480)))?;

    let report = shell.start()?;
    tracing::info!("Started: state {}, surface {:?}", report.state, report.surface);

    shell.handle(HostEvent::RunRequested)?;
    tracing::info!("Running: {}", shell.coordinator().is_running());

    shell.handle(HostEvent::AppPaused)?;
    tracing::info!("Backgrounded: state {}", shell.state());

    shell.handle(HostEvent::AppResumed)?;
    tracing::info!("Foregrounded: state {}", shell.state());

    shell.handle(HostEvent::SurfaceDestroyed(surface))?;
    shell.handle(HostEvent::Teardown)?;

    tracing::info!(
        "Done: state {}, {} lifecycle calls forwarded",
        shell.state(),
        shell.coordinator().forwarded_count()
    );
    Ok(())
}
