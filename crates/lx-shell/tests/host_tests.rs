//! Host wiring, start-up and bridge tests

mod common;

use common::{handle, surface, Call, RecordingEngine};
use lx_core::{Config, RunState, ShellError, SurfaceDesc};
use lx_shell::{create_host_bridge, parse_script, HostEvent, HostReply, HostShell, SurfaceOutcome};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

fn config_in(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.paths.storage = dir.path().join("lxdream");
    config
}

#[test]
fn test_start_prepares_storage_and_inits() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);
    let (engine, log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine), &config);

    let report = shell.start().unwrap();
    assert_eq!(report.state, RunState::Initialized);
    assert!(report.failures.is_empty());
    assert!(config.paths.storage.is_dir());
    assert_eq!(log.calls(), vec![Call::Init(config.paths.storage.clone())]);
}

#[test]
fn test_start_attaches_early_surface() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine), &config_in(&dir));
    let h = surface(1);

    shell.handle(HostEvent::SurfaceCreated).unwrap();
    let reply = shell
        .handle(HostEvent::SurfaceChanged(SurfaceDesc::new(h, 800, 480)))
        .unwrap();
    assert_eq!(reply, HostReply::Surface(SurfaceOutcome::Deferred));

    let report = shell.start().unwrap();
    assert_eq!(report.surface, Some(SurfaceOutcome::Attached));
    assert!(shell.surfaces().is_bound());
    assert_eq!(log.calls()[1], Call::SetSurface(SurfaceDesc::new(h, 800, 480)));
}

#[test]
fn test_start_with_unusable_storage_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let mut config = Config::default();
    config.paths.storage = blocker.join("lxdream");
    let (engine, log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine), &config);

    shell
        .handle(HostEvent::SurfaceChanged(SurfaceDesc::new(surface(1), 800, 480)))
        .unwrap();
    let err = shell.start().unwrap_err();
    assert!(matches!(err, ShellError::Initialization(_)));

    // No surface may be presented after a failed start
    let reply = shell
        .handle(HostEvent::SurfaceChanged(SurfaceDesc::new(surface(2), 800, 480)))
        .unwrap();
    assert_eq!(reply, HostReply::Surface(SurfaceOutcome::Dropped));
    assert_eq!(shell.handle(HostEvent::RunRequested).unwrap(), HostReply::Rejected);
    assert_eq!(log.len(), 0);
}

#[test]
fn test_start_engine_init_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine.failing_init()), &config_in(&dir));

    let err = shell.start().unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(shell.state(), RunState::Uninitialized);
}

#[test]
fn test_autoload_failure_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(&dir);
    config.media.autoload = Some(PathBuf::from("/sdcard/missing.gdi"));
    config.general.run_on_start = true;

    let (engine, log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine.failing_mount()), &config);

    let report = shell.start().unwrap();
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0],
        ShellError::EngineRejected { operation: "mount", .. }
    ));
    assert_eq!(report.state, RunState::Running);
    assert_eq!(
        log.calls()[1..],
        [Call::Mount(PathBuf::from("/sdcard/missing.gdi")), Call::Run]
    );
}

#[test]
fn test_invalid_transitions_stay_inside() {
    let (engine, log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine), &Config::default());

    assert_eq!(shell.handle(HostEvent::RunRequested).unwrap(), HostReply::Rejected);
    assert_eq!(shell.handle(HostEvent::ResetRequested).unwrap(), HostReply::Rejected);
    assert_eq!(
        shell.handle(HostEvent::SurfaceDestroyed(surface(9))).unwrap(),
        HostReply::Surface(SurfaceOutcome::Dropped)
    );
    assert_eq!(log.len(), 0);
}

#[test]
fn test_engine_rejection_reaches_host() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine.failing_mount()), &config_in(&dir));
    shell.start().unwrap();

    let err = shell
        .handle(HostEvent::MountRequested(PathBuf::from("/sdcard/bad.cdi")))
        .unwrap_err();
    assert!(matches!(err, ShellError::EngineRejected { .. }));
    assert_eq!(shell.state(), RunState::Initialized);
}

#[test]
fn test_script_session() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine), &config_in(&dir));
    shell.start().unwrap();
    log.clear();

    let script = "\
surface-created
surface-changed 1 800 480
run
app-pause
app-resume
toggle
surface-destroyed 1
teardown
surface-changed 2 800 480
";
    for event in parse_script(script).unwrap() {
        shell.handle(event).unwrap();
    }

    let h = surface(1);
    assert_eq!(
        log.calls(),
        vec![
            Call::SetSurface(SurfaceDesc::new(h, 800, 480)),
            Call::Run,
            Call::AppPause,
            Call::AppResume,
            Call::ToggleRun,
            Call::ClearSurface(h),
        ]
    );
    assert_eq!(shell.state(), RunState::Paused);
    assert!(!shell.surfaces().is_bound());
}

#[test]
fn test_bridge_session_from_host_thread() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine), &config_in(&dir));
    shell.start().unwrap();
    log.clear();

    let (sender, receiver) = create_host_bridge();
    let h = surface(3);

    let host = thread::spawn(move || {
        assert!(sender.post(HostEvent::SurfaceCreated));
        assert!(sender.surface_changed(SurfaceDesc::new(h, 1024, 600)));
        assert!(sender.post(HostEvent::RunRequested));
        let stopped = sender.stop();
        let destroyed = sender.surface_destroyed(h);
        sender.post(HostEvent::Teardown);
        (stopped, destroyed)
    });

    let mut torn_down = false;
    while !torn_down {
        if receiver.wait(Duration::from_millis(50)) {
            let report = shell.pump(&receiver);
            assert!(report.failures.is_empty());
        }
        torn_down = shell.coordinator().gate().is_tearing_down();
    }

    let (stopped, destroyed) = host.join().unwrap();
    assert!(matches!(stopped, Some(Ok(HostReply::Lifecycle(_)))));
    assert!(matches!(
        destroyed,
        Some(Ok(HostReply::Surface(SurfaceOutcome::Cleared)))
    ));

    assert_eq!(
        log.calls(),
        vec![
            Call::SetSurface(SurfaceDesc::new(h, 1024, 600)),
            Call::Run,
            Call::Stop,
            Call::ClearSurface(h),
        ]
    );
    assert_eq!(shell.state(), RunState::Stopped);
}

#[test]
fn test_posted_failures_collected() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, _log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine.failing_mount()), &config_in(&dir));
    shell.start().unwrap();

    let (sender, receiver) = create_host_bridge();
    sender.post(HostEvent::MountRequested(PathBuf::from("/sdcard/a.gdi")));
    sender.post(HostEvent::ResetRequested);

    let report = shell.pump(&receiver);
    assert_eq!(report.processed, 2);
    // The rejected reset is resolved inside, only the mount failure remains
    assert_eq!(report.failures.len(), 1);
}

#[test]
fn test_close_bridge_handles_pending_destroy() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine), &config_in(&dir));
    shell.start().unwrap();
    let h = surface(1);
    shell
        .handle(HostEvent::SurfaceChanged(SurfaceDesc::new(h, 800, 480)))
        .unwrap();
    shell.handle(HostEvent::Teardown).unwrap();

    let (sender, receiver) = create_host_bridge();
    let host = thread::spawn(move || sender.surface_destroyed(h));

    assert!(receiver.wait(Duration::from_secs(5)));
    let report = shell.close_bridge(&receiver);
    assert_eq!(report.processed, 1);

    let reply = host.join().unwrap();
    assert!(matches!(
        reply,
        Some(Ok(HostReply::Surface(SurfaceOutcome::Cleared)))
    ));
    assert!(!shell.surfaces().is_bound());
    let calls = log.calls();
    assert_eq!(calls.last(), Some(&Call::ClearSurface(h)));
    assert_eq!(calls.iter().filter(|call| call.surface() == Some(h)).count(), 2);
}

#[test]
fn test_close_bridge_releases_bound_surface() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine), &config_in(&dir));
    shell.start().unwrap();
    let h = surface(2);
    shell
        .handle(HostEvent::SurfaceChanged(SurfaceDesc::new(h, 800, 480)))
        .unwrap();

    let (sender, receiver) = create_host_bridge();
    sender.post(HostEvent::RunRequested);
    shell.close_bridge(&receiver);

    // The engine let go before the bridge refused the late destroy
    assert_eq!(log.calls().last(), Some(&Call::ClearSurface(h)));
    assert!(sender.surface_destroyed(h).is_none());
    assert!(!log.calls().contains(&Call::Run));
    assert!(!shell.surfaces().is_bound());
}

#[test]
fn test_mount_through_bridge_returns_engine_result() {
    let dir = tempfile::tempdir().unwrap();
    let (engine, log) = RecordingEngine::new();
    let mut shell = HostShell::new(handle(engine.failing_mount()), &config_in(&dir));
    shell.start().unwrap();

    let (sender, receiver) = create_host_bridge();
    let host = thread::spawn(move || {
        let mounted = sender.mount("/sdcard/crazy taxi.cdi");
        let stopped = sender.stop();
        (mounted, stopped)
    });

    let mut answered = 0;
    while answered < 2 {
        if receiver.wait(Duration::from_millis(50)) {
            let report = shell.pump(&receiver);
            // Sent events answer their sender, nothing is collected here
            assert!(report.failures.is_empty());
            answered += report.processed;
        }
    }

    let (mounted, stopped) = host.join().unwrap();
    assert!(matches!(
        mounted,
        Some(Err(ShellError::EngineRejected { operation: "mount", .. }))
    ));
    assert!(matches!(stopped, Some(Ok(HostReply::Lifecycle(_)))));
    assert!(log
        .calls()
        .contains(&Call::Mount(PathBuf::from("/sdcard/crazy taxi.cdi"))));
}
