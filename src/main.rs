//! lxshell - lifecycle shell for the lxdream engine
//!
//! Runs a headless session: host events are read from a script (or stdin),
//! fed from a host thread through the bridge, and processed on the control
//! thread, the same way a windowing toolkit would drive the shell.

use anyhow::{bail, Context};
use clap::Parser;
use lx_core::config::LogLevel;
use lx_core::{Config, EngineHandle, NullEngine};
use lx_shell::{create_host_bridge, parse_script, HostEvent, HostShell};
use std::io::Read;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "lxshell", version, about = "Drive the lxdream lifecycle shell from a host event script")]
struct Args {
    /// Configuration file (defaults to the per-user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Engine storage directory, overrides the config
    #[arg(short, long)]
    storage: Option<PathBuf>,

    /// Host event script, read from stdin when omitted
    #[arg(long)]
    script: Option<PathBuf>,

    /// Log level, overrides the config
    #[arg(long)]
    log_level: Option<LogLevel>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load().context("loading config")?,
    };
    if let Some(storage) = args.storage {
        config.paths.storage = storage;
    }
    if let Some(level) = args.log_level {
        config.debug.log_level = level;
        config.debug.log_filter = None;
    }

    // Initialize logging
    lx_core::logging::init(&config.debug);

    tracing::info!("Starting lxshell");

    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading script from stdin")?;
            text
        }
    };
    let events = parse_script(&script)?;

    let engine = EngineHandle::new("null", NullEngine::new());
    let mut shell = HostShell::new(engine, &config);

    let report = shell.start()?;
    for failure in &report.failures {
        tracing::warn!("Start-up: {}", failure);
    }

    let (sender, receiver) = create_host_bridge();
    let host = thread::spawn(move || {
        for event in events {
            // Destroy, stop and mount complete before the host moves on
            let delivered = match event {
                HostEvent::SurfaceDestroyed(handle) => sender.surface_destroyed(handle).is_some(),
                HostEvent::StopRequested => sender.stop().is_some(),
                HostEvent::MountRequested(image) => sender.mount(image).is_some(),
                event => sender.post(event),
            };
            if !delivered {
                break;
            }
        }
        sender.post(HostEvent::Teardown);
    });

    let mut failed = 0usize;
    loop {
        if receiver.wait(Duration::from_millis(100)) {
            let pumped = shell.pump(&receiver);
            for failure in &pumped.failures {
                tracing::error!("{}", failure);
            }
            failed += pumped.failures.len();
        }
        if shell.coordinator().gate().is_tearing_down() && !receiver.has_pending() {
            break;
        }
        if host.is_finished() && !receiver.has_pending() {
            break;
        }
    }
    let closed = shell.close_bridge(&receiver);
    for failure in &closed.failures {
        tracing::error!("{}", failure);
    }
    failed += closed.failures.len();
    if host.join().is_err() {
        bail!("host event thread panicked");
    }

    let binding = shell.surfaces().binding();
    tracing::info!(
        "Session finished: state {}, surface {}, {} lifecycle calls forwarded, {} failures",
        shell.state(),
        binding
            .handle
            .map(|h| h.to_string())
            .unwrap_or_else(|| "none".to_string()),
        shell.coordinator().forwarded_count(),
        failed
    );

    Ok(())
}
