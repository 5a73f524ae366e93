//! Lifecycle shell between a host UI and the emulation engine
//!
//! This crate keeps two independent timelines consistent:
//! - [`LifecycleCoordinator`]: run-state machine driven by user actions and
//!   host foreground/background transitions
//! - [`SurfaceBindingManager`]: render-target binding driven by the host
//!   windowing system
//!
//! The coordinator publishes render eligibility through a [`RenderGate`]
//! which the binding manager consults before attaching a surface.
//! [`HostShell`] wires both to host events, and the host bridge lets a
//! windowing thread hand events to the control thread.

pub mod binding;
pub mod bridge;
pub mod coordinator;
pub mod gate;
pub mod host;

pub use binding::{SurfaceBinding, SurfaceBindingManager, SurfaceOutcome};
pub use bridge::{create_host_bridge, HostEventReceiver, HostEventSender};
pub use coordinator::{LifecycleCoordinator, LifecycleRequest, Transition};
pub use gate::RenderGate;
pub use host::{
    parse_script, HostEvent, HostReply, HostShell, ParseEventError, PumpReport, StartReport,
};
