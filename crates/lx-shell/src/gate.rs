//! Render eligibility shared between the coordinator and the binding manager
//!
//! The coordinator is the only writer. Reads are lock-free so a query from
//! any thread never blocks.

use lx_core::RunState;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// Published engine state
#[derive(Debug)]
pub struct RenderGate {
    state: AtomicU8,
    poisoned: AtomicBool,
    teardown: AtomicBool,
}

impl RenderGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(RunState::Uninitialized.as_u8()),
            poisoned: AtomicBool::new(false),
            teardown: AtomicBool::new(false),
        })
    }

    /// Last published run state
    pub fn run_state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Engine init failed; nothing may be attached for the rest of the process
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }

    /// Process teardown has begun
    pub fn is_tearing_down(&self) -> bool {
        self.teardown.load(Ordering::Acquire)
    }

    /// The engine may be handed a render target
    pub fn is_render_eligible(&self) -> bool {
        !self.is_poisoned() && !self.is_tearing_down() && self.run_state().is_initialized()
    }

    pub(crate) fn publish(&self, state: RunState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub(crate) fn poison(&self) {
        self.poisoned.store(true, Ordering::Release);
    }

    pub(crate) fn begin_teardown(&self) {
        self.teardown.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_eligibility() {
        let gate = RenderGate::new();
        assert_eq!(gate.run_state(), RunState::Uninitialized);
        assert!(!gate.is_render_eligible());

        gate.publish(RunState::Initialized);
        assert!(gate.is_render_eligible());

        gate.publish(RunState::Paused);
        assert!(gate.is_render_eligible());

        gate.begin_teardown();
        assert!(!gate.is_render_eligible());
    }

    #[test]
    fn test_poisoned_gate() {
        let gate = RenderGate::new();
        gate.poison();
        gate.publish(RunState::Initialized);
        assert!(gate.is_poisoned());
        assert!(!gate.is_render_eligible());
    }
}
