//! Host bridge - hands host events from windowing threads to the control thread
//!
//! Windowing callbacks may arrive on a thread other than the one that owns
//! the [`HostShell`](crate::HostShell). The bridge queues those events for the
//! control thread, which drains them in arrival order with
//! [`HostShell::pump`](crate::HostShell::pump).
//!
//! Two delivery modes:
//! - `post`: fire-and-forget, the caller continues immediately
//! - `send`: the caller blocks until the control thread has processed the
//!   event and gets its reply back
//!
//! Surface destruction always uses `send`: the host must not reclaim the
//! surface before the engine has let go of it. Never call `send` from the
//! control thread itself.

use crate::host::{HostEvent, HostReply};
use crossbeam::channel;
use lx_core::{Result, SurfaceDesc, SurfaceHandle};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Initial capacity of the bridge queue
pub const BRIDGE_QUEUE_CAPACITY: usize = 64;

/// Queued event plus the reply slot of a blocked sender
pub(crate) struct Envelope {
    pub(crate) event: HostEvent,
    pub(crate) reply: Option<channel::Sender<Result<HostReply>>>,
}

/// The sender side of the bridge (used by host windowing threads)
#[derive(Clone)]
pub struct HostEventSender {
    /// Event queue
    queue: Arc<Mutex<VecDeque<Envelope>>>,
    /// Condvar to signal new events
    condvar: Arc<Condvar>,
    /// Receiver still accepts events
    open: Arc<AtomicBool>,
}

impl HostEventSender {
    /// Queue an event without waiting. Returns false if the bridge is closed.
    pub fn post(&self, event: HostEvent) -> bool {
        self.enqueue(Envelope { event, reply: None })
    }

    /// Queue an event and wait for the control thread to process it
    ///
    /// Returns `None` if the bridge closed before the event was handled.
    pub fn send(&self, event: HostEvent) -> Option<Result<HostReply>> {
        let (reply_tx, reply_rx) = channel::bounded(1);
        if !self.enqueue(Envelope {
            event,
            reply: Some(reply_tx),
        }) {
            return None;
        }
        // Disconnects if the envelope is dropped by `close`
        reply_rx.recv().ok()
    }

    /// Host reported a surface size. Posted.
    pub fn surface_changed(&self, desc: SurfaceDesc) -> bool {
        self.post(HostEvent::SurfaceChanged(desc))
    }

    /// Host is about to reclaim a surface. Blocks until the engine released it.
    pub fn surface_destroyed(&self, handle: SurfaceHandle) -> Option<Result<HostReply>> {
        self.send(HostEvent::SurfaceDestroyed(handle))
    }

    /// Stop emulation. Blocks until the engine has stopped.
    pub fn stop(&self) -> Option<Result<HostReply>> {
        self.send(HostEvent::StopRequested)
    }

    /// Mount a disc image and wait for the result
    pub fn mount(&self, image: impl Into<PathBuf>) -> Option<Result<HostReply>> {
        self.send(HostEvent::MountRequested(image.into()))
    }

    /// Check if the control thread still accepts events
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn enqueue(&self, envelope: Envelope) -> bool {
        let mut queue = self.queue.lock();
        if !self.open.load(Ordering::Acquire) {
            return false;
        }
        queue.push_back(envelope);
        self.condvar.notify_one();
        true
    }
}

/// The receiver side of the bridge (owned by the control thread)
pub struct HostEventReceiver {
    /// Event queue (shared with senders)
    queue: Arc<Mutex<VecDeque<Envelope>>>,
    /// Condvar to wait for events
    condvar: Arc<Condvar>,
    /// Open state
    open: Arc<AtomicBool>,
}

impl HostEventReceiver {
    /// Take every queued event, oldest first
    pub(crate) fn drain(&self) -> Vec<Envelope> {
        let mut queue = self.queue.lock();
        queue.drain(..).collect()
    }

    /// Check if there are pending events
    pub fn has_pending(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    /// Number of queued events
    pub fn pending_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Wait up to `timeout` for an event. Returns true if one is queued.
    pub fn wait(&self, timeout: Duration) -> bool {
        let mut queue = self.queue.lock();
        if queue.is_empty() && self.open.load(Ordering::Acquire) {
            self.condvar.wait_for(&mut queue, timeout);
        }
        !queue.is_empty()
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Stop accepting events and hand back whatever is still queued. A
    /// blocked `send` returns `None` once its envelope is dropped.
    pub(crate) fn close(&self) -> Vec<Envelope> {
        let leftover: Vec<Envelope> = {
            let mut queue = self.queue.lock();
            self.open.store(false, Ordering::Release);
            queue.drain(..).collect()
        };
        self.condvar.notify_all();
        tracing::info!("Host bridge closed ({} events left over)", leftover.len());
        leftover
    }
}

/// Create a new host bridge pair (sender, receiver)
pub fn create_host_bridge() -> (HostEventSender, HostEventReceiver) {
    let queue = Arc::new(Mutex::new(VecDeque::with_capacity(BRIDGE_QUEUE_CAPACITY)));
    let condvar = Arc::new(Condvar::new());
    let open = Arc::new(AtomicBool::new(true));

    let sender = HostEventSender {
        queue: Arc::clone(&queue),
        condvar: Arc::clone(&condvar),
        open: Arc::clone(&open),
    };

    let receiver = HostEventReceiver {
        queue,
        condvar,
        open,
    };

    (sender, receiver)
}
