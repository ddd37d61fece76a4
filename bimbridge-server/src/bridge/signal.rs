//! Wake signal
//!
//! Moves control from "a job was enqueued" to "the host thread runs the
//! pump". Raises coalesce: while a wake is pending, further raises send
//! nothing. The pump acknowledges before it drains, so a job enqueued after
//! the drain started always produces a fresh wake.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

/// Events delivered to the host thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Jobs are waiting
    Wake,
    /// Drain what is left and exit
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct WakeSignal {
    pending: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl WakeSignal {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let signal = Self {
            pending: Arc::new(AtomicBool::new(false)),
            tx,
        };
        (signal, rx)
    }

    /// Request a pump run; `false` if the host thread is gone
    pub fn raise(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return true;
        }
        self.tx.send(HostEvent::Wake).is_ok()
    }

    /// Called by the pump before draining
    pub fn acknowledge(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn shutdown(&self) -> bool {
        self.tx.send(HostEvent::Shutdown).is_ok()
    }
}
