//! Notifications and the session log
//!
//! Notifications are transient pop-up style messages. The session log holds
//! permanent results of work that outlives the panel that started it; the
//! interpreter drains it into the history.

use parking_lot::Mutex;
use rose_core::Output;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Receiver of transient user notifications
pub trait NotificationSink: Send + Sync {
    fn notify(&self, output: Output);
}

/// Forwards notifications over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Output>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Output>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelSink {
    fn notify(&self, output: Output) {
        if self.tx.send(output).is_err() {
            debug!("Notification dropped, receiver closed");
        }
    }
}

/// Append-only log shared between panels and the interpreter
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    entries: Arc<Mutex<Vec<Output>>>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, output: Output) {
        self.entries.lock().push(output);
    }

    /// Take every pending entry, in the order pushed
    pub fn drain(&self) -> Vec<Output> {
        std::mem::take(&mut *self.entries.lock())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl NotificationSink for SessionLog {
    fn notify(&self, output: Output) {
        self.push(output);
    }
}
