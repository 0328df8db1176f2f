use std::sync::mpsc::{Receiver, Sender, channel};

/// Handle used by tasks to tell connected browsers to refresh.
///
/// The handle is owned by whoever runs the tasks and passed explicitly to
/// each of them. A disabled handle swallows every notification, which is
/// what one-shot and production builds use.
#[derive(Debug, Clone, Default)]
pub struct Reload {
    tx: Option<Sender<()>>,
}

impl Reload {
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Creates a live handle, notifications arrive on the returned receiver.
    pub fn channel() -> (Self, Receiver<()>) {
        let (tx, rx) = channel();
        (Self { tx: Some(tx) }, rx)
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    pub fn notify(&self) {
        if let Some(tx) = &self.tx
            && tx.send(()).is_err()
        {
            tracing::debug!("live-reload listener is gone");
        }
    }
}
