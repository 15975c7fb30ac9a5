//! Named broadcast signals.
//!
//! A [`SignalBus`] is the observable channel namespace shared by the cache
//! (resource completion signals, named after the resource key) and widgets
//! (lifecycle signals such as `zmd-ready`).

use tokio::sync::broadcast;

/// Number of signals buffered per subscriber before it starts lagging.
const DEFAULT_CAPACITY: usize = 256;

/// A named notification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Signal {
    /// Channel name (a resource key or a lifecycle event name).
    pub name: String,
    /// Identifier of the emitter, if any (e.g., a widget id).
    pub origin: Option<String>,
}

impl Signal {
    /// Create a signal with no origin.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: None,
        }
    }

    /// Attach the emitter's identifier.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Broadcast bus for [`Signal`]s.
///
/// Cloning yields another handle to the same bus. Emitting with no
/// subscribers is not an error; the signal is simply dropped.
#[derive(Clone, Debug)]
pub struct SignalBus {
    sender: broadcast::Sender<Signal>,
}

impl SignalBus {
    /// Create a new bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { sender }
    }

    /// Subscribe to every signal emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.sender.subscribe()
    }

    /// Publish a signal to all current subscribers.
    pub fn emit(&self, signal: Signal) {
        tracing::debug!(name = %signal.name, origin = ?signal.origin, "Emitting signal");
        let _ = self.sender.send(signal);
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}
