use event_emitter_rs::EventEmitter;
use parking_lot::Mutex;

/// Connection lifecycle notifications a store client publishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected(String),
    Disconnected(String),
    Error(String),
}

impl ConnectionEvent {
    fn name(&self) -> &'static str {
        match self {
            ConnectionEvent::Connected(_) => "connected",
            ConnectionEvent::Disconnected(_) => "disconnected",
            ConnectionEvent::Error(_) => "error",
        }
    }

    fn into_payload(self) -> String {
        match self {
            ConnectionEvent::Connected(detail)
            | ConnectionEvent::Disconnected(detail)
            | ConnectionEvent::Error(detail) => detail,
        }
    }
}

/// Listener registry for [`ConnectionEvent`]s.
///
/// Listeners run on the emitter's own threads, so they must not assume
/// they observe events synchronously with the state change.
pub struct ConnectionEvents {
    emitter: Mutex<EventEmitter>,
}

impl Default for ConnectionEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionEvents {
    pub fn new() -> Self {
        Self {
            emitter: Mutex::new(EventEmitter::new()),
        }
    }

    /// Called with the endpoint description whenever a connection opens.
    pub fn on_connected<F>(&self, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.emitter.lock().on("connected", listener);
    }

    /// Called with the endpoint description whenever a connection closes.
    pub fn on_disconnected<F>(&self, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.emitter.lock().on("disconnected", listener);
    }

    /// Called with the error message when the client reports a failure.
    pub fn on_error<F>(&self, listener: F)
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.emitter.lock().on("error", listener);
    }

    pub fn emit(&self, event: ConnectionEvent) {
        let name = event.name();
        self.emitter.lock().emit(name, event.into_payload());
    }
}
