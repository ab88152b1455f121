//! Session event sink.
//!
//! Every user-visible action the engine performs is reported to an injected
//! [`EventSink`]. The sink is owned by the engine and dropped with it, so its
//! lifetime is exactly the session's.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use serde::{Deserialize, Serialize};

/// How the user triggered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMethod {
    /// Arrow / Enter / Space / Delete navigation.
    Keyboard,
    /// A modified-key shortcut (Ctrl/Cmd + ...).
    Shortcut,
    /// Mouse, pen or touch.
    Pointer,
    /// Clipboard paste.
    Clipboard,
    /// File picker or drag-and-drop.
    File,
    /// A direct call from the host (toolbar buttons, decode completions).
    Host,
}

/// Receiver for engine events.
pub trait EventSink {
    fn record(&mut self, event_type: &str, details: &serde_json::Value, input: InputMethod);
}

/// Forwards every event to `tracing` at info level.
#[derive(Debug, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event_type: &str, details: &serde_json::Value, input: InputMethod) {
        tracing::info!(event = event_type, ?input, %details, "tile event");
    }
}

/// A recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub event_type: String,
    pub details: serde_json::Value,
    pub input: InputMethod,
}

/// Keeps events in memory, in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<RecordedEvent>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }

    /// Event types only, in order.
    #[must_use]
    pub fn types(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.event_type.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for MemorySink {
    fn record(&mut self, event_type: &str, details: &serde_json::Value, input: InputMethod) {
        self.events.push(RecordedEvent { event_type: event_type.to_string(), details: details.clone(), input });
    }
}

/// Lets a host keep a handle on a sink shared with the engine.
impl<S: EventSink> EventSink for std::rc::Rc<std::cell::RefCell<S>> {
    fn record(&mut self, event_type: &str, details: &serde_json::Value, input: InputMethod) {
        self.borrow_mut().record(event_type, details, input);
    }
}
