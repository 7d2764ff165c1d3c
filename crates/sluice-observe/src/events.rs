//! Observable events on stream handles.

use std::io::SeekFrom;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::RwLock;

/// Events that can be observed on a stream handle.
///
/// Events are fire-and-forget notifications; the core never consumes a
/// return value from a subscriber, and every operation behaves identically
/// with zero subscribers registered.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Bytes were read from the handle. Empty reads are reported too.
    Read {
        /// The bytes returned by the read.
        data: Bytes,
    },
    /// Bytes were written to the handle.
    Write {
        /// The bytes handed to the write.
        data: Bytes,
    },
    /// The cursor was repositioned.
    Seek {
        /// Requested target position.
        pos: SeekFrom,
    },
    /// Blocking mode was toggled.
    Block {
        /// The new blocking state.
        blocking: bool,
    },
    /// Custom event.
    Custom {
        /// Event name.
        name: String,
        /// Event data.
        data: serde_json::Value,
    },
}

impl StreamEvent {
    /// Get the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::Read { .. } => "read",
            StreamEvent::Write { .. } => "write",
            StreamEvent::Seek { .. } => "seek",
            StreamEvent::Block { .. } => "block",
            StreamEvent::Custom { .. } => "custom",
        }
    }
}

/// Subscriber for stream events.
pub trait EventSubscriber: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &StreamEvent);

    /// Filter for event types this subscriber is interested in.
    /// Returns true to receive all events.
    fn event_filter(&self) -> Option<Vec<&'static str>> {
        None // Receive all events by default
    }
}

/// A subscriber that logs events through `tracing`.
pub struct LoggingSubscriber {
    /// Minimum log level for events.
    pub log_level: tracing::Level,
}

impl LoggingSubscriber {
    /// Create a new logging subscriber.
    pub fn new() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
        }
    }

    /// Set the log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.log_level = level;
        self
    }
}

impl Default for LoggingSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for LoggingSubscriber {
    fn on_event(&self, event: &StreamEvent) {
        match event {
            StreamEvent::Read { data } => {
                tracing::trace!(event = "read", bytes = data.len(), "Stream read");
            }
            StreamEvent::Write { data } => {
                tracing::trace!(event = "write", bytes = data.len(), "Stream write");
            }
            StreamEvent::Seek { pos } => {
                tracing::debug!(event = "seek", pos = ?pos, "Stream seek");
            }
            StreamEvent::Block { blocking } => {
                tracing::debug!(event = "block", blocking = blocking, "Blocking mode changed");
            }
            StreamEvent::Custom { name, data } => {
                tracing::debug!(event = "custom", name = name, data = %data, "Custom event");
            }
        }
    }
}

/// A subscriber that collects events for later analysis.
pub struct CollectingSubscriber {
    events: RwLock<Vec<(Instant, StreamEvent)>>,
    max_events: usize,
}

impl CollectingSubscriber {
    /// Create a new collecting subscriber.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events,
        }
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<(Instant, StreamEvent)> {
        self.events.read().clone()
    }

    /// Clear collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Get event count.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSubscriber for CollectingSubscriber {
    fn on_event(&self, event: &StreamEvent) {
        let mut events = self.events.write();
        if events.len() < self.max_events {
            events.push((Instant::now(), event.clone()));
        }
    }
}

/// Event dispatcher that manages subscribers.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Remove all subscribers.
    pub fn clear_subscribers(&self) {
        self.subscribers.write().clear();
    }

    /// Get subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: StreamEvent) {
        let subscribers = self.subscribers.read();
        for subscriber in subscribers.iter() {
            // Check filter
            if let Some(filter) = subscriber.event_filter() {
                if !filter.contains(&event.event_type()) {
                    continue;
                }
            }
            subscriber.on_event(&event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
