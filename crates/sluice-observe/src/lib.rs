//! Sluice Observability
//!
//! This crate provides the event observation layer for sluice streams:
//!
//! - [`StreamEvent`]: read/write/seek/block notifications
//! - [`EventSubscriber`]: the observer trait
//! - [`EventDispatcher`]: per-handle subscriber registry
//!
//! # Event Subscription
//!
//! ```
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use sluice_observe::{CollectingSubscriber, EventDispatcher, StreamEvent};
//!
//! let dispatcher = EventDispatcher::new();
//! let collector = Arc::new(CollectingSubscriber::new(64));
//! dispatcher.subscribe(collector.clone());
//!
//! dispatcher.emit(StreamEvent::Read { data: Bytes::from_static(b"hello") });
//! assert_eq!(collector.len(), 1);
//! ```
//!
//! Observation is strictly fire-and-forget: the stream core never reads a
//! value back from a subscriber, and all operations behave identically when
//! no subscriber is registered.

pub mod events;

// Re-export main types
pub use events::{
    CollectingSubscriber, EventDispatcher, EventSubscriber, LoggingSubscriber, StreamEvent,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::events::{EventDispatcher, EventSubscriber, StreamEvent};
}
