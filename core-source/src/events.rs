//! # Source Event Bus
//!
//! Event notifications for timeline-synchronized media sources, built on
//! `tokio::sync::broadcast`. A source node publishes its lifecycle events here
//! and any number of host-side listeners consume them independently.
//!
//! ## Overview
//!
//! The event system consists of:
//! - **Event Types**: A small, strongly-typed enum of source lifecycle events
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//! - **Subscription Management**: Multiple subscribers can listen independently
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    emit     ┌───────────┐
//! │ Source Node  ├────────────>│           │
//! └──────────────┘             │ EventBus  │    subscribe    ┌────────────┐
//!                              │ (broadcast├────────────────>│ Graph Host │
//!                              │  channel) │                 └────────────┘
//!                              │           │    subscribe    ┌────────────┐
//!                              │           ├────────────────>│ UI Layer   │
//!                              └───────────┘                 └────────────┘
//! ```
//!
//! ## Usage
//!
//! ### Subscribing to Events
//!
//! ```rust
//! use core_source::events::{EventBus, SourceEvent};
//! use tokio::sync::broadcast::error::RecvError;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::default();
//! let mut subscriber = event_bus.subscribe();
//!
//! tokio::spawn(async move {
//!     loop {
//!         match subscriber.recv().await {
//!             Ok(event) => println!("{}: {}", event.name(), event.description()),
//!             Err(RecvError::Lagged(n)) => eprintln!("Missed {} events", n),
//!             Err(RecvError::Closed) => break,
//!         }
//!     }
//! });
//! # }
//! ```
//!
//! ### Filtering Events
//!
//! ```rust
//! use core_source::events::{EventBus, EventStream, SourceEvent};
//!
//! let event_bus = EventBus::default();
//! let mut errors = EventStream::new(event_bus.subscribe())
//!     .filter(|event| matches!(event, SourceEvent::Error));
//! ```
//!
//! ## Event Types
//!
//! Each event fires at most once per load of the underlying resource:
//!
//! - `DurationChange`: The media duration became known and the node resolved
//!   its stop bound from it
//! - `Loaded`: The resource buffered enough to play through without stalling
//! - `Ended`: The node left its presentation window, or the resource reached
//!   its natural end
//! - `Error`: The resource failed and the node was taken out of service
//!
//! ## Error Handling
//!
//! The bus uses `tokio::sync::broadcast`, which can produce two errors on the
//! receiving side:
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   Non-fatal; the subscriber keeps receiving newer events.
//! - **`RecvError::Closed`**: All senders have been dropped, which signals
//!   that the node was torn down.
//!
//! Emitting with no live subscribers returns an error; source nodes ignore it,
//! since listeners are optional.
//!
//! ## Thread Safety
//!
//! The event bus is fully thread-safe (`Send + Sync`) and cheap to clone; each
//! clone publishes into the same channel.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// A single source emits a handful of events per load, so a small buffer is
/// enough to absorb bursts. Subscribers that still fall behind receive
/// `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 16;

// ============================================================================
// Source Events
// ============================================================================

/// Lifecycle events published by a media source node.
///
/// The names mirror the media-element vocabulary hosts already know
/// (`durationchange`, `loaded`, `ended`, `error`). Every variant fires at most
/// once per load of the underlying resource; a re-load after teardown starts a
/// fresh episode and may fire them again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum SourceEvent {
    /// The media duration became known; the node resolved its stop bound.
    DurationChange {
        /// Intrinsic duration of the media, in seconds.
        duration: f64,
    },
    /// The resource buffered enough to play through without stalling.
    Loaded,
    /// The node left its presentation window or the media reached its end.
    Ended,
    /// The resource failed; the node is out of service until reconstructed.
    Error,
}

impl SourceEvent {
    /// Returns the wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            SourceEvent::DurationChange { .. } => "durationchange",
            SourceEvent::Loaded => "loaded",
            SourceEvent::Ended => "ended",
            SourceEvent::Error => "error",
        }
    }

    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &'static str {
        match self {
            SourceEvent::DurationChange { .. } => "Media duration resolved",
            SourceEvent::Loaded => "Source ready to play through",
            SourceEvent::Ended => "Source finished presenting",
            SourceEvent::Error => "Source failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to source events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends (events are cloned for each subscriber)
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
///
/// # Example
///
/// ```rust
/// use core_source::events::{EventBus, SourceEvent};
///
/// # #[tokio::main]
/// # async fn main() {
/// let event_bus = EventBus::default();
/// let mut subscriber = event_bus.subscribe();
///
/// event_bus.emit(SourceEvent::Loaded).ok();
///
/// let received = subscriber.recv().await.unwrap();
/// assert_eq!(received, SourceEvent::Loaded);
/// # }
/// ```
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SourceEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events to buffer per subscriber.
    ///   When a subscriber falls behind by more than this amount, it will
    ///   receive a `RecvError::Lagged` error.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Creates a new event bus with the default buffer size.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when there are no active subscribers. Publishers that do not care
    /// whether anyone is listening may discard the result.
    pub fn emit(&self, event: SourceEvent) -> Result<usize, SendError<SourceEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that will receive all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<SourceEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

/// Type alias for event filter functions.
type EventFilter = Box<dyn Fn(&SourceEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with additional filtering.
///
/// Provides a more ergonomic API for consuming events when a listener cares
/// about a subset of them.
///
/// # Example
///
/// ```rust
/// use core_source::events::{EventBus, EventStream, SourceEvent};
///
/// let event_bus = EventBus::default();
/// let mut terminations = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, SourceEvent::Ended | SourceEvent::Error));
/// ```
pub struct EventStream {
    receiver: Receiver<SourceEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    /// Creates a new event stream from a receiver.
    pub fn new(receiver: Receiver<SourceEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Adds a filter function to this stream.
    ///
    /// Only events that match the filter will be returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&SourceEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter (if any).
    ///
    /// Skips events that don't match the filter and returns the next matching
    /// one.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n`
    /// events. Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<SourceEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            // If no filter, return immediately
            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }

            // Event didn't match filter, continue to next event
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching events are currently available.
    pub fn try_recv(&mut self) -> Option<Result<SourceEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }

                    // Event didn't match filter, continue
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::default();
        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::default();

        // Should error when no subscribers
        assert!(bus.emit(SourceEvent::Loaded).is_err());
    }

    #[tokio::test]
    async fn test_event_emission_with_subscribers() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe();

        let event = SourceEvent::DurationChange { duration: 300.0 };

        let result = bus.emit(event);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 1);

        let received = sub.recv().await.unwrap();
        assert_eq!(received, event);
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        bus.emit(SourceEvent::Ended).ok();

        assert_eq!(sub1.recv().await.unwrap(), SourceEvent::Ended);
        assert_eq!(sub2.recv().await.unwrap(), SourceEvent::Ended);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::default();
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, SourceEvent::Error));

        // Filtered out
        bus.emit(SourceEvent::Loaded).ok();
        bus.emit(SourceEvent::DurationChange { duration: 10.0 }).ok();
        // Passes through
        bus.emit(SourceEvent::Error).ok();

        let received = stream.recv().await.unwrap();
        assert_eq!(received, SourceEvent::Error);
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2); // Very small buffer
        let mut sub = bus.subscribe();

        for _ in 0..5 {
            bus.emit(SourceEvent::Loaded).ok();
        }

        // First recv should indicate lagging
        let result = sub.recv().await;
        assert!(matches!(result, Err(RecvError::Lagged(_))));
    }

    #[tokio::test]
    async fn test_try_recv_empty() {
        let bus = EventBus::default();
        let mut stream = EventStream::new(bus.subscribe());

        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_try_recv_with_event() {
        let bus = EventBus::default();
        let mut stream = EventStream::new(bus.subscribe());

        bus.emit(SourceEvent::Ended).ok();

        let received = stream.try_recv().unwrap().unwrap();
        assert_eq!(received, SourceEvent::Ended);
    }

    #[tokio::test]
    async fn test_try_recv_skips_filtered_events() {
        let bus = EventBus::default();
        let mut stream = EventStream::new(bus.subscribe())
            .filter(|event| matches!(event, SourceEvent::Ended));

        bus.emit(SourceEvent::Loaded).ok();
        bus.emit(SourceEvent::Ended).ok();

        let received = stream.try_recv().unwrap().unwrap();
        assert_eq!(received, SourceEvent::Ended);
        assert!(stream.try_recv().is_none());
    }

    #[test]
    fn test_event_names() {
        assert_eq!(
            SourceEvent::DurationChange { duration: 1.0 }.name(),
            "durationchange"
        );
        assert_eq!(SourceEvent::Loaded.name(), "loaded");
        assert_eq!(SourceEvent::Ended.name(), "ended");
        assert_eq!(SourceEvent::Error.name(), "error");
    }

    #[test]
    fn test_event_serialization() {
        let event = SourceEvent::DurationChange { duration: 42.5 };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("durationchange"));
        assert!(json.contains("42.5"));

        let deserialized: SourceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }
}
