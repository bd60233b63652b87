//! # Event Bus System
//!
//! Broadcasts what the session coordinator did, using `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The coordinator's externally visible side effects (focus requests,
//! directives sent to the engine, notification renders) are mirrored as
//! typed events so hosts can drive UI (e.g. a "focus denied" toast) and
//! tests can observe ordering without reaching into the coordinator.
//!
//! ```text
//! ┌──────────────────┐    emit    ┌──────────┐  subscribe  ┌────────────┐
//! │SessionCoordinator├───────────>│ EventBus ├────────────>│ Subscriber │
//! └──────────────────┘            └──────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, FocusEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(CoreEvent::Focus(FocusEvent::Pending)).ok();
//! assert_eq!(stream.recv().await.unwrap(), CoreEvent::Focus(FocusEvent::Pending));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; keep reading.
//! - **`RecvError::Closed`**: the coordinator and every bus clone were dropped.
//!
//! Emitting with no subscribers returns an error that publishers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Session(SessionEvent),
    Focus(FocusEvent),
    Notification(NotificationEvent),
    Transport(TransportEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Focus(e) => e.description(),
            CoreEvent::Notification(e) => e.description(),
            CoreEvent::Transport(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Session(SessionEvent::Stopped { fatal: true, .. }) => EventSeverity::Error,
            CoreEvent::Focus(FocusEvent::Denied { .. }) => EventSeverity::Warning,
            CoreEvent::Notification(NotificationEvent::RenderFailed { .. }) => {
                EventSeverity::Warning
            }
            CoreEvent::Session(SessionEvent::Started { .. })
            | CoreEvent::Session(SessionEvent::Stopped { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Session Events
// ============================================================================

/// Session lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// The coordinator became active and holds the keep-alive lease.
    Started {
        session_id: String,
        /// Whether the keep-alive host granted the lease.
        keep_alive: bool,
    },
    /// The coordinator reached its terminal state.
    Stopped {
        session_id: String,
        reason: String,
        /// Stopped because the engine reported a fatal error.
        fatal: bool,
    },
    /// The engine reported new content; position-only updates are not published.
    SnapshotApplied {
        title: String,
        is_playing: bool,
        position_ms: u64,
    },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::Started { .. } => "Session started",
            SessionEvent::Stopped { .. } => "Session stopped",
            SessionEvent::SnapshotApplied { .. } => "Playback snapshot applied",
        }
    }
}

// ============================================================================
// Focus Events
// ============================================================================

/// Audio focus arbitration events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum FocusEvent {
    /// Focus state transition (`from`/`to` are focus state names).
    StateChanged { from: String, to: String },
    /// A directive was sent to the engine.
    DirectiveIssued { directive: String },
    /// The audio policy refused focus; playback stays gated.
    Denied { message: String },
    /// Focus was requested and the grant is outstanding.
    Pending,
}

impl FocusEvent {
    fn description(&self) -> &str {
        match self {
            FocusEvent::StateChanged { .. } => "Audio focus state changed",
            FocusEvent::DirectiveIssued { .. } => "Focus directive issued",
            FocusEvent::Denied { .. } => "Audio focus denied",
            FocusEvent::Pending => "Audio focus pending",
        }
    }
}

// ============================================================================
// Notification Events
// ============================================================================

/// Notification projection events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NotificationEvent {
    /// Session metadata and notification were rebuilt and posted.
    Rendered {
        title: String,
        is_playing: bool,
        /// Whether a thumbnail was attached.
        artwork: bool,
    },
    /// Rendering failed; the session continues without a visible notification.
    RenderFailed {
        message: String,
        artwork_stripped: bool,
    },
    /// The notification was removed and the session deactivated.
    Cleared,
}

impl NotificationEvent {
    fn description(&self) -> &str {
        match self {
            NotificationEvent::Rendered { .. } => "Notification rendered",
            NotificationEvent::RenderFailed { .. } => "Notification render failed",
            NotificationEvent::Cleared => "Notification cleared",
        }
    }
}

// ============================================================================
// Transport Events
// ============================================================================

/// Transport-control routing events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TransportEvent {
    /// An OS transport action was forwarded to the engine.
    ActionRouted { action: String },
    /// The engine rejected a forwarded action.
    ActionFailed { action: String, message: String },
}

impl TransportEvent {
    fn description(&self) -> &str {
        match self {
            TransportEvent::ActionRouted { .. } => "Transport action routed",
            TransportEvent::ActionFailed { .. } => "Transport action failed",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning shares the underlying channel. Slow subscribers receive
/// `RecvError::Lagged` instead of blocking the publisher.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
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

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional filter.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let focus_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Focus(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Receives without waiting. Returns `None` when nothing matching is buffered.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }

    /// Drains every buffered matching event.
    pub fn drain(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Some(Ok(event)) = self.try_recv() {
            events.push(event);
        }
        events
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
