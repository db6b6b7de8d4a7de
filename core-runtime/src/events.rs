//! # Event Bus System
//!
//! Decoupled notifications from the deck core to whatever renders it, built on
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! Business logic never touches the UI. Batch jobs report progress and the
//! table reports which cells changed; a host subscribes and repaints.
//!
//! ```text
//! ┌──────────────────┐   emit    ┌───────────┐   subscribe   ┌────────────┐
//! │ BatchOrchestrator├──────────>│           ├──────────────>│ Progress UI│
//! └──────────────────┘           │ EventBus  │               └────────────┘
//! ┌──────────────────┐   emit    │           │   subscribe   ┌────────────┐
//! │   DeckService    ├──────────>│           ├──────────────>│ Table view │
//! └──────────────────┘           └───────────┘               └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, TableEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(64);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Table(TableEvent::Cleared)).ok();
//! assert_eq!(rx.recv().await.unwrap(), CoreEvent::Table(TableEvent::Cleared));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; it can keep
//!   receiving. A progress bar only needs the latest value anyway.
//! - **`RecvError::Closed`**: every sender is gone, the core shut down.
//!
//! Emitting with no subscribers returns an error that callers ignore with
//! `.ok()`: nobody watching is not a failure.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Batch generation lifecycle and progress
    Batch(BatchEvent),
    /// Row Store changes the view must reflect
    Table(TableEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Batch(e) => e.description(),
            CoreEvent::Table(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Batch(BatchEvent::Completed { failed, .. }) if *failed > 0 => {
                EventSeverity::Warning
            }
            CoreEvent::Batch(BatchEvent::Cancelled { .. }) => EventSeverity::Warning,
            CoreEvent::Batch(BatchEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Table(TableEvent::Loaded { .. }) => EventSeverity::Info,
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
// Batch Events
// ============================================================================

/// Lifecycle of one batch pass over a set of rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum BatchEvent {
    /// A pass started.
    Started {
        /// Identifies the job; every pass of a multi-pass job shares it.
        job_id: String,
        /// Phase label shown to the user (e.g. "Step 1/3: Regenerating word information").
        phase: String,
        /// Rows in this pass.
        total: usize,
    },
    /// One more row finished (successfully or not).
    Progress {
        job_id: String,
        completed: usize,
        total: usize,
        /// 0-100
        percent: u8,
        phase: String,
    },
    /// Every row of the pass was attempted.
    Completed {
        job_id: String,
        phase: String,
        succeeded: usize,
        failed: usize,
    },
    /// The pass stopped early on request.
    Cancelled {
        job_id: String,
        phase: String,
        completed: usize,
        skipped: usize,
    },
}

impl BatchEvent {
    fn description(&self) -> &str {
        match self {
            BatchEvent::Started { .. } => "Batch started",
            BatchEvent::Progress { .. } => "Batch in progress",
            BatchEvent::Completed { .. } => "Batch completed",
            BatchEvent::Cancelled { .. } => "Batch cancelled",
        }
    }

    /// Job this event belongs to.
    pub fn job_id(&self) -> &str {
        match self {
            BatchEvent::Started { job_id, .. }
            | BatchEvent::Progress { job_id, .. }
            | BatchEvent::Completed { job_id, .. }
            | BatchEvent::Cancelled { job_id, .. } => job_id,
        }
    }
}

/// Integer percentage for a progress bar, clamped to 100.
pub fn percent_complete(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed as f64 / total as f64) * 100.0).min(100.0) as u8
}

// ============================================================================
// Table Events
// ============================================================================

/// Changes to the Row Store. Row indices are zero-based data rows (header
/// excluded).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TableEvent {
    /// A sheet replaced the previous table.
    Loaded { rows: usize, columns: usize },
    /// Cells of one row were rewritten.
    CellsUpdated {
        row: usize,
        /// Column indices that changed.
        columns: Vec<usize>,
    },
    /// The table was discarded (sign-out).
    Cleared,
}

impl TableEvent {
    fn description(&self) -> &str {
        match self {
            TableEvent::Loaded { .. } => "Sheet loaded",
            TableEvent::CellsUpdated { .. } => "Cells updated",
            TableEvent::Cleared => "Sheet cleared",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel. Cloning shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus; `capacity` events are buffered per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when nobody is subscribed.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a receiver for all future events. Past events are not replayed.
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

/// A `broadcast::Receiver` that skips events not matching a predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let progress_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Batch(_)));
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

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |f| f(event))
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

    /// Non-blocking receive; `None` when nothing matching is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) if self.accepts(&event) => return Some(Ok(event)),
                Ok(_) => continue,
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
