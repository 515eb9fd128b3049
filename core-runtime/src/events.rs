//! # Event Bus System
//!
//! Typed, decoupled notifications between the player core and its hosts,
//! built on `tokio::sync::broadcast`.
//!
//! ```text
//! ┌────────────────┐  emit   ┌───────────┐  subscribe  ┌────────────┐
//! │ PlaybackEngine ├────────>│           ├────────────>│  UI layer  │
//! └────────────────┘         │ EventBus  │             └────────────┘
//! ┌────────────────┐  emit   │           │  subscribe  ┌────────────┐
//! │ ImportService  ├────────>│           ├────────────>│  Telemetry │
//! └────────────────┘         └───────────┘             └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(64);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Playback(PlaybackEvent::VolumeChanged { volume: 40 }))
//!     .ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event.description(), "Volume changed");
//! # }
//! ```
//!
//! Emitting with no subscribers returns `Err`; publishers treat that as a
//! no-op. Slow subscribers get `RecvError::Lagged(n)` and may keep reading.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    Library(LibraryEvent),
    Playback(PlaybackEvent),
}

impl CoreEvent {
    /// Human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Library(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Playback(PlaybackEvent::Stalled { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::HealingStarted { .. }) => EventSeverity::Warning,
            CoreEvent::Playback(PlaybackEvent::TrackStarted { .. })
            | CoreEvent::Playback(PlaybackEvent::Healed { .. })
            | CoreEvent::Library(_) => EventSeverity::Info,
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

/// Changes to the persisted track store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// A local file was imported with its audio blob.
    TrackImported { track_id: String, title: String },
    /// Metadata of a stored track was edited.
    TrackUpdated { track_id: String },
    /// A track and its blob were removed.
    TrackDeleted { track_id: String },
    /// Every track was removed.
    LibraryPurged { removed: usize },
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::TrackImported { .. } => "Track imported",
            LibraryEvent::TrackUpdated { .. } => "Track updated",
            LibraryEvent::TrackDeleted { .. } => "Track deleted",
            LibraryEvent::LibraryPurged { .. } => "Library purged",
        }
    }
}

/// Observable playback transitions.
///
/// Positions and durations are in seconds. `source` is `"local"` or
/// `"remote"`; repeat modes are `"off"`, `"one"` or `"all"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    TrackStarted {
        track_id: String,
        title: String,
        source: String,
    },
    Paused {
        track_id: String,
        position_secs: f64,
    },
    Resumed {
        track_id: String,
        position_secs: f64,
    },
    Stopped {
        track_id: Option<String>,
    },
    /// The active media reached its end.
    Ended {
        track_id: String,
    },
    PositionChanged {
        track_id: String,
        position_secs: f64,
        duration_secs: f64,
    },
    DurationChanged {
        track_id: String,
        duration_secs: f64,
    },
    VolumeChanged {
        volume: u8,
    },
    RepeatModeChanged {
        mode: String,
    },
    ShuffleChanged {
        enabled: bool,
    },
    /// A blocked remote track is being substituted.
    HealingStarted {
        track_id: String,
        attempt: u32,
    },
    /// A substitute replaced the failed track.
    Healed {
        failed_track_id: String,
        substitute_track_id: String,
    },
    /// Playback cannot continue without user action.
    Stalled {
        track_id: Option<String>,
        reason: String,
    },
    Error {
        track_id: Option<String>,
        message: String,
        recoverable: bool,
    },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::TrackStarted { .. } => "Track started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Resumed { .. } => "Playback resumed",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::Ended { .. } => "Track ended",
            PlaybackEvent::PositionChanged { .. } => "Playback position changed",
            PlaybackEvent::DurationChanged { .. } => "Duration changed",
            PlaybackEvent::VolumeChanged { .. } => "Volume changed",
            PlaybackEvent::RepeatModeChanged { .. } => "Repeat mode changed",
            PlaybackEvent::ShuffleChanged { .. } => "Shuffle changed",
            PlaybackEvent::HealingStarted { .. } => "Healing started",
            PlaybackEvent::Healed { .. } => "Track healed",
            PlaybackEvent::Stalled { .. } => "Playback stalled",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }
}

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus clones the sender; every `subscribe()` call creates an
/// independent receiver that sees events emitted after it was created.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event, returning the number of receivers reached.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

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

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional filter predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::default();
/// let playback_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Playback(_)));
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
