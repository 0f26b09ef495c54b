//! # Event Bus System
//!
//! Typed notifications about the player, fanned out over
//! `tokio::sync::broadcast`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   emit    ┌───────────┐  subscribe  ┌──────────────┐
//! │ Track session    ├──────────>│           ├────────────>│ UI shell     │
//! │ controller       │           │ EventBus  │             └──────────────┘
//! └──────────────────┘           │ (broadcast│  subscribe  ┌──────────────┐
//!                                │  channel) ├────────────>│ Analytics /  │
//!                                └───────────┘             │ diagnostics  │
//!                                                          └──────────────┘
//! ```
//!
//! The bus is an observation channel only. State that the UI renders comes
//! from the session snapshot; events describe what happened to it.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, ScrubEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Scrub(ScrubEvent::DragEnded { session_id: 1, segment: 100 })).ok();
//! assert!(matches!(rx.recv().await, Ok(CoreEvent::Scrub(_))));
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events; keep reading.
//! - **`RecvError::Closed`**: every sender is gone; the player shut down.
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

/// Top-level event published through the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Track session lifecycle and fetch results
    Session(SessionEvent),
    /// Decoder transport changes
    Playback(PlaybackEvent),
    /// Gesture-driven scrubbing
    Scrub(ScrubEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Playback(e) => e.description(),
            CoreEvent::Scrub(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Playback(PlaybackEvent::Error { .. }) => EventSeverity::Error,
            CoreEvent::Session(SessionEvent::FetchFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Session(SessionEvent::Switched { .. })
            | CoreEvent::Session(SessionEvent::SoundLoaded { .. })
            | CoreEvent::Playback(PlaybackEvent::Ended { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }

    /// Session the event belongs to.
    pub fn session_id(&self) -> u64 {
        match self {
            CoreEvent::Session(e) => e.session_id(),
            CoreEvent::Playback(e) => e.session_id(),
            CoreEvent::Scrub(e) => e.session_id(),
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

/// Independently fetched piece of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchSlot {
    Name,
    Duration,
    Waveform,
    Cover,
    Sound,
}

impl fmt::Display for FetchSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchSlot::Name => "name",
            FetchSlot::Duration => "duration",
            FetchSlot::Waveform => "waveform",
            FetchSlot::Cover => "cover",
            FetchSlot::Sound => "sound",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Session Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A new session replaced the previous one.
    Switched { session_id: u64, track_id: u32 },
    /// Display name arrived.
    MetadataLoaded { session_id: u64, name: String },
    /// Waveform samples arrived and were normalized.
    WaveformLoaded { session_id: u64, bars: usize },
    /// Cover art arrived.
    CoverLoaded { session_id: u64, url: String },
    /// Decoder is ready; controls are enabled.
    SoundLoaded { session_id: u64, duration_secs: u64 },
    /// One slot failed; the others are unaffected.
    FetchFailed {
        session_id: u64,
        slot: FetchSlot,
        message: String,
    },
    /// A late result for a superseded session was dropped.
    StaleResultDiscarded { session_id: u64, slot: FetchSlot },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::Switched { .. } => "Track switched",
            SessionEvent::MetadataLoaded { .. } => "Track name loaded",
            SessionEvent::WaveformLoaded { .. } => "Waveform loaded",
            SessionEvent::CoverLoaded { .. } => "Cover art loaded",
            SessionEvent::SoundLoaded { .. } => "Sound loaded",
            SessionEvent::FetchFailed { .. } => "Fetch failed",
            SessionEvent::StaleResultDiscarded { .. } => "Stale result discarded",
        }
    }

    fn session_id(&self) -> u64 {
        match self {
            SessionEvent::Switched { session_id, .. }
            | SessionEvent::MetadataLoaded { session_id, .. }
            | SessionEvent::WaveformLoaded { session_id, .. }
            | SessionEvent::CoverLoaded { session_id, .. }
            | SessionEvent::SoundLoaded { session_id, .. }
            | SessionEvent::FetchFailed { session_id, .. }
            | SessionEvent::StaleResultDiscarded { session_id, .. } => *session_id,
        }
    }
}

// ============================================================================
// Playback Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum PlaybackEvent {
    Started { session_id: u64 },
    Paused { session_id: u64 },
    Stopped { session_id: u64 },
    Seeked { session_id: u64, position_secs: f64 },
    /// The decoder reached the end of the track.
    Ended { session_id: u64 },
    Error { session_id: u64, message: String },
}

impl PlaybackEvent {
    fn description(&self) -> &str {
        match self {
            PlaybackEvent::Started { .. } => "Playback started",
            PlaybackEvent::Paused { .. } => "Playback paused",
            PlaybackEvent::Stopped { .. } => "Playback stopped",
            PlaybackEvent::Seeked { .. } => "Playback seeked",
            PlaybackEvent::Ended { .. } => "Track ended",
            PlaybackEvent::Error { .. } => "Playback error",
        }
    }

    fn session_id(&self) -> u64 {
        match self {
            PlaybackEvent::Started { session_id }
            | PlaybackEvent::Paused { session_id }
            | PlaybackEvent::Stopped { session_id }
            | PlaybackEvent::Seeked { session_id, .. }
            | PlaybackEvent::Ended { session_id }
            | PlaybackEvent::Error { session_id, .. } => *session_id,
        }
    }
}

// ============================================================================
// Scrub Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum ScrubEvent {
    DragStarted { session_id: u64, offset: f32 },
    DragEnded { session_id: u64, segment: usize },
    /// Drag ended before the decoder was ready; the seek waits for load.
    SeekQueued { session_id: u64, segment: usize },
    /// A queued seek was issued after load completed.
    SeekReplayed { session_id: u64, segment: usize },
}

impl ScrubEvent {
    fn description(&self) -> &str {
        match self {
            ScrubEvent::DragStarted { .. } => "Drag started",
            ScrubEvent::DragEnded { .. } => "Drag ended",
            ScrubEvent::SeekQueued { .. } => "Seek queued until load",
            ScrubEvent::SeekReplayed { .. } => "Queued seek replayed",
        }
    }

    fn session_id(&self) -> u64 {
        match self {
            ScrubEvent::DragStarted { session_id, .. }
            | ScrubEvent::DragEnded { session_id, .. }
            | ScrubEvent::SeekQueued { session_id, .. }
            | ScrubEvent::SeekReplayed { session_id, .. } => *session_id,
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus yields another producer for the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus. Subscribers falling more than `capacity`
    /// events behind receive `RecvError::Lagged`.
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
    /// Returns the number of receivers, or an error when nobody listens.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a receiver for all future events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

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

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A `broadcast::Receiver` with an optional predicate.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::new(16);
/// let errors = EventStream::new(bus.subscribe())
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

    /// Only events matching `predicate` are returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only events of the given session are returned.
    pub fn for_session(self, session_id: u64) -> Self {
        self.filter(move |event| event.session_id() == session_id)
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |f| f(event))
    }

    /// Receives the next matching event.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged(n)` when `n` events were missed,
    /// `RecvError::Closed` once all senders are dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking variant of [`EventStream::recv`]; `None` when empty.
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
