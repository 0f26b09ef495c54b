//! # Track Session Controller
//!
//! A single task owns the active [`TrackSession`] and processes one message
//! at a time from one inbox:
//!
//! ```text
//!   PlayerHandle ──Command──┐
//!   fetch tasks ──Resolved──┤          ┌──────────────┐   watch    ┌────────┐
//!   ticker ───────Tick──────┼─▶ inbox ─▶  PlayerActor ├──────────▶│ UI     │
//!   AudioBackend ─Audio─────┤          │ (one turn per│  EventBus  └────────┘
//!   transport ────Transport─┘          │   message)   ├──────────▶ observers
//!                                      └──────┬───────┘
//!                                             └──▶ transport queue ──▶ AudioBackend
//! ```
//!
//! No turn awaits the backend. Decoder calls are queued on the session's
//! transport worker and their outcomes come back as `Transport` messages,
//! so a stalled decoder never holds up gestures, switches or shutdown.
//!
//! Every message from a fetch, the ticker, the transport worker or the
//! decoder carries the [`SessionId`] it was started for. Messages for any
//! other session are dropped, which is how a slow response for a previous
//! track is kept from overwriting the current one.

use std::sync::Arc;

use bridge_traits::playback::{AudioEvent, AudioEventKind};
use core_playback::{usable_duration, PlaybackError, TransportCall, TransportOp, TransportOutcome};
use core_runtime::config::PlayerConfig;
use core_runtime::events::{
    CoreEvent, EventBus, FetchSlot, PlaybackEvent, ScrubEvent, SessionEvent,
};
use core_waveform::{SegmentModel, WaveformSamples};
use provider_media_server::{MediaServerClient, TrackId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{Result, SessionError};
use crate::fetch::{self, FetchContext, FetchResult};
use crate::session::{now, SessionId, TrackSession};
use crate::snapshot::PlayerSnapshot;
use crate::synchronizer::{ScrubState, SyncEffect};
use crate::ticker::Ticker;
use crate::transport::TransportQueue;

/// Inline message shown when neither the server nor the decoder knows how
/// long the track is.
pub(crate) const UNKNOWN_DURATION: &str = "Track length unknown, scrubbing is disabled";

/// User-facing commands accepted by the player.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Tear down the current track and load `track_id`. `name` is shown
    /// until the server's name arrives.
    SwitchTo { track_id: TrackId, name: String },
    /// Tap on the waveform.
    Toggle,
    DragBegin,
    /// `dx` is the total horizontal translation since `DragBegin`.
    DragUpdate { dx: f32 },
    DragEnd,
    Next,
    Previous,
    /// Reload the current track after a failure.
    Retry,
}

pub(crate) enum PlayerMessage {
    Command(PlayerCommand),
    Resolved {
        session: SessionId,
        result: FetchResult,
    },
    Tick {
        session: SessionId,
        generation: u64,
    },
    Audio {
        session: SessionId,
        event: AudioEvent,
    },
    Transport {
        session: SessionId,
        outcome: TransportOutcome,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

struct Shared {
    inbox: mpsc::UnboundedSender<PlayerMessage>,
    snapshot: watch::Receiver<PlayerSnapshot>,
    events: EventBus,
    root: CancellationToken,
}

impl Drop for Shared {
    fn drop(&mut self) {
        // Last handle gone: nobody can observe the player any more.
        self.root.cancel();
    }
}

/// Cheap, cloneable handle to a running player actor.
#[derive(Clone)]
pub struct PlayerHandle {
    shared: Arc<Shared>,
}

impl PlayerHandle {
    /// Start the actor on the current Tokio runtime.
    pub fn spawn(config: PlayerConfig, events: EventBus) -> Result<Self> {
        let model = SegmentModel::new(config.bars_num, config.segment_width)
            .map_err(|e| SessionError::Config(e.to_string()))?;
        let client = MediaServerClient::new(config.http_client.clone(), config.server_url.clone())?;

        let (inbox, rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot) = watch::channel(PlayerSnapshot {
            model,
            ..PlayerSnapshot::default()
        });
        let root = CancellationToken::new();

        let actor = PlayerActor {
            config,
            model,
            client,
            events: events.clone(),
            inbox: inbox.clone(),
            snapshot: snapshot_tx,
            root: root.clone(),
            last_session: SessionId::new(0),
            current: None,
        };
        tokio::spawn(actor.run(rx));

        Ok(Self {
            shared: Arc::new(Shared {
                inbox,
                snapshot,
                events,
                root,
            }),
        })
    }

    pub fn send(&self, command: PlayerCommand) -> Result<()> {
        self.shared
            .inbox
            .send(PlayerMessage::Command(command))
            .map_err(|_| SessionError::Stopped)
    }

    pub fn switch_to(&self, track_id: TrackId, name: impl Into<String>) -> Result<()> {
        self.send(PlayerCommand::SwitchTo {
            track_id,
            name: name.into(),
        })
    }

    pub fn toggle(&self) -> Result<()> {
        self.send(PlayerCommand::Toggle)
    }

    pub fn drag_begin(&self) -> Result<()> {
        self.send(PlayerCommand::DragBegin)
    }

    pub fn drag_update(&self, dx: f32) -> Result<()> {
        self.send(PlayerCommand::DragUpdate { dx })
    }

    pub fn drag_end(&self) -> Result<()> {
        self.send(PlayerCommand::DragEnd)
    }

    pub fn next(&self) -> Result<()> {
        self.send(PlayerCommand::Next)
    }

    pub fn previous(&self) -> Result<()> {
        self.send(PlayerCommand::Previous)
    }

    pub fn retry(&self) -> Result<()> {
        self.send(PlayerCommand::Retry)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.shared.snapshot.borrow().clone()
    }

    /// Receiver that is notified after every actor turn.
    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.shared.snapshot.clone()
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.events
    }

    /// Tear down the current session and stop the actor. Resolves once the
    /// decoder handle has been released.
    pub async fn shutdown(&self) -> Result<()> {
        let (done, finished) = oneshot::channel();
        self.shared
            .inbox
            .send(PlayerMessage::Shutdown { done })
            .map_err(|_| SessionError::Stopped)?;
        finished.await.map_err(|_| SessionError::Stopped)
    }
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("closed", &self.shared.inbox.is_closed())
            .finish()
    }
}

/// Unload a detached decoder handle on its own task.
fn spawn_release(call: TransportCall, session: SessionId) -> JoinHandle<()> {
    tokio::spawn(async move {
        let handle = call.handle();
        if let Err(err) = call.run().await.result {
            warn!(%session, %handle, error = %err, "Decoder not released cleanly");
        }
    })
}

struct PlayerActor {
    config: PlayerConfig,
    model: SegmentModel,
    client: MediaServerClient,
    events: EventBus,
    inbox: mpsc::UnboundedSender<PlayerMessage>,
    snapshot: watch::Sender<PlayerSnapshot>,
    root: CancellationToken,
    last_session: SessionId,
    current: Option<TrackSession>,
}

impl PlayerActor {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<PlayerMessage>) {
        debug!("Player actor started");
        loop {
            let message = tokio::select! {
                biased;
                _ = self.root.cancelled() => break,
                message = rx.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };

            if let PlayerMessage::Shutdown { done } = message {
                rx.close();
                let release = self.teardown();
                self.publish();
                if let Some(release) = release {
                    let _ = release.await;
                }
                let _ = done.send(());
                debug!("Player actor shut down");
                return;
            }

            self.handle(message);
            self.publish();
        }

        if let Some(release) = self.teardown() {
            let _ = release.await;
        }
        debug!("Player actor stopped: all handles dropped");
    }

    fn handle(&mut self, message: PlayerMessage) {
        match message {
            PlayerMessage::Command(command) => self.on_command(command),
            PlayerMessage::Resolved { session, result } => self.on_resolved(session, result),
            PlayerMessage::Tick {
                session,
                generation,
            } => self.on_tick(session, generation),
            PlayerMessage::Audio { session, event } => self.on_audio(session, event),
            PlayerMessage::Transport { session, outcome } => self.on_transport(session, outcome),
            PlayerMessage::Shutdown { .. } => {}
        }
    }

    fn publish(&self) {
        let snapshot = match &self.current {
            Some(session) => session.snapshot(),
            None => PlayerSnapshot {
                model: self.model,
                ..PlayerSnapshot::default()
            },
        };
        self.snapshot.send_replace(snapshot);
    }

    fn emit(&self, event: CoreEvent) {
        // No subscribers is fine.
        self.events.emit(event).ok();
    }

    fn on_command(&mut self, command: PlayerCommand) {
        trace!(?command, "Command");
        match command {
            PlayerCommand::SwitchTo { track_id, name } => self.switch_to(track_id, name),
            PlayerCommand::Next => {
                if let Some(session) = &self.current {
                    let next = session.track_id.next();
                    self.switch_to(next, String::new());
                }
            }
            PlayerCommand::Previous => {
                let previous = self.current.as_ref().map(|s| s.track_id.previous());
                match previous {
                    Some(Some(track_id)) => self.switch_to(track_id, String::new()),
                    Some(None) => debug!("Already at the first track"),
                    None => {}
                }
            }
            PlayerCommand::Retry => {
                if let Some(session) = &self.current {
                    let (track_id, name) = (session.track_id, session.name.clone());
                    self.switch_to(track_id, name);
                }
            }
            PlayerCommand::Toggle
            | PlayerCommand::DragBegin
            | PlayerCommand::DragUpdate { .. }
            | PlayerCommand::DragEnd => {
                let Some(session) = self.current.as_mut() else {
                    debug!(?command, "No active track");
                    return;
                };
                let now = now();
                let effects = match command {
                    PlayerCommand::Toggle => {
                        session.control_error = None;
                        session.sync.toggle(now)
                    }
                    PlayerCommand::DragBegin => session.sync.drag_begin(now),
                    PlayerCommand::DragUpdate { dx } => {
                        session.sync.drag_update(dx, now);
                        Vec::new()
                    }
                    _ => {
                        session.control_error = None;
                        session.sync.drag_end(now)
                    }
                };
                self.apply(effects);
                if let Some(session) = self.current.as_mut() {
                    flag_unknown_duration(session);
                }
            }
        }
    }

    /// Replace the current session with a fresh one for `track_id`.
    #[instrument(skip_all, fields(track = %track_id))]
    fn switch_to(&mut self, track_id: TrackId, name: String) {
        let released = self.teardown();

        let id = self.last_session.next();
        self.last_session = id;

        let token = self.root.child_token();
        let transport = TransportQueue::start(self.inbox.clone(), id, &token);
        let session = TrackSession::new(
            id,
            track_id,
            name,
            &self.config,
            self.model,
            token.clone(),
            transport,
        );

        fetch::spawn_all(FetchContext {
            client: self.client.clone(),
            backend: self.config.audio_backend.clone(),
            inbox: self.inbox.clone(),
            session: id,
            track_id,
            token,
            released,
        });
        self.current = Some(session);

        info!(session = %id, "Switched track");
        self.emit(CoreEvent::Session(SessionEvent::Switched {
            session_id: id.value(),
            track_id: track_id.0,
        }));
    }

    /// Cancel fetches, queued decoder calls and the ticker, then start
    /// releasing the decoder. The returned task finishes once the handle is
    /// unloaded.
    fn teardown(&mut self) -> Option<JoinHandle<()>> {
        let mut session = self.current.take()?;
        session.token.cancel();
        session.stop_ticker();
        let release = session
            .controller
            .release_call()
            .map(|call| spawn_release(call, session.id));
        debug!(session = %session.id, "Session torn down");
        release
    }

    fn on_resolved(&mut self, session_id: SessionId, result: FetchResult) {
        let slot = result.slot();
        let Some(session) = self.current.as_mut().filter(|s| s.id == session_id) else {
            self.discard_stale(session_id, result);
            return;
        };
        let sid = session_id.value();

        let effects = match result {
            FetchResult::Name(Ok(name)) => {
                session.name = name.clone();
                session.name_error = None;
                self.events
                    .emit(CoreEvent::Session(SessionEvent::MetadataLoaded {
                        session_id: sid,
                        name,
                    }))
                    .ok();
                Vec::new()
            }
            FetchResult::Duration(Ok(secs)) => {
                if !session.decoder_duration {
                    session.set_duration_secs(secs);
                    ensure_ticker(session, &self.inbox, &self.config);
                }
                Vec::new()
            }
            FetchResult::Waveform(Ok(raw)) => {
                let samples = WaveformSamples::from_raw(&raw, self.model.bars_num());
                let bars = samples.len();
                session.waveform = Arc::new(samples);
                session.waveform_error = None;
                self.events
                    .emit(CoreEvent::Session(SessionEvent::WaveformLoaded {
                        session_id: sid,
                        bars,
                    }))
                    .ok();
                Vec::new()
            }
            FetchResult::Cover(Ok(cover)) => {
                let url = cover.url.clone();
                session.cover = Some(cover);
                session.cover_error = None;
                self.events
                    .emit(CoreEvent::Session(SessionEvent::CoverLoaded {
                        session_id: sid,
                        url,
                    }))
                    .ok();
                Vec::new()
            }
            FetchResult::Sound(Ok(loaded)) => {
                let decoder_secs = usable_duration(loaded.duration);
                if let Some(displaced) = session.controller.attach(loaded) {
                    spawn_release(displaced, session_id);
                }
                if let Some(secs) = decoder_secs {
                    session.decoder_duration = true;
                    session.set_duration_secs(secs);
                }
                session.sound_error = None;
                let effects = session.sync.on_loaded(None);
                flag_unknown_duration(session);
                self.events
                    .emit(CoreEvent::Session(SessionEvent::SoundLoaded {
                        session_id: sid,
                        duration_secs: session.duration_secs,
                    }))
                    .ok();
                effects
            }
            FetchResult::Name(Err(err))
            | FetchResult::Duration(Err(err))
            | FetchResult::Waveform(Err(err))
            | FetchResult::Cover(Err(err))
            | FetchResult::Sound(Err(err)) => {
                warn!(session = %session_id, %slot, error = %err, "Fetch failed");
                let message = err.to_string();
                match slot {
                    FetchSlot::Name => session.name_error = Some(message.clone()),
                    FetchSlot::Waveform => {
                        session.waveform = Arc::new(WaveformSamples::empty());
                        session.waveform_error = Some(message.clone());
                    }
                    FetchSlot::Cover => session.cover_error = Some(message.clone()),
                    FetchSlot::Sound => {
                        session.controller.mark_load_failed();
                        session.sync.on_load_failed();
                        session.sound_error = Some(message.clone());
                    }
                    FetchSlot::Duration => {
                        session.duration_failed = true;
                        flag_unknown_duration(session);
                    }
                }
                self.events
                    .emit(CoreEvent::Session(SessionEvent::FetchFailed {
                        session_id: sid,
                        slot,
                        message,
                    }))
                    .ok();
                Vec::new()
            }
        };

        self.apply(effects);
    }

    fn discard_stale(&self, got: SessionId, result: FetchResult) {
        let slot = result.slot();
        let err = SessionError::StaleResultIgnored {
            expected: self.last_session,
            got,
        };
        debug!(%slot, error = %err, "Discarding result");

        if let FetchResult::Sound(Ok(loaded)) = result {
            let backend = self.config.audio_backend.clone();
            tokio::spawn(async move {
                if let Err(err) = backend.unload(loaded.handle).await {
                    warn!(error = %err, "Failed to release stale audio handle");
                }
            });
        }

        self.emit(CoreEvent::Session(SessionEvent::StaleResultDiscarded {
            session_id: got.value(),
            slot,
        }));
    }

    fn on_tick(&mut self, session_id: SessionId, generation: u64) {
        let Some(session) = self
            .current
            .as_mut()
            .filter(|s| s.id == session_id && s.is_live_tick(generation))
        else {
            trace!(session = %session_id, generation, "Stray tick ignored");
            return;
        };

        let effects = session.sync.tick(now());
        self.apply(effects);
    }

    fn on_audio(&mut self, session_id: SessionId, event: AudioEvent) {
        let Some(session) = self.current.as_mut().filter(|s| s.id == session_id) else {
            debug!(session = %session_id, "Audio event for finished session ignored");
            return;
        };
        let sid = session_id.value();

        let effects = match session.controller.on_audio_event(&event) {
            Some(AudioEventKind::Finished) => {
                info!(session = %session_id, "Track ended");
                self.events
                    .emit(CoreEvent::Playback(PlaybackEvent::Ended { session_id: sid }))
                    .ok();
                session.sync.on_ended(now())
            }
            Some(AudioEventKind::Failed(message)) => {
                session.control_error = Some(message.clone());
                self.events
                    .emit(CoreEvent::Playback(PlaybackEvent::Error {
                        session_id: sid,
                        message,
                    }))
                    .ok();
                session.sync.halt(now())
            }
            None => Vec::new(),
        };

        self.apply(effects);
    }

    /// A queued decoder call finished.
    fn on_transport(&mut self, session_id: SessionId, outcome: TransportOutcome) {
        let Some(session) = self.current.as_mut().filter(|s| s.id == session_id) else {
            trace!(session = %session_id, op = ?outcome.op, "Transport result for finished session");
            return;
        };
        let sid = session_id.value();
        session.controller.complete(&outcome);

        let event = match (outcome.op, outcome.result) {
            (_, Err(err)) => {
                self.transport_failed(err);
                return;
            }
            (TransportOp::Play, Ok(())) => PlaybackEvent::Started { session_id: sid },
            (TransportOp::Pause, Ok(())) => PlaybackEvent::Paused { session_id: sid },
            (TransportOp::Stop, Ok(())) => PlaybackEvent::Stopped { session_id: sid },
            (TransportOp::Seek(position), Ok(())) => PlaybackEvent::Seeked {
                session_id: sid,
                position_secs: position.as_secs_f64(),
            },
            (TransportOp::Release, Ok(())) => return,
        };
        self.emit(CoreEvent::Playback(event));
    }

    /// Fall back to paused after the decoder rejected a call.
    fn transport_failed(&mut self, err: PlaybackError) {
        let Some(session) = self.current.as_mut() else {
            return;
        };
        let sid = session.id.value();
        warn!(session = %session.id, error = %err, "Transport call failed");

        session.control_error = Some(err.to_string());
        for effect in session.sync.halt(now()) {
            if effect == SyncEffect::StopTicker {
                session.stop_ticker();
            }
        }
        self.emit(CoreEvent::Playback(PlaybackEvent::Error {
            session_id: sid,
            message: err.to_string(),
        }));
    }

    /// Carry out synchronizer effects in order. A call the controller
    /// refuses halts playback and drops the remaining effects.
    fn apply(&mut self, effects: Vec<SyncEffect>) {
        for effect in effects {
            let Some(session) = self.current.as_mut() else {
                return;
            };
            let sid = session.id.value();

            let outcome: std::result::Result<Option<CoreEvent>, PlaybackError> = match effect {
                SyncEffect::Play => session.issue(TransportOp::Play).map(|_| None),
                SyncEffect::Pause => session.issue(TransportOp::Pause).map(|_| None),
                SyncEffect::Seek {
                    segment,
                    position,
                    replayed,
                } => session.issue(TransportOp::Seek(position)).map(|_| {
                    replayed.then_some(CoreEvent::Scrub(ScrubEvent::SeekReplayed {
                        session_id: sid,
                        segment,
                    }))
                }),
                SyncEffect::StartTicker => {
                    start_ticker(session, &self.inbox, &self.config);
                    Ok(None)
                }
                SyncEffect::StopTicker => {
                    session.stop_ticker();
                    Ok(None)
                }
                SyncEffect::DragStarted { offset } => Ok(Some(CoreEvent::Scrub(
                    ScrubEvent::DragStarted {
                        session_id: sid,
                        offset: offset.px(),
                    },
                ))),
                SyncEffect::DragEnded { segment } => Ok(Some(CoreEvent::Scrub(
                    ScrubEvent::DragEnded {
                        session_id: sid,
                        segment,
                    },
                ))),
                SyncEffect::SeekQueued { segment } => {
                    debug!(segment, "Seek queued until sound is loaded");
                    Ok(Some(CoreEvent::Scrub(ScrubEvent::SeekQueued {
                        session_id: sid,
                        segment,
                    })))
                }
                SyncEffect::AdvanceTrack => {
                    let next = session.track_id.next();
                    self.switch_to(next, String::new());
                    return;
                }
            };

            match outcome {
                Ok(Some(event)) => self.emit(event),
                Ok(None) => {}
                Err(err) => {
                    self.transport_failed(err);
                    return;
                }
            }
        }
    }
}

/// Show why the scrubber does nothing once both duration sources are out.
fn flag_unknown_duration(session: &mut TrackSession) {
    if session.duration_unavailable() && session.control_error.is_none() {
        warn!(session = %session.id, "No track duration from server or decoder");
        session.control_error = Some(UNKNOWN_DURATION.to_string());
    }
}

fn start_ticker(
    session: &mut TrackSession,
    inbox: &mpsc::UnboundedSender<PlayerMessage>,
    config: &PlayerConfig,
) {
    session.stop_ticker();
    let Some(period) = session.sync.tick_period(config.tick_period) else {
        debug!(session = %session.id, "Duration unknown, ticker deferred");
        return;
    };
    session.tick_generation += 1;
    session.ticker = Some(Ticker::start(
        inbox.clone(),
        session.id,
        session.tick_generation,
        period,
        &session.token,
    ));
    trace!(session = %session.id, ?period, "Ticker started");
}

/// Start a ticker that was deferred for lack of a duration.
fn ensure_ticker(
    session: &mut TrackSession,
    inbox: &mpsc::UnboundedSender<PlayerMessage>,
    config: &PlayerConfig,
) {
    if session.ticker.is_none()
        && session.sync.state() == ScrubState::Playing
    {
        start_ticker(session, inbox, config);
    }
}
