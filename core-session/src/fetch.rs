//! Concurrent loading of one track's slots.
//!
//! Name, duration, waveform and cover are fetched from the media server and
//! the audio stream is opened by the backend, all in parallel. Each task
//! posts exactly one [`FetchResult`] tagged with its session, so a failure in
//! one slot never holds up another.

use std::future::Future;
use std::sync::Arc;

use bridge_traits::playback::{AudioBackend, AudioEventCallback, LoadedAudio};
use core_playback::PlaybackController;
use core_runtime::events::FetchSlot;
use provider_media_server::{CoverArt, MediaServerClient, TrackId};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument};

use crate::actor::PlayerMessage;
use crate::error::Result;
use crate::session::SessionId;

#[derive(Debug)]
pub(crate) enum FetchResult {
    Name(Result<String>),
    Duration(Result<u64>),
    Waveform(Result<Vec<f32>>),
    Cover(Result<CoverArt>),
    Sound(Result<LoadedAudio>),
}

impl FetchResult {
    pub(crate) fn slot(&self) -> FetchSlot {
        match self {
            FetchResult::Name(_) => FetchSlot::Name,
            FetchResult::Duration(_) => FetchSlot::Duration,
            FetchResult::Waveform(_) => FetchSlot::Waveform,
            FetchResult::Cover(_) => FetchSlot::Cover,
            FetchResult::Sound(_) => FetchSlot::Sound,
        }
    }
}

pub(crate) struct FetchContext {
    pub client: MediaServerClient,
    pub backend: Arc<dyn AudioBackend>,
    pub inbox: UnboundedSender<PlayerMessage>,
    pub session: SessionId,
    pub track_id: TrackId,
    pub token: CancellationToken,
    /// Release of the previous session's decoder. The new stream is only
    /// opened once it has finished.
    pub released: Option<JoinHandle<()>>,
}

/// Start every fetch for a freshly created session.
pub(crate) fn spawn_all(ctx: FetchContext) {
    let FetchContext {
        client,
        backend,
        inbox,
        session,
        track_id,
        token,
        released,
    } = ctx;
    let span = tracing::debug_span!("fetch", %session, track = %track_id);

    {
        let client = client.clone();
        spawn_slot(&inbox, session, &token, span.clone(), async move {
            FetchResult::Name(client.fetch_name(track_id).await.map_err(Into::into))
        });
    }
    {
        let client = client.clone();
        spawn_slot(&inbox, session, &token, span.clone(), async move {
            FetchResult::Duration(client.fetch_duration(track_id).await.map_err(Into::into))
        });
    }
    {
        let client = client.clone();
        spawn_slot(&inbox, session, &token, span.clone(), async move {
            FetchResult::Waveform(client.fetch_waveform(track_id).await.map_err(Into::into))
        });
    }
    {
        let client = client.clone();
        spawn_slot(&inbox, session, &token, span.clone(), async move {
            FetchResult::Cover(client.fetch_cover(track_id).await.map_err(Into::into))
        });
    }

    spawn_sound(SoundLoad {
        client,
        backend,
        inbox,
        session,
        track_id,
        token,
        released,
        span,
    });
}

fn spawn_slot<F>(
    inbox: &UnboundedSender<PlayerMessage>,
    session: SessionId,
    token: &CancellationToken,
    span: tracing::Span,
    fetch: F,
) where
    F: Future<Output = FetchResult> + Send + 'static,
{
    let inbox = inbox.clone();
    let token = token.clone();

    tokio::spawn(
        async move {
            tokio::select! {
                _ = token.cancelled() => debug!("Fetch cancelled"),
                result = fetch => {
                    // A closed inbox means the actor is gone; nothing to do.
                    let _ = inbox.send(PlayerMessage::Resolved { session, result });
                }
            }
        }
        .instrument(span),
    );
}

struct SoundLoad {
    client: MediaServerClient,
    backend: Arc<dyn AudioBackend>,
    inbox: UnboundedSender<PlayerMessage>,
    session: SessionId,
    track_id: TrackId,
    token: CancellationToken,
    released: Option<JoinHandle<()>>,
    span: tracing::Span,
}

fn spawn_sound(load: SoundLoad) {
    let SoundLoad {
        client,
        backend,
        inbox,
        session,
        track_id,
        token,
        released,
        span,
    } = load;
    let source = client.stream_source(track_id);
    let events = inbox.clone();
    let on_event: AudioEventCallback = Arc::new(move |event| {
        let _ = events.send(PlayerMessage::Audio { session, event });
    });

    tokio::spawn(
        async move {
            let acquire = async {
                if let Some(released) = released {
                    // At most one live decoder handle.
                    let _ = released.await;
                }
                PlaybackController::acquire(backend.clone(), source, on_event).await
            };
            let result = tokio::select! {
                _ = token.cancelled() => {
                    debug!("Sound load cancelled");
                    return;
                }
                result = acquire => result,
            };

            match result {
                Ok(loaded) if token.is_cancelled() => {
                    // Switched away while the decoder was opening.
                    if let Err(err) = backend.unload(loaded.handle).await {
                        warn!(error = %err, "Failed to release superseded audio handle");
                    }
                }
                result => {
                    let result = FetchResult::Sound(result.map_err(Into::into));
                    let _ = inbox.send(PlayerMessage::Resolved { session, result });
                }
            }
        }
        .instrument(span),
    );
}
