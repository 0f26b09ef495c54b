//! Behavioural tests for PlaybackController against a recording backend.

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::playback::{
    AudioBackend, AudioEvent, AudioEventCallback, AudioEventKind, AudioHandleId, AudioSource,
    LoadedAudio,
};
use core_playback::{PlaybackController, PlaybackError, PlaybackState, TransportOp};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Recording AudioBackend
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(String),
    Play(AudioHandleId),
    Pause(AudioHandleId),
    Stop(AudioHandleId),
    Seek(AudioHandleId, Duration),
    Unload(AudioHandleId),
}

#[derive(Default)]
struct BackendState {
    calls: Vec<Call>,
    live: Vec<AudioHandleId>,
    fail_load: bool,
    fail_seek: bool,
    duration: Option<Duration>,
    callbacks: Vec<(AudioHandleId, AudioEventCallback)>,
}

#[derive(Clone, Default)]
struct RecordingBackend {
    state: Arc<Mutex<BackendState>>,
}

impl RecordingBackend {
    fn with_duration(self, duration: Duration) -> Self {
        self.state.lock().unwrap().duration = Some(duration);
        self
    }

    fn with_load_failure(self) -> Self {
        self.state.lock().unwrap().fail_load = true;
        self
    }

    fn with_seek_failure(self) -> Self {
        self.state.lock().unwrap().fail_seek = true;
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    fn live_handles(&self) -> usize {
        self.state.lock().unwrap().live.len()
    }

    fn emit(&self, event: AudioEvent) {
        let callbacks = self.state.lock().unwrap().callbacks.clone();
        for (handle, callback) in callbacks {
            if handle == event.handle {
                callback(event.clone());
            }
        }
    }
}

#[async_trait]
impl AudioBackend for RecordingBackend {
    async fn load(
        &self,
        source: AudioSource,
        on_event: AudioEventCallback,
    ) -> BridgeResult<LoadedAudio> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Load(source.url().to_string()));
        if state.fail_load {
            return Err(BridgeError::Audio("unsupported format".into()));
        }
        let handle = AudioHandleId::new();
        state.live.push(handle);
        state.callbacks.push((handle, on_event));
        Ok(LoadedAudio {
            handle,
            duration: state.duration,
        })
    }

    async fn play(&self, handle: AudioHandleId) -> BridgeResult<()> {
        self.state.lock().unwrap().calls.push(Call::Play(handle));
        Ok(())
    }

    async fn pause(&self, handle: AudioHandleId) -> BridgeResult<()> {
        self.state.lock().unwrap().calls.push(Call::Pause(handle));
        Ok(())
    }

    async fn stop(&self, handle: AudioHandleId) -> BridgeResult<()> {
        self.state.lock().unwrap().calls.push(Call::Stop(handle));
        Ok(())
    }

    async fn seek(&self, handle: AudioHandleId, position: Duration) -> BridgeResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_seek {
            return Err(BridgeError::Audio("seek rejected".into()));
        }
        state.calls.push(Call::Seek(handle, position));
        Ok(())
    }

    async fn unload(&self, handle: AudioHandleId) -> BridgeResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Unload(handle));
        state.live.retain(|h| *h != handle);
        Ok(())
    }
}

fn noop_callback() -> AudioEventCallback {
    Arc::new(|_| {})
}

fn source(id: u32) -> AudioSource {
    AudioSource::remote(format!("http://media.local/get_mp3/{}", id))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_load_then_play_pause() {
    let backend = RecordingBackend::default().with_duration(Duration::from_secs(200));
    let mut controller = PlaybackController::new(Arc::new(backend.clone()));
    assert_eq!(controller.state(), PlaybackState::Idle);

    let handle = controller.load(source(1), noop_callback()).await.unwrap();
    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert_eq!(controller.duration(), Some(Duration::from_secs(200)));

    controller.play().await.unwrap();
    assert_eq!(controller.state(), PlaybackState::Playing);
    controller.pause().await.unwrap();
    assert_eq!(controller.state(), PlaybackState::Paused);

    assert_eq!(
        backend.calls(),
        vec![
            Call::Load("http://media.local/get_mp3/1".into()),
            Call::Play(handle),
            Call::Pause(handle),
        ]
    );
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_transport_before_load_is_noop() {
    let backend = RecordingBackend::default();
    let mut controller = PlaybackController::new(Arc::new(backend.clone()));

    controller.play().await.unwrap();
    controller.pause().await.unwrap();
    controller.stop().await.unwrap();

    assert!(backend.calls().is_empty());
    assert_eq!(controller.state(), PlaybackState::Idle);
}

#[tokio::test]
async fn test_invalid_transitions_are_noops() {
    let backend = RecordingBackend::default();
    let mut controller = PlaybackController::new(Arc::new(backend.clone()));
    controller.load(source(1), noop_callback()).await.unwrap();

    // pause/stop while not playing do nothing
    controller.pause().await.unwrap();
    controller.stop().await.unwrap();
    controller.play().await.unwrap();
    controller.play().await.unwrap();

    let plays = backend
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Play(_)))
        .count();
    assert_eq!(plays, 1);
    assert_eq!(backend.calls().len(), 2);
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_seek_requires_loaded_handle() {
    let backend = RecordingBackend::default();
    let mut controller = PlaybackController::new(Arc::new(backend));

    let result = controller.seek_to(Duration::from_secs(5)).await;
    assert!(matches!(result, Err(PlaybackError::NotLoaded)));
}

#[tokio::test]
async fn test_seek_is_clamped_to_duration() {
    let backend = RecordingBackend::default().with_duration(Duration::from_secs(60));
    let mut controller = PlaybackController::new(Arc::new(backend.clone()));
    let handle = controller.load(source(1), noop_callback()).await.unwrap();

    controller.seek_to(Duration::from_secs(90)).await.unwrap();

    assert_eq!(
        backend.calls().last(),
        Some(&Call::Seek(handle, Duration::from_secs(60)))
    );
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_seek_failure_is_reported() {
    let backend = RecordingBackend::default().with_seek_failure();
    let mut controller = PlaybackController::new(Arc::new(backend));
    controller.load(source(1), noop_callback()).await.unwrap();

    let err = controller.seek_to(Duration::from_secs(1)).await.unwrap_err();
    assert!(matches!(err, PlaybackError::SeekFailed { .. }));
    assert_eq!(err.to_string(), "Failed to seek to 1s: seek rejected");
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_reload_releases_previous_handle_first() {
    let backend = RecordingBackend::default();
    let mut controller = PlaybackController::new(Arc::new(backend.clone()));

    let first = controller.load(source(1), noop_callback()).await.unwrap();
    let second = controller.load(source(2), noop_callback()).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(backend.live_handles(), 1);
    let calls = backend.calls();
    let unload_at = calls.iter().position(|c| *c == Call::Unload(first)).unwrap();
    let load_at = calls
        .iter()
        .position(|c| *c == Call::Load("http://media.local/get_mp3/2".into()))
        .unwrap();
    assert!(unload_at < load_at);

    controller.dispose().await.unwrap();
    assert_eq!(backend.live_handles(), 0);
}

#[tokio::test]
async fn test_load_failure_returns_to_idle() {
    let backend = RecordingBackend::default().with_load_failure();
    let mut controller = PlaybackController::new(Arc::new(backend));

    let err = controller.load(source(1), noop_callback()).await.unwrap_err();
    assert!(err.is_load_error());
    assert_eq!(err.to_string(), "Failed to load audio: unsupported format");
    assert_eq!(controller.state(), PlaybackState::Idle);
    assert!(!controller.is_loaded());
}

#[tokio::test]
async fn test_finished_event_is_delivered_through_callback() {
    let backend = RecordingBackend::default();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let callback: AudioEventCallback = Arc::new(move |event| sink.lock().unwrap().push(event));

    let mut controller = PlaybackController::new(Arc::new(backend.clone()));
    let handle = controller.load(source(1), callback).await.unwrap();
    controller.play().await.unwrap();

    backend.emit(AudioEvent::finished(handle));
    let events = received.lock().unwrap().clone();
    assert_eq!(events.len(), 1);

    assert_eq!(
        controller.on_audio_event(&events[0]),
        Some(AudioEventKind::Finished)
    );
    assert_eq!(controller.state(), PlaybackState::Ended);

    // Seeking out of Ended makes the handle resumable again.
    controller.seek_to(Duration::ZERO).await.unwrap();
    assert_eq!(controller.state(), PlaybackState::Paused);
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_events_for_released_handles_are_ignored() {
    let backend = RecordingBackend::default();
    let mut controller = PlaybackController::new(Arc::new(backend));
    let old = controller.load(source(1), noop_callback()).await.unwrap();
    controller.load(source(2), noop_callback()).await.unwrap();

    assert_eq!(controller.on_audio_event(&AudioEvent::finished(old)), None);
    assert_eq!(controller.state(), PlaybackState::Stopped);
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_dispose_is_idempotent() {
    let backend = RecordingBackend::default();
    let mut controller = PlaybackController::new(Arc::new(backend.clone()));
    let handle = controller.load(source(1), noop_callback()).await.unwrap();

    controller.dispose().await.unwrap();
    controller.dispose().await.unwrap();

    let unloads = backend
        .calls()
        .iter()
        .filter(|c| **c == Call::Unload(handle))
        .count();
    assert_eq!(unloads, 1);
    assert_eq!(controller.state(), PlaybackState::Idle);
}

#[tokio::test]
async fn test_prepared_calls_gate_on_their_target_state() {
    let backend = RecordingBackend::default();
    let mut controller = PlaybackController::new(Arc::new(backend.clone()));
    let handle = controller.load(source(1), noop_callback()).await.unwrap();

    let play = controller.prepare(TransportOp::Play).unwrap().unwrap();
    assert_eq!(controller.state(), PlaybackState::Playing);
    assert!(controller.prepare(TransportOp::Play).unwrap().is_none());
    let pause = controller.prepare(TransportOp::Pause).unwrap().unwrap();
    assert_eq!(backend.calls().len(), 1, "nothing reaches the backend until run");

    let played = play.run().await;
    controller.complete(&played);
    let paused = pause.run().await;
    controller.complete(&paused);

    assert_eq!(controller.state(), PlaybackState::Paused);
    assert_eq!(&backend.calls()[1..], &[Call::Play(handle), Call::Pause(handle)]);
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_rejected_call_rolls_state_back() {
    let backend = RecordingBackend::default().with_seek_failure();
    let mut controller = PlaybackController::new(Arc::new(backend));
    let handle = controller.load(source(1), noop_callback()).await.unwrap();
    controller.on_audio_event(&AudioEvent::finished(handle));

    let seek = controller
        .prepare(TransportOp::Seek(Duration::ZERO))
        .unwrap()
        .unwrap();
    assert_eq!(controller.state(), PlaybackState::Paused);

    let outcome = seek.run().await;
    assert!(outcome.result.is_err());
    controller.complete(&outcome);
    assert_eq!(controller.state(), PlaybackState::Ended);
    controller.dispose().await.unwrap();
}

#[tokio::test]
async fn test_release_call_detaches_the_handle() {
    let backend = RecordingBackend::default();
    let mut controller = PlaybackController::new(Arc::new(backend.clone()));
    let handle = controller.load(source(1), noop_callback()).await.unwrap();

    let release = controller.release_call().unwrap();
    assert_eq!(release.handle(), handle);
    assert!(!controller.is_loaded());
    assert_eq!(controller.state(), PlaybackState::Idle);
    assert!(controller.release_call().is_none());
    assert_eq!(backend.live_handles(), 1);

    release.run().await.result.unwrap();
    assert_eq!(backend.live_handles(), 0);
}
