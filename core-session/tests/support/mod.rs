//! Fakes shared by the session integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::playback::{
    AudioBackend, AudioEvent, AudioEventCallback, AudioHandleId, AudioSource, LoadedAudio,
};
use bytes::Bytes;
use core_runtime::config::{EndBehavior, PlayerConfig};
use core_runtime::events::EventBus;
use core_session::{PlayerHandle, PlayerSnapshot};
use tokio::sync::Notify;

pub const BASE: &str = "http://media.test:5000";

// ============================================================================
// Media server
// ============================================================================

#[derive(Clone)]
pub struct TrackFixture {
    pub name: String,
    pub duration: u64,
    /// Raw JSON body of /get_waveform
    pub waveform: String,
    pub has_cover: bool,
    pub has_duration: bool,
}

impl TrackFixture {
    pub fn new(name: &str, duration: u64, amplitude: f32) -> Self {
        let values = vec![amplitude; 200];
        Self {
            name: name.to_string(),
            duration,
            waveform: serde_json::to_string(&values).unwrap(),
            has_cover: true,
            has_duration: true,
        }
    }

    pub fn without_cover(mut self) -> Self {
        self.has_cover = false;
        self
    }

    pub fn without_duration(mut self) -> Self {
        self.has_duration = false;
        self
    }

    pub fn with_waveform_body(mut self, body: &str) -> Self {
        self.waveform = body.to_string();
        self
    }
}

#[derive(Default)]
pub struct FakeMediaServer {
    tracks: Mutex<HashMap<u32, TrackFixture>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    requests: Mutex<Vec<String>>,
}

impl FakeMediaServer {
    pub fn with_track(self, id: u32, track: TrackFixture) -> Self {
        self.tracks.lock().unwrap().insert(id, track);
        self
    }

    /// Hold every request for `path` (e.g. "get_waveform/1") until the
    /// returned notify is signalled.
    pub fn gate(&self, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(path.to_string(), notify.clone());
        notify
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(&self, url: &str, path: &str) -> HttpResponse {
        let mut parts = path.splitn(2, '/');
        let endpoint = parts.next().unwrap_or_default();
        let track = parts
            .next()
            .and_then(|id| id.parse::<u32>().ok())
            .and_then(|id| self.tracks.lock().unwrap().get(&id).cloned());

        let Some(track) = track else {
            return response(url, 404, "not found");
        };

        match endpoint {
            "get_name" => response(url, 200, &format!(r#"{{"name": "{}"}}"#, track.name)),
            "get_duration" if track.has_duration => response(url, 200, &format!(r#"{{"duration": {}}}"#, track.duration)),
            "get_waveform" => response(url, 200, &track.waveform),
            "get_cover" if track.has_cover => {
                let mut res = response(url, 200, "JPEG");
                res.headers
                    .insert("content-type".to_string(), "image/jpeg".to_string());
                res
            }
            _ => response(url, 404, "not found"),
        }
    }
}

fn response(url: &str, status: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status,
        url: url.to_string(),
        headers: HashMap::new(),
        body: Bytes::from(body.to_string()),
    }
}

#[async_trait]
impl HttpClient for FakeMediaServer {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        let path = request
            .url
            .strip_prefix(BASE)
            .map(|p| p.trim_start_matches('/').to_string())
            .ok_or_else(|| BridgeError::Network(format!("unknown host: {}", request.url)))?;
        self.requests.lock().unwrap().push(path.clone());

        let gate = self.gates.lock().unwrap().get(&path).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        Ok(self.respond(&request.url, &path))
    }
}

// ============================================================================
// Audio backend
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
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
    callbacks: HashMap<AudioHandleId, AudioEventCallback>,
    duration: Option<Duration>,
    load_gate: Option<Arc<Notify>>,
    stall_seeks: bool,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    pub fn with_duration(duration: Duration) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().duration = Some(duration);
        backend
    }

    /// Hold every `load` until the returned notify is signalled.
    pub fn gate_loads(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.state.lock().unwrap().load_gate = Some(notify.clone());
        notify
    }

    /// Every `seek` is recorded and then never returns.
    pub fn stall_seeks(&self) {
        self.state.lock().unwrap().stall_seeks = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Seek(_, position) => Some(position),
                _ => None,
            })
            .collect()
    }

    pub fn play_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Play(_)))
            .count()
    }

    pub fn live_handles(&self) -> Vec<AudioHandleId> {
        self.state.lock().unwrap().live.clone()
    }

    /// Report end-of-track for the most recently loaded live handle.
    pub fn finish_current(&self) {
        let (handle, callback) = {
            let state = self.state.lock().unwrap();
            let handle = *state.live.last().expect("no live handle");
            (handle, state.callbacks[&handle].clone())
        };
        callback(AudioEvent::finished(handle));
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl AudioBackend for FakeBackend {
    async fn load(
        &self,
        source: AudioSource,
        on_event: AudioEventCallback,
    ) -> BridgeResult<LoadedAudio> {
        self.record(Call::Load(source.url().to_string()));

        let gate = self.state.lock().unwrap().load_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let handle = AudioHandleId::new();
        let mut state = self.state.lock().unwrap();
        state.live.push(handle);
        state.callbacks.insert(handle, on_event);
        Ok(LoadedAudio {
            handle,
            duration: state.duration,
        })
    }

    async fn play(&self, handle: AudioHandleId) -> BridgeResult<()> {
        self.record(Call::Play(handle));
        Ok(())
    }

    async fn pause(&self, handle: AudioHandleId) -> BridgeResult<()> {
        self.record(Call::Pause(handle));
        Ok(())
    }

    async fn stop(&self, handle: AudioHandleId) -> BridgeResult<()> {
        self.record(Call::Stop(handle));
        Ok(())
    }

    async fn seek(&self, handle: AudioHandleId, position: Duration) -> BridgeResult<()> {
        self.record(Call::Seek(handle, position));
        let stall = self.state.lock().unwrap().stall_seeks;
        if stall {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn unload(&self, handle: AudioHandleId) -> BridgeResult<()> {
        self.record(Call::Unload(handle));
        let mut state = self.state.lock().unwrap();
        state.live.retain(|h| *h != handle);
        state.callbacks.remove(&handle);
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn spawn_player(
    server: Arc<FakeMediaServer>,
    backend: FakeBackend,
    end_behavior: EndBehavior,
) -> PlayerHandle {
    let config = PlayerConfig::builder()
        .server_url(BASE)
        .http_client(server)
        .audio_backend(Arc::new(backend))
        .without_settings_store()
        .end_behavior(end_behavior)
        .build()
        .unwrap();
    PlayerHandle::spawn(config, EventBus::default()).unwrap()
}

/// Wait until a published snapshot satisfies `predicate`.
pub async fn wait_until<F>(player: &PlayerHandle, mut predicate: F) -> PlayerSnapshot
where
    F: FnMut(&PlayerSnapshot) -> bool,
{
    let mut rx = player.watch();
    let snapshot = tokio::time::timeout(Duration::from_secs(600), rx.wait_for(|s| predicate(s)))
        .await
        .expect("timed out waiting for player state")
        .expect("player actor stopped");
    snapshot.clone()
}

/// Let queued decoder calls reach the backend. Paused time only advances
/// once every ready task has run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
