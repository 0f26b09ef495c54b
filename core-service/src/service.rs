use core_runtime::config::PlayerConfig;
use core_runtime::events::{EventBus, EventStream};
use core_session::PlayerHandle;
use provider_media_server::{MediaFile, MediaServerClient};
#[cfg(feature = "desktop-shims")]
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::Result;
use crate::screen::PlayerScreenParams;
use crate::theme::ThemePreference;

/// Primary façade exposed to host applications.
///
/// Owns the validated configuration and the event bus shared by every
/// player opened through it.
#[derive(Clone)]
pub struct PlayerService {
    config: PlayerConfig,
    client: MediaServerClient,
    events: EventBus,
}

impl PlayerService {
    pub fn new(config: PlayerConfig) -> Result<Self> {
        config.validate()?;
        let client = MediaServerClient::new(config.http_client.clone(), config.server_url.clone())?;
        let events = EventBus::new(config.event_buffer_size);
        Ok(Self {
            config,
            client,
            events,
        })
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    /// Tracks for the home list. Only `.mp3` entries are kept.
    #[instrument(skip(self))]
    pub async fn list_media_files(&self) -> Result<Vec<MediaFile>> {
        let files: Vec<MediaFile> = self
            .client
            .list_media_files()
            .await?
            .into_iter()
            .filter(MediaFile::is_mp3)
            .collect();
        info!(count = files.len(), "Playable tracks");
        Ok(files)
    }

    /// Mount the player screen: start an actor and load the track.
    ///
    /// Call [`PlayerHandle::shutdown`] when the screen unmounts.
    pub fn open_player(&self, params: PlayerScreenParams) -> Result<PlayerHandle> {
        let player = PlayerHandle::spawn(self.config.clone(), self.events.clone())?;
        player.switch_to(params.track_id, params.track_name)?;
        Ok(player)
    }

    /// Theme stored in the configured settings store.
    pub async fn theme(&self) -> ThemePreference {
        ThemePreference::load(self.config.settings_store.clone()).await
    }
}

impl std::fmt::Debug for PlayerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerService")
            .field("server_url", &self.config.server_url)
            .finish()
    }
}

/// Desktop bootstrap: reqwest HTTP and SQLite settings from `bridge-desktop`,
/// plus the host's decoder.
///
/// ```no_run
/// # #[cfg(feature = "desktop-shims")]
/// # async fn example(backend: std::sync::Arc<dyn bridge_traits::playback::AudioBackend>) -> core_service::Result<()> {
/// use core_service::{bootstrap_desktop, PlayerScreenParams};
/// use provider_media_server::TrackId;
///
/// let service = bootstrap_desktop("http://192.168.1.20:5000", backend)?;
/// let player = service.open_player(PlayerScreenParams::new(TrackId(1), "Intro"))?;
/// player.toggle()?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(
    server_url: impl Into<String>,
    audio_backend: Arc<dyn bridge_traits::playback::AudioBackend>,
) -> Result<PlayerService> {
    let config = PlayerConfig::builder()
        .server_url(server_url)
        .audio_backend(audio_backend)
        .build()?;
    PlayerService::new(config)
}
