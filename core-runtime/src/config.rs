//! # Player Configuration
//!
//! `PlayerConfig` carries every injected bridge and tunable the player needs.
//! It is assembled through [`PlayerConfigBuilder`] and validated fail-fast in
//! [`build()`](PlayerConfigBuilder::build).
//!
//! ## Required Dependencies
//!
//! - `server_url` - base URL of the media server
//! - `AudioBackend` - decoder/output engine; there is no desktop default
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `SettingsStore` - theme persistence (desktop default: SQLite file under
//!   the platform data directory)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{EndBehavior, PlayerConfig};
//! use std::sync::Arc;
//!
//! let config = PlayerConfig::builder()
//!     .server_url("http://localhost:8080/")
//!     .audio_backend(Arc::new(MyBackend))
//!     .end_behavior(EndBehavior::Advance)
//!     .build()?;
//!
//! assert_eq!(config.server_url, "http://localhost:8080");
//! ```
//!
//! ## Error Handling
//!
//! A missing capability yields [`Error::CapabilityMissing`] naming the bridge
//! and how to provide it. Out-of-range values yield [`Error::Config`].

use crate::error::{Error, Result};
use bridge_traits::{AudioBackend, HttpClient, SettingsStore};
use core_waveform::{DEFAULT_BARS_NUM, DEFAULT_EASE_DURATION, SEGMENT_WIDTH};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::events::DEFAULT_EVENT_BUFFER_SIZE;

/// Upper bound for the offset easing duration.
pub const MAX_EASE_DURATION: Duration = Duration::from_secs(10);

/// What happens when the decoder reports the end of a track.
///
/// In every case the visual offset returns to the start first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndBehavior {
    /// Stop and wait for the user.
    #[default]
    Stop,
    /// Seek to zero and keep playing.
    Repeat,
    /// Switch to the next track id.
    Advance,
}

/// Validated player configuration.
#[derive(Clone)]
pub struct PlayerConfig {
    /// Media server base URL without a trailing slash
    pub server_url: String,

    /// Number of bars the waveform is resampled to
    pub bars_num: usize,

    /// Pixel width of one bar including its margin
    pub segment_width: f32,

    /// Fixed tick period; `None` ticks once per segment duration
    pub tick_period: Option<Duration>,

    /// Duration of the eased offset transition
    pub ease_duration: Duration,

    pub end_behavior: EndBehavior,

    /// Capacity of the broadcast event bus
    pub event_buffer_size: usize,

    pub http_client: Arc<dyn HttpClient>,

    /// Theme persistence; `None` keeps the theme in memory only
    pub settings_store: Option<Arc<dyn SettingsStore>>,

    pub audio_backend: Arc<dyn AudioBackend>,
}

impl std::fmt::Debug for PlayerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerConfig")
            .field("server_url", &self.server_url)
            .field("bars_num", &self.bars_num)
            .field("segment_width", &self.segment_width)
            .field("tick_period", &self.tick_period)
            .field("ease_duration", &self.ease_duration)
            .field("end_behavior", &self.end_behavior)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("http_client", &"HttpClient { ... }")
            .field(
                "settings_store",
                &self
                    .settings_store
                    .as_ref()
                    .map(|_| "SettingsStore { ... }"),
            )
            .field("audio_backend", &"AudioBackend { ... }")
            .finish()
    }
}

impl PlayerConfig {
    pub fn builder() -> PlayerConfigBuilder {
        PlayerConfigBuilder::default()
    }

    /// Checks value ranges. Called by the builder; exposed for configs
    /// mutated after construction.
    pub fn validate(&self) -> Result<()> {
        validate_server_url(&self.server_url)?;

        if self.bars_num == 0 {
            return Err(Error::Config(
                "bars_num must be greater than 0".to_string(),
            ));
        }

        if !self.segment_width.is_finite() || self.segment_width <= 0.0 {
            return Err(Error::Config(format!(
                "segment_width must be a positive finite number, got {}",
                self.segment_width
            )));
        }

        if self.tick_period == Some(Duration::ZERO) {
            return Err(Error::Config(
                "tick_period must be greater than 0".to_string(),
            ));
        }

        if self.ease_duration > MAX_EASE_DURATION {
            return Err(Error::Config(format!(
                "ease_duration exceeds maximum of {}s",
                MAX_EASE_DURATION.as_secs()
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "event_buffer_size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_server_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(Error::Config("server_url cannot be empty".to_string()));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(Error::Config(format!(
            "server_url must start with http:// or https://, got '{}'",
            url
        )));
    }
    Ok(())
}

fn audio_backend_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AudioBackend".to_string(),
        message: "An AudioBackend implementation is required to decode and play tracks. \
                  Inject the host's audio engine with .audio_backend()."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required to reach the media server. \
                  Desktop: enable the 'desktop-shims' feature to use the reqwest client. \
                  Other hosts: inject a native HTTP client."
            .to_string(),
    })
}

/// Opens the SQLite preference store under the platform data directory.
///
/// Runs on a dedicated runtime so that `build()` stays synchronous whether
/// or not it is called from inside a Tokio context.
#[cfg(feature = "desktop-shims")]
fn provide_default_settings_store() -> Result<Option<Arc<dyn SettingsStore>>> {
    use bridge_desktop::{default_settings_path, SqliteSettingsStore};
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let path = default_settings_path();

    let open = move || -> Result<SqliteSettingsStore> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Internal(format!(
                    "Failed to create settings directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default settings store: {}",
                    e
                ))
            })?;

        runtime
            .block_on(SqliteSettingsStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default SettingsStore: {}", e))
            })
    };

    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(open).join().map_err(|_| {
            Error::Internal("Settings store initialization thread panicked".to_string())
        })??,
        Err(_) => open()?,
    };

    Ok(Some(Arc::new(store)))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_settings_store() -> Result<Option<Arc<dyn SettingsStore>>> {
    Ok(None)
}

/// Builder for [`PlayerConfig`].
#[derive(Default)]
pub struct PlayerConfigBuilder {
    server_url: Option<String>,
    bars_num: Option<usize>,
    segment_width: Option<f32>,
    tick_period: Option<Duration>,
    ease_duration: Option<Duration>,
    end_behavior: EndBehavior,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    skip_default_settings: bool,
    audio_backend: Option<Arc<dyn AudioBackend>>,
}

impl PlayerConfigBuilder {
    /// Sets the media server base URL (required). A trailing `/` is removed.
    ///
    /// ```
    /// use core_runtime::config::PlayerConfig;
    ///
    /// let builder = PlayerConfig::builder().server_url("http://localhost:8080/");
    /// ```
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.server_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Default: 200
    pub fn bars_num(mut self, bars_num: usize) -> Self {
        self.bars_num = Some(bars_num);
        self
    }

    /// Default: 5.0 (3px stick + 2px margin)
    pub fn segment_width(mut self, width: f32) -> Self {
        self.segment_width = Some(width);
        self
    }

    /// Overrides the per-segment tick period.
    pub fn tick_period(mut self, period: Duration) -> Self {
        self.tick_period = Some(period);
        self
    }

    /// Default: 300ms
    pub fn ease_duration(mut self, duration: Duration) -> Self {
        self.ease_duration = Some(duration);
        self
    }

    /// Default: [`EndBehavior::Stop`]
    pub fn end_behavior(mut self, behavior: EndBehavior) -> Self {
        self.end_behavior = behavior;
        self
    }

    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the reqwest client is used when the `desktop-shims`
    /// feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the preference store used for the theme.
    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Keeps the theme in memory instead of opening the default store.
    pub fn without_settings_store(mut self) -> Self {
        self.settings_store = None;
        self.skip_default_settings = true;
        self
    }

    /// Sets the audio backend (required).
    pub fn audio_backend(mut self, backend: Arc<dyn AudioBackend>) -> Self {
        self.audio_backend = Some(backend);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// - `CapabilityMissing` when no audio backend is set, or no HTTP client
    ///   is set and no desktop default exists
    /// - `Config` when `server_url` is missing or a value is out of range
    pub fn build(self) -> Result<PlayerConfig> {
        let server_url = self.server_url.ok_or_else(|| {
            Error::Config("server_url is required. Use .server_url() to set it.".to_string())
        })?;

        let audio_backend = self.audio_backend.ok_or_else(audio_backend_missing_error)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let settings_store = match self.settings_store {
            Some(store) => Some(store),
            None if self.skip_default_settings => None,
            None => provide_default_settings_store()?,
        };

        let config = PlayerConfig {
            server_url,
            bars_num: self.bars_num.unwrap_or(DEFAULT_BARS_NUM),
            segment_width: self.segment_width.unwrap_or(SEGMENT_WIDTH),
            tick_period: self.tick_period,
            ease_duration: self.ease_duration.unwrap_or(DEFAULT_EASE_DURATION),
            end_behavior: self.end_behavior,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
            settings_store,
            audio_backend,
        };

        config.validate()?;

        Ok(config)
    }
}
