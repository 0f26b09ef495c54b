//! # Host Bridge Traits
//!
//! Capabilities the player core needs from its host but does not implement
//! itself.
//!
//! | Trait | Purpose | Desktop implementation |
//! |-------|---------|------------------------|
//! | [`HttpClient`](http::HttpClient) | Media server requests | `bridge_desktop::ReqwestHttpClient` |
//! | [`AudioBackend`](playback::AudioBackend) | Opaque streaming decoder | host supplied |
//! | [`SettingsStore`](storage::SettingsStore) | Theme preference | `bridge_desktop::SqliteSettingsStore` |
//! | [`LoggerSink`](log::LoggerSink) | Forward tracing output | [`ConsoleLogger`](log::ConsoleLogger) |
//!
//! ## Fail-Fast Strategy
//!
//! Missing capabilities are reported when the configuration is built, never
//! lazily at first use:
//!
//! ```ignore
//! let backend = self.audio_backend.ok_or_else(|| Error::CapabilityMissing {
//!     capability: "AudioBackend".to_string(),
//!     message: "Inject the platform audio engine.".to_string(),
//! })?;
//! ```
//!
//! ## Error Handling
//!
//! Every trait returns [`BridgeError`](error::BridgeError). Implementations
//! map transport failures to `Network`, decoder failures to `Audio` and
//! persistence failures to `Storage` so upper layers can classify them.
//!
//! All traits require `Send + Sync`.

pub mod error;
pub mod http;
pub mod log;
pub mod playback;
pub mod storage;

pub use error::BridgeError;

pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use playback::{
    AudioBackend, AudioEvent, AudioEventCallback, AudioEventKind, AudioHandleId, AudioSource,
    LoadedAudio,
};
pub use storage::SettingsStore;
