//! Media server HTTP connector

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::playback::AudioSource;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{MediaServerError, Result};
use crate::types::{CoverArt, DurationResponse, MediaFile, NameResponse, TrackId};

/// Longest error body echoed back in [`MediaServerError::ApiError`].
const MAX_ERROR_BODY: usize = 200;

/// Client for one media server instance.
///
/// # Example
///
/// ```ignore
/// use provider_media_server::{MediaServerClient, TrackId};
///
/// let client = MediaServerClient::new(http_client, "http://192.168.0.10:5000")?;
/// let waveform = client.fetch_waveform(TrackId(1)).await?;
/// ```
#[derive(Clone)]
pub struct MediaServerClient {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
}

impl MediaServerClient {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(MediaServerError::InvalidUrl(base_url));
        }
        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// URL of `/get_mp3/{id}`, streamed by the audio backend.
    pub fn stream_url(&self, id: TrackId) -> String {
        self.endpoint(&format!("get_mp3/{}", id))
    }

    /// URL of `/get_cover/{id}`.
    pub fn cover_url(&self, id: TrackId) -> String {
        self.endpoint(&format!("get_cover/{}", id))
    }

    /// Audio reference for the decoder. Nothing is downloaded here.
    pub fn stream_source(&self, id: TrackId) -> AudioSource {
        AudioSource::remote(self.stream_url(id))
    }

    async fn get(&self, url: String) -> Result<HttpResponse> {
        let response = self
            .http_client
            .execute(HttpRequest::get(url.clone()))
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Media server request failed");
                MediaServerError::from(e)
            })?;

        if !response.is_success() {
            let mut message = String::from_utf8_lossy(&response.body).into_owned();
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            warn!(url = %url, status = response.status, "Media server returned error status");
            return Err(MediaServerError::ApiError {
                status_code: response.status,
                message,
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String, what: &str) -> Result<T> {
        let response = self.get(url).await?;
        serde_json::from_slice(&response.body)
            .map_err(|e| MediaServerError::ParseError(format!("Failed to parse {}: {}", what, e)))
    }

    /// `GET /media_files`
    #[instrument(skip(self))]
    pub async fn list_media_files(&self) -> Result<Vec<MediaFile>> {
        let files: Vec<MediaFile> = self
            .get_json(self.endpoint("media_files"), "media list")
            .await?;

        info!(count = files.len(), "Listed media files");
        Ok(files)
    }

    /// `GET /get_name/{id}`
    #[instrument(skip(self), fields(track_id = %id))]
    pub async fn fetch_name(&self, id: TrackId) -> Result<String> {
        let body: NameResponse = self
            .get_json(self.endpoint(&format!("get_name/{}", id)), "track name")
            .await?;
        Ok(body.name)
    }

    /// `GET /get_duration/{id}`, in whole seconds.
    #[instrument(skip(self), fields(track_id = %id))]
    pub async fn fetch_duration(&self, id: TrackId) -> Result<u64> {
        let body: DurationResponse = self
            .get_json(self.endpoint(&format!("get_duration/{}", id)), "duration")
            .await?;

        if !body.duration.is_finite() || body.duration < 0.0 {
            return Err(MediaServerError::ParseError(format!(
                "Invalid duration: {}",
                body.duration
            )));
        }
        Ok(body.duration.floor() as u64)
    }

    /// `GET /get_waveform/{id}`: raw amplitudes, not yet normalized.
    #[instrument(skip(self), fields(track_id = %id))]
    pub async fn fetch_waveform(&self, id: TrackId) -> Result<Vec<f32>> {
        let values: Vec<f32> = self
            .get_json(self.endpoint(&format!("get_waveform/{}", id)), "waveform")
            .await?;

        debug!(samples = values.len(), "Fetched waveform");
        Ok(values)
    }

    /// `GET /get_cover/{id}`
    #[instrument(skip(self), fields(track_id = %id))]
    pub async fn fetch_cover(&self, id: TrackId) -> Result<CoverArt> {
        let response = self.get(self.cover_url(id)).await?;
        let content_type = response.header("content-type").map(str::to_string);

        debug!(bytes = response.body.len(), "Fetched cover");
        Ok(CoverArt {
            url: response.url,
            content_type,
            data: response.body,
        })
    }
}

impl std::fmt::Debug for MediaServerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaServerClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
