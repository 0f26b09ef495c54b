//! # Media Server Provider
//!
//! Typed client for the HTTP media server that backs the player:
//!
//! | Endpoint | Method |
//! |----------|--------|
//! | `GET /media_files` | [`MediaServerClient::list_media_files`] |
//! | `GET /get_name/{id}` | [`MediaServerClient::fetch_name`] |
//! | `GET /get_duration/{id}` | [`MediaServerClient::fetch_duration`] |
//! | `GET /get_waveform/{id}` | [`MediaServerClient::fetch_waveform`] |
//! | `GET /get_cover/{id}` | [`MediaServerClient::fetch_cover`] |
//! | `GET /get_mp3/{id}` | [`MediaServerClient::stream_source`] (by reference) |
//!
//! Every request is attempted once; failures are returned as
//! [`MediaServerError`] for the caller to surface.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::MediaServerClient;
pub use error::{MediaServerError, Result};
pub use types::{CoverArt, MediaFile, TrackId};
