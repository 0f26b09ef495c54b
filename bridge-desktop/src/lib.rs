//! # Desktop Bridge Implementations
//!
//! Default bridge implementations for macOS, Windows and Linux:
//! - [`ReqwestHttpClient`] implements `HttpClient` with `reqwest`
//! - [`SqliteSettingsStore`] implements `SettingsStore` with a SQLite file
//!
//! The audio backend has no desktop default; hosts inject one.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{default_settings_path, ReqwestHttpClient, SqliteSettingsStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http = ReqwestHttpClient::new()?;
//!     let settings = SqliteSettingsStore::new(default_settings_path()).await?;
//!     Ok(())
//! }
//! ```

mod http;
mod settings;

pub use http::ReqwestHttpClient;
pub use settings::SqliteSettingsStore;

use std::path::PathBuf;

/// Location of the preference database under the platform data directory.
pub fn default_settings_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("scrub-player")
        .join("preferences.db")
}
