//! Core service façade and bootstrap helpers.
//!
//! Hosts construct a [`PlayerService`] from a [`PlayerConfig`](core_runtime::config::PlayerConfig)
//! carrying their bridge implementations (HTTP, settings, audio decoder).
//! Desktop apps typically enable the `desktop-shims` feature, which fills in
//! HTTP and settings from `bridge-desktop` so only the decoder must be
//! supplied.
//!
//! The service lists the server's tracks for the home screen, opens the
//! player screen with [`PlayerScreenParams`] and exposes the persisted
//! [`ThemePreference`].

pub mod error;
pub mod screen;
mod service;
pub mod theme;

pub use error::{CoreError, Result};
pub use screen::PlayerScreenParams;
#[cfg(feature = "desktop-shims")]
pub use service::bootstrap_desktop;
pub use service::PlayerService;
pub use theme::{Theme, ThemePalette, ThemePreference};
