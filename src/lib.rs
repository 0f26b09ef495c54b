//! Workspace placeholder crate.
//!
//! Exposes feature flags that map onto the member crates so a host can depend
//! on `scrub-player` alone:
//!
//! * `desktop-shims` (default): the [`core_service`] façade with reqwest HTTP
//!   and SQLite settings.
//! * `headless`: only [`core_session`] and [`core_waveform`], for hosts that
//!   drive the scrub state machine and render the waveform themselves.

#[cfg(feature = "desktop-shims")]
pub use core_service;
#[cfg(feature = "headless")]
pub use core_session;
#[cfg(feature = "headless")]
pub use core_waveform;
