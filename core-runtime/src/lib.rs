//! # Core Runtime
//!
//! Shared runtime infrastructure for the player crates:
//! - [`logging`]: `tracing` subscriber setup with redaction and host sinks
//! - [`config`]: validated [`PlayerConfig`](config::PlayerConfig) and bridge defaults
//! - [`events`]: broadcast event bus
//!
//! Every other core crate depends on these conventions rather than setting
//! up its own logging or channels.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
