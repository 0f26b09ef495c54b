//! # Track Session
//!
//! The scrub synchronizer and the track session controller.
//!
//! - [`synchronizer`]: sans-IO state machine that owns the visual offset and
//!   turns taps, drags, ticks and end-of-track into decoder commands
//! - [`PlayerHandle`]: spawns the single-inbox actor that owns the current
//!   [`TrackSession`](session) and carries those commands out
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::events::EventBus;
//! use core_session::PlayerHandle;
//! use provider_media_server::TrackId;
//!
//! let player = PlayerHandle::spawn(config, EventBus::default())?;
//! player.switch_to(TrackId(1), "Intro")?;
//!
//! let mut updates = player.watch();
//! updates.changed().await?;
//! println!("{}", updates.borrow().position_label());
//! ```

mod actor;
pub mod error;
mod fetch;
pub mod session;
pub mod snapshot;
pub mod synchronizer;
mod ticker;
mod transport;

pub use actor::{PlayerCommand, PlayerHandle};
pub use error::{Result, SessionError};
pub use session::SessionId;
pub use snapshot::PlayerSnapshot;
pub use synchronizer::{PlayIntent, ScrubState, ScrubSynchronizer, SyncEffect};
