//! Periodic advance timer for one session.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::actor::PlayerMessage;
use crate::session::SessionId;

/// Running tick task. Stopping, or dropping, cancels it immediately.
#[derive(Debug)]
pub(crate) struct Ticker {
    generation: u64,
    token: CancellationToken,
}

impl Ticker {
    /// Spawn a task that posts `PlayerMessage::Tick` every `period`. The
    /// first tick arrives one period from now.
    pub(crate) fn start(
        inbox: UnboundedSender<PlayerMessage>,
        session: SessionId,
        generation: u64,
        period: Duration,
        parent: &CancellationToken,
    ) -> Self {
        let token = parent.child_token();
        let task_token = token.clone();

        tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = interval.tick() => {
                        if inbox.send(PlayerMessage::Tick { session, generation }).is_err() {
                            break;
                        }
                    }
                }
            }
            trace!(%session, generation, "Ticker finished");
        });

        Self { generation, token }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn stop(self) {
        self.token.cancel();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
