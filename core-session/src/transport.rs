//! Ordered decoder calls for one session.
//!
//! The actor never awaits the backend. It queues [`TransportCall`]s here and
//! a worker runs them one after another, posting each outcome back to the
//! inbox as `PlayerMessage::Transport`. Cancelling the session token drops
//! whatever call is in flight.

use core_playback::TransportCall;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, Instrument};

use crate::actor::PlayerMessage;
use crate::session::SessionId;

#[derive(Debug)]
pub(crate) struct TransportQueue {
    calls: UnboundedSender<TransportCall>,
}

impl TransportQueue {
    pub(crate) fn start(
        inbox: UnboundedSender<PlayerMessage>,
        session: SessionId,
        token: &CancellationToken,
    ) -> Self {
        let (calls, mut rx) = mpsc::unbounded_channel::<TransportCall>();
        let token = token.clone();

        tokio::spawn(
            async move {
                loop {
                    let call = tokio::select! {
                        _ = token.cancelled() => break,
                        call = rx.recv() => match call {
                            Some(call) => call,
                            None => break,
                        },
                    };

                    let op = call.op();
                    let outcome = tokio::select! {
                        _ = token.cancelled() => {
                            debug!(?op, "Transport call abandoned");
                            break;
                        }
                        outcome = call.run() => outcome,
                    };
                    if inbox
                        .send(PlayerMessage::Transport { session, outcome })
                        .is_err()
                    {
                        break;
                    }
                }
                trace!("Transport worker finished");
            }
            .instrument(tracing::debug_span!("transport", %session)),
        );

        Self { calls }
    }

    /// Queue `call` behind every call pushed before it.
    pub(crate) fn push(&self, call: TransportCall) {
        if let Err(rejected) = self.calls.send(call) {
            debug!(op = ?rejected.0.op(), "Transport worker gone, call dropped");
        }
    }
}
