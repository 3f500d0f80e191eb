//! Per-rank connection to the world: outgoing queues, inbox and mailbox.

use std::sync::Arc;

use grid_types::{ContextId, Envelope, Payload, Rank, Tag};
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace};

use crate::mailbox::Mailbox;
use crate::Error;

pub struct Endpoint {
    rank: Rank,
    peers: Arc<[mpsc::UnboundedSender<Envelope>]>,
    inbox: mpsc::UnboundedReceiver<Envelope>,
    mailbox: Mailbox,
    abort: watch::Receiver<bool>,
}

impl Endpoint {
    pub fn new(
        rank: Rank,
        peers: Arc<[mpsc::UnboundedSender<Envelope>]>,
        inbox: mpsc::UnboundedReceiver<Envelope>,
        abort: watch::Receiver<bool>,
    ) -> Self {
        Self {
            rank,
            peers,
            inbox,
            mailbox: Mailbox::new(),
            abort,
        }
    }

    /// Queues `envelope` for world rank `dest`. Never blocks.
    pub fn post(&self, dest: Rank, envelope: Envelope) -> Result<(), Error> {
        let peer = self.peers.get(dest).ok_or(Error::RankOutOfRange {
            rank: dest,
            size: self.peers.len(),
        })?;
        trace!(
            from = self.rank,
            to = dest,
            context = %envelope.context,
            tag = %envelope.tag,
            len = envelope.payload.len(),
            "post"
        );
        peer.send(envelope).map_err(|_| Error::Disconnected(dest))
    }

    /// Waits for the next message from world rank `source` with `tag` in
    /// `context`. Messages for other keys are stashed in the mailbox.
    pub async fn receive(
        &mut self,
        context: &ContextId,
        source: Rank,
        tag: Tag,
    ) -> Result<Payload, Error> {
        if let Some(payload) = self.mailbox.take(context, source, tag) {
            return Ok(payload);
        }

        let Endpoint {
            rank,
            inbox,
            mailbox,
            abort,
            ..
        } = self;

        loop {
            tokio::select! {
                biased;
                _ = aborted(abort) => {
                    return Err(Error::Aborted { from: source, tag });
                }
                envelope = inbox.recv() => {
                    let envelope = envelope.ok_or(Error::Disconnected(source))?;
                    if envelope.source == source && envelope.tag == tag && envelope.context == *context {
                        return Ok(envelope.payload);
                    }
                    trace!(
                        rank = *rank,
                        from = envelope.source,
                        context = %envelope.context,
                        tag = %envelope.tag,
                        "stash"
                    );
                    mailbox.stash(envelope);
                }
            }
        }
    }
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        if !self.mailbox.is_empty() {
            debug!(
                rank = self.rank,
                pending = self.mailbox.len(),
                "endpoint closed with undelivered messages"
            );
        }
    }
}

/// Resolves once the world is aborted. Pends forever if the world handle is
/// gone, since nobody can abort it any more.
async fn aborted(abort: &mut watch::Receiver<bool>) {
    if abort.wait_for(|&flag| flag).await.is_err() {
        std::future::pending::<()>().await;
    }
}
