//! Loopback router standing in for the network.
//!
//! Every [`ChannelTransport`] created by the hub sends into one shared outbox.
//! The hub delivers client envelopes to the server and fans server broadcasts
//! out to every connected client except the excluded peer.

use std::collections::HashMap;

use status_core::{Endpoint, Recipient};
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

use crate::transport::{ChannelTransport, Envelope};

#[derive(Debug)]
pub struct SessionHub {
    outbox_tx: mpsc::UnboundedSender<Envelope>,
    outbox_rx: mpsc::UnboundedReceiver<Envelope>,
    inboxes: HashMap<Endpoint, mpsc::UnboundedSender<Envelope>>,
}

impl SessionHub {
    pub fn new() -> Self {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        Self {
            outbox_tx,
            outbox_rx,
            inboxes: HashMap::new(),
        }
    }

    /// Registers `endpoint` and returns its transport. Reconnecting replaces
    /// the previous inbox; anything still queued for it is dropped.
    pub fn connect(&mut self, endpoint: Endpoint) -> ChannelTransport {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        if self.inboxes.insert(endpoint, inbox_tx).is_some() {
            debug!(?endpoint, "endpoint reconnected");
        }
        ChannelTransport::new(endpoint, self.outbox_tx.clone(), inbox_rx)
    }

    pub fn disconnect(&mut self, endpoint: Endpoint) -> bool {
        self.inboxes.remove(&endpoint).is_some()
    }

    pub fn is_connected(&self, endpoint: Endpoint) -> bool {
        self.inboxes.contains_key(&endpoint)
    }

    /// Delivers every envelope queued so far. Returns how many were routed.
    pub fn route_pending(&mut self) -> usize {
        let mut routed = 0;
        while let Ok(envelope) = self.outbox_rx.try_recv() {
            self.deliver(envelope);
            routed += 1;
        }
        routed
    }

    /// Routes envelopes as they arrive until `shutdown` flips to true.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                Some(envelope) = self.outbox_rx.recv() => self.deliver(envelope),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("session hub stopped");
    }

    fn deliver(&mut self, envelope: Envelope) {
        let targets: Vec<Endpoint> = match envelope.recipient {
            Recipient::Server => vec![Endpoint::Server],
            recipient @ Recipient::Broadcast { .. } => self
                .inboxes
                .keys()
                .copied()
                .filter(|endpoint| match endpoint {
                    // Never loop a broadcast back to the client that sent it.
                    Endpoint::Client(peer) => {
                        Some(*peer) != envelope.from.peer() && recipient.includes(*peer)
                    }
                    Endpoint::Server => false,
                })
                .collect(),
        };

        for target in targets {
            let Some(inbox) = self.inboxes.get(&target) else {
                warn!(?target, from = ?envelope.from, "no inbox for recipient; envelope dropped");
                continue;
            };
            if inbox.send(envelope.clone()).is_err() {
                debug!(?target, "recipient inbox closed");
                self.inboxes.remove(&target);
                continue;
            }
            trace!(from = ?envelope.from, to = ?target, bytes = envelope.bytes.len(), "envelope delivered");
        }
    }
}

impl Default for SessionHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use status_core::PeerId;

    use super::*;
    use crate::transport::Transport;

    fn envelope(from: Endpoint, recipient: Recipient) -> Envelope {
        Envelope {
            from,
            recipient,
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn broadcast_skips_the_excluded_peer() {
        let mut hub = SessionHub::new();
        let server = hub.connect(Endpoint::Server);
        let mut one = hub.connect(Endpoint::Client(PeerId(1)));
        let mut two = hub.connect(Endpoint::Client(PeerId(2)));

        server
            .send(envelope(
                Endpoint::Server,
                Recipient::Broadcast {
                    except: Some(PeerId(1)),
                },
            ))
            .unwrap();
        assert_eq!(hub.route_pending(), 1);

        assert!(one.try_recv().is_none());
        assert!(two.try_recv().is_some());
    }

    #[test]
    fn client_messages_reach_only_the_server() {
        let mut hub = SessionHub::new();
        let mut server = hub.connect(Endpoint::Server);
        let one = hub.connect(Endpoint::Client(PeerId(1)));
        let mut two = hub.connect(Endpoint::Client(PeerId(2)));

        one.send(envelope(Endpoint::Client(PeerId(1)), Recipient::Server))
            .unwrap();
        hub.route_pending();

        assert_eq!(server.try_recv().map(|e| e.from), Some(Endpoint::Client(PeerId(1))));
        assert!(two.try_recv().is_none());
    }

    #[test]
    fn disconnected_peers_are_skipped() {
        let mut hub = SessionHub::new();
        let server = hub.connect(Endpoint::Server);
        let two = hub.connect(Endpoint::Client(PeerId(2)));
        drop(two);
        assert!(hub.disconnect(Endpoint::Client(PeerId(2))));

        server
            .send(envelope(Endpoint::Server, Recipient::Broadcast { except: None }))
            .unwrap();
        assert_eq!(hub.route_pending(), 1);
        assert!(!hub.is_connected(Endpoint::Client(PeerId(2))));
    }
}
