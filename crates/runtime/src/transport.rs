//! Message transport between participants.
//!
//! The engine only produces [`Outbound`] values; a transport moves their
//! encoded form to the right endpoint. Delivery is assumed reliable and
//! ordered per sender.

use status_core::sync::{decode, encode};
use status_core::{Endpoint, Outbound, Recipient, SyncMessage};
use tokio::sync::mpsc;

use crate::error::{Result, RuntimeError};

/// One encoded sync message in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: Endpoint,
    pub recipient: Recipient,
    pub bytes: Vec<u8>,
}

impl Envelope {
    pub fn seal(from: Endpoint, outbound: &Outbound) -> Result<Self> {
        Ok(Self {
            from,
            recipient: outbound.recipient,
            bytes: encode(&outbound.message)?,
        })
    }

    pub fn open(&self) -> Result<SyncMessage> {
        Ok(decode(&self.bytes)?)
    }
}

/// Sending and receiving side of one endpoint.
pub trait Transport: Send {
    fn endpoint(&self) -> Endpoint;

    fn send(&self, envelope: Envelope) -> Result<()>;

    /// Next delivered envelope, if one is waiting.
    fn try_recv(&mut self) -> Option<Envelope>;
}

/// Transport over in-process unbounded channels, connected by a
/// [`crate::SessionHub`].
#[derive(Debug)]
pub struct ChannelTransport {
    endpoint: Endpoint,
    outbox: mpsc::UnboundedSender<Envelope>,
    inbox: mpsc::UnboundedReceiver<Envelope>,
}

impl ChannelTransport {
    pub(crate) fn new(
        endpoint: Endpoint,
        outbox: mpsc::UnboundedSender<Envelope>,
        inbox: mpsc::UnboundedReceiver<Envelope>,
    ) -> Self {
        Self {
            endpoint,
            outbox,
            inbox,
        }
    }
}

impl Transport for ChannelTransport {
    fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    fn send(&self, envelope: Envelope) -> Result<()> {
        self.outbox
            .send(envelope)
            .map_err(|_| RuntimeError::TransportClosed {
                endpoint: self.endpoint,
            })
    }

    fn try_recv(&mut self) -> Option<Envelope> {
        self.inbox.try_recv().ok()
    }
}
