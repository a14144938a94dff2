/*!
 * Message channel abstraction.
 *
 * The transport between peers is opaque to the session: anything that can
 * send a [`SyncMessage`] and yield [`ChannelEvent`]s implements
 * [`SyncChannel`]. [`MemoryChannel`] connects two sessions in-process.
 */

use async_trait::async_trait;
use log::warn;
use tokio::sync::mpsc;

use super::message::SyncMessage;
use crate::errors::SyncError;

/// What the transport reports to the session
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// The connection is established
    Open,
    /// A decoded message from the peer
    Message(SyncMessage),
    /// The peer closed the connection
    Closed,
    /// The transport failed
    Error(String),
}

/// Bidirectional message transport between two peers
#[async_trait]
pub trait SyncChannel: Send {
    /// Deliver a message to the peer
    async fn send(&mut self, message: SyncMessage) -> Result<(), SyncError>;

    /// Next transport event; `None` once the channel is exhausted
    async fn recv(&mut self) -> Option<ChannelEvent>;
}

/// In-process channel carrying JSON-encoded messages over tokio mpsc
#[derive(Debug)]
pub struct MemoryChannel {
    outgoing: Option<mpsc::UnboundedSender<String>>,
    incoming: mpsc::UnboundedReceiver<String>,
    opened: bool,
    closed: bool,
}

impl MemoryChannel {
    /// Two connected endpoints
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, b_rx), Self::new(b_tx, a_rx))
    }

    fn new(outgoing: mpsc::UnboundedSender<String>, incoming: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            outgoing: Some(outgoing),
            incoming,
            opened: false,
            closed: false,
        }
    }

    /// Stop sending; the peer sees `Closed` after draining queued messages
    pub fn close(&mut self) {
        self.outgoing = None;
    }

    /// Queue a raw payload, bypassing encoding
    pub fn send_raw(&self, raw: impl Into<String>) -> Result<(), SyncError> {
        let sender = self.outgoing.as_ref().ok_or(SyncError::ChannelClosed)?;
        sender.send(raw.into()).map_err(|_| SyncError::ChannelClosed)
    }
}

#[async_trait]
impl SyncChannel for MemoryChannel {
    async fn send(&mut self, message: SyncMessage) -> Result<(), SyncError> {
        let raw = message.to_json()?;
        self.send_raw(raw)
    }

    async fn recv(&mut self) -> Option<ChannelEvent> {
        if !self.opened {
            self.opened = true;
            return Some(ChannelEvent::Open);
        }
        if self.closed {
            return None;
        }

        loop {
            match self.incoming.recv().await {
                Some(raw) => match SyncMessage::from_json(&raw) {
                    Ok(message) => return Some(ChannelEvent::Message(message)),
                    Err(e) => warn!("Dropping undecodable sync message: {}", e),
                },
                None => {
                    self.closed = true;
                    return Some(ChannelEvent::Closed);
                }
            }
        }
    }
}
