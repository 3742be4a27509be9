//! In-process duplex text transport
//!
//! Models the postMessage contract between the UI context and the worker
//! context: fire-and-forget text send, event-driven receive, no shared
//! memory. Each side holds one [`MessagePort`] of a connected pair.

use flume::{unbounded, Receiver, Sender};

/// One endpoint of a duplex text link
pub struct MessagePort {
    sender: Sender<String>,
    receiver: Receiver<String>,
}

/// Create a connected pair of ports
///
/// Text posted on one port arrives on the other, in order.
pub fn duplex() -> (MessagePort, MessagePort) {
    let (left_tx, left_rx) = unbounded();
    let (right_tx, right_rx) = unbounded();
    (
        MessagePort { sender: left_tx, receiver: right_rx },
        MessagePort { sender: right_tx, receiver: left_rx },
    )
}

impl MessagePort {
    /// Post a text message to the peer (fire-and-forget)
    #[inline]
    pub fn post(&self, text: impl Into<String>) -> Result<(), PostError> {
        self.sender.send(text.into()).map_err(|_| PostError)
    }

    /// Wait for the next incoming message
    ///
    /// Resolves to `None` once the peer endpoint is gone.
    pub async fn recv(&self) -> Option<String> {
        self.receiver.recv_async().await.ok()
    }

    /// Take an already-delivered message without blocking
    pub fn try_recv(&self) -> Option<String> {
        self.receiver.try_recv().ok()
    }

    /// Check if no messages are waiting
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Get number of messages waiting
    #[inline]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }
}

impl Clone for MessagePort {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
        }
    }
}

/// Post failure: the peer endpoint has been dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostError;

impl std::fmt::Display for PostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "peer disconnected")
    }
}

impl std::error::Error for PostError {}
