//! Session struct definition
//!
//! Represents one connected, named client and its outbound queue.

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::SessionId;

/// Server → Client line queue
pub type Tx = mpsc::UnboundedSender<ServerMessage>;
/// Receiving side of [`Tx`], drained by the writer task
pub type Rx = mpsc::UnboundedReceiver<ServerMessage>;

/// Connected session information
///
/// Created once the handshake name has been claimed and shared as
/// `Arc<Session>` between the registry, the group table and the
/// connection's own task. The current group lives in the group table.
#[derive(Debug)]
pub struct Session {
    /// Unique identifier for this session
    id: SessionId,
    /// Display name claimed during the handshake
    name: String,
    /// Server → Client line queue, drained by the writer task
    sender: Tx,
}

impl Session {
    /// Create a new session with the given name and sender channel
    pub fn new(name: String, sender: Tx) -> Self {
        Self {
            id: SessionId::new(),
            name,
            sender,
        }
    }

    /// Session identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a message for this session without waiting
    ///
    /// The queue is unbounded, so the only failure is a writer that has
    /// already gone away.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .map_err(|_| SendError::ChannelClosed)
    }

    /// Queue a message, logging instead of failing
    ///
    /// Used for fan-out where a departed recipient must not affect the
    /// others.
    pub fn deliver(&self, msg: ServerMessage) {
        if self.send(msg).is_err() {
            debug!("Session '{}' is closing, line not delivered", self.name);
        }
    }
}
