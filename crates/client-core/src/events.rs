//! Client event stream
//!
//! Lifecycle edges are broadcast so applications can observe session and
//! connection progress without polling. Send failures mean nobody is
//! listening right now and are logged at debug only.

use tokio::sync::broadcast;
use tracing::debug;

use roomlink_peer_core::{ConnectionState, PeerId, PeerRole};

use crate::error::ResultCode;

/// Events emitted by the client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A session finished initializing and is ready for audio tasks
    SessionInitialized { meeting_id: String },
    /// A task's connection state changed
    ConnectionStateChanged {
        role: PeerRole,
        peer_id: PeerId,
        state: ConnectionState,
    },
    /// A publish or subscribe task shut down
    TaskStopped { role: PeerRole, peer_id: PeerId },
    /// The session was torn down
    SessionLeft { meeting_id: String },
    /// An operation failed with the given wire code
    OperationFailed { code: ResultCode },
}

/// Broadcast emitter shared by the client and its tasks.
#[derive(Debug, Clone)]
pub(crate) struct EventEmitter {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventEmitter {
    pub(crate) fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }

    pub(crate) fn emit(&self, event: ClientEvent) {
        if self.tx.send(event).is_err() {
            debug!("client event dropped: no subscribers");
        }
    }
}
