//! Connection driver and the seam to the external peer-connection library
//!
//! A [`ConnectionDriver`] owns one peer connection and is the only writer of
//! its [`ConnectionState`]; everyone else reads through the watch channel it
//! hands out. Both establishment phases are bounded by [`ConnectionTimeouts`]
//! so a stuck exchange resolves to `Failed` instead of hanging its task.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{PeerError, PeerResult, TransportError};
use crate::types::{ConnectionId, ConnectionState, PeerId, PeerRole};

/// One peer connection as exposed by the external ICE/DTLS/SRTP library.
///
/// Implementations do the real network and crypto work; the driver only
/// sequences the calls and bounds them with timeouts.
#[async_trait]
pub trait PeerConnection: Send {
    /// Exchange ICE candidates with the remote side until a pair is selected.
    async fn pair_candidates(&mut self) -> Result<(), TransportError>;

    /// Run the DTLS handshake over the selected pair.
    async fn handshake(&mut self) -> Result<(), TransportError>;

    /// Tear the connection down. Must be safe to call in any state.
    async fn close(&mut self);
}

/// Creates peer connections for a task's role and identity.
#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    /// Bring up the underlying peer stack for one task.
    ///
    /// `remote` is the participant a subscriber wants media from; `None` for
    /// publishers.
    async fn create(
        &self,
        role: PeerRole,
        local: &PeerId,
        remote: Option<&PeerId>,
    ) -> Result<Box<dyn PeerConnection>, TransportError>;
}

/// Phase timeouts for connection establishment.
#[derive(Debug, Clone)]
pub struct ConnectionTimeouts {
    /// Bound on the ICE candidate exchange
    pub candidate_pairing: Duration,
    /// Bound on the DTLS handshake
    pub dtls_handshake: Duration,
}

impl Default for ConnectionTimeouts {
    fn default() -> Self {
        Self {
            candidate_pairing: Duration::from_secs(10),
            dtls_handshake: Duration::from_secs(5),
        }
    }
}

/// Drives one peer connection through the state machine.
pub struct ConnectionDriver {
    id: ConnectionId,
    conn: Box<dyn PeerConnection>,
    timeouts: ConnectionTimeouts,
    state_tx: watch::Sender<ConnectionState>,
}

impl ConnectionDriver {
    pub fn new(conn: Box<dyn PeerConnection>, timeouts: ConnectionTimeouts) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        Self {
            id: ConnectionId::new(),
            conn,
            timeouts,
            state_tx,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Synchronized accessor for the connection state.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Current state, read through the owning channel.
    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Walk Idle -> CandidatePairing -> DtlsHandshake -> Established.
    ///
    /// Every failure or timeout lands the connection in `Failed` with the
    /// phase-specific error; the caller never observes a hang.
    pub async fn establish(&mut self) -> PeerResult<()> {
        self.transition(ConnectionState::CandidatePairing)?;
        match timeout(self.timeouts.candidate_pairing, self.conn.pair_candidates()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(self.fail(PeerError::from_pairing(e))),
            Err(_) => {
                return Err(self.fail(PeerError::pairing_timeout(self.timeouts.candidate_pairing)))
            }
        }

        self.transition(ConnectionState::DtlsHandshake)?;
        match timeout(self.timeouts.dtls_handshake, self.conn.handshake()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(self.fail(PeerError::from_handshake(e))),
            Err(_) => {
                return Err(self.fail(PeerError::handshake_timeout(self.timeouts.dtls_handshake)))
            }
        }

        self.transition(ConnectionState::Established)?;
        Ok(())
    }

    /// Close the connection and mark it `Closed`.
    ///
    /// Idempotent; a connection already in a terminal state is left as-is.
    pub async fn close(&mut self) {
        let current = self.state();
        if current.is_terminal() {
            return;
        }
        self.conn.close().await;
        self.state_tx.send_replace(ConnectionState::Closed);
        debug!("connection {} closed from state {}", self.id, current);
    }

    fn transition(&self, next: ConnectionState) -> PeerResult<()> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(PeerError::Terminal { state: current });
        }
        debug!("connection {} state changed: {} -> {}", self.id, current, next);
        // send_replace updates even with no subscribers; plain send would be
        // a no-op until someone called state_receiver().
        self.state_tx.send_replace(next);
        Ok(())
    }

    fn fail(&self, err: PeerError) -> PeerError {
        self.state_tx.send_replace(ConnectionState::Failed);
        warn!("connection {} failed: {}", self.id, err);
        err
    }
}
