//! Error types for peer connection operations

use std::time::Duration;

use thiserror::Error;

use crate::types::ConnectionState;

/// Result type alias for peer-core operations
pub type PeerResult<T> = std::result::Result<T, PeerError>;

/// Errors reported by the external peer-connection library.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The SRTP/peer stack could not be brought up
    #[error("peer initialization failed: {reason}")]
    Init { reason: String },

    /// No candidate pair could be agreed with the remote peer
    #[error("candidate pairing failed: {reason}")]
    CandidatePairing { reason: String },

    /// The DTLS handshake was rejected or broke mid-flight
    #[error("DTLS handshake failed: {reason}")]
    DtlsHandshake { reason: String },

    /// The transport ran out of a local resource (buffers, task slots)
    #[error("transport resource exhausted: {resource}")]
    ResourceExhausted { resource: String },

    /// The connection was closed underneath the operation
    #[error("connection closed")]
    Closed,
}

/// Errors produced while driving a connection through its lifecycle.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Peer stack initialization failed before pairing could begin
    #[error("peer initialization failed: {reason}")]
    InitFailed { reason: String },

    /// Candidate pairing failed or timed out
    #[error("candidate pairing failed: {reason}")]
    CandidatePairFailed { reason: String },

    /// DTLS handshake failed or timed out
    #[error("DTLS handshake failed: {reason}")]
    DtlsHandshakeFailed { reason: String },

    /// The connection is in a terminal state and cannot move further
    #[error("connection is terminal in state {state}")]
    Terminal { state: ConnectionState },
}

impl PeerError {
    pub(crate) fn pairing_timeout(after: Duration) -> Self {
        Self::CandidatePairFailed {
            reason: format!("no candidate pair within {}ms", after.as_millis()),
        }
    }

    pub(crate) fn handshake_timeout(after: Duration) -> Self {
        Self::DtlsHandshakeFailed {
            reason: format!("handshake did not complete within {}ms", after.as_millis()),
        }
    }

    /// Fold a transport error from the pairing phase into the lifecycle error.
    pub(crate) fn from_pairing(err: TransportError) -> Self {
        match err {
            TransportError::Init { reason } => Self::InitFailed { reason },
            other => Self::CandidatePairFailed {
                reason: other.to_string(),
            },
        }
    }

    /// Fold a transport error from the handshake phase into the lifecycle error.
    pub(crate) fn from_handshake(err: TransportError) -> Self {
        match err {
            TransportError::Init { reason } => Self::InitFailed { reason },
            other => Self::DtlsHandshakeFailed {
                reason: other.to_string(),
            },
        }
    }
}
