//! Core types for peer connection tracking

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// State of a single peer connection.
///
/// Owned exclusively by the task driving the connection; other tasks observe
/// it through the watch channel handed out by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No connection attempt has begun
    Idle,
    /// ICE candidate exchange in progress
    CandidatePairing,
    /// Candidates paired, DTLS handshake in progress
    DtlsHandshake,
    /// Secure media path is up
    Established,
    /// Terminal: initialization, pairing, or handshake failed
    Failed,
    /// Terminal: closed by stop or leave
    Closed,
}

impl ConnectionState {
    /// Terminal states admit no further transitions; a fresh start builds a
    /// new connection instead of reusing this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Closed)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (*self, next) {
            (Idle, CandidatePairing) => true,
            (CandidatePairing, DtlsHandshake) => true,
            (DtlsHandshake, Established) => true,
            // Stop or leave closes a connection in any live state.
            (Idle | CandidatePairing | DtlsHandshake | Established, Closed) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CandidatePairing => "candidate-pairing",
            Self::DtlsHandshake => "dtls-handshake",
            Self::Established => "established",
            Self::Failed => "failed",
            Self::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// Role a task plays in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeerRole {
    /// Sends local audio into the meeting
    Publisher,
    /// Receives another participant's audio
    Subscriber,
}

impl fmt::Display for PeerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Publisher => write!(f, "publish"),
            Self::Subscriber => write!(f, "subscribe"),
        }
    }
}

/// Caller-supplied participant identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PeerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Unique identifier for one connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
