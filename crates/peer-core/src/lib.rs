//! Peer connection lifecycle for roomlink
//!
//! This crate drives a single peer connection from ICE candidate pairing
//! through the DTLS handshake to an established media path, and owns the
//! state machine each publish or subscribe task runs independently. The
//! actual ICE/DTLS/SRTP work is delegated to an external peer-connection
//! library behind the [`PeerConnection`] trait; this crate owns ordering,
//! phase timeouts, and teardown.

pub mod connection;
pub mod error;
pub mod types;

pub use connection::{ConnectionDriver, ConnectionTimeouts, PeerConnection, PeerConnectionFactory};
pub use error::{PeerError, PeerResult, TransportError};
pub use types::{ConnectionId, ConnectionState, PeerId, PeerRole};
