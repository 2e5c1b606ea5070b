//! roomlink client core
//!
//! The lifecycle core of a single-peer real-time audio publish/subscribe
//! client: meeting creation over signaling, session initialization with
//! codec negotiation, one publish and one subscribe task with mutex-guarded
//! lifecycles, and per-task connection state machines with wire-stable
//! result codes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │     Application          │
//! └────────────┬─────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │     MeetingClient        │  create_meeting / init / leave
//! │  ┌────────────────────┐  │
//! │  │ PeerTaskController │  │  start/stop publish + subscribe
//! │  └─────────┬──────────┘  │
//! └────────────┼─────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │  roomlink-peer-core      │  ICE pairing → DTLS → established
//! └──────────────────────────┘
//! ```
//!
//! Network, crypto, and hardware concerns sit behind trait seams
//! ([`SignalingApi`], [`PeerConnectionFactory`], [`AudioBoard`]) so the
//! lifecycle core stays testable without a board or a media stack.

pub mod board;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod signaling;

pub use board::{AudioBoard, HostBoard};
pub use client::{MeetingClient, Session, TaskId, TaskSnapshot};
pub use codec::{AudioCodec, CodecNegotiator, NegotiatedAudio};
pub use config::{ClientConfig, RetryConfig, SessionConfig};
pub use error::{
    ClientError, ClientResult, ProtocolError, ResourceError, ResultCode, UsageError,
};
pub use events::ClientEvent;
pub use signaling::{HttpSignalingApi, RoomId, SignalingApi};

// Re-export the peer layer types that appear in this crate's public API.
pub use roomlink_peer_core::{
    ConnectionState, ConnectionTimeouts, PeerConnection, PeerConnectionFactory, PeerId, PeerRole,
    TransportError,
};
