//! Shared mock seams and helpers for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use roomlink_client_core::{
    AudioBoard, AudioCodec, ClientConfig, ClientResult, ConnectionState, ConnectionTimeouts,
    MeetingClient, PeerConnection, PeerConnectionFactory, PeerId, PeerRole, ProtocolError,
    ResourceError, RetryConfig, RoomId, SessionConfig, SignalingApi, TransportError,
};

/// How a mock connection behaves at each establishment phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectBehavior {
    /// Pair and handshake immediately
    Establish,
    /// Never complete candidate pairing
    HangInPairing,
    /// Fail candidate pairing outright
    FailPairing,
    /// Fail the DTLS handshake
    FailHandshake,
}

pub struct MockConnection {
    behavior: ConnectBehavior,
}

#[async_trait]
impl PeerConnection for MockConnection {
    async fn pair_candidates(&mut self) -> Result<(), TransportError> {
        match self.behavior {
            ConnectBehavior::Establish | ConnectBehavior::FailHandshake => Ok(()),
            ConnectBehavior::HangInPairing => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            ConnectBehavior::FailPairing => Err(TransportError::CandidatePairing {
                reason: "no viable candidate pair".into(),
            }),
        }
    }

    async fn handshake(&mut self) -> Result<(), TransportError> {
        match self.behavior {
            ConnectBehavior::FailHandshake => Err(TransportError::DtlsHandshake {
                reason: "bad certificate".into(),
            }),
            _ => Ok(()),
        }
    }

    async fn close(&mut self) {}
}

/// How the mock factory itself behaves on `create`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateBehavior {
    /// Hand out a connection
    Succeed,
    /// Report a peer-stack initialization failure
    FailInit,
    /// Report transport resource exhaustion
    Exhausted,
    /// Never return, to hold the caller's lifecycle mutex
    Hang,
}

pub struct MockFactory {
    pub connect: ConnectBehavior,
    pub create: CreateBehavior,
    /// Subscribe targets that resolve to a remote participant
    pub known_remotes: Vec<String>,
    pub created: AtomicUsize,
}

impl MockFactory {
    pub fn establishing() -> Self {
        Self {
            connect: ConnectBehavior::Establish,
            create: CreateBehavior::Succeed,
            known_remotes: vec!["remote-speaker".to_string()],
            created: AtomicUsize::new(0),
        }
    }

    pub fn with_connect(connect: ConnectBehavior) -> Self {
        Self {
            connect,
            ..Self::establishing()
        }
    }

    pub fn with_create(create: CreateBehavior) -> Self {
        Self {
            create,
            ..Self::establishing()
        }
    }
}

#[async_trait]
impl PeerConnectionFactory for MockFactory {
    async fn create(
        &self,
        role: PeerRole,
        _local: &PeerId,
        remote: Option<&PeerId>,
    ) -> Result<Box<dyn PeerConnection>, TransportError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        match self.create {
            CreateBehavior::Succeed => {}
            CreateBehavior::FailInit => {
                return Err(TransportError::Init {
                    reason: "srtp profile rejected".into(),
                })
            }
            CreateBehavior::Exhausted => {
                return Err(TransportError::ResourceExhausted {
                    resource: "task buffers".into(),
                })
            }
            CreateBehavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }

        // A subscribe target nobody publishes under never finds a pair.
        let behavior = match (role, remote) {
            (PeerRole::Subscriber, Some(remote_id))
                if !self.known_remotes.iter().any(|r| r == remote_id.as_str()) =>
            {
                ConnectBehavior::FailPairing
            }
            _ => self.connect,
        };
        Ok(Box::new(MockConnection { behavior }))
    }
}

/// How the mock signaling service answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingBehavior {
    /// Accept the configured token
    Accept,
    /// Fail with a retryable server error
    ServerError,
}

pub struct MockSignaling {
    pub valid_token: String,
    pub room_id: String,
    pub behavior: SignalingBehavior,
    pub attempts: AtomicUsize,
}

impl MockSignaling {
    pub fn accepting(token: &str) -> Self {
        Self {
            valid_token: token.to_string(),
            room_id: "room-1".to_string(),
            behavior: SignalingBehavior::Accept,
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: SignalingBehavior::ServerError,
            ..Self::accepting("t")
        }
    }
}

#[async_trait]
impl SignalingApi for MockSignaling {
    async fn create_room(&self, token: &str) -> ClientResult<RoomId> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            SignalingBehavior::ServerError => Err(ProtocolError::HttpRequest {
                reason: "503 service unavailable".into(),
            }
            .into()),
            SignalingBehavior::Accept if token == self.valid_token => {
                Ok(RoomId::new(self.room_id.clone()))
            }
            SignalingBehavior::Accept => Err(ProtocolError::HttpRejected { status: 401 }.into()),
        }
    }
}

/// Audio board whose failures are scripted per test.
#[derive(Debug, Clone)]
pub struct MockBoard {
    pub supported: Vec<AudioCodec>,
    pub fail_board: bool,
    pub fail_codec: bool,
}

impl MockBoard {
    pub fn ok() -> Self {
        Self {
            supported: AudioCodec::SUPPORTED.to_vec(),
            fail_board: false,
            fail_codec: false,
        }
    }
}

#[async_trait]
impl AudioBoard for MockBoard {
    fn supported_codecs(&self) -> Vec<AudioCodec> {
        self.supported.clone()
    }

    async fn init_board(&self) -> ClientResult<()> {
        if self.fail_board {
            return Err(ResourceError::BoardInit {
                reason: "i2s bring-up failed".into(),
            }
            .into());
        }
        Ok(())
    }

    async fn init_codec(&self, codec: AudioCodec) -> ClientResult<()> {
        if self.fail_codec {
            return Err(ResourceError::CodecInit {
                reason: format!("{} pipeline rejected", codec),
            }
            .into());
        }
        Ok(())
    }
}

/// Short, test-friendly timeouts.
pub fn test_config() -> ClientConfig {
    ClientConfig::new()
        .with_signaling_timeout(Duration::from_millis(250))
        .with_connection_timeouts(ConnectionTimeouts {
            candidate_pairing: Duration::from_millis(100),
            dtls_handshake: Duration::from_millis(100),
        })
        .with_stop_timeout(Duration::from_millis(500))
        .with_retry(RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            backoff_multiplier: 2.0,
        })
}

pub fn test_session_config() -> SessionConfig {
    SessionConfig::new("m1", "t", "d", AudioCodec::Opus)
}

/// Client wired to the given factory with accepting signaling and a healthy
/// board.
pub fn client_with_factory(factory: MockFactory) -> MeetingClient {
    MeetingClient::with_parts(
        test_config(),
        Arc::new(MockSignaling::accepting("t")),
        Arc::new(MockBoard::ok()),
        Arc::new(factory),
    )
}

/// Client with every seam supplied by the caller.
pub fn client_with(
    signaling: MockSignaling,
    board: MockBoard,
    factory: MockFactory,
) -> MeetingClient {
    MeetingClient::with_parts(
        test_config(),
        Arc::new(signaling),
        Arc::new(board),
        Arc::new(factory),
    )
}

/// Poll until the task for `role` reaches `want`, or give up after a second.
pub async fn wait_for_state(
    client: &MeetingClient,
    role: PeerRole,
    want: ConnectionState,
) -> bool {
    for _ in 0..100 {
        if client.connection_state(role).await == Some(want) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Start publish, retrying briefly while the previous task finishes
/// unwinding.
pub async fn start_publish_eventually(client: &MeetingClient, id: &str) -> ClientResult<()> {
    let mut last = client.start_publish_audio(id).await;
    for _ in 0..40 {
        match &last {
            Ok(()) => return Ok(()),
            Err(e) if e.code() == roomlink_client_core::ResultCode::TaskAlreadyStarted => {
                tokio::time::sleep(Duration::from_millis(25)).await;
                last = client.start_publish_audio(id).await;
            }
            Err(_) => return last,
        }
    }
    last
}
