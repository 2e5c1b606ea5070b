//! Error taxonomy and wire result codes
//!
//! Errors are grouped into usage, resource, and protocol families so callers
//! can tell a programmer error from a transient local failure from a broken
//! network path. Every error maps onto exactly one wire-stable
//! [`ResultCode`]; the integer values are a compatibility contract with
//! deployed devices and must not be renumbered.

use thiserror::Error;

use roomlink_peer_core::{PeerError, PeerRole, TransportError};

/// Result type alias for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Wire-stable result codes. 0 is success, 3001-3024 are the failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
    Ok = 0,
    SslConnectFailed = 3001,
    HttpRequestFailed = 3002,
    MemoryAllocFailed = 3003,
    DeviceNotSupported = 3004,
    NullParameter = 3005,
    InitBoardFailed = 3006,
    PeerInitFailed = 3007,
    TaskAlreadyStarted = 3008,
    PublishMutexCreateFailed = 3009,
    AudioCodecInitFailed = 3010,
    PublishPeerConnectionFailed = 3011,
    PublishMemoryAllocFailed = 3012,
    PublishTaskCreateFailed = 3013,
    SubscribeMutexCreateFailed = 3014,
    SubscribePeerConnectionFailed = 3015,
    SubscribeMemoryAllocFailed = 3016,
    SubscribeTaskCreateFailed = 3017,
    StopPublishTaskCreateFailed = 3018,
    StopSubscribeTaskCreateFailed = 3019,
    CandidatePairFailed = 3020,
    DtlsHandshakeFailed = 3021,
    LeaveFailed = 3022,
    InitNotCalled = 3023,
    DuplicateId = 3024,
}

impl ResultCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Programmer errors: surfaced immediately, never retried.
#[derive(Debug, Error)]
pub enum UsageError {
    /// A required parameter was empty or absent
    #[error("required parameter is missing: {field}")]
    NullParameter { field: &'static str },

    /// An audio operation was attempted before a successful init
    #[error("init has not been called")]
    InitNotCalled,

    /// init was called again while a session is active
    #[error("session already initialized for meeting {meeting_id}")]
    AlreadyInitialized { meeting_id: String },

    /// A task of this kind is already running
    #[error("{role} task already started")]
    TaskAlreadyStarted { role: PeerRole },

    /// The identity collides with an active participant id
    #[error("identity already in use: {id}")]
    DuplicateId { id: String },
}

/// Local, usually transient failures. The session is left in its prior
/// valid state; no partial task survives the error.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The task-kind lifecycle mutex could not be acquired
    #[error("{role} lifecycle mutex unavailable")]
    MutexUnavailable { role: PeerRole },

    /// The scheduler refused to spawn the task
    #[error("failed to spawn {role} task: {reason}")]
    TaskSpawn { role: PeerRole, reason: String },

    /// Task state could not be allocated
    #[error("{role} task allocation failed: {reason}")]
    Alloc { role: PeerRole, reason: String },

    /// The task did not acknowledge shutdown
    #[error("failed to stop {role} task: {reason}")]
    StopTask { role: PeerRole, reason: String },

    /// The platform cannot run this client at all
    #[error("device not supported: {reason}")]
    DeviceNotSupported { reason: String },

    /// The audio board exists but failed to initialize
    #[error("audio board initialization failed: {reason}")]
    BoardInit { reason: String },

    /// The board's codec path failed to initialize
    #[error("audio codec initialization failed: {reason}")]
    CodecInit { reason: String },
}

/// Network and crypto failures, with signaling kept distinct from the
/// media path so callers can tell which side of the system broke.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// TLS could not be established towards the signaling service
    #[error("TLS connection to signaling failed: {reason}")]
    SslConnect { reason: String },

    /// The signaling HTTP request could not be completed
    #[error("signaling HTTP request failed: {reason}")]
    HttpRequest { reason: String },

    /// The signaling service answered with a client-error status; retrying
    /// the same request cannot help
    #[error("signaling request rejected with status {status}")]
    HttpRejected { status: u16 },

    /// The peer stack could not be brought up
    #[error("peer stack initialization failed: {reason}")]
    PeerInit { reason: String },

    /// The peer connection layer refused the task's connection
    #[error("{role} peer connection failed: {reason}")]
    PeerConnection { role: PeerRole, reason: String },

    /// ICE candidate pairing failed or timed out
    #[error("candidate pairing failed: {reason}")]
    CandidatePairing { reason: String },

    /// The DTLS handshake failed or timed out
    #[error("DTLS handshake failed: {reason}")]
    DtlsHandshake { reason: String },

    /// Session teardown did not complete cleanly
    #[error("session teardown incomplete: {reason}")]
    LeaveIncomplete { reason: String },
}

/// Top-level client error.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ClientError {
    /// The wire code this error reports at the compatibility boundary.
    pub fn code(&self) -> ResultCode {
        match self {
            Self::Usage(e) => match e {
                UsageError::NullParameter { .. } => ResultCode::NullParameter,
                UsageError::InitNotCalled => ResultCode::InitNotCalled,
                UsageError::AlreadyInitialized { .. } => ResultCode::DuplicateId,
                UsageError::TaskAlreadyStarted { .. } => ResultCode::TaskAlreadyStarted,
                UsageError::DuplicateId { .. } => ResultCode::DuplicateId,
            },
            Self::Resource(e) => match e {
                ResourceError::MutexUnavailable { role } => match role {
                    PeerRole::Publisher => ResultCode::PublishMutexCreateFailed,
                    PeerRole::Subscriber => ResultCode::SubscribeMutexCreateFailed,
                },
                ResourceError::TaskSpawn { role, .. } => match role {
                    PeerRole::Publisher => ResultCode::PublishTaskCreateFailed,
                    PeerRole::Subscriber => ResultCode::SubscribeTaskCreateFailed,
                },
                ResourceError::Alloc { role, .. } => match role {
                    PeerRole::Publisher => ResultCode::PublishMemoryAllocFailed,
                    PeerRole::Subscriber => ResultCode::SubscribeMemoryAllocFailed,
                },
                ResourceError::StopTask { role, .. } => match role {
                    PeerRole::Publisher => ResultCode::StopPublishTaskCreateFailed,
                    PeerRole::Subscriber => ResultCode::StopSubscribeTaskCreateFailed,
                },
                ResourceError::DeviceNotSupported { .. } => ResultCode::DeviceNotSupported,
                ResourceError::BoardInit { .. } => ResultCode::InitBoardFailed,
                ResourceError::CodecInit { .. } => ResultCode::AudioCodecInitFailed,
            },
            Self::Protocol(e) => match e {
                ProtocolError::SslConnect { .. } => ResultCode::SslConnectFailed,
                ProtocolError::HttpRequest { .. } | ProtocolError::HttpRejected { .. } => {
                    ResultCode::HttpRequestFailed
                }
                ProtocolError::PeerInit { .. } => ResultCode::PeerInitFailed,
                ProtocolError::PeerConnection { role, .. } => match role {
                    PeerRole::Publisher => ResultCode::PublishPeerConnectionFailed,
                    PeerRole::Subscriber => ResultCode::SubscribePeerConnectionFailed,
                },
                ProtocolError::CandidatePairing { .. } => ResultCode::CandidatePairFailed,
                ProtocolError::DtlsHandshake { .. } => ResultCode::DtlsHandshakeFailed,
                ProtocolError::LeaveIncomplete { .. } => ResultCode::LeaveFailed,
            },
        }
    }

    /// Whether retrying the same operation can plausibly succeed.
    ///
    /// Usage errors and rejected requests never are; transport failures and
    /// mutex contention are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Usage(_) => false,
            Self::Resource(e) => matches!(e, ResourceError::MutexUnavailable { .. }),
            Self::Protocol(e) => matches!(
                e,
                ProtocolError::SslConnect { .. } | ProtocolError::HttpRequest { .. }
            ),
        }
    }

    /// Lift a connection-lifecycle error out of the peer layer.
    pub fn from_peer(role: PeerRole, err: PeerError) -> Self {
        match err {
            PeerError::InitFailed { reason } => ProtocolError::PeerInit { reason }.into(),
            PeerError::CandidatePairFailed { reason } => {
                ProtocolError::CandidatePairing { reason }.into()
            }
            PeerError::DtlsHandshakeFailed { reason } => {
                ProtocolError::DtlsHandshake { reason }.into()
            }
            PeerError::Terminal { state } => ProtocolError::PeerConnection {
                role,
                reason: format!("connection already terminal in state {}", state),
            }
            .into(),
        }
    }

    /// Lift a transport error reported while creating a task's connection.
    pub fn from_transport(role: PeerRole, err: TransportError) -> Self {
        match err {
            TransportError::Init { reason } => ProtocolError::PeerInit { reason }.into(),
            TransportError::ResourceExhausted { resource } => ResourceError::Alloc {
                role,
                reason: format!("transport out of {}", resource),
            }
            .into(),
            other => ProtocolError::PeerConnection {
                role,
                reason: other.to_string(),
            }
            .into(),
        }
    }

    // Convenience constructors for the hot paths.

    pub fn null_parameter(field: &'static str) -> Self {
        UsageError::NullParameter { field }.into()
    }

    pub fn duplicate_id(id: impl Into<String>) -> Self {
        UsageError::DuplicateId { id: id.into() }.into()
    }

    pub fn device_not_supported(reason: impl Into<String>) -> Self {
        ResourceError::DeviceNotSupported {
            reason: reason.into(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_codes_are_stable() {
        let expected = [
            (ResultCode::Ok, 0),
            (ResultCode::SslConnectFailed, 3001),
            (ResultCode::HttpRequestFailed, 3002),
            (ResultCode::MemoryAllocFailed, 3003),
            (ResultCode::DeviceNotSupported, 3004),
            (ResultCode::NullParameter, 3005),
            (ResultCode::InitBoardFailed, 3006),
            (ResultCode::PeerInitFailed, 3007),
            (ResultCode::TaskAlreadyStarted, 3008),
            (ResultCode::PublishMutexCreateFailed, 3009),
            (ResultCode::AudioCodecInitFailed, 3010),
            (ResultCode::PublishPeerConnectionFailed, 3011),
            (ResultCode::PublishMemoryAllocFailed, 3012),
            (ResultCode::PublishTaskCreateFailed, 3013),
            (ResultCode::SubscribeMutexCreateFailed, 3014),
            (ResultCode::SubscribePeerConnectionFailed, 3015),
            (ResultCode::SubscribeMemoryAllocFailed, 3016),
            (ResultCode::SubscribeTaskCreateFailed, 3017),
            (ResultCode::StopPublishTaskCreateFailed, 3018),
            (ResultCode::StopSubscribeTaskCreateFailed, 3019),
            (ResultCode::CandidatePairFailed, 3020),
            (ResultCode::DtlsHandshakeFailed, 3021),
            (ResultCode::LeaveFailed, 3022),
            (ResultCode::InitNotCalled, 3023),
            (ResultCode::DuplicateId, 3024),
        ];
        for (code, value) in expected {
            assert_eq!(code.as_i32(), value, "{:?}", code);
        }
    }

    #[test]
    fn test_role_splits_task_codes() {
        let publish: ClientError = ResourceError::MutexUnavailable {
            role: PeerRole::Publisher,
        }
        .into();
        let subscribe: ClientError = ResourceError::MutexUnavailable {
            role: PeerRole::Subscriber,
        }
        .into();
        assert_eq!(publish.code(), ResultCode::PublishMutexCreateFailed);
        assert_eq!(subscribe.code(), ResultCode::SubscribeMutexCreateFailed);
    }

    #[test]
    fn test_peer_errors_map_to_media_path_codes() {
        let pairing = ClientError::from_peer(
            PeerRole::Publisher,
            PeerError::CandidatePairFailed {
                reason: "timed out".into(),
            },
        );
        assert_eq!(pairing.code(), ResultCode::CandidatePairFailed);

        let handshake = ClientError::from_peer(
            PeerRole::Subscriber,
            PeerError::DtlsHandshakeFailed {
                reason: "alert".into(),
            },
        );
        assert_eq!(handshake.code(), ResultCode::DtlsHandshakeFailed);
    }

    #[test]
    fn test_transport_exhaustion_maps_to_alloc_code() {
        let err = ClientError::from_transport(
            PeerRole::Subscriber,
            TransportError::ResourceExhausted {
                resource: "rx buffers".into(),
            },
        );
        assert_eq!(err.code(), ResultCode::SubscribeMemoryAllocFailed);
    }

    #[test]
    fn test_retryability() {
        assert!(!ClientError::null_parameter("token").is_retryable());
        let http: ClientError = ProtocolError::HttpRequest {
            reason: "503".into(),
        }
        .into();
        assert!(http.is_retryable());
        let pairing: ClientError = ProtocolError::CandidatePairing {
            reason: "timeout".into(),
        }
        .into();
        assert!(!pairing.is_retryable());

        let rejected: ClientError = ProtocolError::HttpRejected { status: 401 }.into();
        assert!(!rejected.is_retryable());
        assert_eq!(rejected.code(), ResultCode::HttpRequestFailed);
    }
}
