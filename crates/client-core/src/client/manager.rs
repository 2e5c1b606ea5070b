//! Meeting client
//!
//! [`MeetingClient`] is the entry point for one device's meeting presence:
//! create a meeting over signaling, initialize a session against it, start
//! and stop the publish/subscribe audio tasks, and leave. One client holds
//! at most one session; concurrent sessions are concurrent clients.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use roomlink_peer_core::{ConnectionState, PeerConnectionFactory, PeerId, PeerRole};

use crate::board::{AudioBoard, HostBoard};
use crate::codec::{CodecNegotiator, NegotiatedAudio};
use crate::config::{ClientConfig, SessionConfig};
use crate::error::{ClientError, ClientResult, ProtocolError, UsageError};
use crate::events::{ClientEvent, EventEmitter};
use crate::signaling::{retry_with_backoff, HttpSignalingApi, RoomId, SignalingApi};

use super::tasks::{PeerTaskController, TaskSnapshot};

/// An initialized meeting session.
#[derive(Debug, Clone)]
pub struct Session {
    meeting_id: String,
    display_name: String,
    negotiated: NegotiatedAudio,
}

impl Session {
    pub fn meeting_id(&self) -> &str {
        &self.meeting_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Audio parameters fixed at init time.
    pub fn negotiated_audio(&self) -> NegotiatedAudio {
        self.negotiated
    }
}

/// High-level meeting audio client.
///
/// Owns the session, the signaling backend, the audio board seam, and the
/// publish/subscribe task controller. Every operation returns a
/// [`ClientResult`]; the wire code for a failure is available through
/// [`ClientError::code`].
///
/// # Examples
///
/// ```no_run
/// use roomlink_client_core::{AudioCodec, ClientResult, MeetingClient, SessionConfig};
///
/// async fn join_and_publish(client: &MeetingClient) -> ClientResult<()> {
///     let room = client.create_meeting("device-token").await?;
///     let config = SessionConfig::new(room.as_str(), "device-token", "kitchen-panel", AudioCodec::Opus);
///     client.init(config).await?;
///
///     client.start_publish_audio("kitchen-panel").await?;
///     // ... audio flows until we are done ...
///     client.stop_publish_audio().await?;
///     client.leave().await?;
///     Ok(())
/// }
/// ```
pub struct MeetingClient {
    config: ClientConfig,
    signaling: Arc<dyn SignalingApi>,
    board: Arc<dyn AudioBoard>,
    session: RwLock<Option<Session>>,
    tasks: PeerTaskController,
    emitter: EventEmitter,
}

impl MeetingClient {
    /// Create a client with the production HTTP signaling backend and the
    /// host board.
    pub fn new(
        config: ClientConfig,
        factory: Arc<dyn PeerConnectionFactory>,
    ) -> ClientResult<Self> {
        let signaling = Arc::new(HttpSignalingApi::new(
            config.signaling_url.clone(),
            config.signaling_timeout,
        )?);
        Ok(Self::with_parts(config, signaling, Arc::new(HostBoard), factory))
    }

    /// Create a client with explicit signaling and board implementations.
    pub fn with_parts(
        config: ClientConfig,
        signaling: Arc<dyn SignalingApi>,
        board: Arc<dyn AudioBoard>,
        factory: Arc<dyn PeerConnectionFactory>,
    ) -> Self {
        let emitter = EventEmitter::new(config.event_capacity);
        let tasks = PeerTaskController::new(
            factory,
            config.connection_timeouts.clone(),
            config.stop_timeout,
            emitter.clone(),
        );
        Self {
            config,
            signaling,
            board,
            session: RwLock::new(None),
            tasks,
            emitter,
        }
    }

    /// Subscribe to the client's event stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.emitter.subscribe()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Ask the conference service for a new meeting room.
    ///
    /// Bounded by the configured signaling timeout and retried with
    /// exponential backoff. An invalid token surfaces as a non-OK code and
    /// no room id is produced.
    pub async fn create_meeting(&self, token: &str) -> ClientResult<RoomId> {
        if token.is_empty() {
            return Err(ClientError::null_parameter("token"));
        }
        let result =
            retry_with_backoff(&self.config.retry, || self.signaling.create_room(token)).await;
        match &result {
            Ok(room) => info!("created meeting room {}", room),
            Err(e) => {
                warn!("create_meeting failed: {}", e);
                self.emit_failure(e);
            }
        }
        result
    }

    /// Initialize a session against a meeting.
    ///
    /// Validates the config, brings up the audio board, and negotiates the
    /// requested codec, in that order, so an unsupported platform or codec
    /// fails before any connection work. On success the session is ready
    /// and audio tasks may start.
    pub async fn init(&self, session_config: SessionConfig) -> ClientResult<()> {
        let result = self.try_init(&session_config).await;
        if let Err(e) = &result {
            self.emit_failure(e);
        }
        result
    }

    async fn try_init(&self, config: &SessionConfig) -> ClientResult<()> {
        config.validate()?;

        let mut session = self.session.write().await;
        if let Some(existing) = session.as_ref() {
            return Err(UsageError::AlreadyInitialized {
                meeting_id: existing.meeting_id().to_string(),
            }
            .into());
        }

        self.board.init_board().await?;
        let negotiator = CodecNegotiator::with_supported(self.board.supported_codecs());
        let negotiated = negotiator.negotiate(config.audio_codec)?;
        self.board.init_codec(negotiated.codec).await?;

        info!(
            "session ready for meeting {} as \"{}\" ({})",
            config.meeting_id, config.display_name, negotiated.codec
        );
        *session = Some(Session {
            meeting_id: config.meeting_id.clone(),
            display_name: config.display_name.clone(),
            negotiated,
        });
        drop(session);

        self.emitter.emit(ClientEvent::SessionInitialized {
            meeting_id: config.meeting_id.clone(),
        });
        Ok(())
    }

    /// Start publishing this device's audio under `publisher_id`.
    pub async fn start_publish_audio(&self, publisher_id: &str) -> ClientResult<()> {
        let result = self
            .try_start(PeerRole::Publisher, publisher_id, None)
            .await;
        if let Err(e) = &result {
            self.emit_failure(e);
        }
        result
    }

    /// Start receiving `subscribe_to_id`'s audio under `subscriber_id`.
    pub async fn start_subscribe_audio(
        &self,
        subscriber_id: &str,
        subscribe_to_id: &str,
    ) -> ClientResult<()> {
        let result = self
            .try_start(PeerRole::Subscriber, subscriber_id, Some(subscribe_to_id))
            .await;
        if let Err(e) = &result {
            self.emit_failure(e);
        }
        result
    }

    async fn try_start(
        &self,
        role: PeerRole,
        local_id: &str,
        remote_id: Option<&str>,
    ) -> ClientResult<()> {
        if local_id.is_empty() {
            let field = match role {
                PeerRole::Publisher => "publisher_id",
                PeerRole::Subscriber => "subscriber_id",
            };
            return Err(ClientError::null_parameter(field));
        }
        if let Some(remote) = remote_id {
            if remote.is_empty() {
                return Err(ClientError::null_parameter("subscribe_to_id"));
            }
        }
        self.require_session().await?;
        self.tasks
            .start(role, PeerId::new(local_id), remote_id.map(PeerId::new))
            .await
    }

    /// Stop the publish task. Idempotent.
    pub async fn stop_publish_audio(&self) -> ClientResult<()> {
        self.require_session().await?;
        let result = self.tasks.stop(PeerRole::Publisher).await;
        if let Err(e) = &result {
            self.emit_failure(e);
        }
        result
    }

    /// Stop the subscribe task. Idempotent.
    pub async fn stop_subscribe_audio(&self) -> ClientResult<()> {
        self.require_session().await?;
        let result = self.tasks.stop(PeerRole::Subscriber).await;
        if let Err(e) = &result {
            self.emit_failure(e);
        }
        result
    }

    /// Leave the meeting.
    ///
    /// Stops both tasks idempotently, then releases the session. Best
    /// effort: a task that refuses to shut down is aborted and its state
    /// released before the failure is reported, so nothing leaks either way.
    pub async fn leave(&self) -> ClientResult<()> {
        let meeting_id = {
            let mut session = self.session.write().await;
            match session.take() {
                Some(existing) => existing.meeting_id,
                None => return Err(UsageError::InitNotCalled.into()),
            }
        };

        let teardown = self.tasks.stop_all().await;
        self.emitter.emit(ClientEvent::SessionLeft {
            meeting_id: meeting_id.clone(),
        });

        match teardown {
            Ok(()) => {
                info!("left meeting {}", meeting_id);
                Ok(())
            }
            Err(e) => {
                warn!(
                    "left meeting {} with incomplete teardown: {}",
                    meeting_id, e
                );
                let err: ClientError = ProtocolError::LeaveIncomplete {
                    reason: e.to_string(),
                }
                .into();
                self.emit_failure(&err);
                Err(err)
            }
        }
    }

    /// The active session, if `init` has succeeded and `leave` has not run.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Connection state of the active task for `role`, if any.
    pub async fn connection_state(&self, role: PeerRole) -> Option<ConnectionState> {
        self.tasks.connection_state(role).await
    }

    /// Snapshot of the active publish task.
    pub async fn publish_task(&self) -> Option<TaskSnapshot> {
        self.tasks.snapshot(PeerRole::Publisher).await
    }

    /// Snapshot of the active subscribe task.
    pub async fn subscribe_task(&self) -> Option<TaskSnapshot> {
        self.tasks.snapshot(PeerRole::Subscriber).await
    }

    async fn require_session(&self) -> ClientResult<()> {
        if self.session.read().await.is_none() {
            return Err(UsageError::InitNotCalled.into());
        }
        Ok(())
    }

    fn emit_failure(&self, err: &ClientError) {
        self.emitter
            .emit(ClientEvent::OperationFailed { code: err.code() });
    }
}
