//! Publish/subscribe task lifecycles
//!
//! One spawned task per active role. Start and stop for a given role are
//! serialized by that role's lifecycle mutex; the identity registry spans
//! both roles so a colliding participant id is rejected before any peer
//! work happens. A task's connection state is written only by the task's
//! own driver and read elsewhere through its watch channel.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use roomlink_peer_core::{
    ConnectionDriver, ConnectionState, ConnectionTimeouts, PeerConnectionFactory, PeerId, PeerRole,
};

use crate::error::{ClientError, ClientResult, ResourceError, UsageError};
use crate::events::{ClientEvent, EventEmitter};

/// Identifier of one spawned audio task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-in-time view of an active task, for status reporting.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    pub task_id: TaskId,
    pub peer_id: PeerId,
    pub remote_peer_id: Option<PeerId>,
    pub state: ConnectionState,
}

/// State owned by one live publish or subscribe task.
struct AudioTask {
    task_id: TaskId,
    peer_id: PeerId,
    remote_peer_id: Option<PeerId>,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Controls the publish and subscribe task lifecycles for one session.
pub(crate) struct PeerTaskController {
    factory: Arc<dyn PeerConnectionFactory>,
    timeouts: ConnectionTimeouts,
    stop_timeout: Duration,
    emitter: EventEmitter,
    publish: Mutex<Option<AudioTask>>,
    subscribe: Mutex<Option<AudioTask>>,
    /// Active participant identities across both roles
    identities: DashMap<String, PeerRole>,
}

impl PeerTaskController {
    pub(crate) fn new(
        factory: Arc<dyn PeerConnectionFactory>,
        timeouts: ConnectionTimeouts,
        stop_timeout: Duration,
        emitter: EventEmitter,
    ) -> Self {
        Self {
            factory,
            timeouts,
            stop_timeout,
            emitter,
            publish: Mutex::new(None),
            subscribe: Mutex::new(None),
            identities: DashMap::new(),
        }
    }

    fn slot(&self, role: PeerRole) -> &Mutex<Option<AudioTask>> {
        match role {
            PeerRole::Publisher => &self.publish,
            PeerRole::Subscriber => &self.subscribe,
        }
    }

    /// Start the task for `role`.
    ///
    /// The lifecycle mutex is taken without waiting: contention with another
    /// start/stop in flight is a reported, retryable error rather than a
    /// block. On any failure path no task is left registered.
    pub(crate) async fn start(
        &self,
        role: PeerRole,
        peer_id: PeerId,
        remote: Option<PeerId>,
    ) -> ClientResult<()> {
        let mut guard = self
            .slot(role)
            .try_lock()
            .map_err(|_| ResourceError::MutexUnavailable { role })?;

        if let Some(task) = guard.as_ref() {
            if !task.handle.is_finished() {
                return Err(UsageError::TaskAlreadyStarted { role }.into());
            }
        }
        if let Some(prev) = guard.take() {
            // Terminal task that was never stopped; release its identities
            // so the fresh start below sees a clean registry.
            self.deregister(&prev);
            debug!("{} task {} replaced after terminal connection", role, prev.task_id);
        }

        if let Some(ref remote_id) = remote {
            if remote_id.as_str() == peer_id.as_str() {
                return Err(ClientError::duplicate_id(peer_id.as_str()));
            }
            if self.identities.contains_key(remote_id.as_str()) {
                return Err(ClientError::duplicate_id(remote_id.as_str()));
            }
        }
        if self.identities.contains_key(peer_id.as_str()) {
            return Err(ClientError::duplicate_id(peer_id.as_str()));
        }

        let conn = self
            .factory
            .create(role, &peer_id, remote.as_ref())
            .await
            .map_err(|e| ClientError::from_transport(role, e))?;
        let driver = ConnectionDriver::new(conn, self.timeouts.clone());
        let state_rx = driver.state_receiver();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Spawning needs a live runtime; its absence is the scheduler
        // rejecting the task.
        let runtime = Handle::try_current().map_err(|e| ResourceError::TaskSpawn {
            role,
            reason: e.to_string(),
        })?;

        let task_id = TaskId::new();
        let handle = runtime.spawn(run_audio_task(
            driver,
            shutdown_rx,
            self.emitter.clone(),
            role,
            peer_id.clone(),
            task_id,
        ));

        self.identities.insert(peer_id.as_str().to_string(), role);
        if let Some(ref remote_id) = remote {
            self.identities.insert(remote_id.as_str().to_string(), role);
        }

        info!("started {} task {} for {}", role, task_id, peer_id);
        *guard = Some(AudioTask {
            task_id,
            peer_id,
            remote_peer_id: remote,
            state_rx,
            shutdown_tx,
            handle,
        });
        Ok(())
    }

    /// Stop the task for `role`, waiting for it to acknowledge shutdown.
    ///
    /// Idempotent: stopping an absent task succeeds. Even when the join
    /// fails, the task's identities are released and its state is gone, so
    /// a failed stop never leaks a slot.
    pub(crate) async fn stop(&self, role: PeerRole) -> ClientResult<()> {
        let mut guard = match timeout(self.stop_timeout, self.slot(role).lock()).await {
            Ok(guard) => guard,
            Err(_) => {
                return Err(ResourceError::StopTask {
                    role,
                    reason: "lifecycle mutex busy".to_string(),
                }
                .into())
            }
        };

        let Some(task) = guard.take() else {
            debug!("stop {}: no task active", role);
            return Ok(());
        };

        let _ = task.shutdown_tx.send(true);
        let mut handle = task.handle;
        let joined = timeout(self.stop_timeout, &mut handle).await;

        self.identities.remove(task.peer_id.as_str());
        if let Some(ref remote_id) = task.remote_peer_id {
            self.identities.remove(remote_id.as_str());
        }
        self.emitter.emit(ClientEvent::TaskStopped {
            role,
            peer_id: task.peer_id.clone(),
        });

        match joined {
            Ok(Ok(())) => {
                info!("stopped {} task {}", role, task.task_id);
                Ok(())
            }
            Ok(Err(join_err)) => Err(ResourceError::StopTask {
                role,
                reason: join_err.to_string(),
            }
            .into()),
            Err(_) => {
                // The task never acknowledged; cut it loose rather than leak.
                handle.abort();
                warn!(
                    "{} task {} did not acknowledge shutdown within {}ms, aborted",
                    role,
                    task.task_id,
                    self.stop_timeout.as_millis()
                );
                Err(ResourceError::StopTask {
                    role,
                    reason: format!(
                        "no shutdown acknowledgement within {}ms",
                        self.stop_timeout.as_millis()
                    ),
                }
                .into())
            }
        }
    }

    /// Stop both tasks; each stop is idempotent so this is safe whatever
    /// subset is running.
    pub(crate) async fn stop_all(&self) -> ClientResult<()> {
        let publish = self.stop(PeerRole::Publisher).await;
        let subscribe = self.stop(PeerRole::Subscriber).await;
        publish.and(subscribe)
    }

    /// Synchronized read of a task's connection state.
    pub(crate) async fn connection_state(&self, role: PeerRole) -> Option<ConnectionState> {
        let guard = self.slot(role).lock().await;
        guard.as_ref().map(|task| *task.state_rx.borrow())
    }

    /// Point-in-time view of the active task for `role`.
    pub(crate) async fn snapshot(&self, role: PeerRole) -> Option<TaskSnapshot> {
        let guard = self.slot(role).lock().await;
        guard.as_ref().map(|task| TaskSnapshot {
            task_id: task.task_id,
            peer_id: task.peer_id.clone(),
            remote_peer_id: task.remote_peer_id.clone(),
            state: *task.state_rx.borrow(),
        })
    }

    fn deregister(&self, task: &AudioTask) {
        self.identities.remove(task.peer_id.as_str());
        if let Some(ref remote_id) = task.remote_peer_id {
            self.identities.remove(remote_id.as_str());
        }
    }
}

/// Body of a spawned audio task: establish, hold until asked to stop,
/// then close.
async fn run_audio_task(
    mut driver: ConnectionDriver,
    mut shutdown_rx: watch::Receiver<bool>,
    emitter: EventEmitter,
    role: PeerRole,
    peer_id: PeerId,
    task_id: TaskId,
) {
    let state_rx = driver.state_receiver();
    let forwarder = tokio::spawn(forward_connection_states(
        state_rx,
        emitter.clone(),
        role,
        peer_id.clone(),
    ));

    match driver.establish().await {
        Ok(()) => {
            debug!("{} task {} established", role, task_id);
            // Hold the media path open until stop or leave asks us to go.
            while !*shutdown_rx.borrow() {
                if shutdown_rx.changed().await.is_err() {
                    break;
                }
            }
            driver.close().await;
        }
        Err(e) => {
            warn!("{} task {} failed to establish: {}", role, task_id, e);
            emitter.emit(ClientEvent::OperationFailed {
                code: ClientError::from_peer(role, e).code(),
            });
        }
    }

    // The connection is terminal either way, so the forwarder has exited.
    let _ = forwarder.await;
}

/// Forward connection state changes onto the client event stream until the
/// connection reaches a terminal state.
async fn forward_connection_states(
    mut state_rx: watch::Receiver<ConnectionState>,
    emitter: EventEmitter,
    role: PeerRole,
    peer_id: PeerId,
) {
    loop {
        let state = *state_rx.borrow_and_update();
        if state != ConnectionState::Idle {
            emitter.emit(ClientEvent::ConnectionStateChanged {
                role,
                peer_id: peer_id.clone(),
                state,
            });
        }
        if state.is_terminal() {
            break;
        }
        if state_rx.changed().await.is_err() {
            break;
        }
    }
}
