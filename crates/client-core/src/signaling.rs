//! Meeting signaling
//!
//! Meeting creation is the one signaling call the lifecycle core makes
//! itself: ask the conference service for a room, bounded by the configured
//! request timeout and retried with exponential backoff before a failure is
//! reported. Everything else on the signaling plane belongs to the service.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::{ClientError, ClientResult, ProtocolError};

/// Identifier of a created meeting room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signaling operations the session manager depends on.
#[async_trait]
pub trait SignalingApi: Send + Sync {
    /// Create a meeting room, returning its id.
    async fn create_room(&self, token: &str) -> ClientResult<RoomId>;
}

#[derive(Debug, Deserialize)]
struct CreateRoomResponse {
    #[serde(rename = "roomId")]
    room_id: String,
}

/// HTTP signaling backend.
///
/// `POST {base_url}/v2/rooms` with the auth token in the `Authorization`
/// header; the response body carries the room id as JSON. TLS/connect
/// failures are reported distinctly from request failures so callers can
/// tell a broken trust path from a rejected token.
pub struct HttpSignalingApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpSignalingApi {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ProtocolError::HttpRequest {
                reason: e.to_string(),
            })?;
        Ok(Self {
            base_url: base_url.into(),
            http,
        })
    }
}

#[async_trait]
impl SignalingApi for HttpSignalingApi {
    async fn create_room(&self, token: &str) -> ClientResult<RoomId> {
        let url = format!("{}/v2/rooms", self.base_url.trim_end_matches('/'));
        debug!("creating meeting room via {}", url);

        let response = self
            .http
            .post(&url)
            .header("Authorization", token)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            // Server-side failures are worth retrying; a rejected token or
            // bad request is not.
            if status.is_server_error() {
                return Err(ProtocolError::HttpRequest {
                    reason: format!("{} returned {}", url, status),
                }
                .into());
            }
            return Err(ProtocolError::HttpRejected {
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(classify_request_error)?;
        let parsed: CreateRoomResponse =
            serde_json::from_slice(&body).map_err(|e| ProtocolError::HttpRequest {
                reason: format!("malformed room response: {}", e),
            })?;
        Ok(RoomId::new(parsed.room_id))
    }
}

fn classify_request_error(err: reqwest::Error) -> ClientError {
    if err.is_connect() {
        ProtocolError::SslConnect {
            reason: err.to_string(),
        }
        .into()
    } else {
        ProtocolError::HttpRequest {
            reason: err.to_string(),
        }
        .into()
    }
}

/// Run `op` until it succeeds, returns a non-retryable error, or attempts
/// are exhausted, backing off exponentially between attempts.
pub(crate) async fn retry_with_backoff<T, F, Fut>(retry: &RetryConfig, mut op: F) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let mut delay = retry.initial_delay;
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt >= retry.max_attempts.max(1) || !e.is_retryable() => {
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "signaling attempt {}/{} failed, retrying in {}ms: {}",
                    attempt,
                    retry.max_attempts,
                    delay.as_millis(),
                    e
                );
                tokio::time::sleep(delay).await;
                delay = delay.mul_f64(retry.backoff_multiplier).min(retry.max_delay);
                attempt += 1;
            }
        }
    }
}
