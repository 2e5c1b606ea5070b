//! Client and session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use roomlink_peer_core::ConnectionTimeouts;

use crate::codec::AudioCodec;
use crate::error::{ClientError, ClientResult};

/// Retry policy for signaling requests (exponential backoff).
///
/// Applies to meeting creation only; media connections are never restarted
/// automatically, since a terminal connection requires a fresh start call.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Ceiling for the backoff delay
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

/// Client-wide configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the signaling service
    pub signaling_url: String,
    /// Total bound on one signaling request
    pub signaling_timeout: Duration,
    /// Retry policy for meeting creation
    pub retry: RetryConfig,
    /// Phase timeouts for connection establishment
    pub connection_timeouts: ConnectionTimeouts,
    /// Bound on waiting for a task to acknowledge shutdown
    pub stop_timeout: Duration,
    /// Capacity of the client event channel
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: "https://api.roomlink.dev".to_string(),
            signaling_timeout: Duration::from_secs(15),
            retry: RetryConfig::default(),
            connection_timeouts: ConnectionTimeouts::default(),
            stop_timeout: Duration::from_secs(5),
            event_capacity: 64,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signaling_url(mut self, url: impl Into<String>) -> Self {
        self.signaling_url = url.into();
        self
    }

    pub fn with_signaling_timeout(mut self, timeout: Duration) -> Self {
        self.signaling_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_connection_timeouts(mut self, timeouts: ConnectionTimeouts) -> Self {
        self.connection_timeouts = timeouts;
        self
    }

    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }
}

/// Per-meeting session configuration, consumed by `init`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub meeting_id: String,
    pub token: String,
    pub display_name: String,
    pub audio_codec: AudioCodec,
}

impl SessionConfig {
    pub fn new(
        meeting_id: impl Into<String>,
        token: impl Into<String>,
        display_name: impl Into<String>,
        audio_codec: AudioCodec,
    ) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            token: token.into(),
            display_name: display_name.into(),
            audio_codec,
        }
    }

    /// All string fields are required; an empty one is reported before any
    /// other init work happens.
    pub fn validate(&self) -> ClientResult<()> {
        if self.meeting_id.is_empty() {
            return Err(ClientError::null_parameter("meeting_id"));
        }
        if self.token.is_empty() {
            return Err(ClientError::null_parameter("token"));
        }
        if self.display_name.is_empty() {
            return Err(ClientError::null_parameter("display_name"));
        }
        Ok(())
    }
}
