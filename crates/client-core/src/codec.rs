//! Audio codec negotiation
//!
//! The codec requested at init time is validated against the board's
//! supported set before any network or crypto work begins, so a bad request
//! fails fast instead of after a wasted handshake.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Audio codecs the client can negotiate.
///
/// Discriminants are part of the wire contract (PCMA = 0, PCMU = 1,
/// OPUS = 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AudioCodec {
    /// G.711 A-law
    Pcma = 0,
    /// G.711 mu-law
    Pcmu = 1,
    /// Opus
    Opus = 2,
}

impl AudioCodec {
    /// Every codec this client knows how to negotiate.
    pub const SUPPORTED: [AudioCodec; 3] = [Self::Pcma, Self::Pcmu, Self::Opus];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Pcma => "PCMA",
            Self::Pcmu => "PCMU",
            Self::Opus => "OPUS",
        }
    }

    /// RTP payload number (static for G.711, the conventional dynamic
    /// number for Opus).
    pub fn payload_type(&self) -> u8 {
        match self {
            Self::Pcma => 8,
            Self::Pcmu => 0,
            Self::Opus => 111,
        }
    }

    pub fn clock_rate(&self) -> u32 {
        match self {
            Self::Pcma | Self::Pcmu => 8000,
            Self::Opus => 48000,
        }
    }

    pub fn channels(&self) -> u8 {
        match self {
            Self::Pcma | Self::Pcmu => 1,
            Self::Opus => 2,
        }
    }

    /// Decode a wire discriminant; unknown values are a negotiation failure
    /// reported as device-not-supported.
    pub fn from_wire(value: u8) -> ClientResult<Self> {
        match value {
            0 => Ok(Self::Pcma),
            1 => Ok(Self::Pcmu),
            2 => Ok(Self::Opus),
            other => Err(ClientError::device_not_supported(format!(
                "unknown audio codec value {}",
                other
            ))),
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Negotiated parameters for the session's audio path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatedAudio {
    pub codec: AudioCodec,
    pub payload_type: u8,
    pub clock_rate: u32,
    pub channels: u8,
}

/// Validates codec requests against the set the audio path can actually run.
#[derive(Debug, Clone)]
pub struct CodecNegotiator {
    supported: Vec<AudioCodec>,
}

impl CodecNegotiator {
    /// Negotiator over the full supported table.
    pub fn new() -> Self {
        Self {
            supported: AudioCodec::SUPPORTED.to_vec(),
        }
    }

    /// Negotiator restricted to what a particular board supports.
    pub fn with_supported(supported: Vec<AudioCodec>) -> Self {
        Self { supported }
    }

    /// Validate `requested` and fix the audio-path parameters.
    pub fn negotiate(&self, requested: AudioCodec) -> ClientResult<NegotiatedAudio> {
        if !self.supported.contains(&requested) {
            return Err(ClientError::device_not_supported(format!(
                "audio codec {} not supported on this device",
                requested
            )));
        }
        Ok(NegotiatedAudio {
            codec: requested,
            payload_type: requested.payload_type(),
            clock_rate: requested.clock_rate(),
            channels: requested.channels(),
        })
    }
}

impl Default for CodecNegotiator {
    fn default() -> Self {
        Self::new()
    }
}
