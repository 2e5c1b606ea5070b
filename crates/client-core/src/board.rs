//! Audio board seam
//!
//! The physical audio path (codec chip, I2S wiring, DMA buffers) belongs to
//! a platform layer. The client only needs to know whether the platform can
//! be brought up and which codecs its hardware path supports.

use async_trait::async_trait;

use crate::codec::AudioCodec;
use crate::error::ClientResult;

/// Platform audio hardware as seen by the session manager.
///
/// Implementations report an unsupported platform distinctly from a board
/// that exists but failed to initialize, and a board that came up but whose
/// codec path would not.
#[async_trait]
pub trait AudioBoard: Send + Sync {
    /// Codecs the board's audio path can run.
    fn supported_codecs(&self) -> Vec<AudioCodec>;

    /// Bring the board up. Called once per `init`.
    async fn init_board(&self) -> ClientResult<()>;

    /// Prepare the board's codec path for the negotiated codec.
    async fn init_codec(&self, codec: AudioCodec) -> ClientResult<()>;
}

/// Board implementation for hosted (non-embedded) targets.
///
/// Supports the full codec table and performs no hardware setup; embedded
/// targets provide their own implementation.
#[derive(Debug, Default, Clone)]
pub struct HostBoard;

#[async_trait]
impl AudioBoard for HostBoard {
    fn supported_codecs(&self) -> Vec<AudioCodec> {
        AudioCodec::SUPPORTED.to_vec()
    }

    async fn init_board(&self) -> ClientResult<()> {
        Ok(())
    }

    async fn init_codec(&self, _codec: AudioCodec) -> ClientResult<()> {
        Ok(())
    }
}
