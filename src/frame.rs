//! The frame decoder seam between the byte window and the bitstream decoder.

use crate::error::MpaError;

/// Channel mode of an MPEG audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channels {
    Mono,
    Stereo,
}

impl Channels {
    /// Number of interleaved channels in the PCM output.
    pub fn count(self) -> u16 {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

/// Stream parameters reported when the first frame is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    pub channels: Channels,
}

/// A stateful decoder producing one frame of PCM bytes per step.
///
/// The caller owns the sample buffer and lends it for every call. Implementors
/// clear and refill it; whatever is left in it after a call is the PCM of
/// exactly one frame.
pub trait FrameDecoder {
    /// Locate the stream and decode its first frame into `samples`.
    ///
    /// Returns `Ok(None)` when the input holds no decodable frame.
    fn initiate(&mut self, samples: &mut Vec<u8>) -> Result<Option<StreamParams>, MpaError>;

    /// Decode the next frame into `samples`.
    ///
    /// Returns `Ok(false)` once no further frame can be decoded.
    fn decode_frame(&mut self, samples: &mut Vec<u8>) -> Result<bool, MpaError>;
}
