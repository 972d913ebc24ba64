//! Sequential PCM byte reader over MPEG audio (layer 1/2/3) elementary streams.
//!
//! MPEG audio decodes one frame at a time; [`MpaReader`] hides that and serves
//! the decoded PCM as a plain byte stream, decoding the next frame only when
//! the current one has been read to its end. The bitstream decoding itself
//! sits behind the [`FrameDecoder`] trait; [`Mp3Decoder`] is the bundled
//! implementation on top of `nanomp3`.
//!
//! Output is interleaved signed 16-bit little-endian PCM.
//!
//! # Example
//!
//! ```no_run
//! use mpa_rs::MpaReader;
//!
//! let mut reader = MpaReader::open("track.mp3").unwrap();
//! println!("{}Hz, stereo: {}", reader.sample_rate(), reader.is_stereo());
//!
//! let mut pcm = Vec::new();
//! let written = reader.decode_all(&mut pcm).unwrap();
//! assert_eq!(written as usize, pcm.len());
//! ```

mod buffer;
mod decode;
pub mod error;
mod frame;
mod header;
mod settings;

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use tracing::{debug, warn};

use buffer::SampleBuffer;

pub use decode::{BYTES_PER_SAMPLE, Mp3Decoder};
pub use error::MpaError;
pub use frame::{Channels, FrameDecoder, StreamParams};
pub use settings::{DecoderSettings, MIN_WINDOW};

/// Metadata about the decoded PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpaInfo {
    /// Sample rate in Hz (e.g. 44100).
    pub sample_rate: u32,
    pub channels: Channels,
    /// Bits per output sample.
    pub bits_per_sample: u16,
}

/// A byte-stream view of the PCM decoded from an MPEG audio stream.
///
/// Reads are served from the current frame's samples; the next frame is
/// decoded only once those run out. Once the decoder has no more frames (or
/// fails mid-stream) the reader is exhausted and every read reports end of
/// stream.
pub struct MpaReader<D: FrameDecoder> {
    /// None once closed. Owns the input source.
    decoder: Option<D>,
    /// None once exhausted or closed.
    frame: Option<SampleBuffer>,
    info: MpaInfo,
}

impl MpaReader<Mp3Decoder<BufReader<File>>> {
    /// Open an MPEG audio file by path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MpaError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read> MpaReader<Mp3Decoder<R>> {
    /// Create a reader from any `Read` source, using the bundled decoder.
    ///
    /// Decodes the first frame immediately. Fails with
    /// [`MpaError::NoMpegData`] if the source holds no MPEG audio frame.
    pub fn new(reader: R) -> Result<Self, MpaError> {
        Self::with_settings(reader, DecoderSettings::default())
    }

    pub fn with_settings(reader: R, settings: DecoderSettings) -> Result<Self, MpaError> {
        Self::with_decoder(Mp3Decoder::with_settings(reader, settings))
    }
}

impl<D: FrameDecoder> MpaReader<D> {
    /// Create a reader over an arbitrary frame decoder.
    pub fn with_decoder(mut decoder: D) -> Result<Self, MpaError> {
        let mut frame = SampleBuffer::new();
        let params = decoder
            .initiate(frame.refill())?
            .ok_or(MpaError::NoMpegData)?;

        debug!(
            sample_rate = params.sample_rate,
            channels = params.channels.count(),
            first_frame_bytes = frame.remaining(),
            "MPEG audio stream found"
        );

        Ok(MpaReader {
            decoder: Some(decoder),
            frame: Some(frame),
            info: MpaInfo {
                sample_rate: params.sample_rate,
                channels: params.channels,
                bits_per_sample: (BYTES_PER_SAMPLE * 8) as u16,
            },
        })
    }

    /// Get metadata about the PCM stream.
    pub fn info(&self) -> &MpaInfo {
        &self.info
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    pub fn channels(&self) -> Channels {
        self.info.channels
    }

    pub fn is_stereo(&self) -> bool {
        self.info.channels == Channels::Stereo
    }

    /// Read one byte, decoding the next frame if the current one is used up.
    ///
    /// Returns `None` at end of stream, and keeps returning `None` after.
    pub fn read_byte(&mut self) -> Option<u8> {
        loop {
            let frame = self.frame.as_mut()?;
            if let Some(b) = frame.next_byte() {
                return Some(b);
            }
            if !self.advance() {
                return None;
            }
        }
    }

    /// Read up to `count` bytes into `buf[offset..offset + count]`.
    ///
    /// Returns the number of bytes copied, which is less than `count` only
    /// when the stream ended during the call, or `None` if the stream was
    /// already at its end. A `count` of zero returns `Some(0)` without
    /// touching any state.
    pub fn read_into(
        &mut self,
        buf: &mut [u8],
        offset: usize,
        count: usize,
    ) -> Result<Option<usize>, MpaError> {
        let end = offset
            .checked_add(count)
            .filter(|&end| end <= buf.len())
            .ok_or(MpaError::InvalidArgument {
                offset,
                count,
                len: buf.len(),
            })?;
        if count == 0 {
            return Ok(Some(0));
        }
        if self.frame.is_none() {
            return Ok(None);
        }

        let n = self.fill(&mut buf[offset..end]);
        Ok((n > 0).then_some(n))
    }

    /// Bytes that can be read without decoding another frame.
    pub fn available(&self) -> usize {
        self.frame.as_ref().map_or(0, SampleBuffer::remaining)
    }

    /// Write the rest of the stream into `sink`, returning the byte count.
    ///
    /// Leaves the reader exhausted, including when `sink` fails.
    pub fn decode_all<W: Write>(&mut self, mut sink: W) -> Result<u64, MpaError> {
        let Some(mut frame) = self.frame.take() else {
            return Ok(0);
        };

        let mut written = frame.remaining() as u64;
        sink.write_all(frame.unread())?;
        frame.consume_all();

        if let Some(decoder) = self.decoder.as_mut() {
            while step(decoder, &mut frame) {
                sink.write_all(frame.unread())?;
                written += frame.remaining() as u64;
            }
        }

        debug!(written, "decoded stream to end");
        Ok(written)
    }

    /// Release the input source and drop the decoded samples.
    ///
    /// Later reads report end of stream. Calling this again does nothing.
    pub fn close(&mut self) {
        self.frame = None;
        if let Some(decoder) = self.decoder.take() {
            drop(decoder);
            debug!("reader closed");
        }
    }

    /// Take back the frame decoder, and with it the input source.
    ///
    /// Returns `None` if the reader was closed.
    pub fn into_inner(mut self) -> Option<D> {
        self.frame = None;
        self.decoder.take()
    }

    /// Whether the stream has ended or the reader was closed.
    pub fn is_exhausted(&self) -> bool {
        self.frame.is_none()
    }

    /// Copy into `out` until it is full or the stream ends.
    fn fill(&mut self, out: &mut [u8]) -> usize {
        let mut filled = 0;
        while filled < out.len() {
            let Some(frame) = self.frame.as_mut() else {
                break;
            };
            if frame.is_empty() {
                if !self.advance() {
                    break;
                }
                continue;
            }
            filled += frame.copy_to(&mut out[filled..]);
        }
        filled
    }

    /// Decode the next frame into the window. On failure the reader becomes
    /// exhausted.
    fn advance(&mut self) -> bool {
        let decoded = match (self.decoder.as_mut(), self.frame.as_mut()) {
            (Some(decoder), Some(frame)) => step(decoder, frame),
            _ => false,
        };
        if !decoded {
            self.frame = None;
        }
        decoded
    }
}

/// Decode one frame into `frame`. Mid-stream errors end the stream.
fn step<D: FrameDecoder>(decoder: &mut D, frame: &mut SampleBuffer) -> bool {
    match decoder.decode_frame(frame.refill()) {
        Ok(true) => true,
        Ok(false) => {
            debug!("end of MPEG audio stream");
            false
        }
        Err(e) => {
            warn!(error = %e, "frame decode failed, treating as end of stream");
            false
        }
    }
}

impl<D: FrameDecoder> Read for MpaReader<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.fill(buf))
    }
}

impl<D: FrameDecoder> std::fmt::Debug for MpaReader<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MpaReader")
            .field("info", &self.info)
            .field("available", &self.available())
            .field("closed", &self.decoder.is_none())
            .finish()
    }
}
