//! MP3 frame decoder backed by `nanomp3`.
//!
//! Per-frame pipeline:
//! 1. Keep at least `min_window` encoded bytes buffered from the reader
//! 2. At end of input, drop a trailing ID3v1 tag
//! 3. Hand the window to `nanomp3`, which syncs on the next frame header;
//!    at end of input a failed sync is retried on exactly one frame
//! 4. Drop the consumed bytes (frame data plus any skipped garbage)
//! 5. Convert the `f32` output to interleaved `i16` little-endian PCM

use std::io::{self, Read};

use nanomp3::MAX_SAMPLES_PER_FRAME;
use tracing::{debug, trace};

use crate::error::MpaError;
use crate::frame::{Channels, FrameDecoder, StreamParams};
use crate::header;
use crate::settings::{DecoderSettings, MIN_WINDOW};

/// Bytes per output sample (signed 16-bit).
pub const BYTES_PER_SAMPLE: usize = 2;

/// Frame decoder over any `Read` source of MPEG audio layer 1/2/3 data.
pub struct Mp3Decoder<R: Read> {
    reader: R,
    inner: nanomp3::Decoder,
    /// Encoded bytes read from `reader` but not yet consumed by `inner`.
    input: Vec<u8>,
    /// Whether `reader` has reported end of input.
    eof: bool,
    /// Whether the end of input was checked for an ID3v1 tag.
    tail_checked: bool,
    /// Scratch output for one frame.
    pcm: Box<[f32; MAX_SAMPLES_PER_FRAME]>,
    settings: DecoderSettings,
    frames: u64,
}

impl<R: Read> Mp3Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_settings(reader, DecoderSettings::default())
    }

    pub fn with_settings(reader: R, settings: DecoderSettings) -> Self {
        Mp3Decoder {
            reader,
            inner: nanomp3::Decoder::new(),
            input: Vec::with_capacity(settings.min_window.max(MIN_WINDOW) + settings.read_chunk),
            eof: false,
            tail_checked: false,
            pcm: Box::new([0.0; MAX_SAMPLES_PER_FRAME]),
            settings,
            frames: 0,
        }
    }

    /// Number of frames decoded so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames
    }

    /// Give back the underlying reader. Buffered encoded bytes are lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read from the source until `want` bytes are buffered or it runs dry.
    fn fill_window(&mut self, want: usize) -> io::Result<()> {
        let chunk = self.settings.read_chunk.max(1);
        while !self.eof && self.input.len() < want {
            let start = self.input.len();
            self.input.resize(start + chunk, 0);
            let res = self.reader.read(&mut self.input[start..]);
            match res {
                Ok(0) => {
                    self.input.truncate(start);
                    self.eof = true;
                }
                Ok(n) => self.input.truncate(start + n),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => self.input.truncate(start),
                Err(e) => {
                    self.input.truncate(start);
                    return Err(e);
                }
            }
        }
        if self.eof && !self.tail_checked {
            self.tail_checked = true;
            if header::has_id3v1_tail(&self.input) {
                self.input.truncate(self.input.len() - header::ID3V1_LEN);
                debug!("dropped trailing ID3v1 tag");
            }
        }
        Ok(())
    }

    /// Decode the next frame into `samples`.
    ///
    /// Gives up once more than `scan_limit` input bytes were consumed without
    /// a complete frame ending inside them.
    fn next_frame(
        &mut self,
        samples: &mut Vec<u8>,
        scan_limit: Option<usize>,
    ) -> Result<Option<StreamParams>, MpaError> {
        samples.clear();
        let window = self.settings.min_window.max(MIN_WINDOW);
        let mut want = window;
        let mut scanned = 0usize;

        loop {
            self.fill_window(want)?;
            if self.input.is_empty() && self.eof {
                return Ok(None);
            }
            let (mut consumed, mut info) = self.inner.decode(&self.input, &mut self.pcm[..]);
            if self.eof && !info.as_ref().is_some_and(|i| i.samples_produced > 0) {
                // The sync check wants another header after the frame; the
                // last frame of the input has none, so offer it on its own
                if let Some(len) = header::frame_len(&self.input).filter(|&l| l <= self.input.len()) {
                    (consumed, info) = self.inner.decode(&self.input[..len], &mut self.pcm[..]);
                }
            }
            let consumed = consumed.min(self.input.len());
            self.input.drain(..consumed);
            scanned += consumed;
            if let Some(limit) = scan_limit {
                if scanned > limit {
                    debug!(scanned, limit, "gave up searching for frame sync");
                    return Ok(None);
                }
            }

            // Output-less frames (bit reservoir warm-up, resync) count as skipped
            if let Some(info) = info.filter(|i| i.samples_produced > 0) {
                let channels = if info.channels.num() == 1 {
                    Channels::Mono
                } else {
                    Channels::Stereo
                };
                let n = (info.samples_produced as usize * channels.count() as usize)
                    .min(self.pcm.len());
                samples.reserve(n * BYTES_PER_SAMPLE);
                for &s in &self.pcm[..n] {
                    samples.extend_from_slice(&pcm_to_i16(s).to_le_bytes());
                }
                self.frames += 1;
                trace!(frame = self.frames, bytes = samples.len(), "decoded frame");
                return Ok(Some(StreamParams {
                    sample_rate: info.sample_rate,
                    channels,
                }));
            }

            if consumed == 0 {
                if self.eof {
                    return Ok(None);
                }
                // Partial frame at the end of the window: read further
                want = self.input.len() + self.settings.read_chunk.max(1);
                continue;
            }

            want = window;
        }
    }
}

impl<R: Read> FrameDecoder for Mp3Decoder<R> {
    fn initiate(&mut self, samples: &mut Vec<u8>) -> Result<Option<StreamParams>, MpaError> {
        if self.settings.skip_id3v2 {
            let lookahead = header::skip_id3v2(&mut self.reader)?;
            self.input.extend_from_slice(&lookahead);
        }
        self.next_frame(samples, self.settings.max_sync_scan)
    }

    fn decode_frame(&mut self, samples: &mut Vec<u8>) -> Result<bool, MpaError> {
        Ok(self.next_frame(samples, None)?.is_some())
    }
}

/// Convert a float sample in [-1.0, 1.0] to 16-bit PCM, saturating.
fn pcm_to_i16(s: f32) -> i16 {
    (s * 32768.0).clamp(-32768.0, 32767.0) as i16
}
