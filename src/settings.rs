//! Settings for the bundled MP3 frame decoder.

use crate::header::{FRAME_HEADER_LEN, MAX_FRAME_LEN};

/// Smallest input window: two of the largest frames plus the next header,
/// enough for the decoder to confirm sync.
pub const MIN_WINDOW: usize = 2 * MAX_FRAME_LEN + FRAME_HEADER_LEN;

/// Input buffering and sync behavior of [`Mp3Decoder`](crate::Mp3Decoder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderSettings {
    /// Bytes requested from the reader per refill.
    /// Default: 4096.
    pub read_chunk: usize,

    /// Encoded bytes kept buffered ahead of the decoder, so that it always
    /// sees whole frames (the largest layer 1/2/3 frame is under 3 KiB).
    /// Values below [`MIN_WINDOW`] are raised to it.
    /// Default: 16384.
    pub min_window: usize,

    /// Skip a leading ID3v2 tag before looking for the first frame.
    /// Default: true.
    pub skip_id3v2: bool,

    /// Give up looking for the first frame unless it ends within this many
    /// input bytes. `None` scans the whole input.
    /// Default: None.
    pub max_sync_scan: Option<usize>,
}

impl Default for DecoderSettings {
    fn default() -> Self {
        Self {
            read_chunk: 4096,
            min_window: 16 * 1024,
            skip_id3v2: true,
            max_sync_scan: None,
        }
    }
}

impl DecoderSettings {
    /// Create default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the refill chunk size. Zero is bumped to one byte.
    pub fn with_read_chunk(mut self, bytes: usize) -> Self {
        self.read_chunk = bytes.max(1);
        self
    }

    /// Set the minimum number of buffered input bytes, at least [`MIN_WINDOW`].
    pub fn with_min_window(mut self, bytes: usize) -> Self {
        self.min_window = bytes.max(MIN_WINDOW);
        self
    }

    /// Enable or disable ID3v2 tag skipping.
    pub fn with_skip_id3v2(mut self, skip: bool) -> Self {
        self.skip_id3v2 = skip;
        self
    }

    /// Bound the initial sync search.
    pub fn with_max_sync_scan(mut self, bytes: Option<usize>) -> Self {
        self.max_sync_scan = bytes;
        self
    }
}
