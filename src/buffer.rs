//! PCM byte window over the current frame.
//!
//! Holds the decoded bytes of exactly one frame and the read cursor into them.

/// Decoded bytes of the current frame plus the read position.
#[derive(Debug, Default)]
pub struct SampleBuffer {
    /// Interleaved PCM bytes of the current frame.
    samples: Vec<u8>,
    /// Current read position, always `<= samples.len()`.
    pos: usize,
}

impl SampleBuffer {
    pub fn new() -> Self {
        SampleBuffer {
            samples: Vec::new(),
            pos: 0,
        }
    }

    /// Take the next byte, or None if the frame is exhausted.
    pub fn next_byte(&mut self) -> Option<u8> {
        let b = *self.samples.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    /// Copy as many unread bytes as fit into `out`. Returns the number copied.
    pub fn copy_to(&mut self, out: &mut [u8]) -> usize {
        let tail = self.unread();
        let n = tail.len().min(out.len());
        out[..n].copy_from_slice(&tail[..n]);
        self.pos += n;
        n
    }

    /// Unread bytes of the current frame.
    pub fn unread(&self) -> &[u8] {
        &self.samples[self.pos..]
    }

    /// Reset for the next frame and hand out the storage to be refilled.
    ///
    /// The allocation is kept so consecutive frames reuse it.
    pub fn refill(&mut self) -> &mut Vec<u8> {
        self.samples.clear();
        self.pos = 0;
        &mut self.samples
    }

    /// Whether all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.samples.len()
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.pos
    }

    /// Mark everything as consumed.
    pub fn consume_all(&mut self) {
        self.pos = self.samples.len();
    }
}
