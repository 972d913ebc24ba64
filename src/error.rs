use std::io;

use thiserror::Error;

/// Errors that can occur while reading PCM from an MPEG audio stream.
#[derive(Debug, Error)]
pub enum MpaError {
    /// No decodable MPEG audio frame header was found in the input.
    #[error("no MPEG audio data in the input stream")]
    NoMpegData,
    /// `offset + count` does not fit inside the target buffer.
    #[error("invalid read range: offset {offset} + count {count} exceeds buffer length {len}")]
    InvalidArgument {
        offset: usize,
        count: usize,
        len: usize,
    },
    /// A wrapped I/O error from the input source or the output sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<MpaError> for io::Error {
    fn from(e: MpaError) -> Self {
        match e {
            MpaError::Io(e) => e,
            MpaError::NoMpegData => io::Error::new(io::ErrorKind::InvalidData, e),
            MpaError::InvalidArgument { .. } => io::Error::new(io::ErrorKind::InvalidInput, e),
        }
    }
}
