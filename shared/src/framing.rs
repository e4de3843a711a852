//! Newline framing for the inbound snapshot stream

use crate::Snapshot;
use thiserror::Error;

pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum FrameDecodeError {
    #[error("malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("frame exceeds {limit} bytes")]
    Oversized { limit: usize },
}

/// Accumulates raw stream bytes and cuts them into newline-terminated frames.
///
/// A frame that outgrows `max_frame_len` is discarded up to its terminating
/// newline, so one runaway message never poisons the frames after it.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    max_frame_len: usize,
    discarding: bool,
    dropped: u64,
}

impl FrameDecoder {
    pub fn new(max_frame_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_frame_len,
            discarding: false,
            dropped: 0,
        }
    }

    /// Appends `chunk` and returns every frame it completed, in arrival order.
    ///
    /// Blank frames are skipped. Oversized frames come back as errors.
    pub fn split(&mut self, chunk: &[u8]) -> Vec<Result<Vec<u8>, FrameDecodeError>> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let frame = &self.buffer[start..end];
            start = end + 1;

            if self.discarding {
                self.discarding = false;
                continue;
            }
            if frame.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            if frame.len() > self.max_frame_len {
                frames.push(Err(FrameDecodeError::Oversized {
                    limit: self.max_frame_len,
                }));
                continue;
            }
            frames.push(Ok(frame.to_vec()));
        }

        self.buffer.drain(..start);

        if self.buffer.len() > self.max_frame_len {
            self.buffer.clear();
            if !self.discarding {
                self.discarding = true;
                frames.push(Err(FrameDecodeError::Oversized {
                    limit: self.max_frame_len,
                }));
            }
        }

        self.dropped += frames.iter().filter(|f| f.is_err()).count() as u64;
        frames
    }

    /// Splits `chunk` and decodes each completed frame into a [`Snapshot`].
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Result<Snapshot, FrameDecodeError>> {
        let decoded: Vec<_> = self
            .split(chunk)
            .into_iter()
            .map(|frame| frame.and_then(|bytes| decode_frame(&bytes)))
            .collect();

        let malformed = decoded
            .iter()
            .filter(|d| matches!(d, Err(FrameDecodeError::Malformed(_))))
            .count();
        self.dropped += malformed as u64;

        decoded
    }

    /// Bytes received after the last complete frame.
    pub fn remainder(&self) -> &[u8] {
        &self.buffer
    }

    /// Frames dropped so far, oversized and malformed alike.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LEN)
    }
}

pub fn decode_frame(frame: &[u8]) -> Result<Snapshot, FrameDecodeError> {
    Ok(serde_json::from_slice(frame)?)
}
