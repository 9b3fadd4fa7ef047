use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::codec::{decode_frame, Frame, FrameLayout};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete fixed-size frames from any `Read` stream.
///
/// Handles partial reads internally; callers only ever see whole frames.
/// End of input ends the sequence cleanly. Bytes left over that do not fill a
/// frame are discarded and reported through [`FrameReader::trailing_bytes`].
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    layout: FrameLayout,
    next_index: u64,
    finished: bool,
    trailing: usize,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with the default layout.
    pub fn new(inner: T) -> Self {
        Self::with_layout(inner, FrameLayout::default())
    }

    /// Create a new frame reader with an explicit layout.
    pub fn with_layout(inner: T, layout: FrameLayout) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            layout,
            next_index: 0,
            finished: false,
            trailing: 0,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Ok(None)` once the input is exhausted.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(data) = decode_frame(&mut self.buf, &self.layout) {
                let frame = Frame::from_parts(self.next_index, data, &self.layout);
                self.next_index += 1;
                return Ok(Some(frame));
            }

            if self.finished {
                return Ok(None);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                self.finish();
                return Ok(None);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.trailing = self.buf.len();
        if self.trailing > 0 {
            warn!(
                trailing_bytes = self.trailing,
                frame_size = self.layout.frame_size(),
                "discarding partial frame at end of stream"
            );
            self.buf.clear();
        }
        debug!(frames = self.next_index, "end of frame stream");
    }

    /// Frames produced so far.
    pub fn frames_read(&self) -> u64 {
        self.next_index
    }

    /// Bytes discarded at end of stream because they did not fill a frame.
    pub fn trailing_bytes(&self) -> usize {
        self.trailing
    }
}

impl<T: Read> Iterator for FrameReader<T> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_frame().transpose()
    }
}
