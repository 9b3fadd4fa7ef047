use std::io::{Read, Write};

use tracing::debug;

use crate::codec::FrameLayout;
use crate::error::{FrameError, Result};
use crate::reader::FrameReader;

/// Default bytes kept per frame: the first two 32-bit channels.
pub const DEFAULT_KEEP_PREFIX: usize = 8;

/// Counters for a finished extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Frames forwarded.
    pub frames: u64,
    /// Bytes written to the output.
    pub bytes_written: u64,
    /// Input bytes dropped at the end because they did not fill a frame.
    pub trailing_bytes: usize,
}

/// Forwards the leading `keep_prefix` bytes of every frame, for playback.
///
/// Each prefix is written and flushed as soon as its frame is complete, so
/// output latency stays around one frame period regardless of input length.
#[derive(Debug, Clone, Copy)]
pub struct ChannelExtractor {
    layout: FrameLayout,
    keep_prefix: usize,
}

impl ChannelExtractor {
    /// Create an extractor keeping `keep_prefix` bytes of each `layout` frame.
    pub fn new(layout: FrameLayout, keep_prefix: usize) -> Result<Self> {
        if keep_prefix == 0 || keep_prefix > layout.frame_size() {
            return Err(FrameError::KeepPrefix {
                keep: keep_prefix,
                frame_size: layout.frame_size(),
            });
        }
        Ok(Self {
            layout,
            keep_prefix,
        })
    }

    /// Copy frame prefixes from `input` to `output` until `input` ends.
    pub fn run<R: Read, W: Write>(&self, input: R, mut output: W) -> Result<ExtractStats> {
        let mut reader = FrameReader::with_layout(input, self.layout);
        let mut stats = ExtractStats::default();

        while let Some(frame) = reader.read_frame()? {
            output.write_all(&frame.as_bytes()[..self.keep_prefix])?;
            output.flush()?;
            stats.frames += 1;
            stats.bytes_written += self.keep_prefix as u64;
        }

        stats.trailing_bytes = reader.trailing_bytes();
        debug!(
            frames = stats.frames,
            bytes_written = stats.bytes_written,
            trailing_bytes = stats.trailing_bytes,
            "extraction finished"
        );
        Ok(stats)
    }
}
