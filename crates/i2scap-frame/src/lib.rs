//! Fixed-size sample frame decoding for I2S audio captures.
//!
//! A capture is a plain byte stream of back-to-back frames. Each frame is
//! `samples_per_frame` samples of `sample_size` bytes, one per channel slot,
//! with no header and no padding:
//! - [`FrameReader`] cuts a stream into indexed [`Frame`]s
//! - [`LossDetector`] follows a hardware sequence counter carried in one slot
//!   and reports gaps between marker frames
//! - [`FrameDecoder`] combines both into a stream of [`DiagnosticRecord`]s
//! - [`ChannelExtractor`] forwards a leading byte range of each frame for playback
//!
//! Every stage takes the same [`FrameLayout`]. A trailing partial frame is
//! never treated as a frame.

pub mod codec;
pub mod decoder;
pub mod detect;
pub mod error;
pub mod extract;
pub mod reader;
pub mod record;

#[cfg(feature = "async")]
pub use codec::FixedFrameCodec;
pub use codec::{
    decode_frame, Frame, FrameLayout, DEFAULT_SAMPLES_PER_FRAME, DEFAULT_SAMPLE_SIZE,
    MAX_FRAME_SIZE,
};
pub use decoder::{DecodeSummary, FrameDecoder};
pub use detect::{ByteOrder, CounterConfig, LossDetector, LossSummary, Observation};
pub use error::{FrameError, Result};
pub use extract::{ChannelExtractor, ExtractStats, DEFAULT_KEEP_PREFIX};
pub use reader::FrameReader;
pub use record::{DiagnosticRecord, Hex};
