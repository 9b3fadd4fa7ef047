use std::ops::Range;
use std::slice::ChunksExact;

use bytes::{Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Default sample width in bytes (one 32-bit TDM slot).
pub const DEFAULT_SAMPLE_SIZE: usize = 4;

/// Default number of samples in a frame.
pub const DEFAULT_SAMPLES_PER_FRAME: usize = 8;

/// Largest accepted frame, in bytes.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Byte layout shared by every stage that reads the frame stream.
///
/// ```text
/// ┌───────────┬───────────┬─────┬───────────┐
/// │ slot 0    │ slot 1    │ ... │ slot N-1  │
/// │ S bytes   │ S bytes   │     │ S bytes   │
/// └───────────┴───────────┴─────┴───────────┘
///  N = samples_per_frame, S = sample_size, frame_size = N * S
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    sample_size: usize,
    samples_per_frame: usize,
}

impl FrameLayout {
    /// Create a layout, rejecting empty samples, empty frames and frames
    /// larger than [`MAX_FRAME_SIZE`].
    pub fn new(sample_size: usize, samples_per_frame: usize) -> Result<Self> {
        if sample_size == 0 {
            return Err(FrameError::ZeroSampleSize);
        }
        if samples_per_frame == 0 {
            return Err(FrameError::ZeroSamplesPerFrame);
        }
        match sample_size.checked_mul(samples_per_frame) {
            Some(frame_size) if frame_size <= MAX_FRAME_SIZE => {}
            _ => {
                return Err(FrameError::FrameTooLarge {
                    sample_size,
                    samples_per_frame,
                    max: MAX_FRAME_SIZE,
                })
            }
        }
        Ok(Self {
            sample_size,
            samples_per_frame,
        })
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }

    /// Bytes per frame.
    pub fn frame_size(&self) -> usize {
        self.sample_size * self.samples_per_frame
    }

    /// Byte range of `slot` within a frame, or `None` past the last slot.
    pub fn slot_range(&self, slot: usize) -> Option<Range<usize>> {
        if slot >= self.samples_per_frame {
            return None;
        }
        let start = slot * self.sample_size;
        Some(start..start + self.sample_size)
    }
}

impl Default for FrameLayout {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            samples_per_frame: DEFAULT_SAMPLES_PER_FRAME,
        }
    }
}

/// One complete frame and its position in the stream.
///
/// The index counts frames as they were decoded, starting at zero. It is
/// unrelated to any sequence counter the hardware embeds in a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    index: u64,
    data: Bytes,
    sample_size: usize,
}

impl Frame {
    /// Build a frame from raw bytes, checking them against `layout`.
    pub fn new(index: u64, data: impl Into<Bytes>, layout: &FrameLayout) -> Result<Self> {
        let data = data.into();
        if data.len() != layout.frame_size() {
            return Err(FrameError::FrameLength {
                len: data.len(),
                expected: layout.frame_size(),
            });
        }
        Ok(Self::from_parts(index, data, layout))
    }

    pub(crate) fn from_parts(index: u64, data: Bytes, layout: &FrameLayout) -> Self {
        debug_assert_eq!(data.len(), layout.frame_size());
        Self {
            index,
            data,
            sample_size: layout.sample_size(),
        }
    }

    /// Zero-based decode position.
    pub fn index(&self) -> u64 {
        self.index
    }

    /// The raw frame bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of sample slots.
    pub fn sample_count(&self) -> usize {
        self.data.len() / self.sample_size
    }

    /// Bytes of the sample at `slot`, or `None` past the last slot.
    pub fn sample(&self, slot: usize) -> Option<&[u8]> {
        let start = slot.checked_mul(self.sample_size)?;
        let end = start.checked_add(self.sample_size)?;
        self.data.get(start..end)
    }

    /// All samples in slot order.
    pub fn samples(&self) -> ChunksExact<'_, u8> {
        self.data.chunks_exact(self.sample_size)
    }
}

/// Split one frame off the front of `src`.
///
/// Returns `None` while fewer than `layout.frame_size()` bytes are buffered;
/// on success the frame bytes are consumed from `src`.
pub fn decode_frame(src: &mut BytesMut, layout: &FrameLayout) -> Option<Bytes> {
    if src.len() < layout.frame_size() {
        return None; // Need more data
    }
    Some(src.split_to(layout.frame_size()).freeze())
}

/// `tokio_util` decoder producing indexed frames from an async byte stream.
///
/// A partial frame left at end of stream is discarded, matching
/// [`FrameReader`](crate::FrameReader).
#[cfg(feature = "async")]
#[derive(Debug, Clone)]
pub struct FixedFrameCodec {
    layout: FrameLayout,
    next_index: u64,
    trailing: usize,
}

#[cfg(feature = "async")]
impl FixedFrameCodec {
    pub fn new(layout: FrameLayout) -> Self {
        Self {
            layout,
            next_index: 0,
            trailing: 0,
        }
    }

    /// Bytes discarded at end of stream because they did not fill a frame.
    pub fn trailing_bytes(&self) -> usize {
        self.trailing
    }
}

#[cfg(feature = "async")]
impl tokio_util::codec::Decoder for FixedFrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        let Some(data) = decode_frame(src, &self.layout) else {
            src.reserve(self.layout.frame_size() - src.len());
            return Ok(None);
        };
        let frame = Frame::from_parts(self.next_index, data, &self.layout);
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if !src.is_empty() {
            self.trailing = src.len();
            tracing::warn!(
                trailing_bytes = self.trailing,
                frame_size = self.layout.frame_size(),
                "discarding partial frame at end of stream"
            );
            src.clear();
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_rejects_degenerate_shapes() {
        assert!(matches!(
            FrameLayout::new(0, 8),
            Err(FrameError::ZeroSampleSize)
        ));
        assert!(matches!(
            FrameLayout::new(3, 0),
            Err(FrameError::ZeroSamplesPerFrame)
        ));
        assert!(matches!(
            FrameLayout::new(usize::MAX, 2),
            Err(FrameError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn layout_rejects_frames_above_limit() {
        assert!(matches!(
            FrameLayout::new(usize::MAX / 4, 1),
            Err(FrameError::FrameTooLarge {
                max: MAX_FRAME_SIZE,
                ..
            })
        ));
        assert!(FrameLayout::new(MAX_FRAME_SIZE + 1, 1).is_err());
        assert!(FrameLayout::new(4, MAX_FRAME_SIZE / 4 + 1).is_err());

        let largest = FrameLayout::new(4, MAX_FRAME_SIZE / 4).unwrap();
        assert_eq!(largest.frame_size(), MAX_FRAME_SIZE);
    }

    #[test]
    fn layout_slot_ranges() {
        let layout = FrameLayout::new(3, 2).unwrap();
        assert_eq!(layout.frame_size(), 6);
        assert_eq!(layout.slot_range(0), Some(0..3));
        assert_eq!(layout.slot_range(1), Some(3..6));
        assert_eq!(layout.slot_range(2), None);
    }

    #[test]
    fn default_layout_is_32_byte_frames() {
        assert_eq!(FrameLayout::default().frame_size(), 32);
    }

    #[test]
    fn decode_needs_full_frame() {
        let layout = FrameLayout::new(3, 2).unwrap();
        let mut buf = BytesMut::from(&[1u8, 2, 3, 4, 5][..]);
        assert!(decode_frame(&mut buf, &layout).is_none());
        assert_eq!(buf.len(), 5);

        buf.extend_from_slice(&[6, 7]);
        let data = decode_frame(&mut buf, &layout).unwrap();
        assert_eq!(data.as_ref(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(buf.as_ref(), &[7]);
    }

    #[test]
    fn frame_exposes_samples_by_slot() {
        let layout = FrameLayout::new(3, 2).unwrap();
        let frame = Frame::new(5, vec![0xAA, 0xBB, 0xCC, 0x01, 0x02, 0x03], &layout).unwrap();

        assert_eq!(frame.index(), 5);
        assert_eq!(frame.sample_count(), 2);
        assert_eq!(frame.sample(0), Some(&[0xAA, 0xBB, 0xCC][..]));
        assert_eq!(frame.sample(1), Some(&[0x01, 0x02, 0x03][..]));
        assert_eq!(frame.sample(2), None);
        assert_eq!(frame.samples().count(), 2);
    }

    #[test]
    fn frame_rejects_wrong_length() {
        let layout = FrameLayout::new(4, 2).unwrap();
        let err = Frame::new(0, vec![0u8; 7], &layout).unwrap_err();
        assert!(matches!(
            err,
            FrameError::FrameLength {
                len: 7,
                expected: 8
            }
        ));
    }

    #[cfg(feature = "async")]
    mod async_codec {
        use futures_util::StreamExt;
        use tokio_util::codec::FramedRead;

        use super::*;

        #[tokio::test]
        async fn frames_async_stream_and_drops_partial_tail() {
            let layout = FrameLayout::new(2, 2).unwrap();
            let wire: Vec<u8> = (0..11u8).collect();

            let mut framed = FramedRead::new(&wire[..], FixedFrameCodec::new(layout));
            let mut frames = Vec::new();
            while let Some(frame) = framed.next().await {
                frames.push(frame.unwrap());
            }

            assert_eq!(frames.len(), 2);
            assert_eq!(frames[0].index(), 0);
            assert_eq!(frames[1].index(), 1);
            assert_eq!(frames[1].as_bytes(), &[4, 5, 6, 7]);
            assert_eq!(framed.decoder().trailing_bytes(), 3);
        }
    }
}
