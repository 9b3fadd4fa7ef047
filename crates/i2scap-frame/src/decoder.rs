use std::io::Read;

use tracing::{debug, info};

use crate::codec::FrameLayout;
use crate::detect::{CounterConfig, LossDetector, LossSummary, Observation};
use crate::error::Result;
use crate::reader::FrameReader;
use crate::record::DiagnosticRecord;

/// Totals for one decode run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Complete frames decoded.
    pub frames: u64,
    /// Bytes discarded at the end because they did not fill a frame.
    pub trailing_bytes: usize,
    /// Sequence counter totals, when loss detection was enabled.
    pub loss: Option<LossSummary>,
}

/// Decodes a byte stream into diagnostic records, one per frame, in order.
///
/// Loss detection is optional: without a [`CounterConfig`] every record is
/// unannotated.
pub struct FrameDecoder<T> {
    reader: FrameReader<T>,
    detector: Option<LossDetector>,
    summarized: bool,
}

impl<T: Read> FrameDecoder<T> {
    /// Decode frames without loss detection.
    pub fn new(inner: T, layout: FrameLayout) -> Self {
        Self {
            reader: FrameReader::with_layout(inner, layout),
            detector: None,
            summarized: false,
        }
    }

    /// Decode frames and track the sequence counter described by `counter`.
    ///
    /// The counter configuration is checked against `layout` before anything
    /// is read.
    pub fn with_counter(inner: T, layout: FrameLayout, counter: CounterConfig) -> Result<Self> {
        let detector = LossDetector::new(counter, &layout)?;
        Ok(Self {
            reader: FrameReader::with_layout(inner, layout),
            detector: Some(detector),
            summarized: false,
        })
    }

    /// Decode the next frame and run it through the detector.
    ///
    /// Returns `Ok(None)` at end of stream.
    pub fn next_record(&mut self) -> Result<Option<DiagnosticRecord>> {
        let Some(frame) = self.reader.read_frame()? else {
            self.log_summary();
            return Ok(None);
        };

        let observation = match self.detector.as_mut() {
            Some(detector) => detector.observe(&frame),
            None => Observation::Unmarked,
        };
        if let Observation::Gap { counter, lost } = observation {
            debug!(frame = frame.index(), counter, lost, "sequence counter gap");
        }

        Ok(Some(DiagnosticRecord::new(frame, observation)))
    }

    fn log_summary(&mut self) {
        if self.summarized {
            return;
        }
        self.summarized = true;

        let summary = self.summary();
        match summary.loss {
            Some(loss) => info!(
                frames = summary.frames,
                trailing_bytes = summary.trailing_bytes,
                marker_frames = loss.marker_frames,
                gap_events = loss.gap_events,
                lost_frames = loss.lost_frames,
                "decode finished"
            ),
            None => info!(
                frames = summary.frames,
                trailing_bytes = summary.trailing_bytes,
                "decode finished"
            ),
        }
    }

    /// Totals so far.
    pub fn summary(&self) -> DecodeSummary {
        DecodeSummary {
            frames: self.reader.frames_read(),
            trailing_bytes: self.reader.trailing_bytes(),
            loss: self.detector.as_ref().map(LossDetector::summary),
        }
    }
}

impl<T: Read> Iterator for FrameDecoder<T> {
    type Item = Result<DiagnosticRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}
