//! Dropped-frame detection from a hardware sequence counter.
//!
//! The bridge hardware can repurpose two sample slots: a marker slot that
//! holds a fixed sentinel pattern, and a counter slot that then carries a
//! sequence counter of `counter_bits` width. Between two marker frames the
//! counter should advance by exactly one (mod `2^counter_bits`); any other step
//! means frames were lost in between.

use bytes::Bytes;

use crate::codec::{Frame, FrameLayout};
use crate::error::{FrameError, Result};

/// Byte order of the counter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Big,
    Little,
}

/// Where the marker and counter live and how to read the counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterConfig {
    /// Slot that flags a frame as carrying a counter.
    pub marker_slot: usize,
    /// Exact bytes the marker slot holds on counter frames.
    pub sentinel: Bytes,
    /// Slot that carries the counter on marker frames.
    pub counter_slot: usize,
    /// Counter width; the counter wraps at `2^counter_bits`.
    pub counter_bits: u32,
    /// Byte order of the counter slot.
    pub byte_order: ByteOrder,
}

impl CounterConfig {
    /// Check the configuration against a frame layout.
    pub fn validate(&self, layout: &FrameLayout) -> Result<()> {
        let samples_per_frame = layout.samples_per_frame();
        for (role, slot) in [("marker", self.marker_slot), ("counter", self.counter_slot)] {
            if slot >= samples_per_frame {
                return Err(FrameError::SlotOutOfRange {
                    role,
                    slot,
                    samples_per_frame,
                });
            }
        }
        if self.marker_slot == self.counter_slot {
            return Err(FrameError::SlotConflict(self.marker_slot));
        }
        if self.sentinel.len() != layout.sample_size() {
            return Err(FrameError::SentinelLength {
                len: self.sentinel.len(),
                sample_size: layout.sample_size(),
            });
        }

        let max = u32::try_from(layout.sample_size().saturating_mul(8))
            .unwrap_or(u32::MAX)
            .min(u64::BITS);
        if self.counter_bits == 0 || self.counter_bits > max {
            return Err(FrameError::CounterWidth {
                bits: self.counter_bits,
                max,
            });
        }
        Ok(())
    }

    /// Mask selecting the low `counter_bits` bits.
    pub fn counter_mask(&self) -> u64 {
        if self.counter_bits >= u64::BITS {
            u64::MAX
        } else {
            (1u64 << self.counter_bits) - 1
        }
    }
}

/// What the detector concluded about one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The marker slot does not hold the sentinel; no sequence information.
    Unmarked,
    /// First marker frame of the run. Nothing to compare it with.
    First { counter: u64 },
    /// Counter advanced by exactly one.
    InSequence { counter: u64 },
    /// `lost` frames are missing between the previous marker frame and this one.
    Gap { counter: u64, lost: u64 },
}

impl Observation {
    /// Counter value carried by the frame, if it was a marker frame.
    pub fn counter(&self) -> Option<u64> {
        match *self {
            Observation::Unmarked => None,
            Observation::First { counter }
            | Observation::InSequence { counter }
            | Observation::Gap { counter, .. } => Some(counter),
        }
    }

    /// Number of lost frames detected at this frame, if nonzero.
    pub fn lost_frames(&self) -> Option<u64> {
        match *self {
            Observation::Gap { lost, .. } => Some(lost),
            _ => None,
        }
    }
}

/// Running totals for one detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LossSummary {
    /// Frames inspected.
    pub frames: u64,
    /// Frames whose marker slot matched the sentinel.
    pub marker_frames: u64,
    /// Gaps detected.
    pub gap_events: u64,
    /// Sum of all gap sizes.
    pub lost_frames: u64,
}

/// Tracks the sequence counter across one decode run.
///
/// The previous counter value belongs to this instance, so independent runs
/// never share state. It is empty until the first marker frame.
#[derive(Debug, Clone)]
pub struct LossDetector {
    config: CounterConfig,
    mask: u64,
    previous: Option<u64>,
    summary: LossSummary,
}

impl LossDetector {
    /// Create a detector for frames of `layout`.
    pub fn new(config: CounterConfig, layout: &FrameLayout) -> Result<Self> {
        config.validate(layout)?;
        Ok(Self {
            mask: config.counter_mask(),
            config,
            previous: None,
            summary: LossSummary::default(),
        })
    }

    /// Inspect one frame and update the previous counter.
    pub fn observe(&mut self, frame: &Frame) -> Observation {
        self.summary.frames += 1;

        if frame.sample(self.config.marker_slot) != Some(self.config.sentinel.as_ref()) {
            return Observation::Unmarked;
        }
        let Some(slot) = frame.sample(self.config.counter_slot) else {
            return Observation::Unmarked;
        };

        let counter = self.read_counter(slot);
        self.summary.marker_frames += 1;

        let observation = match self.previous {
            None => Observation::First { counter },
            Some(previous) => {
                let lost = counter.wrapping_sub(previous).wrapping_sub(1) & self.mask;
                if lost == 0 {
                    Observation::InSequence { counter }
                } else {
                    self.summary.gap_events += 1;
                    self.summary.lost_frames = self.summary.lost_frames.saturating_add(lost);
                    Observation::Gap { counter, lost }
                }
            }
        };
        self.previous = Some(counter);
        observation
    }

    /// Interpret a counter slot as an unsigned integer of the configured width.
    ///
    /// Slots wider than eight bytes contribute only their eight least
    /// significant bytes.
    pub fn read_counter(&self, slot: &[u8]) -> u64 {
        let accumulate = |acc: u64, byte: &u8| (acc << 8) | u64::from(*byte);
        let value = match self.config.byte_order {
            ByteOrder::Big => slot.iter().fold(0, accumulate),
            ByteOrder::Little => slot.iter().rev().fold(0, accumulate),
        };
        value & self.mask
    }

    /// Last counter value seen, if any marker frame was observed.
    pub fn previous(&self) -> Option<u64> {
        self.previous
    }

    /// Forget the previous counter and totals, as on a decoder restart.
    pub fn reset(&mut self) {
        self.previous = None;
        self.summary = LossSummary::default();
    }

    /// Totals accumulated so far.
    pub fn summary(&self) -> LossSummary {
        self.summary
    }
}
