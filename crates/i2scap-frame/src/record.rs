use std::fmt;

use crate::codec::Frame;
use crate::detect::Observation;

/// Lowercase hex rendering of a byte slice, two digits per byte.
pub struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// One line of decoder output: a frame plus what the loss detector made of it.
///
/// `Display` renders the text form:
///
/// ```text
/// 00000042 00a1b2c3 ffffffff 0000002a lost 3 frames
/// ```
///
/// The index is zero-padded to eight digits, followed by every sample slot in
/// hex, followed by the loss annotation when frames were lost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    frame: Frame,
    observation: Observation,
}

impl DiagnosticRecord {
    pub fn new(frame: Frame, observation: Observation) -> Self {
        Self { frame, observation }
    }

    pub fn index(&self) -> u64 {
        self.frame.index()
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn observation(&self) -> Observation {
        self.observation
    }

    /// Frames lost just before this one, if any.
    pub fn lost_frames(&self) -> Option<u64> {
        self.observation.lost_frames()
    }

    /// Hex string of every sample slot, in slot order.
    pub fn hex_samples(&self) -> Vec<String> {
        self.frame
            .samples()
            .map(|sample| Hex(sample).to_string())
            .collect()
    }
}

impl fmt::Display for DiagnosticRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08}", self.frame.index())?;
        for sample in self.frame.samples() {
            write!(f, " {}", Hex(sample))?;
        }
        match self.lost_frames() {
            Some(1) => write!(f, " lost 1 frame"),
            Some(lost) => write!(f, " lost {lost} frames"),
            None => Ok(()),
        }
    }
}
