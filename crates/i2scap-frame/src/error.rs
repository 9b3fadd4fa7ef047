/// Errors that can occur while configuring or running frame decoding.
///
/// Every configuration variant is raised before any byte is read, so a
/// running decoder never has to guess how to interpret a slot.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Samples must be at least one byte wide.
    #[error("sample size must be at least 1 byte")]
    ZeroSampleSize,

    /// Frames must hold at least one sample.
    #[error("samples per frame must be at least 1")]
    ZeroSamplesPerFrame,

    /// `sample_size * samples_per_frame` exceeds the frame size limit.
    #[error("frame of {samples_per_frame} samples x {sample_size} bytes exceeds {max} bytes")]
    FrameTooLarge {
        sample_size: usize,
        samples_per_frame: usize,
        max: usize,
    },

    /// A marker or counter slot index is outside the frame.
    #[error("{role} slot {slot} is out of range (frame has {samples_per_frame} slots)")]
    SlotOutOfRange {
        role: &'static str,
        slot: usize,
        samples_per_frame: usize,
    },

    /// Marker and counter were configured on the same slot.
    #[error("marker and counter cannot share slot {0}")]
    SlotConflict(usize),

    /// The sentinel pattern is not exactly one sample wide.
    #[error("sentinel is {len} bytes, expected one sample ({sample_size} bytes)")]
    SentinelLength { len: usize, sample_size: usize },

    /// The counter width does not fit the counter slot.
    #[error("counter width {bits} bits is outside 1..={max} bits")]
    CounterWidth { bits: u32, max: u32 },

    /// The extractor prefix is empty or longer than a frame.
    #[error("keep prefix {keep} bytes is outside 1..={frame_size} bytes")]
    KeepPrefix { keep: usize, frame_size: usize },

    /// Frame data does not match the layout's frame size.
    #[error("frame data is {len} bytes, layout expects {expected}")]
    FrameLength { len: usize, expected: usize },

    /// An I/O error occurred while reading frames or writing output.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
