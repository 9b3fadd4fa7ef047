//! Lossless capture and dropped-frame diagnostics for I2S audio bridged onto UDP.
//!
//! Upstream hardware packs multi-channel I2S frames into UDP datagrams. i2scap
//! persists them byte-exact, decodes the capture into fixed-size frames,
//! detects frames lost in transit from a sequence counter the hardware embeds
//! in one sample slot, and strips frames down to a channel subset for playback.
//!
//! # Crate Structure
//!
//! - [`transport`]: UDP ingest, capture store, capture sink loop and replay sender
//! - [`frame`]: frame layout, frame reader, loss detector, diagnostic records
//!   and channel extractor

/// Re-export transport types.
pub mod transport {
    pub use i2scap_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use i2scap_frame::*;
}
