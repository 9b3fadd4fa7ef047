use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use i2scap_frame::{
    ByteOrder, CounterConfig, FrameLayout, DEFAULT_KEEP_PREFIX, DEFAULT_SAMPLES_PER_FRAME,
    DEFAULT_SAMPLE_SIZE,
};
use i2scap_transport::{DEFAULT_MAX_DATAGRAM, DEFAULT_PROGRESS_INTERVAL};

use crate::exit::{frame_error, CliResult};
use crate::output::OutputFormat;

pub mod capture;
pub mod decode;
pub mod extract;
pub mod replay;
pub mod version;

pub const DEFAULT_PORT: u16 = 45678;
pub const DEFAULT_CAPTURE_FILE: &str = "i2s_data.raw";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Receive datagrams and append them verbatim to a capture file.
    Capture(CaptureArgs),
    /// Decode a capture into one diagnostic line per frame.
    Decode(DecodeArgs),
    /// Forward the leading bytes of each frame from stdin to stdout.
    Extract(ExtractArgs),
    /// Send a capture file to a UDP endpoint in datagram-sized chunks.
    Replay(ReplayArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Capture(args) => capture::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Extract(args) => extract::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Frame geometry shared by decode and extract.
#[derive(Args, Debug, Clone, Copy)]
pub struct LayoutArgs {
    /// Bytes per sample.
    #[arg(long, env = "I2SCAP_SAMPLE_SIZE", default_value_t = DEFAULT_SAMPLE_SIZE)]
    pub sample_size: usize,
    /// Samples (channel slots) per frame.
    #[arg(long, env = "I2SCAP_SAMPLES_PER_FRAME", default_value_t = DEFAULT_SAMPLES_PER_FRAME)]
    pub samples_per_frame: usize,
}

impl LayoutArgs {
    pub fn layout(&self) -> CliResult<FrameLayout> {
        FrameLayout::new(self.sample_size, self.samples_per_frame)
            .map_err(|err| frame_error("invalid frame layout", err))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum CounterOrder {
    Be,
    Le,
}

impl From<CounterOrder> for ByteOrder {
    fn from(order: CounterOrder) -> Self {
        match order {
            CounterOrder::Be => ByteOrder::Big,
            CounterOrder::Le => ByteOrder::Little,
        }
    }
}

/// Sequence counter location. Loss detection runs only when a sentinel is given.
#[derive(Args, Debug, Clone)]
pub struct CounterArgs {
    /// Marker slot pattern in hex (e.g. 0x800001); enables loss detection.
    #[arg(long, env = "I2SCAP_SENTINEL", value_name = "HEX", value_parser = parse_hex)]
    pub sentinel: Option<::std::vec::Vec<u8>>,
    /// Slot holding the sentinel on marker frames.
    #[arg(long, env = "I2SCAP_MARKER_SLOT", default_value_t = 1)]
    pub marker_slot: usize,
    /// Slot holding the sequence counter on marker frames.
    #[arg(long, env = "I2SCAP_COUNTER_SLOT", default_value_t = 2)]
    pub counter_slot: usize,
    /// Counter width in bits; the counter wraps at 2^bits.
    #[arg(long, env = "I2SCAP_COUNTER_BITS", default_value_t = 8)]
    pub counter_bits: u32,
    /// Byte order of the counter slot.
    #[arg(long, env = "I2SCAP_COUNTER_ORDER", value_enum, default_value = "be")]
    pub counter_order: CounterOrder,
}

impl CounterArgs {
    pub fn config(&self) -> Option<CounterConfig> {
        let sentinel = self.sentinel.clone()?;
        Some(CounterConfig {
            marker_slot: self.marker_slot,
            sentinel: sentinel.into(),
            counter_slot: self.counter_slot,
            counter_bits: self.counter_bits,
            byte_order: self.counter_order.into(),
        })
    }
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Address to listen on.
    #[arg(long, env = "I2SCAP_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,
    /// UDP port to listen on.
    #[arg(long, short = 'p', env = "I2SCAP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// Capture file to write.
    #[arg(long, short = 'o', env = "I2SCAP_OUTPUT", default_value = DEFAULT_CAPTURE_FILE)]
    pub output: PathBuf,
    /// Largest datagram accepted; longer datagrams are truncated.
    #[arg(long, env = "I2SCAP_MAX_DATAGRAM", default_value_t = DEFAULT_MAX_DATAGRAM)]
    pub max_datagram: usize,
    /// Append to an existing capture instead of truncating it.
    #[arg(long)]
    pub append: bool,
    /// Sync file data to disk after every datagram.
    #[arg(long)]
    pub sync: bool,
    /// Log progress every N datagrams (0 disables).
    #[arg(long, env = "I2SCAP_PROGRESS_EVERY", default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_every: u64,
    /// Requested kernel receive buffer size in bytes.
    #[arg(long, env = "I2SCAP_RECV_BUFFER", value_name = "BYTES")]
    pub recv_buffer: Option<usize>,
    /// Stop after N datagrams and print a summary.
    #[arg(long)]
    pub count: Option<u64>,
}

impl CaptureArgs {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to decode, or `-` for stdin.
    #[arg(default_value = DEFAULT_CAPTURE_FILE)]
    pub input: PathBuf,
    #[command(flatten)]
    pub layout: LayoutArgs,
    #[command(flatten)]
    pub counter: CounterArgs,
    /// Print decode totals after the records.
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub layout: LayoutArgs,
    /// Leading bytes of each frame to forward.
    #[arg(long, env = "I2SCAP_KEEP_PREFIX", default_value_t = DEFAULT_KEEP_PREFIX)]
    pub keep_prefix: usize,
    /// Print totals to stderr when the input ends.
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture file to send.
    pub input: PathBuf,
    /// Destination address.
    #[arg(long, env = "I2SCAP_TARGET", default_value_t = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT))]
    pub target: SocketAddr,
    /// Payload bytes per datagram.
    #[arg(long, env = "I2SCAP_DATAGRAM_SIZE", default_value_t = DEFAULT_MAX_DATAGRAM)]
    pub datagram_size: usize,
    /// Pause between datagrams, in microseconds.
    #[arg(long, env = "I2SCAP_INTERVAL_US", value_name = "MICROS")]
    pub interval_us: Option<u64>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a hex byte string such as `800001` or `0x80_00_01`.
pub fn parse_hex(input: &str) -> Result<Vec<u8>, String> {
    let trimmed = input.trim();
    let digits: String = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| *c != '_')
        .collect();
    if digits.is_empty() {
        return Err("hex pattern must not be empty".to_string());
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("invalid hex pattern: {input}"));
    }
    if digits.len() % 2 != 0 {
        return Err(format!("hex pattern has an odd number of digits: {input}"));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|err| err.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_accepts_prefix_and_separators() {
        assert_eq!(parse_hex("800001").unwrap(), vec![0x80, 0x00, 0x01]);
        assert_eq!(parse_hex("0xDEAD_beef").unwrap(), vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn parse_hex_rejects_bad_input() {
        assert!(parse_hex("").is_err());
        assert!(parse_hex("0x").is_err());
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
        assert!(parse_hex("éé").is_err());
    }

    #[test]
    fn parse_hex_strips_one_prefix_only() {
        assert_eq!(parse_hex("0X8001").unwrap(), vec![0x80, 0x01]);
        assert!(parse_hex("0x0x8001").is_err());
        assert!(parse_hex("0X0x8001").is_err());
    }

    #[test]
    fn oversized_layout_is_a_usage_error() {
        let args = LayoutArgs {
            sample_size: usize::MAX / 4,
            samples_per_frame: 1,
        };
        let err = args.layout().unwrap_err();
        assert_eq!(err.code, crate::exit::USAGE);
        assert!(err.message.starts_with("invalid frame layout"));
    }

    #[test]
    fn counter_config_only_with_sentinel() {
        let mut args = CounterArgs {
            sentinel: None,
            marker_slot: 1,
            counter_slot: 2,
            counter_bits: 8,
            counter_order: CounterOrder::Le,
        };
        assert!(args.config().is_none());

        args.sentinel = Some(vec![0x80, 0, 0, 1]);
        let config = args.config().unwrap();
        assert_eq!(config.sentinel.as_ref(), &[0x80, 0, 0, 1]);
        assert_eq!(config.byte_order, ByteOrder::Little);
        assert!(config.validate(&FrameLayout::default()).is_ok());
    }
}
