mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "i2scap",
    version,
    about = "Capture, decode and check I2S audio bridged onto UDP"
)]
struct Cli {
    /// Output format for records and summaries.
    #[arg(long, value_name = "FORMAT", env = "I2SCAP_FORMAT", default_value = "text", global = true)]
    format: OutputFormat,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", env = "I2SCAP_LOG_FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", env = "I2SCAP_LOG_LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match cmd::run(cli.command, cli.format) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::PathBuf;

    use super::*;
    use crate::cmd::CounterOrder;

    #[test]
    fn capture_defaults_match_reference_receiver() {
        let cli = Cli::try_parse_from(["i2scap", "capture"]).expect("capture args should parse");
        let Command::Capture(args) = cli.command else {
            panic!("expected capture");
        };
        assert_eq!(args.listen_addr(), "0.0.0.0:45678".parse::<SocketAddr>().unwrap());
        assert_eq!(args.output, PathBuf::from("i2s_data.raw"));
        assert_eq!(args.max_datagram, 1280);
        assert_eq!(args.progress_every, 300);
        assert!(!args.append);
        assert!(args.count.is_none());
    }

    #[test]
    fn parses_decode_with_counter_options() {
        let cli = Cli::try_parse_from([
            "i2scap",
            "--format",
            "json",
            "decode",
            "capture.raw",
            "--sample-size",
            "3",
            "--samples-per-frame",
            "4",
            "--sentinel",
            "0x800001",
            "--counter-slot",
            "3",
            "--counter-bits",
            "16",
            "--counter-order",
            "le",
        ])
        .expect("decode args should parse");

        assert_eq!(cli.format, OutputFormat::Json);
        let Command::Decode(args) = cli.command else {
            panic!("expected decode");
        };
        assert_eq!(args.input, PathBuf::from("capture.raw"));
        assert_eq!(args.layout.sample_size, 3);
        assert_eq!(args.counter.sentinel, Some(vec![0x80, 0x00, 0x01]));
        assert_eq!(args.counter.marker_slot, 1);
        assert_eq!(args.counter.counter_slot, 3);
        assert_eq!(args.counter.counter_order, CounterOrder::Le);
    }

    #[test]
    fn rejects_malformed_sentinel() {
        let err = Cli::try_parse_from(["i2scap", "decode", "--sentinel", "80000"])
            .expect_err("odd-length sentinel should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn parses_extract_keep_prefix() {
        let cli = Cli::try_parse_from(["i2scap", "extract", "--keep-prefix", "12"])
            .expect("extract args should parse");
        let Command::Extract(args) = cli.command else {
            panic!("expected extract");
        };
        assert_eq!(args.keep_prefix, 12);
        assert_eq!(args.layout.samples_per_frame, 8);
    }

    #[test]
    fn replay_requires_input() {
        let err = Cli::try_parse_from(["i2scap", "replay"]).expect_err("missing file should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
