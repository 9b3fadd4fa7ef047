use std::fs::File;
use std::io;
use std::time::Duration;

use i2scap_transport::DatagramSender;

use crate::cmd::ReplayArgs;
use crate::exit::{io_error, transport_error, CliResult, SUCCESS};
use crate::output::{write_summary, OutputFormat, ReplaySummary};

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let input = File::open(&args.input)
        .map_err(|err| io_error(&format!("cannot open {}", args.input.display()), err))?;

    let sender =
        DatagramSender::connect(args.target).map_err(|err| transport_error("connect failed", err))?;
    let interval = args.interval_us.map(Duration::from_micros);
    let stats = sender
        .send_stream(input, args.datagram_size, interval)
        .map_err(|err| transport_error("replay failed", err))?;

    let summary = ReplaySummary::new(sender.target().to_string(), stats);
    write_summary(&mut io::stdout().lock(), &summary, format)
        .map_err(|err| io_error("failed writing summary", err))?;

    Ok(SUCCESS)
}
