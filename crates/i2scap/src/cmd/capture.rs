use std::io;

use i2scap_transport::{
    CaptureSink, CaptureStore, DatagramSocket, SinkConfig, SocketOptions, StoreMode,
};
use tracing::warn;

use crate::cmd::CaptureArgs;
use crate::exit::{io_error, transport_error, CliResult, SUCCESS};
use crate::output::{write_summary, CaptureSummary, OutputFormat};

pub fn run(args: CaptureArgs, format: OutputFormat) -> CliResult<i32> {
    let config = SinkConfig {
        max_datagram_size: args.max_datagram,
        progress_interval: args.progress_every,
    };
    config
        .validate()
        .map_err(|err| transport_error("invalid capture configuration", err))?;

    let options = SocketOptions {
        recv_buffer_size: args.recv_buffer,
    };
    let socket = DatagramSocket::bind(args.listen_addr(), &options)
        .map_err(|err| transport_error("bind failed", err))?;

    let mode = if args.append {
        StoreMode::Append
    } else {
        StoreMode::Truncate
    };
    let store = CaptureStore::open(&args.output, mode)
        .map_err(|err| transport_error("cannot open capture file", err))?
        .with_sync_each(args.sync);

    let mut sink = CaptureSink::new(socket, store, config)
        .map_err(|err| transport_error("invalid capture configuration", err))?;
    let stats = sink.run(args.count).map_err(|err| {
        let partial = sink.stats();
        warn!(
            datagrams = partial.datagrams,
            bytes = partial.bytes,
            "capture stopped early"
        );
        transport_error("capture failed", err)
    })?;

    let summary = CaptureSummary::new(
        sink.get_ref().path().display().to_string(),
        sink.local_addr().to_string(),
        stats,
    );
    write_summary(&mut io::stdout().lock(), &summary, format)
        .map_err(|err| io_error("failed writing summary", err))?;

    Ok(SUCCESS)
}
