use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::Path;

use i2scap_frame::{FrameDecoder, FrameError};
use tracing::debug;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{write_summary, DecodeReport, OutputFormat, RecordPrinter};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let live = is_stdin(&args.input);
    if live && format == OutputFormat::Table {
        return Err(CliError::new(
            USAGE,
            "table output buffers every record; use text or json to decode stdin",
        ));
    }
    let layout = args.layout.layout()?;
    let input = open_input(&args.input)?;

    let mut decoder = match args.counter.config() {
        Some(counter) => FrameDecoder::with_counter(input, layout, counter)
            .map_err(|err| frame_error("invalid counter configuration", err))?,
        None => FrameDecoder::new(input, layout),
    };

    let stdout = io::stdout().lock();
    let mut printer = RecordPrinter::new(BufWriter::new(stdout), format).with_flush_each(live);

    while let Some(record) = decoder
        .next_record()
        .map_err(|err| frame_error("decode failed", err))?
    {
        if let Err(err) = printer.print(&record) {
            return stdout_closed(err);
        }
    }

    let mut out = match printer.finish() {
        Ok(out) => out,
        Err(err) => return stdout_closed(err),
    };

    if args.summary {
        let report = DecodeReport::from(decoder.summary());
        if let Err(err) = write_summary(&mut out, &report, format) {
            return stdout_closed(err);
        }
    }

    Ok(SUCCESS)
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn open_input(path: &Path) -> CliResult<Box<dyn Read>> {
    if is_stdin(path) {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path)
        .map_err(|err| io_error(&format!("cannot open {}", path.display()), err))?;
    Ok(Box::new(file))
}

/// A reader that stops listening (`| head`) ends the run without an error.
fn stdout_closed(err: io::Error) -> CliResult<i32> {
    if err.kind() == io::ErrorKind::BrokenPipe {
        debug!("stdout closed, stopping decode");
        return Ok(SUCCESS);
    }
    Err(frame_error("failed writing records", FrameError::Io(err)))
}
