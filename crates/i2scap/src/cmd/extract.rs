use std::io;

use i2scap_frame::{ChannelExtractor, FrameError};
use tracing::debug;

use crate::cmd::ExtractArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{write_summary, ExtractSummary, OutputFormat};

pub fn run(args: ExtractArgs, format: OutputFormat) -> CliResult<i32> {
    let layout = args.layout.layout()?;
    let extractor = ChannelExtractor::new(layout, args.keep_prefix)
        .map_err(|err| frame_error("invalid keep prefix", err))?;

    let stats = match extractor.run(io::stdin().lock(), io::stdout().lock()) {
        Ok(stats) => stats,
        Err(FrameError::Io(err)) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!("playback sink closed, stopping extraction");
            return Ok(SUCCESS);
        }
        Err(err) => return Err(frame_error("extraction failed", err)),
    };

    if args.summary {
        write_summary(&mut io::stderr().lock(), &ExtractSummary::from(stats), format)
            .map_err(|err| io_error("failed writing summary", err))?;
    }

    Ok(SUCCESS)
}
