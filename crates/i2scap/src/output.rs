use std::io::{self, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use i2scap_frame::{DecodeSummary, DiagnosticRecord, ExtractStats};
use i2scap_transport::{SendStats, SinkStats};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One diagnostic line per frame; `key: value` summaries.
    Text,
    /// One JSON object per line.
    Json,
    /// Tables, printed once the input ends. Finite inputs only.
    Table,
}

#[derive(Serialize)]
struct RecordOutput {
    index: u64,
    samples: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    counter: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lost_frames: Option<u64>,
}

impl From<&DiagnosticRecord> for RecordOutput {
    fn from(record: &DiagnosticRecord) -> Self {
        Self {
            index: record.index(),
            samples: record.hex_samples(),
            counter: record.observation().counter(),
            lost_frames: record.lost_frames(),
        }
    }
}

/// Writes diagnostic records in the selected format.
pub struct RecordPrinter<W: Write> {
    out: W,
    format: OutputFormat,
    table: Option<Table>,
    flush_each: bool,
}

impl<W: Write> RecordPrinter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            table: None,
            flush_each: false,
        }
    }

    /// Flush after every text or json record, for live input.
    pub fn with_flush_each(mut self, flush_each: bool) -> Self {
        self.flush_each = flush_each;
        self
    }

    pub fn print(&mut self, record: &DiagnosticRecord) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(self.out, "{record}")?;
                self.flush_if_live()
            }
            OutputFormat::Json => {
                let line =
                    serde_json::to_string(&RecordOutput::from(record)).map_err(io::Error::other)?;
                writeln!(self.out, "{line}")?;
                self.flush_if_live()
            }
            OutputFormat::Table => {
                let samples = record.hex_samples();
                let table = self
                    .table
                    .get_or_insert_with(|| record_table(samples.len()));
                let mut row = Vec::with_capacity(samples.len() + 2);
                row.push(format!("{:08}", record.index()));
                row.extend(samples);
                row.push(
                    record
                        .lost_frames()
                        .map(|lost| lost.to_string())
                        .unwrap_or_default(),
                );
                table.add_row(row);
                Ok(())
            }
        }
    }

    fn flush_if_live(&mut self) -> io::Result<()> {
        if self.flush_each {
            self.out.flush()?;
        }
        Ok(())
    }

    /// Print any buffered table and flush.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(table) = self.table.take() {
            writeln!(self.out, "{table}")?;
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

fn record_table(slots: usize) -> Table {
    let mut header = Vec::with_capacity(slots + 2);
    header.push("FRAME".to_string());
    header.extend((0..slots).map(|slot| format!("SLOT {slot}")));
    header.push("LOST".to_string());

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// A command's closing report.
pub trait Summary: Serialize {
    fn rows(&self) -> Vec<(&'static str, String)>;
}

#[derive(Serialize)]
pub struct CaptureSummary {
    pub output: String,
    pub local_addr: String,
    pub datagrams: u64,
    pub bytes: u64,
    pub truncated: u64,
    pub largest_datagram: usize,
}

impl CaptureSummary {
    pub fn new(output: String, local_addr: String, stats: SinkStats) -> Self {
        Self {
            output,
            local_addr,
            datagrams: stats.datagrams,
            bytes: stats.bytes,
            truncated: stats.truncated,
            largest_datagram: stats.largest,
        }
    }
}

impl Summary for CaptureSummary {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("output", self.output.clone()),
            ("local_addr", self.local_addr.clone()),
            ("datagrams", self.datagrams.to_string()),
            ("bytes", self.bytes.to_string()),
            ("truncated", self.truncated.to_string()),
            ("largest_datagram", self.largest_datagram.to_string()),
        ]
    }
}

#[derive(Serialize)]
pub struct DecodeReport {
    pub frames: u64,
    pub trailing_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker_frames: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_events: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lost_frames: Option<u64>,
}

impl From<DecodeSummary> for DecodeReport {
    fn from(summary: DecodeSummary) -> Self {
        Self {
            frames: summary.frames,
            trailing_bytes: summary.trailing_bytes,
            marker_frames: summary.loss.map(|loss| loss.marker_frames),
            gap_events: summary.loss.map(|loss| loss.gap_events),
            lost_frames: summary.loss.map(|loss| loss.lost_frames),
        }
    }
}

impl Summary for DecodeReport {
    fn rows(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("frames", self.frames.to_string()),
            ("trailing_bytes", self.trailing_bytes.to_string()),
        ];
        for (key, value) in [
            ("marker_frames", self.marker_frames),
            ("gap_events", self.gap_events),
            ("lost_frames", self.lost_frames),
        ] {
            if let Some(value) = value {
                rows.push((key, value.to_string()));
            }
        }
        rows
    }
}

#[derive(Serialize)]
pub struct ExtractSummary {
    pub frames: u64,
    pub bytes_written: u64,
    pub trailing_bytes: usize,
}

impl From<ExtractStats> for ExtractSummary {
    fn from(stats: ExtractStats) -> Self {
        Self {
            frames: stats.frames,
            bytes_written: stats.bytes_written,
            trailing_bytes: stats.trailing_bytes,
        }
    }
}

impl Summary for ExtractSummary {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("frames", self.frames.to_string()),
            ("bytes_written", self.bytes_written.to_string()),
            ("trailing_bytes", self.trailing_bytes.to_string()),
        ]
    }
}

#[derive(Serialize)]
pub struct ReplaySummary {
    pub target: String,
    pub datagrams: u64,
    pub bytes: u64,
}

impl ReplaySummary {
    pub fn new(target: String, stats: SendStats) -> Self {
        Self {
            target,
            datagrams: stats.datagrams,
            bytes: stats.bytes,
        }
    }
}

impl Summary for ReplaySummary {
    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("target", self.target.clone()),
            ("datagrams", self.datagrams.to_string()),
            ("bytes", self.bytes.to_string()),
        ]
    }
}

pub fn write_summary<S: Summary>(
    out: &mut impl Write,
    summary: &S,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Text => {
            for (key, value) in summary.rows() {
                writeln!(out, "{key}: {value}")?;
            }
        }
        OutputFormat::Json => {
            let line = serde_json::to_string(summary).map_err(io::Error::other)?;
            writeln!(out, "{line}")?;
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (key, value) in summary.rows() {
                table.add_row(vec![key.to_string(), value]);
            }
            writeln!(out, "{table}")?;
        }
    }
    out.flush()
}
