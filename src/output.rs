use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::SpeciesRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    #[value(name = "jsonlines", alias = "jsonl")]
    JsonLines,
    Json,
}

impl OutputFormat {
    /// Guess from a file extension; `None` when it says nothing useful.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "jsonl" | "ndjson" => Some(Self::JsonLines),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Consumer of the ordered record stream.
pub trait RecordSink {
    fn write_record(&mut self, record: &SpeciesRecord) -> Result<()>;

    /// Push buffered output down to the writer. Called after each page.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once, only after a successful run.
    fn finish(&mut self) -> Result<()>;
}

impl RecordSink for Vec<SpeciesRecord> {
    fn write_record(&mut self, record: &SpeciesRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

const CSV_HEADER: [&str; 2] = ["latin_name", "detail_url"];

/// Header row, then one quoted-as-needed row per record. The header is
/// written even when the run yields no records.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    header_written: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().has_headers(false).from_writer(out),
            header_written: false,
        }
    }

    fn ensure_header(&mut self) -> Result<()> {
        if !self.header_written {
            self.writer.write_record(CSV_HEADER)?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_record(&mut self, record: &SpeciesRecord) -> Result<()> {
        self.ensure_header()?;
        self.writer.serialize(record)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.ensure_header()?;
        self.flush()
    }
}

/// One JSON object per line. Non-ASCII is written as-is.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write_record(&mut self, record: &SpeciesRecord) -> Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.flush()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpeciesDocument {
    pub species: Vec<SpeciesRecord>,
}

/// `{"species": [...]}`. Nothing reaches the writer before `finish`.
pub struct JsonSink<W: Write> {
    out: W,
    species: Vec<SpeciesRecord>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            species: Vec::new(),
        }
    }
}

impl<W: Write> RecordSink for JsonSink<W> {
    fn write_record(&mut self, record: &SpeciesRecord) -> Result<()> {
        self.species.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let doc = SpeciesDocument {
            species: std::mem::take(&mut self.species),
        };
        serde_json::to_writer_pretty(&mut self.out, &doc)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

pub fn open_sink<'a>(format: OutputFormat, out: Box<dyn Write + 'a>) -> Box<dyn RecordSink + 'a> {
    match format {
        OutputFormat::Csv => Box::new(CsvSink::new(out)),
        OutputFormat::JsonLines => Box::new(JsonLinesSink::new(out)),
        OutputFormat::Json => Box::new(JsonSink::new(out)),
    }
}
