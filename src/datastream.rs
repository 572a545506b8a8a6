//! Sample streams over local dataset files.
//!
//! A stream yields one JSON object per sample. JSONL files (optionally
//! gzip-compressed) are read line by line; CSV files are read whole with
//! normalised column names.

use crate::error::{AdhocResult, ArgsError};
use crate::scope::AdhocArguments;
use crate::units::basename_from_path;
use crate::value::parse_literal;
use flate2::read::GzDecoder;
use log::debug;
use serde_json::{Map, Value as JsonValue};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// One dataset row.
pub type Sample = Map<String, JsonValue>;

pub type SampleIter = Box<dyn Iterator<Item = AdhocResult<Sample>>>;

/// Sample range read from the scope: `start|=0` and `end|head`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamRange {
    pub start: usize,
    pub end: Option<usize>,
}

impl StreamRange {
    pub fn from_args(args: &AdhocArguments) -> Self {
        Self {
            start: args.get_usize("start|=0").unwrap_or(0),
            end: args.get_usize("end|head"),
        }
    }

    /// Configured bounds take precedence over the caller's; a zero start
    /// counts as unset.
    fn resolve(&self, start: usize, end: Option<usize>) -> (usize, Option<usize>) {
        let start = if self.start != 0 { self.start } else { start };
        (start, self.end.or(end))
    }
}

pub trait DataStream {
    fn path(&self) -> &Path;

    fn range(&self) -> StreamRange;

    /// Samples in `[start, end)`, before any configured bounds.
    fn stream(&self, start: usize, end: Option<usize>) -> AdhocResult<SampleIter>;

    fn datatag(&self) -> String {
        basename_from_path(&self.path().to_string_lossy())
    }

    /// Stream honouring the configured range.
    fn samples(&self) -> AdhocResult<SampleIter> {
        self.samples_between(0, None)
    }

    fn samples_between(&self, start: usize, end: Option<usize>) -> AdhocResult<SampleIter> {
        let (start, end) = self.range().resolve(start, end);
        self.stream(start, end)
    }
}

fn slice(iter: SampleIter, start: usize, end: Option<usize>) -> SampleIter {
    let iter = iter.skip(start);
    match end {
        Some(end) => Box::new(iter.take(end.saturating_sub(start))),
        None => Box::new(iter),
    }
}

fn open_file(path: &Path) -> AdhocResult<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ArgsError::dataset_not_found(path.to_path_buf()),
        _ => ArgsError::dataset_processing(format!("{}: {}", path.display(), e)),
    })
}

pub struct JsonlStream {
    path: PathBuf,
    range: StreamRange,
}

impl JsonlStream {
    pub fn new(path: impl Into<PathBuf>, range: StreamRange) -> Self {
        Self { path: path.into(), range }
    }
}

/// Line-by-line JSONL reader. Blank lines are skipped.
pub fn read_jsonl(path: &Path) -> AdhocResult<SampleIter> {
    let file = open_file(path)?;
    let reader: Box<dyn Read> = if path.extension().map(|e| e == "gz").unwrap_or(false) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };
    let origin = path.display().to_string();
    let lines = BufReader::new(reader)
        .lines()
        .enumerate()
        .filter_map(move |(lineno, line)| {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    let message = format!("{}: {}", origin, e);
                    return Some(Err(ArgsError::dataset_processing(message)));
                }
            };
            if line.trim().is_empty() {
                return None;
            }
            Some(match serde_json::from_str::<JsonValue>(&line) {
                Ok(JsonValue::Object(sample)) => Ok(sample),
                Ok(_) => Err(ArgsError::dataset_processing(format!(
                    "{}:{}: not a JSON object",
                    origin,
                    lineno + 1
                ))),
                Err(e) => Err(ArgsError::dataset_processing(format!(
                    "{}:{}: {}",
                    origin,
                    lineno + 1,
                    e
                ))),
            })
        });
    Ok(Box::new(lines))
}

impl DataStream for JsonlStream {
    fn path(&self) -> &Path {
        &self.path
    }

    fn range(&self) -> StreamRange {
        self.range
    }

    fn stream(&self, start: usize, end: Option<usize>) -> AdhocResult<SampleIter> {
        Ok(slice(read_jsonl(&self.path)?, start, end))
    }
}

pub struct CsvStream {
    path: PathBuf,
    range: StreamRange,
}

impl CsvStream {
    pub fn new(path: impl Into<PathBuf>, range: StreamRange) -> Self {
        Self { path: path.into(), range }
    }
}

fn column_name(header: &str) -> String {
    header.to_lowercase().replace(' ', "_")
}

fn csv_error(path: &Path, e: csv::Error) -> ArgsError {
    ArgsError::dataset_processing(format!("{}: {}", path.display(), e))
}

impl DataStream for CsvStream {
    fn path(&self) -> &Path {
        &self.path
    }

    fn range(&self) -> StreamRange {
        self.range
    }

    fn stream(&self, start: usize, end: Option<usize>) -> AdhocResult<SampleIter> {
        let file = open_file(&self.path)?;
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(&self.path, e))?
            .iter()
            .map(column_name)
            .collect();

        let mut samples = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(&self.path, e))?;
            let mut sample = Sample::new();
            for (name, cell) in columns.iter().zip(record.iter()) {
                let value = if cell.is_empty() {
                    JsonValue::Null
                } else {
                    parse_literal(cell).to_json()
                };
                sample.insert(name.clone(), value);
            }
            samples.push(Ok(sample));
        }
        debug!("Read {} rows from {}", samples.len(), self.path.display());
        Ok(slice(Box::new(samples.into_iter()), start, end))
    }
}

/// Open a local dataset by path. Hub dataset names are not streamed here.
pub fn open_stream(path: &str, args: &AdhocArguments) -> AdhocResult<Box<dyn DataStream>> {
    let range = StreamRange::from_args(args);
    if path.contains(".json") {
        Ok(Box::new(JsonlStream::new(path, range)))
    } else if path.ends_with(".csv") {
        Ok(Box::new(CsvStream::new(path, range)))
    } else {
        Err(ArgsError::unsupported_source(path))
    }
}
