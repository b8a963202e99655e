//! CSV file data adapter.
//!
//! One file per ticker at `<base_path>/<TICKER>.<extension>`, with a header
//! row naming at least `Date`, `Open`, `Close` and `Adj Close`. Rows are
//! streamed from the file as they are pulled.

use crate::domain::error::{PriceStreamError, RecordError};
use crate::domain::record::RawRecord;
use crate::ports::data_port::{DataPort, RecordStream};
use chrono::NaiveDate;
use csv::{StringRecord, StringRecordsIntoIter};
use std::fs::{self, File};
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_EXTENSION: &str = "csv";

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

pub struct CsvAdapter {
    base_path: PathBuf,
    extension: String,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self::with_extension(base_path, DEFAULT_EXTENSION)
    }

    pub fn with_extension(base_path: PathBuf, extension: &str) -> Self {
        Self {
            base_path,
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", ticker, self.extension))
    }
}

impl DataPort for CsvAdapter {
    fn open_records(&self, ticker: &str) -> Result<RecordStream, PriceStreamError> {
        let path = self.csv_path(ticker);
        if !path.is_file() {
            return Err(PriceStreamError::NotFound {
                ticker: ticker.to_string(),
                path: path.display().to_string(),
            });
        }

        let stream_error = |reason: String| PriceStreamError::StreamIo {
            ticker: ticker.to_string(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| stream_error(format!("failed to open {}: {}", path.display(), e)))?;
        let headers = reader
            .headers()
            .map_err(|e| stream_error(format!("failed to read header: {}", e)))?;
        let columns = Columns::locate(headers).map_err(|e| stream_error(e.to_string()))?;

        Ok(Box::new(CsvRecords {
            ticker: ticker.to_string(),
            rows: reader.into_records(),
            columns,
            done: false,
        }))
    }

    fn list_tickers(&self) -> Result<Vec<String>, PriceStreamError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| PriceStreamError::StreamIo {
            ticker: "*".into(),
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let matches_extension = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension));
            if !matches_extension || !path.is_file() {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                tickers.push(stem.to_string_lossy().into_owned());
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}

/// Positions of the required columns in the header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    date: usize,
    open: usize,
    close: usize,
    adj_close: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, RecordError> {
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(column))
                .ok_or(RecordError::MissingColumn { column })
        };
        Ok(Self {
            date: find("Date")?,
            open: find("Open")?,
            close: find("Close")?,
            adj_close: find("Adj Close")?,
        })
    }

    fn decode(&self, row: &StringRecord) -> Result<RawRecord, RecordError> {
        let date = parse_record_date(field(row, self.date, "Date")?)?;
        let open = number(row, self.open, "Open")?;
        let close = number(row, self.close, "Close")?;
        let adj_close = number(row, self.adj_close, "Adj Close")?;
        if close <= 0.0 {
            return Err(RecordError::NonPositiveClose { close });
        }
        Ok(RawRecord {
            date,
            open,
            close,
            adj_close,
        })
    }
}

fn field<'r>(
    row: &'r StringRecord,
    index: usize,
    column: &'static str,
) -> Result<&'r str, RecordError> {
    row.get(index)
        .filter(|s| !s.is_empty())
        .ok_or(RecordError::MissingColumn { column })
}

fn number(row: &StringRecord, index: usize, column: &'static str) -> Result<f64, RecordError> {
    let raw = field(row, index, column)?;
    let value: f64 = raw.parse().map_err(|_| RecordError::InvalidNumber {
        column,
        value: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(RecordError::NonFinite { column });
    }
    Ok(value)
}

pub fn parse_record_date(value: &str) -> Result<NaiveDate, RecordError> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| RecordError::InvalidDate {
            value: value.to_string(),
        })
}

/// Row iterator over an open CSV file. The file closes when this is dropped.
struct CsvRecords {
    ticker: String,
    rows: StringRecordsIntoIter<File>,
    columns: Columns,
    done: bool,
}

impl Iterator for CsvRecords {
    type Item = Result<RawRecord, PriceStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let row = match self.rows.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Ok(row)) => row,
                Some(Err(e)) if e.is_io_error() => {
                    self.done = true;
                    return Some(Err(PriceStreamError::StreamIo {
                        ticker: self.ticker.clone(),
                        reason: e.to_string(),
                    }));
                }
                Some(Err(e)) => {
                    warn!(ticker = %self.ticker, error = %e, "skipping unreadable row");
                    continue;
                }
            };

            match self.columns.decode(&row) {
                Ok(record) => return Some(Ok(record)),
                Err(e) => {
                    let line = row.position().map(|p| p.line()).unwrap_or_default();
                    warn!(ticker = %self.ticker, line, error = %e, "skipping malformed row");
                }
            }
        }
        None
    }
}
