//! Stream configuration: which ticker, which dates, which reporting frequency.

use crate::domain::error::PriceStreamError;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Reporting period of an interval stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Whether `cur` belongs to a different period than `prev`, its
    /// immediate predecessor in the stream.
    ///
    /// Weeks run Sunday to Saturday: a week wraps when the day-of-week does
    /// not increase. A gap of a full week or more is also a boundary, so two
    /// sparse records never share a week.
    pub fn starts_new_period(self, prev: NaiveDate, cur: NaiveDate) -> bool {
        match self {
            Frequency::Daily => true,
            Frequency::Weekly => {
                cur.weekday().num_days_from_sunday() <= prev.weekday().num_days_from_sunday()
                    || (cur - prev).num_days() >= 7
            }
            Frequency::Monthly => cur.month() != prev.month() || cur.year() != prev.year(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown frequency {0:?} (expected daily, weekly or monthly)")]
pub struct ParseFrequencyError(pub String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "d" => Ok(Frequency::Daily),
            "weekly" | "w" => Ok(Frequency::Weekly),
            "monthly" | "m" => Ok(Frequency::Monthly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

/// Describes one interval stream.
///
/// Defaults: no date bounds, [`Frequency::Daily`], and the still-open final
/// period is dropped at end of data unless `flush_partial` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDescriptor {
    pub ticker: String,
    /// Inclusive lower bound on record dates.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on record dates.
    pub end_date: Option<NaiveDate>,
    pub frequency: Frequency,
    /// Emit the final, still-open period when the records run out.
    pub flush_partial: bool,
}

impl SourceDescriptor {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            start_date: None,
            end_date: None,
            frequency: Frequency::default(),
            flush_partial: false,
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_start(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_end(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn with_flush_partial(mut self, flush: bool) -> Self {
        self.flush_partial = flush;
        self
    }

    pub fn is_before_range(&self, date: NaiveDate) -> bool {
        self.start_date.is_some_and(|start| date < start)
    }

    pub fn is_past_range(&self, date: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| date > end)
    }

    /// Structural checks done before any stream is opened. `section` names
    /// the config section the descriptor came from, for error messages.
    pub fn validate(&self, section: &str) -> Result<(), PriceStreamError> {
        if self.ticker.trim().is_empty() {
            return Err(PriceStreamError::config_missing(section, "ticker"));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(PriceStreamError::config_invalid(
                    section,
                    "start",
                    "start must not be after end",
                ));
            }
        }
        Ok(())
    }
}

/// Everything needed to open a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Directory holding one `<TICKER>.<extension>` file per ticker.
    pub data_dir: PathBuf,
    pub extension: String,
    pub primary: SourceDescriptor,
    /// In output order.
    pub references: Vec<SourceDescriptor>,
}
