//! Price data access port.

use crate::domain::error::PriceStreamError;
use crate::domain::record::RawRecord;
use chrono::NaiveDate;

/// Lazy, ascending sequence of raw daily records for one ticker.
///
/// Malformed rows are skipped by the source; an `Err` item is a read failure
/// and ends the stream. Dropping the stream releases the underlying file.
pub type RecordStream = Box<dyn Iterator<Item = Result<RawRecord, PriceStreamError>> + Send>;

pub trait DataPort {
    /// Opens the record stream for `ticker`. A ticker with no data file is a
    /// [`PriceStreamError::NotFound`], never an empty stream.
    fn open_records(&self, ticker: &str) -> Result<RecordStream, PriceStreamError>;

    fn list_tickers(&self) -> Result<Vec<String>, PriceStreamError>;

    /// First date, last date and record count, or `None` for an empty file.
    fn get_data_range(
        &self,
        ticker: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, PriceStreamError> {
        let mut range: Option<(NaiveDate, NaiveDate, usize)> = None;
        for record in self.open_records(ticker)? {
            let date = record?.date;
            range = Some(match range {
                None => (date, date, 1),
                Some((first, last, count)) => (first.min(date), last.max(date), count + 1),
            });
        }
        Ok(range)
    }
}
