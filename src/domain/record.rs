//! Raw daily records and the price intervals built from them.

use chrono::NaiveDate;
use serde::Serialize;

/// One trading day as read from a ticker's data file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub adj_close: f64,
}

/// One endpoint of an [`Interval`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
    pub adj_price: f64,
}

/// Opening and closing prices of one reporting period for a ticker.
///
/// `start.date <= end.date` always holds for intervals built by
/// [`Interval::from_period`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interval {
    pub ticker: String,
    pub start: PricePoint,
    pub end: PricePoint,
}

impl Interval {
    /// Builds the interval spanning `first..=last`.
    ///
    /// Only the closing price has an adjusted counterpart in the source data,
    /// so the adjusted opening price is reconstructed by projecting the
    /// period's closing adjustment factor onto the raw open:
    /// `first.open * last.adj_close / last.close`. This is exact unless a
    /// split or dividend falls strictly inside the period.
    pub fn from_period(ticker: &str, first: &RawRecord, last: &RawRecord) -> Self {
        let adj_start = first.open * last.adj_close / last.close;
        Self {
            ticker: ticker.to_string(),
            start: PricePoint {
                date: first.date,
                price: first.open,
                adj_price: adj_start,
            },
            end: PricePoint {
                date: last.date,
                price: last.close,
                adj_price: last.adj_close,
            },
        }
    }

    /// Adjusted return over the period: end.adj / start.adj - 1.
    pub fn adjusted_return(&self) -> f64 {
        if self.start.adj_price == 0.0 {
            return 0.0;
        }
        self.end.adj_price / self.start.adj_price - 1.0
    }

    /// Raw (unadjusted) return over the period.
    pub fn raw_return(&self) -> f64 {
        if self.start.price == 0.0 {
            return 0.0;
        }
        self.end.price / self.start.price - 1.0
    }
}

/// Formats a fraction as a percentage string, e.g. `0.1234` at precision 1
/// becomes `"12.3%"`.
pub fn pct_string(value: f64, precision: usize) -> String {
    format!("{:.*}%", precision, value * 100.0)
}
