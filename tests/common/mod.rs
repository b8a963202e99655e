#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use pricestream::domain::error::PriceStreamError;
use pricestream::domain::record::RawRecord;
use pricestream::ports::data_port::{DataPort, RecordStream};
use std::collections::HashMap;
use std::fmt::Write as _;

/// In-memory data port. A ticker can be given a read failure that is
/// yielded after its records.
pub struct MockDataPort {
    pub data: HashMap<String, Vec<RawRecord>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_records(mut self, ticker: &str, records: Vec<RawRecord>) -> Self {
        self.data.insert(ticker.to_string(), records);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn open_records(&self, ticker: &str) -> Result<RecordStream, PriceStreamError> {
        let Some(records) = self.data.get(ticker) else {
            return Err(PriceStreamError::NotFound {
                ticker: ticker.to_string(),
                path: format!("mock/{ticker}"),
            });
        };
        let mut items: Vec<Result<RawRecord, PriceStreamError>> =
            records.iter().copied().map(Ok).collect();
        if let Some(reason) = self.errors.get(ticker) {
            items.push(Err(PriceStreamError::StreamIo {
                ticker: ticker.to_string(),
                reason: reason.clone(),
            }));
        }
        Ok(Box::new(items.into_iter()))
    }

    fn list_tickers(&self) -> Result<Vec<String>, PriceStreamError> {
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_record(date: NaiveDate, open: f64, close: f64, adj_close: f64) -> RawRecord {
    RawRecord {
        date,
        open,
        close,
        adj_close,
    }
}

/// One record per calendar day in `from..=to`, prices rising by one a day.
/// The adjusted close is half the close.
pub fn calendar_days(from: NaiveDate, to: NaiveDate, base: f64) -> Vec<RawRecord> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .enumerate()
        .map(|(i, d)| {
            let price = base + i as f64;
            make_record(d, price, price + 0.5, (price + 0.5) / 2.0)
        })
        .collect()
}

/// Like [`calendar_days`], skipping Saturdays and Sundays.
pub fn trading_days(from: NaiveDate, to: NaiveDate, base: f64) -> Vec<RawRecord> {
    calendar_days(from, to, base)
        .into_iter()
        .filter(|r| !matches!(r.date.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// Renders records as a CSV file in the usual download layout.
pub fn csv_text(records: &[RawRecord]) -> String {
    let mut text = String::from("Date,Open,High,Low,Close,Adj Close,Volume\n");
    for r in records {
        let high = r.open.max(r.close);
        let low = r.open.min(r.close);
        writeln!(
            text,
            "{},{},{},{},{},{},1000000",
            r.date, r.open, high, low, r.close, r.adj_close
        )
        .unwrap();
    }
    text
}
