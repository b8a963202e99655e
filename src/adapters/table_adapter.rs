//! Plain-text table output adapter.
//!
//! One row per primary interval: date range, raw prices and adjusted return,
//! followed by the adjusted return of each reference (`n/a` when
//! unavailable). The header is written with the first record, so an empty
//! stream produces no output at all.

use crate::domain::error::PriceStreamError;
use crate::domain::pipeline::CombinedRecord;
use crate::domain::record::{pct_string, Interval};
use crate::ports::output_port::{write_failed, OutputPort};
use std::io::Write;

const RETURN_PRECISION: usize = 2;

pub struct TableAdapter<W: Write> {
    out: W,
    references: Vec<String>,
    header_written: bool,
}

impl<W: Write> TableAdapter<W> {
    /// `references` are the reference tickers in pipeline order, used as
    /// column headings.
    pub fn new(out: W, references: Vec<String>) -> Self {
        Self {
            out,
            references,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_header(&mut self) -> Result<(), PriceStreamError> {
        let mut header = format!(
            "{:<8} {:<10} {:<10} {:>10} {:>10} {:>9}",
            "Ticker", "Start", "End", "Open", "Close", "Return"
        );
        for ticker in &self.references {
            header.push_str(&format!(" {:>9}", ticker));
        }
        writeln!(self.out, "{}", header).map_err(write_failed)?;
        Ok(())
    }
}

fn format_row(primary: &Interval) -> String {
    format!(
        "{:<8} {:<10} {:<10} {:>10.2} {:>10.2} {:>9}",
        primary.ticker,
        primary.start.date,
        primary.end.date,
        primary.start.price,
        primary.end.price,
        pct_string(primary.adjusted_return(), RETURN_PRECISION),
    )
}

impl<W: Write> OutputPort for TableAdapter<W> {
    fn write_record(&mut self, record: &CombinedRecord) -> Result<(), PriceStreamError> {
        if !self.header_written {
            self.write_header()?;
            self.header_written = true;
        }

        let mut row = format_row(record.primary());
        for range in record.refs() {
            let cell = range
                .interval()
                .map(|iv| pct_string(iv.adjusted_return(), RETURN_PRECISION))
                .unwrap_or_else(|| "n/a".to_string());
            row.push_str(&format!(" {:>9}", cell));
        }
        writeln!(self.out, "{}", row).map_err(write_failed)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), PriceStreamError> {
        self.out.flush().map_err(write_failed)?;
        Ok(())
    }
}
