//! Resampling of raw daily records into periodic intervals.
//!
//! The resampler is a two-field state machine: the last accepted record and
//! the record that opened the current period. Each accepted record is tested
//! against its predecessor with [`Frequency::starts_new_period`]; on a
//! boundary the pending period is closed with the predecessor as its last
//! record and the current record opens the next one.

use crate::domain::error::PriceStreamError;
use crate::domain::record::{Interval, RawRecord};
use crate::domain::source::{Frequency, SourceDescriptor};
use tracing::{debug, warn};

pub struct Resampler<I> {
    records: I,
    source: SourceDescriptor,
    last: Option<RawRecord>,
    period_open: Option<RawRecord>,
    done: bool,
}

impl<I> Resampler<I>
where
    I: Iterator<Item = Result<RawRecord, PriceStreamError>>,
{
    pub fn new(records: I, source: &SourceDescriptor) -> Self {
        Self {
            records,
            source: source.clone(),
            last: None,
            period_open: None,
            done: false,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.source.ticker
    }

    pub fn frequency(&self) -> Frequency {
        self.source.frequency
    }

    /// Accepts one in-range record, returning the period it closed, if any.
    fn accept(&mut self, record: RawRecord) -> Option<Interval> {
        let closed = match (&self.period_open, &self.last) {
            (Some(open), Some(prev)) if self.source.frequency.starts_new_period(prev.date, record.date) => {
                Some(Interval::from_period(&self.source.ticker, open, prev))
            }
            _ => None,
        };
        if closed.is_some() || self.period_open.is_none() {
            self.period_open = Some(record);
        }
        self.last = Some(record);
        closed
    }

    fn finish(&mut self) -> Option<Interval> {
        self.done = true;
        let open = self.period_open.take()?;
        let last = self.last.take()?;
        if self.source.flush_partial {
            Some(Interval::from_period(&self.source.ticker, &open, &last))
        } else {
            debug!(
                ticker = %self.source.ticker,
                start = %open.date,
                end = %last.date,
                "dropping trailing partial period"
            );
            None
        }
    }
}

impl<I> Iterator for Resampler<I>
where
    I: Iterator<Item = Result<RawRecord, PriceStreamError>>,
{
    type Item = Result<Interval, PriceStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let record = match self.records.next() {
                None => return self.finish().map(Ok),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Some(Ok(record)) => record,
            };

            // Records are ascending, so nothing after the end bound can be accepted.
            if self.source.is_past_range(record.date) {
                return self.finish().map(Ok);
            }
            if self.source.is_before_range(record.date) {
                continue;
            }
            if let Some(prev) = &self.last {
                if record.date <= prev.date {
                    warn!(
                        ticker = %self.source.ticker,
                        date = %record.date,
                        previous = %prev.date,
                        "skipping out-of-order record"
                    );
                    continue;
                }
            }

            if let Some(interval) = self.accept(record) {
                return Some(Ok(interval));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use approx::assert_relative_eq;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rec(date: &str, price: f64) -> Result<RawRecord, PriceStreamError> {
        Ok(RawRecord {
            date: d(date),
            open: price,
            close: price + 1.0,
            adj_close: (price + 1.0) / 2.0,
        })
    }

    fn resample(
        records: Vec<Result<RawRecord, PriceStreamError>>,
        source: &SourceDescriptor,
    ) -> Vec<Interval> {
        Resampler::new(records.into_iter(), source)
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn daily_emits_previous_record_on_each_new_record() {
        let source = SourceDescriptor::new("SPY");
        let out = resample(
            vec![
                rec("2011-01-03", 10.0),
                rec("2011-01-04", 11.0),
                rec("2011-01-05", 12.0),
            ],
            &source,
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].start.date, d("2011-01-03"));
        assert_eq!(out[0].end.date, d("2011-01-03"));
        assert_relative_eq!(out[0].start.price, 10.0);
        assert_relative_eq!(out[0].end.price, 11.0);
        assert_eq!(out[1].start.date, d("2011-01-04"));
        assert_eq!(out[1].end.date, d("2011-01-04"));
    }

    #[test]
    fn daily_flush_emits_last_record() {
        let source = SourceDescriptor::new("SPY").with_flush_partial(true);
        let out = resample(
            vec![rec("2011-01-03", 10.0), rec("2011-01-04", 11.0)],
            &source,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].start.date, d("2011-01-04"));
    }

    #[test]
    fn weekly_groups_by_week() {
        let source = SourceDescriptor::new("SPY").with_frequency(Frequency::Weekly);
        let out = resample(
            vec![
                rec("2011-01-03", 10.0), // Mon
                rec("2011-01-05", 11.0), // Wed
                rec("2011-01-07", 12.0), // Fri
                rec("2011-01-10", 13.0), // Mon
                rec("2011-01-14", 14.0), // Fri
                rec("2011-01-18", 15.0), // Tue
            ],
            &source,
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].start.date, d("2011-01-03"));
        assert_eq!(out[0].end.date, d("2011-01-07"));
        assert_relative_eq!(out[0].start.price, 10.0);
        assert_relative_eq!(out[0].end.price, 13.0);
        assert_eq!(out[1].start.date, d("2011-01-10"));
        assert_eq!(out[1].end.date, d("2011-01-14"));
    }

    #[test]
    fn monthly_two_months_emits_one_interval() {
        let source = SourceDescriptor::new("SSO").with_frequency(Frequency::Monthly);
        let out = resample(
            vec![
                rec("2011-01-03", 10.0),
                rec("2011-01-14", 11.0),
                rec("2011-01-31", 12.0),
                rec("2011-02-01", 13.0),
                rec("2011-02-28", 14.0),
            ],
            &source,
        );

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].ticker, "SSO");
        assert_eq!(out[0].start.date, d("2011-01-03"));
        assert_eq!(out[0].end.date, d("2011-01-31"));
        assert_relative_eq!(out[0].start.price, 10.0);
        assert_relative_eq!(out[0].end.price, 13.0);
    }

    #[test]
    fn monthly_flush_emits_trailing_month() {
        let source = SourceDescriptor::new("SSO")
            .with_frequency(Frequency::Monthly)
            .with_flush_partial(true);
        let out = resample(
            vec![
                rec("2011-01-03", 10.0),
                rec("2011-01-31", 12.0),
                rec("2011-02-01", 13.0),
                rec("2011-02-28", 14.0),
            ],
            &source,
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[1].start.date, d("2011-02-01"));
        assert_eq!(out[1].end.date, d("2011-02-28"));
    }

    #[test]
    fn date_bounds_are_applied_before_boundaries() {
        let source = SourceDescriptor::new("SPY")
            .with_frequency(Frequency::Monthly)
            .with_start(d("2011-01-10"))
            .with_end(d("2011-02-15"))
            .with_flush_partial(true);
        let out = resample(
            vec![
                rec("2010-12-31", 1.0),
                rec("2011-01-03", 2.0),
                rec("2011-01-10", 3.0),
                rec("2011-01-31", 4.0),
                rec("2011-02-01", 5.0),
                rec("2011-02-15", 6.0),
                rec("2011-02-16", 7.0),
                rec("2011-03-01", 8.0),
            ],
            &source,
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].start.date, d("2011-01-10"));
        assert_eq!(out[0].end.date, d("2011-01-31"));
        assert_eq!(out[1].start.date, d("2011-02-01"));
        assert_eq!(out[1].end.date, d("2011-02-15"));
    }

    #[test]
    fn stops_reading_past_end_date() {
        let source = SourceDescriptor::new("SPY").with_end(d("2011-01-04"));
        let records = vec![
            rec("2011-01-03", 1.0),
            rec("2011-01-04", 2.0),
            rec("2011-01-05", 3.0),
            Err(PriceStreamError::StreamIo {
                ticker: "SPY".into(),
                reason: "never read".into(),
            }),
        ];
        let out: Vec<_> = Resampler::new(records.into_iter(), &source).collect();
        assert_eq!(out.len(), 1);
        assert!(out[0].is_ok());
    }

    #[test]
    fn out_of_order_records_are_skipped() {
        let source = SourceDescriptor::new("SPY");
        let out = resample(
            vec![
                rec("2011-01-03", 1.0),
                rec("2011-01-04", 2.0),
                rec("2011-01-04", 99.0),
                rec("2011-01-02", 98.0),
                rec("2011-01-05", 3.0),
            ],
            &source,
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].start.date, d("2011-01-04"));
        assert_relative_eq!(out[1].start.price, 2.0);
    }

    #[test]
    fn read_error_is_terminal() {
        let source = SourceDescriptor::new("SPY");
        let records = vec![
            rec("2011-01-03", 1.0),
            rec("2011-01-04", 2.0),
            Err(PriceStreamError::StreamIo {
                ticker: "SPY".into(),
                reason: "disk gone".into(),
            }),
            rec("2011-01-05", 3.0),
        ];
        let mut resampler = Resampler::new(records.into_iter(), &source);

        assert!(resampler.next().unwrap().is_ok());
        assert!(matches!(
            resampler.next(),
            Some(Err(PriceStreamError::StreamIo { .. }))
        ));
        assert!(resampler.next().is_none());
    }

    #[test]
    fn empty_and_single_record_streams() {
        let source = SourceDescriptor::new("SPY").with_frequency(Frequency::Weekly);
        assert!(resample(vec![], &source).is_empty());
        assert!(resample(vec![rec("2011-01-03", 1.0)], &source).is_empty());

        let flushed = source.clone().with_flush_partial(true);
        let out = resample(vec![rec("2011-01-03", 1.0)], &flushed);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start.date, out[0].end.date);
    }

    #[test]
    fn exhausted_resampler_stays_exhausted() {
        let source = SourceDescriptor::new("SPY").with_flush_partial(true);
        let mut resampler = Resampler::new(vec![rec("2011-01-03", 1.0)].into_iter(), &source);
        assert!(resampler.next().is_some());
        assert!(resampler.next().is_none());
        assert!(resampler.next().is_none());
    }
}
