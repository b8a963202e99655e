//! Top-level pipeline: one primary interval stream aligned against zero or
//! more reference streams.

use crate::domain::aligner::{align, MatchedRange};
use crate::domain::error::PriceStreamError;
use crate::domain::record::{Interval, RawRecord};
use crate::domain::resampler::Resampler;
use crate::domain::source::SourceDescriptor;
use crate::domain::stream_queue::StreamQueue;
use crate::ports::data_port::{DataPort, RecordStream};
use serde::Serialize;
use tracing::{debug, warn};

/// One output record per primary interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CombinedRecord {
    /// Pipeline without references: the primary interval as is.
    Single(Interval),
    /// `refs` follows the configured reference order.
    Aligned {
        primary: Interval,
        refs: Vec<MatchedRange>,
    },
}

impl CombinedRecord {
    pub fn primary(&self) -> &Interval {
        match self {
            CombinedRecord::Single(interval) => interval,
            CombinedRecord::Aligned { primary, .. } => primary,
        }
    }

    pub fn refs(&self) -> &[MatchedRange] {
        match self {
            CombinedRecord::Single(_) => &[],
            CombinedRecord::Aligned { refs, .. } => refs,
        }
    }
}

/// A reference stream and its lookahead queue.
///
/// After a read error the reference is marked failed and reports
/// [`MatchedRange::Unavailable`] for every remaining primary interval.
struct Reference<S> {
    ticker: String,
    queue: StreamQueue<Resampler<S>>,
    failed: bool,
}

impl<S> Reference<S>
where
    S: Iterator<Item = Result<RawRecord, PriceStreamError>>,
{
    fn align(&mut self, target: &Interval) -> MatchedRange {
        if self.failed {
            return MatchedRange::Unavailable;
        }
        match align(target, &mut self.queue) {
            Ok(range) => range,
            Err(e) => {
                warn!(
                    reference = %self.ticker,
                    primary = %target.ticker,
                    error = %e,
                    "reference stream failed, reporting unavailable from here on"
                );
                self.failed = true;
                MatchedRange::Unavailable
            }
        }
    }
}

/// Pull-based iterator of [`CombinedRecord`]s.
///
/// Nothing is read until the caller asks for the next record. A read error
/// on the primary stream is yielded once and ends the pipeline.
pub struct PricePipeline<S = RecordStream> {
    primary: Resampler<S>,
    references: Vec<Reference<S>>,
}

impl<S> PricePipeline<S>
where
    S: Iterator<Item = Result<RawRecord, PriceStreamError>>,
{
    pub fn new(primary: Resampler<S>, references: Vec<Resampler<S>>) -> Self {
        let references = references
            .into_iter()
            .map(|resampler| Reference {
                ticker: resampler.ticker().to_string(),
                queue: StreamQueue::new(resampler),
                failed: false,
            })
            .collect();
        Self {
            primary,
            references,
        }
    }

    pub fn reference_count(&self) -> usize {
        self.references.len()
    }
}

impl PricePipeline<RecordStream> {
    /// Validates every descriptor, then opens one record stream per
    /// descriptor through `port`.
    ///
    /// Configuration errors are reported before any stream is opened; a
    /// missing data file for the primary or any reference fails the whole
    /// pipeline.
    pub fn open(
        port: &dyn DataPort,
        primary: &SourceDescriptor,
        references: &[SourceDescriptor],
    ) -> Result<Self, PriceStreamError> {
        primary.validate("primary")?;
        for reference in references {
            reference.validate(&reference.ticker)?;
        }

        let open = |source: &SourceDescriptor| {
            debug!(
                ticker = %source.ticker,
                frequency = %source.frequency,
                "opening interval stream"
            );
            port.open_records(&source.ticker)
                .map(|records| Resampler::new(records, source))
        };

        let primary = open(primary)?;
        let references = references
            .iter()
            .map(open)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(primary, references))
    }
}

impl<S> Iterator for PricePipeline<S>
where
    S: Iterator<Item = Result<RawRecord, PriceStreamError>>,
{
    type Item = Result<CombinedRecord, PriceStreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        let primary = match self.primary.next()? {
            Ok(interval) => interval,
            Err(e) => return Some(Err(e)),
        };
        if self.references.is_empty() {
            return Some(Ok(CombinedRecord::Single(primary)));
        }
        let refs = self
            .references
            .iter_mut()
            .map(|reference| reference.align(&primary))
            .collect();
        Some(Ok(CombinedRecord::Aligned { primary, refs }))
    }
}
