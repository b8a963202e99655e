//! Merge-join of a target interval against a reference interval stream.
//!
//! A finer reference (daily) is folded into a coarser target (monthly) by
//! taking the start price from the earliest reference period overlapping the
//! target and the end price from the first reference period that reaches the
//! target's end. Reference periods in between are consumed and dropped.

use crate::domain::error::PriceStreamError;
use crate::domain::record::{Interval, PricePoint};
use crate::domain::stream_queue::StreamQueue;
use serde::Serialize;

/// Reference data matched against one target interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MatchedRange {
    Matched(Interval),
    /// The reference stream has nothing overlapping the target.
    Unavailable,
}

impl MatchedRange {
    pub fn interval(&self) -> Option<&Interval> {
        match self {
            MatchedRange::Matched(interval) => Some(interval),
            MatchedRange::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, MatchedRange::Matched(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Before,
    Overlapping,
    After,
}

fn placement(candidate: &Interval, target: &Interval) -> Placement {
    if candidate.end.date < target.start.date {
        Placement::Before
    } else if candidate.start.date > target.end.date {
        Placement::After
    } else {
        Placement::Overlapping
    }
}

fn matched(first: &Interval, end: PricePoint) -> MatchedRange {
    MatchedRange::Matched(Interval {
        ticker: first.ticker.clone(),
        start: first.start,
        end,
    })
}

/// Matches `target` against the reference intervals in `queue`.
///
/// Stale reference intervals ending before the target are discarded. If the
/// earliest remaining reference interval starts after the target, the result
/// is [`MatchedRange::Unavailable`] and the queue is left untouched so that
/// interval can match a later target. The reference interval covering the
/// target's end is peeked but left queued.
///
/// Running out of reference data never fails: the range ends at the last
/// reference interval consumed. Only a read error from the reference stream
/// is returned as `Err`.
pub fn align<S>(
    target: &Interval,
    queue: &mut StreamQueue<S>,
) -> Result<MatchedRange, PriceStreamError>
where
    S: Iterator<Item = Result<Interval, PriceStreamError>>,
{
    loop {
        let Some(candidate) = queue.peek()? else {
            return Ok(MatchedRange::Unavailable);
        };
        match placement(candidate, target) {
            Placement::Before => {
                queue.pop();
            }
            Placement::After => return Ok(MatchedRange::Unavailable),
            Placement::Overlapping => break,
        }
    }
    let Some(first) = queue.pop() else {
        return Ok(MatchedRange::Unavailable);
    };

    if first.end.date >= target.end.date {
        return Ok(matched(&first, first.end));
    }

    let mut last_end = first.end;
    loop {
        let Some(next) = queue.peek()? else {
            return Ok(matched(&first, last_end));
        };
        if next.start.date > target.end.date {
            return Ok(matched(&first, last_end));
        }
        if next.end.date >= target.end.date {
            return Ok(matched(&first, next.end));
        }
        if let Some(consumed) = queue.pop() {
            last_end = consumed.end;
        }
    }
}
