//! Lookahead queue over an interval stream.

use crate::domain::error::PriceStreamError;
use crate::domain::record::Interval;
use std::collections::VecDeque;

/// FIFO of intervals already pulled from a stream but not yet consumed.
///
/// `peek` pulls from the stream only when the queue is empty, so an interval
/// that was inspected but not popped stays available for the next caller.
pub struct StreamQueue<S> {
    stream: S,
    values: VecDeque<Interval>,
    exhausted: bool,
}

impl<S> StreamQueue<S>
where
    S: Iterator<Item = Result<Interval, PriceStreamError>>,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            values: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Oldest queued interval, pulling one from the stream if the queue is
    /// empty. `Ok(None)` means the stream is exhausted.
    ///
    /// A pull error is returned once; the queue then reports exhaustion.
    pub fn peek(&mut self) -> Result<Option<&Interval>, PriceStreamError> {
        if self.values.is_empty() && !self.exhausted {
            match self.stream.next() {
                Some(Ok(interval)) => self.values.push_back(interval),
                Some(Err(e)) => {
                    self.exhausted = true;
                    return Err(e);
                }
                None => self.exhausted = true,
            }
        }
        Ok(self.values.front())
    }

    /// Removes the oldest queued interval. Only intervals already pulled by
    /// [`peek`](Self::peek) are returned; the stream is never read here.
    pub fn pop(&mut self) -> Option<Interval> {
        self.values.pop_front()
    }

    /// Number of intervals pulled but not yet consumed.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True once the stream has ended and nothing is left queued.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.values.is_empty()
    }
}
