//! Output port for combined pipeline records.

use crate::domain::error::PriceStreamError;
use crate::domain::pipeline::CombinedRecord;

/// Sink for pipeline output, written one record at a time in stream order.
pub trait OutputPort {
    fn write_record(&mut self, record: &CombinedRecord) -> Result<(), PriceStreamError>;

    /// Flushes buffered output. Default implementation does nothing.
    fn finish(&mut self) -> Result<(), PriceStreamError> {
        Ok(())
    }
}

/// Maps a failed write on the output sink to [`PriceStreamError::Output`].
pub fn write_failed(err: std::io::Error) -> PriceStreamError {
    PriceStreamError::Output {
        reason: err.to_string(),
    }
}
