//! JSON lines output adapter: one serialized record per line.

use crate::domain::error::PriceStreamError;
use crate::domain::pipeline::CombinedRecord;
use crate::ports::output_port::{write_failed, OutputPort};
use std::io::Write;

pub struct JsonLinesAdapter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesAdapter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> OutputPort for JsonLinesAdapter<W> {
    fn write_record(&mut self, record: &CombinedRecord) -> Result<(), PriceStreamError> {
        serde_json::to_writer(&mut self.out, record).map_err(|e| PriceStreamError::Output {
            reason: format!("failed to serialize record: {}", e),
        })?;
        self.out.write_all(b"\n").map_err(write_failed)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), PriceStreamError> {
        self.out.flush().map_err(write_failed)?;
        Ok(())
    }
}
