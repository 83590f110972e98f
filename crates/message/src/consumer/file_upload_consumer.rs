use super::{Consumer, PartSeriesConsumer, Poison, SCAN_CHUNK, suspend};
use crate::buffer::Allocator;
use crate::config::ConsumerConfig;
use crate::cursor::{Cursor, LimitCursor};
use crate::protocol::{Boundary, ParseError, PartData};
use std::sync::Arc;
use tracing::trace;

/// Consumes a multipart body framed by `Content-Length`.
///
/// The series only ever sees `length` bytes of the cursor, so a terminal
/// boundary without a final line break is accepted and the next message is
/// never touched. Bytes between the terminal boundary and the end of the body
/// are discarded.
#[derive(Debug)]
pub struct FileUploadConsumer {
    series: PartSeriesConsumer,
    remaining: u64,
    poison: Poison,
}

impl FileUploadConsumer {
    pub fn new(allocator: Arc<dyn Allocator>, boundary: Boundary, length: u64, config: ConsumerConfig) -> Self {
        Self { series: PartSeriesConsumer::new(allocator, boundary, config), remaining: length, poison: Poison::default() }
    }

    pub fn series(&self) -> &PartSeriesConsumer {
        &self.series
    }

    pub fn into_part_data(self) -> PartData {
        self.series.into_part_data()
    }

    fn advance(&mut self, cursor: &mut LimitCursor<&mut dyn Cursor>) -> Result<(), ParseError> {
        self.series.consume(cursor)?;
        if !self.series.is_finished() {
            return Ok(());
        }

        let mut chunk = [0u8; SCAN_CHUNK];
        let mut discarded = 0;
        while cursor.remaining() > 0 {
            let count = cursor.read(&mut chunk)?;
            if count == 0 {
                return suspend(&*cursor);
            }
            discarded += count;
        }

        if discarded > 0 {
            trace!(discarded, "discarded multipart epilogue");
        }
        Ok(())
    }
}

impl Consumer for FileUploadConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        self.poison.check()?;
        if self.is_finished() {
            return Ok(());
        }

        let mut limited = LimitCursor::new(cursor, self.remaining);
        let result = self.advance(&mut limited);
        self.remaining = limited.remaining();
        self.poison.guard(result)
    }

    fn is_finished(&self) -> bool {
        self.series.is_finished() && self.remaining == 0
    }
}
