//! Resumable parsers driven by a [`Cursor`].
//!
//! Every consumer is a hand written state machine. A call to
//! [`Consumer::consume`] advances it as far as the bytes currently available
//! allow and then returns, whether or not it has finished. The owner of the
//! cursor keeps feeding bytes and calling `consume` until
//! [`Consumer::is_finished`] reports true. The result is the same whether the
//! input arrives in one piece or one byte at a time.
//!
//! A consumer never reads past the end of what it parses: bytes it had to read
//! ahead are pushed back onto the cursor before it finishes, so the next
//! consumer (or the next pipelined request) sees them.
//!
//! # Components
//!
//! - Scanning: [`BoundaryConsumer`], [`TokenConsumer`], [`ContentConsumer`]
//! - Header blocks: [`SegmentConsumer`], [`RequestConsumer`] (built from [`BlockReader`] and [`HeaderParser`])
//! - Bodies: [`FixedLengthConsumer`], [`ChunkedConsumer`], [`BodyConsumer`]
//! - Multipart: [`PartConsumer`], [`PartSeriesConsumer`], [`FileUploadConsumer`], [`ChunkedUploadConsumer`]
//! - Requests: [`EntityConsumer`]

mod body_consumer;
mod boundary_consumer;
mod chunked_consumer;
mod chunked_upload_consumer;
mod content_consumer;
mod entity_consumer;
mod file_upload_consumer;
mod fixed_length_consumer;
mod part_consumer;
mod part_series_consumer;
mod request_consumer;
mod segment_consumer;
mod token_consumer;

pub use body_consumer::BodyConsumer;
pub use boundary_consumer::BoundaryConsumer;
pub use chunked_consumer::ChunkedConsumer;
pub use chunked_upload_consumer::ChunkedUploadConsumer;
pub use content_consumer::ContentConsumer;
pub use entity_consumer::EntityConsumer;
pub use file_upload_consumer::FileUploadConsumer;
pub use fixed_length_consumer::FixedLengthConsumer;
pub use part_consumer::PartConsumer;
pub use part_series_consumer::PartSeriesConsumer;
pub use request_consumer::RequestConsumer;
pub use segment_consumer::{BlockReader, HeaderParser, SegmentConsumer};
pub use token_consumer::TokenConsumer;

use crate::cursor::Cursor;
use crate::protocol::ParseError;
use tracing::debug;

/// Size of the stack buffer used when a consumer reads in bulk.
const SCAN_CHUNK: usize = 2 * 1024;

/// A resumable parser.
pub trait Consumer {
    /// Advances the parser with the bytes currently available on `cursor`.
    ///
    /// Returns `Ok(())` both when the parser finished and when it ran out of
    /// input, check [`is_finished`](Self::is_finished) to tell them apart.
    /// Calling it again after the parser finished does nothing. Once it
    /// returned an error every later call fails with [`ParseError::Failed`].
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError>;

    fn is_finished(&self) -> bool;
}

/// Remembers that a consumer hit a terminal failure.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Poison(bool);

impl Poison {
    fn check(self) -> Result<(), ParseError> {
        if self.0 { Err(ParseError::Failed) } else { Ok(()) }
    }

    fn guard<T>(&mut self, result: Result<T, ParseError>) -> Result<T, ParseError> {
        if let Err(e) = &result {
            self.0 = true;
            debug!(cause = %e, "consumer failed");
        }
        result
    }
}

/// Called when `cursor` had nothing to read: suspends while the stream is open,
/// fails once it is exhausted.
fn suspend(cursor: &dyn Cursor) -> Result<(), ParseError> {
    if cursor.is_open() { Ok(()) } else { Err(ParseError::UnexpectedEof) }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Consumer;
    use crate::cursor::{BytesCursor, Cursor};
    use crate::protocol::ParseError;
    use bytes::BytesMut;
    use std::io;

    const MAX_ROUNDS: usize = 1 << 20;

    /// Feeds `input` to `consumer` in fragments of `step` bytes, letting it
    /// suspend between fragments, then closes the stream.
    ///
    /// Returns the bytes the consumer left on the cursor.
    pub(crate) fn feed<C: Consumer>(consumer: &mut C, input: &[u8], step: usize) -> Result<BytesMut, ParseError> {
        let mut cursor = BytesCursor::empty();
        for fragment in input.chunks(step.max(1)) {
            cursor.feed(fragment);
            consumer.consume(&mut cursor)?;
        }
        cursor.close();
        consumer.consume(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Hands out `prefix`, then fails every read with an error of `kind`.
    #[derive(Debug)]
    pub(crate) struct FailingCursor {
        prefix: BytesCursor,
        kind: io::ErrorKind,
    }

    impl FailingCursor {
        pub(crate) fn new(prefix: &str, kind: io::ErrorKind) -> Self {
            Self { prefix: BytesCursor::complete(prefix), kind }
        }
    }

    impl Cursor for FailingCursor {
        fn is_open(&self) -> bool {
            true
        }

        fn ready(&self) -> usize {
            self.prefix.ready().max(1)
        }

        fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
            match self.prefix.read(dst)? {
                0 => Err(io::Error::new(self.kind, "connection lost")),
                count => Ok(count),
            }
        }

        fn push(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.prefix.push(bytes)
        }
    }

    /// Calls `consume` until the consumer finishes.
    pub(crate) fn drive<C: Consumer>(consumer: &mut C, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        for _ in 0..MAX_ROUNDS {
            if consumer.is_finished() {
                return Ok(());
            }
            consumer.consume(cursor)?;
        }
        panic!("consumer did not finish");
    }
}
