//! Consumer for bodies framed by a `Content-Length` header.
//!
//! See [RFC 7230 Section 3.3.2](https://tools.ietf.org/html/rfc7230#section-3.3.2).

use super::{Consumer, Poison, SCAN_CHUNK, suspend};
use crate::buffer::{Allocator, Buffer};
use crate::cursor::Cursor;
use crate::protocol::ParseError;
use bytes::Bytes;
use std::cmp;
use tracing::trace;

/// Copies exactly `length` bytes, whatever follows them stays on the cursor.
#[derive(Debug)]
pub struct FixedLengthConsumer {
    /// The number of bytes remaining to be read from the payload
    remaining: u64,
    buffer: Buffer,
    poison: Poison,
}

impl FixedLengthConsumer {
    /// Creates a consumer for a payload of `length` bytes.
    ///
    /// Fails when the allocator cannot hold a payload that large.
    pub fn new(allocator: &dyn Allocator, length: u64) -> Result<Self, ParseError> {
        let size_hint = usize::try_from(length).map_err(|e| ParseError::invalid_content_length(format!("{length} does not fit in memory: {e}")))?;
        let buffer = allocator.allocate_with(size_hint)?;
        Ok(Self { remaining: length, buffer, poison: Poison::default() })
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn content(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    pub fn into_content(self) -> Bytes {
        self.buffer.freeze()
    }

    fn advance(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        let mut chunk = [0u8; SCAN_CHUNK];

        while self.remaining > 0 {
            // Read the minimum of remaining length and the scratch chunk
            let want = cmp::min(self.remaining, SCAN_CHUNK as u64) as usize;
            let count = cursor.read(&mut chunk[..want])?;
            if count == 0 {
                return suspend(&*cursor);
            }

            self.buffer.append(&chunk[..count])?;
            self.remaining -= count as u64;
        }

        trace!(len = self.buffer.len(), "finished reading fixed length content");
        Ok(())
    }
}

impl Consumer for FixedLengthConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        self.poison.check()?;
        if self.remaining == 0 {
            return Ok(());
        }
        let result = self.advance(cursor);
        self.poison.guard(result)
    }

    fn is_finished(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ArrayAllocator;
    use crate::consumer::test_support::feed;
    use crate::cursor::BytesCursor;

    #[test]
    fn test_basic() {
        let mut length = FixedLengthConsumer::new(&ArrayAllocator::default(), 10).unwrap();
        let mut cursor = BytesCursor::complete(b"1234567890abcdef\r\n\r\n");
        length.consume(&mut cursor).unwrap();

        assert!(length.is_finished());
        assert_eq!(length.content(), b"1234567890");
        assert_eq!(cursor.remaining(), b"abcdef\r\n\r\n");
    }

    #[test]
    fn test_dribble() {
        let input = b"1234567890abcdef";
        for step in 1..input.len() {
            let mut length = FixedLengthConsumer::new(&ArrayAllocator::default(), 10).unwrap();
            let rest = feed(&mut length, input, step).unwrap();
            assert_eq!(length.content(), b"1234567890");
            assert_eq!(&rest[..], b"abcdef");
        }
    }

    #[test]
    fn test_zero_length() {
        let mut length = FixedLengthConsumer::new(&ArrayAllocator::default(), 0).unwrap();
        assert!(length.is_finished());
        let mut cursor = BytesCursor::complete("GET");
        length.consume(&mut cursor).unwrap();
        assert_eq!(cursor.remaining(), b"GET");
    }

    #[test]
    fn test_truncated() {
        let mut length = FixedLengthConsumer::new(&ArrayAllocator::default(), 10).unwrap();
        let mut cursor = BytesCursor::complete("12345");
        assert!(matches!(length.consume(&mut cursor), Err(ParseError::UnexpectedEof)));
        assert_eq!(length.remaining(), 5);
    }

    #[test]
    fn test_over_limit() {
        let allocator = ArrayAllocator::new(16, 64);
        assert!(matches!(FixedLengthConsumer::new(&allocator, 65), Err(ParseError::Allocation { .. })));
    }
}
