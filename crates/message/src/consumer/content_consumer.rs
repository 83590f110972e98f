//! Consumer for the content of one multipart part.
//!
//! Content runs until the delimiter `CRLF--boundary`. A running match index
//! into the delimiter survives between calls, so a delimiter split across
//! fragments is still found. When the match breaks the bytes held back are
//! appended as content, in order, before scanning resumes.

use super::{Consumer, Poison, SCAN_CHUNK, suspend};
use crate::buffer::{Allocator, Buffer};
use crate::cursor::Cursor;
use crate::protocol::{Boundary, ParseError};
use bytes::Bytes;
use tracing::trace;

/// Copies part content into a [`Buffer`] up to the next delimiter.
///
/// The delimiter itself is pushed back onto the cursor so the entry that
/// follows can consume it.
#[derive(Debug)]
pub struct ContentConsumer {
    boundary: Boundary,
    buffer: Buffer,
    matched: usize,
    finished: bool,
    poison: Poison,
}

impl ContentConsumer {
    pub fn new(allocator: &dyn Allocator, boundary: Boundary) -> Self {
        Self { boundary, buffer: allocator.allocate(), matched: 0, finished: false, poison: Poison::default() }
    }

    /// The content decoded so far.
    pub fn content(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Takes the decoded content out of the consumer.
    pub fn take(&mut self) -> Bytes {
        self.buffer.split()
    }

    fn advance(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        let mut chunk = [0u8; SCAN_CHUNK];

        while !self.finished {
            let count = cursor.read(&mut chunk)?;
            if count == 0 {
                return suspend(&*cursor);
            }

            let delimiter = self.boundary.delimiter();
            if let Some(end) = scan(delimiter, &mut self.matched, &mut self.buffer, &chunk[..count])? {
                cursor.push(&chunk[end..count])?;
                cursor.push(delimiter)?;
                self.finished = true;
                trace!(len = self.buffer.len(), "read part content");
            }
        }
        Ok(())
    }
}

impl Consumer for ContentConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        self.poison.check()?;
        if self.finished {
            return Ok(());
        }
        let result = self.advance(cursor);
        self.poison.guard(result)
    }

    fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Appends the content of `chunk` to `buffer` until `delimiter` completes.
///
/// Returns the index just past the delimiter when it completed inside `chunk`.
/// The delimiter never contains a second CR, so a broken match can only
/// restart at the byte that broke it.
fn scan(delimiter: &[u8], matched: &mut usize, buffer: &mut Buffer, chunk: &[u8]) -> Result<Option<usize>, ParseError> {
    let mut start = 0;

    for (index, &byte) in chunk.iter().enumerate() {
        if byte == delimiter[*matched] {
            if *matched == 0 {
                buffer.append(&chunk[start..index])?;
            }
            *matched += 1;
            start = index + 1;

            if *matched == delimiter.len() {
                *matched = 0;
                return Ok(Some(index + 1));
            }
        } else if *matched > 0 {
            buffer.append(&delimiter[..*matched])?;
            if byte == delimiter[0] {
                *matched = 1;
                start = index + 1;
            } else {
                *matched = 0;
                start = index;
            }
        }
    }

    if *matched == 0 {
        buffer.append(&chunk[start..])?;
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ArrayAllocator;
    use crate::consumer::test_support::{drive, feed};
    use crate::cursor::{BytesCursor, DribbleCursor};

    fn consumer() -> ContentConsumer {
        ContentConsumer::new(&ArrayAllocator::default(), Boundary::new("AaB03x").unwrap())
    }

    /// Decimal numbers with a line feed roughly every 48 characters.
    fn entity(size: usize) -> String {
        let mut entity = String::new();
        let mut line = 0;
        let mut i = 0;
        while entity.len() < size {
            let text = i.to_string();
            line += text.len();
            entity.push_str(&text);
            if line >= 48 {
                entity.push('\n');
                line = 0;
            }
            i += 1;
        }
        entity
    }

    fn check(entity_size: usize, dribble: usize) {
        let entity = entity(entity_size);
        let input = format!("{entity}\r\n--AaB03x\r\n");

        let mut content = consumer();
        let mut cursor = DribbleCursor::new(BytesCursor::complete(&input), dribble);
        drive(&mut content, &mut cursor).unwrap();

        assert_eq!(content.content(), entity.as_bytes(), "failed for entity_size={entity_size} and dribble={dribble}");
        assert_eq!(cursor.into_inner().remaining(), b"\r\n--AaB03x\r\n");
    }

    #[test]
    fn test_content() {
        check(1, 1);
        for size in 1..300 {
            check(size, size);
        }
        for size in (20..1000).step_by(37) {
            for dribble in 1..19 {
                check(size, dribble);
            }
        }
        check(10, 10);
        check(100, 2);
        check(10_000, 4096);
    }

    #[test]
    fn test_partial_delimiters_are_content() {
        let entity = "a\r\nb\r\n-c\r\n--d\r\n--AaB0\r\r\n--AaB03\r\n--AaB03y";
        let input = format!("{entity}\r\n--AaB03x--");

        for step in 1..input.len() {
            let mut content = consumer();
            let rest = feed(&mut content, input.as_bytes(), step).unwrap();
            assert!(content.is_finished());
            assert_eq!(content.content(), entity.as_bytes(), "failed for step={step}");
            assert_eq!(&rest[..], b"\r\n--AaB03x--");
        }
    }

    #[test]
    fn test_take() {
        let mut content = consumer();
        let mut cursor = BytesCursor::complete("hello\r\n--AaB03x");
        content.consume(&mut cursor).unwrap();
        assert_eq!(content.take(), Bytes::from_static(b"hello"));
        assert!(content.content().is_empty());
    }

    #[test]
    fn test_eof_before_delimiter() {
        let mut content = consumer();
        let mut cursor = BytesCursor::complete("no delimiter\r\n--AaB");
        assert!(matches!(content.consume(&mut cursor), Err(ParseError::UnexpectedEof)));
    }
}
