//! Header block consumption.
//!
//! A header block is read in two steps. [`BlockReader`] collects raw bytes up
//! to and including the empty line that ends the block, without ever keeping
//! bytes that belong to what follows. [`HeaderParser`] then turns the
//! collected block into [`Headers`]. [`SegmentConsumer`] combines the two for
//! the headers of a multipart part, `RequestConsumer` does the same after the
//! request line.

use super::{Consumer, Poison, SCAN_CHUNK, suspend};
use crate::config::ConsumerConfig;
use crate::cursor::Cursor;
use crate::protocol::{Headers, ParseError, Segment};
use crate::scan::{Scanner, Token, is_space};
use crate::utils::ensure;
use bytes::{Bytes, BytesMut};
use http::HeaderName;
use memchr::{memchr, memmem};
use tracing::trace;

const EMPTY_LINE: &[u8] = b"\r\n\r\n";

/// Collects a header block up to the empty line that terminates it.
///
/// A block that starts with `CRLF` is an empty block. Bytes read past the end
/// of the block are pushed back onto the cursor.
#[derive(Debug)]
pub struct BlockReader {
    block: BytesMut,
    limit: usize,
    done: bool,
}

impl BlockReader {
    pub fn new(limit: usize) -> Self {
        Self { block: BytesMut::new(), limit, done: false }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// The bytes collected so far.
    pub fn block(&self) -> &[u8] {
        &self.block
    }

    /// Takes the collected block out of the reader.
    pub fn take(&mut self) -> BytesMut {
        self.block.split()
    }

    /// Reads from `cursor` until the block is complete or nothing is left.
    ///
    /// Returns whether the block is complete.
    pub fn read(&mut self, cursor: &mut dyn Cursor) -> Result<bool, ParseError> {
        let mut chunk = [0u8; SCAN_CHUNK];

        while !self.done {
            let count = cursor.read(&mut chunk)?;
            if count == 0 {
                suspend(&*cursor)?;
                return Ok(false);
            }

            let scanned = self.block.len();
            self.block.extend_from_slice(&chunk[..count]);

            match self.find_end(scanned) {
                Some(end) => {
                    ensure!(end <= self.limit, ParseError::too_large_header(end, self.limit));
                    let rest = self.block.split_off(end);
                    cursor.push(&rest)?;
                    self.done = true;
                    trace!(size = end, "read header block");
                }
                None => {
                    ensure!(self.block.len() <= self.limit, ParseError::too_large_header(self.block.len(), self.limit));
                }
            }
        }
        Ok(true)
    }

    /// Finds the end of the block, searching only where a terminator could
    /// have been completed by the bytes appended after `scanned`.
    fn find_end(&self, scanned: usize) -> Option<usize> {
        if self.block.starts_with(b"\r\n") {
            return Some(2);
        }

        let from = scanned.saturating_sub(EMPTY_LINE.len() - 1);
        memmem::find(&self.block[from..], EMPTY_LINE).map(|pos| from + pos + EMPTY_LINE.len())
    }
}

/// Parses a complete header block into [`Headers`].
///
/// Each line is either `name ":" value` or a continuation line starting with
/// a space or tab, which is folded into the previous value. Values are trimmed
/// and the number of fields is limited.
#[derive(Debug, Clone, Copy)]
pub struct HeaderParser {
    max_header_num: usize,
}

impl HeaderParser {
    pub fn new(config: ConsumerConfig) -> Self {
        Self { max_header_num: config.get_max_header_num() }
    }

    pub fn parse(&self, block: &[u8]) -> Result<Headers, ParseError> {
        let mut scanner = Scanner::new(block);
        let mut headers = Headers::new();

        while let Some(line) = scanner.line() {
            let bytes = line.as_bytes(block);
            if bytes.is_empty() {
                break;
            }

            if bytes.first().copied().is_some_and(is_space) {
                headers.fold(&line.text(block))?;
                continue;
            }

            let colon = memchr(b':', bytes).ok_or_else(|| ParseError::invalid_header("header line without colon"))?;
            let name = HeaderName::from_bytes(&bytes[..colon]).map_err(ParseError::invalid_header)?;

            ensure!(headers.len() < self.max_header_num, ParseError::too_many_headers(self.max_header_num));

            let value = Token::new(line.off() + colon + 1, line.len() - colon - 1).trim(block);
            headers.append(name, value.text(block));
        }

        trace!(header_count = headers.len(), "parsed header block");
        Ok(headers)
    }
}

/// Consumes the header block of a multipart part.
#[derive(Debug)]
pub struct SegmentConsumer {
    reader: BlockReader,
    parser: HeaderParser,
    segment: Option<Segment>,
    finished: bool,
    poison: Poison,
}

impl SegmentConsumer {
    pub fn new(config: ConsumerConfig) -> Self {
        Self {
            reader: BlockReader::new(config.get_max_header_bytes()),
            parser: HeaderParser::new(config),
            segment: None,
            finished: false,
            poison: Poison::default(),
        }
    }

    /// The parsed segment, once finished.
    pub fn segment(&self) -> Option<&Segment> {
        self.segment.as_ref()
    }

    pub fn take_segment(&mut self) -> Option<Segment> {
        self.segment.take()
    }

    fn advance(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        if !self.reader.read(cursor)? {
            return Ok(());
        }

        let block: Bytes = self.reader.take().freeze();
        let headers = self.parser.parse(&block)?;
        self.segment = Some(Segment::new(headers));
        self.finished = true;
        Ok(())
    }
}

impl Consumer for SegmentConsumer {
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
