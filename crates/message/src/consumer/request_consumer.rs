//! Consumer for the request line and header block of an HTTP request.
//!
//! Empty lines ahead of the request line are skipped, as RFC 7230 section 3.5
//! asks of servers. The request line and the headers are then collected as one
//! block by a [`BlockReader`], the request line is scanned into [`Token`]s and
//! the remaining lines go through the [`HeaderParser`].

use super::{BlockReader, Consumer, HeaderParser, Poison, suspend};
use crate::config::ConsumerConfig;
use crate::cursor::Cursor;
use crate::protocol::{ParseError, RequestHeader, Segment};
use crate::scan::{Scanner, Token, is_space, is_target, is_terminal, is_token};
use crate::utils::ensure;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Skipping empty lines before the request line
    Idle,
    /// Collecting the request line and headers
    Block,
    Done,
}

/// Consumes `method SP target SP HTTP/major.minor CRLF` and the header block
/// that follows it.
#[derive(Debug)]
pub struct RequestConsumer {
    stage: Stage,
    reader: BlockReader,
    parser: HeaderParser,
    header: Option<RequestHeader>,
    poison: Poison,
}

impl RequestConsumer {
    pub fn new(config: ConsumerConfig) -> Self {
        Self {
            stage: Stage::Idle,
            reader: BlockReader::new(config.get_max_header_bytes()),
            parser: HeaderParser::new(config),
            header: None,
            poison: Poison::default(),
        }
    }

    /// True until the first byte of a request line arrived.
    pub fn is_idle(&self) -> bool {
        self.stage == Stage::Idle
    }

    pub fn header(&self) -> Option<&RequestHeader> {
        self.header.as_ref()
    }

    pub fn take_header(&mut self) -> Option<RequestHeader> {
        self.header.take()
    }

    pub fn method(&self) -> Option<&str> {
        self.header.as_ref().map(RequestHeader::method)
    }

    pub fn target(&self) -> Option<&str> {
        self.header.as_ref().map(RequestHeader::target)
    }

    pub fn major(&self) -> Option<u32> {
        self.header.as_ref().map(RequestHeader::major)
    }

    pub fn minor(&self) -> Option<u32> {
        self.header.as_ref().map(RequestHeader::minor)
    }

    fn advance(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        if self.stage == Stage::Idle {
            loop {
                let Some(byte) = cursor.read_byte()? else {
                    return suspend(&*cursor);
                };
                if !is_terminal(byte) {
                    cursor.push(&[byte])?;
                    self.stage = Stage::Block;
                    break;
                }
            }
        }

        if !self.reader.read(cursor)? {
            return Ok(());
        }

        let mut block = self.reader.take();
        let mut scanner = Scanner::new(&block);
        let line = scanner.line().ok_or_else(|| ParseError::invalid_header("request line is not terminated"))?;
        let (method, target, major, minor) = parse_request_line(line.as_bytes(&block))?;

        let end = scanner.pos();
        let line = block.split_to(end).freeze();
        let headers = self.parser.parse(&block)?;

        let header = RequestHeader::new(line, method, target, major, minor, Segment::new(headers));
        trace!(method = header.method(), uri = header.target(), major, minor, "parsed request header");

        self.header = Some(header);
        self.stage = Stage::Done;
        Ok(())
    }
}

impl Consumer for RequestConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        self.poison.check()?;
        if self.stage == Stage::Done {
            return Ok(());
        }
        let result = self.advance(cursor);
        self.poison.guard(result)
    }

    fn is_finished(&self) -> bool {
        self.stage == Stage::Done
    }
}

/// Scans a request line without its line break.
///
/// The returned tokens index into `line`.
fn parse_request_line(line: &[u8]) -> Result<(Token, Token, u32, u32), ParseError> {
    let mut scanner = Scanner::new(line);

    let method = scanner.take_while(is_token);
    ensure!(!method.is_empty(), ParseError::InvalidMethod);
    ensure!(scanner.skip_while(is_space) > 0, ParseError::InvalidMethod);

    let target = scanner.take_while(is_target);
    ensure!(!target.is_empty(), ParseError::InvalidUri);
    scanner.skip_while(is_space);

    ensure!(scanner.expect(b"HTTP/"), ParseError::InvalidVersion(scanner.peek()));
    let major = scanner.digits().ok_or(ParseError::InvalidVersion(scanner.peek()))?;
    ensure!(scanner.expect(b"."), ParseError::InvalidVersion(scanner.peek()));
    let minor = scanner.digits().ok_or(ParseError::InvalidVersion(scanner.peek()))?;

    scanner.skip_while(is_space);
    ensure!(scanner.is_done(), ParseError::InvalidVersion(scanner.peek()));

    Ok((method, target, major, minor))
}
