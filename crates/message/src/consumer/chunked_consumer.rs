//! Consumer for HTTP chunked transfer encoding.
//!
//! This module decodes bodies that use chunked transfer encoding as specified in
//! [RFC 7230 Section 4.1](https://tools.ietf.org/html/rfc7230#section-4.1).
//!
//! The chunked encoding allows the sender to transmit message data in a series of chunks,
//! indicating the size of each chunk before its data. Trailer fields after the last
//! chunk are parsed with the same [`HeaderParser`] used for header blocks.

use super::{Consumer, HeaderParser, Poison, SCAN_CHUNK, suspend};
use crate::buffer::{Allocator, Buffer};
use crate::config::ConsumerConfig;
use crate::cursor::Cursor;
use crate::protocol::{Headers, ParseError};
use bytes::{Bytes, BytesMut};
use std::task::Poll;
use tracing::trace;
use ChunkedState::*;

/// A consumer for HTTP chunked transfer encoding.
///
/// The consumer processes incoming bytes according to the chunked format:
/// - Each chunk starts with its size in hexadecimal
/// - Followed by optional extensions and CRLF
/// - Then the chunk data and CRLF
/// - A zero-sized chunk, optional trailer fields and an empty line end the body
///
/// The decoded output is the concatenation of the chunk data, whatever the
/// chunk sizes or the fragmentation of the input.
#[derive(Debug)]
pub struct ChunkedConsumer {
    state: ChunkedState,
    remaining_size: u64,
    buffer: Buffer,
    trailer: BytesMut,
    trailers: Headers,
    parser: HeaderParser,
    max_trailer_bytes: usize,
    poison: Poison,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the first hex digit of the chunk size
    SizeStart,
    /// Read the chunk size in hex
    Size,
    /// Handle whitespace after size
    SizeLws,
    /// Skip chunk extensions
    Extension,
    /// Read LF after chunk size
    SizeLf,
    /// Read chunk data
    Body,
    /// Read CR after chunk data
    BodyCr,
    /// Read LF after chunk data
    BodyLf,
    /// Read a trailer field
    Trailer,
    /// Read LF after trailer
    TrailerLf,
    /// Read final CR, or the first byte of a trailer field
    EndCr,
    /// Read final LF
    EndLf,
    /// Final state after reading last chunk
    End,
}

impl ChunkedConsumer {
    /// Creates a new consumer, ready to read the size of the first chunk.
    pub fn new(allocator: &dyn Allocator, config: ConsumerConfig) -> Self {
        Self {
            state: SizeStart,
            remaining_size: 0,
            buffer: allocator.allocate(),
            trailer: BytesMut::new(),
            trailers: Headers::new(),
            parser: HeaderParser::new(config),
            max_trailer_bytes: config.get_max_header_bytes(),
            poison: Poison::default(),
        }
    }

    /// The decoded bytes not yet drained.
    pub fn content(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Hands out the bytes decoded since the last call.
    pub fn drain(&mut self) -> Bytes {
        self.buffer.split()
    }

    pub fn into_content(self) -> Bytes {
        self.buffer.freeze()
    }

    /// Trailer fields, available once the consumer finished.
    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    pub fn take_trailers(&mut self) -> Headers {
        std::mem::take(&mut self.trailers)
    }

    fn advance(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        while self.state != End {
            self.state = match self.step(cursor) {
                Poll::Pending => return suspend(&*cursor),
                Poll::Ready(result) => result?,
            };
        }

        if !self.trailer.is_empty() {
            self.trailers = self.parser.parse(&self.trailer)?;
            self.trailer.clear();
        }
        trace!(len = self.buffer.len(), trailers = self.trailers.len(), "finished reading chunked data");
        Ok(())
    }

    /// Processes the next step in the chunked decoding state machine.
    fn step(&mut self, cursor: &mut dyn Cursor) -> Poll<Result<ChunkedState, ParseError>> {
        match self.state {
            SizeStart => ChunkedState::read_size_start(cursor, &mut self.remaining_size),
            Size => ChunkedState::read_size(cursor, &mut self.remaining_size),
            SizeLws => ChunkedState::read_size_lws(cursor),
            Extension => ChunkedState::read_extension(cursor),
            SizeLf => ChunkedState::read_size_lf(cursor, self.remaining_size),
            Body => ChunkedState::read_body(cursor, &mut self.remaining_size, &mut self.buffer),
            BodyCr => ChunkedState::read_body_cr(cursor),
            BodyLf => ChunkedState::read_body_lf(cursor),
            Trailer => ChunkedState::read_trailer(cursor, &mut self.trailer, self.max_trailer_bytes),
            TrailerLf => ChunkedState::read_trailer_lf(cursor, &mut self.trailer),
            EndCr => ChunkedState::read_end_cr(cursor, &mut self.trailer),
            EndLf => ChunkedState::read_end_lf(cursor),
            End => Poll::Ready(Ok(End)),
        }
    }
}

impl Consumer for ChunkedConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        self.poison.check()?;
        if self.state == End {
            return Ok(());
        }
        let result = self.advance(cursor);
        self.poison.guard(result)
    }

    fn is_finished(&self) -> bool {
        self.state == End
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte + 10 - b'a'),
        b'A'..=b'F' => Some(byte + 10 - b'A'),
        _ => None,
    }
}

macro_rules! try_next_byte {
    ($cursor:ident) => {{
        match $cursor.read_byte() {
            Ok(Some(byte)) => byte,
            Ok(None) => return Poll::Pending,
            Err(e) => return Poll::Ready(Err(ParseError::io(e))),
        }
    }};
}

impl ChunkedState {
    /// Reads the first digit of the chunk size, a size line needs at least one.
    fn read_size_start(cursor: &mut dyn Cursor, size_per_chunk: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        match hex_value(try_next_byte!(cursor)) {
            Some(digit) => {
                *size_per_chunk = u64::from(digit);
                Poll::Ready(Ok(Size))
            }
            None => Poll::Ready(Err(ParseError::invalid_chunk("chunk size line without hex digit"))),
        }
    }

    /// Reads and parses the chunk size in hexadecimal format.
    ///
    /// # State Transitions
    /// - On hex digit (0-9, a-f, A-F): Stay in Size state to read more digits
    /// - On whitespace (tab/space): Transition to SizeLws state
    /// - On semicolon: Transition to Extension state to handle chunk extensions
    /// - On CR: Transition to SizeLf state to finish size line
    /// - On invalid character: Return error
    fn read_size(cursor: &mut dyn Cursor, size_per_chunk: &mut u64) -> Poll<Result<ChunkedState, ParseError>> {
        macro_rules! or_overflow {
            ($e:expr) => {
                match $e {
                    Some(val) => val,
                    None => return Poll::Ready(Err(ParseError::invalid_chunk("invalid overflow chunked length"))),
                }
            };
        }

        let radix = 16;
        match try_next_byte!(cursor) {
            b @ b'0'..=b'9' => {
                *size_per_chunk = or_overflow!(size_per_chunk.checked_mul(radix));
                *size_per_chunk = or_overflow!(size_per_chunk.checked_add(u64::from(b - b'0')));
            }
            b @ b'a'..=b'f' => {
                *size_per_chunk = or_overflow!(size_per_chunk.checked_mul(radix));
                *size_per_chunk = or_overflow!(size_per_chunk.checked_add(u64::from(b + 10 - b'a')));
            }
            b @ b'A'..=b'F' => {
                *size_per_chunk = or_overflow!(size_per_chunk.checked_mul(radix));
                *size_per_chunk = or_overflow!(size_per_chunk.checked_add(u64::from(b + 10 - b'A')));
            }
            b'\t' | b' ' => return Poll::Ready(Ok(SizeLws)),
            b';' => return Poll::Ready(Ok(Extension)),
            b'\r' => return Poll::Ready(Ok(SizeLf)),
            _ => return Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk size line: Invalid Size"))),
        }

        Poll::Ready(Ok(Size))
    }

    /// Processes linear whitespace (LWS) after the chunk size.
    ///
    /// Only tabs and spaces may follow the size, then an extension or the CR.
    fn read_size_lws(cursor: &mut dyn Cursor) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(cursor) {
            // LWS can follow the chunk size, but no more digits can come
            b'\t' | b' ' => Poll::Ready(Ok(SizeLws)),
            b';' => Poll::Ready(Ok(Extension)),
            b'\r' => Poll::Ready(Ok(SizeLf)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk size linear white space"))),
        }
    }

    /// Skips chunk extensions up to the CR.
    ///
    /// Extensions containing a bare LF are rejected.
    fn read_extension(cursor: &mut dyn Cursor) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(cursor) {
            b'\r' => Poll::Ready(Ok(SizeLf)),
            b'\n' => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk extension contains newline"))),
            _ => Poll::Ready(Ok(Extension)), // no supported extensions
        }
    }

    /// Validates the LF byte after the chunk size line.
    ///
    /// # State Transitions
    /// - On LF with size 0: Move to EndCr state for trailers or the final CRLF
    /// - On LF with size > 0: Move to Body state to read chunk data
    /// - On any other byte: Return error
    fn read_size_lf(cursor: &mut dyn Cursor, size_per_chunk: u64) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(cursor) {
            b'\n' if size_per_chunk == 0 => Poll::Ready(Ok(EndCr)),
            b'\n' => {
                trace!(size = size_per_chunk, "read chunk size");
                Poll::Ready(Ok(Body))
            }
            _ => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk size LF"))),
        }
    }

    /// Copies up to `size_per_chunk` bytes of chunk data into `buffer`.
    ///
    /// Never reads past the chunk, the remaining counter carries the position
    /// across calls.
    fn read_body(
        cursor: &mut dyn Cursor,
        size_per_chunk: &mut u64,
        buffer: &mut Buffer,
    ) -> Poll<Result<ChunkedState, ParseError>> {
        let mut chunk = [0u8; SCAN_CHUNK];

        while *size_per_chunk > 0 {
            let want = usize::try_from(*size_per_chunk).map_or(SCAN_CHUNK, |size| size.min(SCAN_CHUNK));
            let count = match cursor.read(&mut chunk[..want]) {
                Ok(0) => return Poll::Pending,
                Ok(count) => count,
                Err(e) => return Poll::Ready(Err(ParseError::io(e))),
            };

            if let Err(e) = buffer.append(&chunk[..count]) {
                return Poll::Ready(Err(e));
            }
            *size_per_chunk -= count as u64;
        }

        Poll::Ready(Ok(BodyCr))
    }

    /// Validates the CR byte after chunk data.
    fn read_body_cr(cursor: &mut dyn Cursor) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(cursor) {
            b'\r' => Poll::Ready(Ok(BodyLf)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk body CR"))),
        }
    }

    /// Validates the LF byte after chunk data, then moves back to Size for the next chunk.
    fn read_body_lf(cursor: &mut dyn Cursor) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(cursor) {
            b'\n' => Poll::Ready(Ok(SizeStart)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk body LF"))),
        }
    }

    /// Collects a trailer field up to its CR.
    fn read_trailer(cursor: &mut dyn Cursor, trailer: &mut BytesMut, limit: usize) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(cursor) {
            b'\r' => Poll::Ready(Ok(TrailerLf)),
            b => {
                if trailer.len() >= limit {
                    return Poll::Ready(Err(ParseError::too_large_header(trailer.len() + 1, limit)));
                }
                trailer.extend_from_slice(&[b]);
                Poll::Ready(Ok(Trailer))
            }
        }
    }

    /// Validates the LF that ends a trailer field.
    fn read_trailer_lf(cursor: &mut dyn Cursor, trailer: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(cursor) {
            b'\n' => {
                trailer.extend_from_slice(b"\r\n");
                Poll::Ready(Ok(EndCr))
            }
            _ => Poll::Ready(Err(ParseError::invalid_chunk("invalid trailer field LF"))),
        }
    }

    /// Reads the final CR, or the first byte of another trailer field.
    fn read_end_cr(cursor: &mut dyn Cursor, trailer: &mut BytesMut) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(cursor) {
            b'\r' => Poll::Ready(Ok(EndLf)),
            b => {
                trailer.extend_from_slice(&[b]);
                Poll::Ready(Ok(Trailer))
            }
        }
    }

    /// Validates the final LF byte of the chunked message.
    fn read_end_lf(cursor: &mut dyn Cursor) -> Poll<Result<ChunkedState, ParseError>> {
        match try_next_byte!(cursor) {
            b'\n' => Poll::Ready(Ok(End)),
            _ => Poll::Ready(Err(ParseError::invalid_chunk("invalid chunk end LF"))),
        }
    }
}
