//! Growable byte accumulators handed out to the consumers.
//!
//! A [`Buffer`] is owned by exactly one consumer while it decodes content and
//! is frozen into [`Bytes`] once that consumer finishes. Every buffer carries a
//! hard limit so a hostile peer cannot make a consumer grow without bound.

mod allocator;

pub use allocator::{Allocator, ArrayAllocator};

use crate::protocol::ParseError;
use crate::utils::ensure;
use bytes::{Bytes, BytesMut};

/// An append-only byte store with a capacity limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buffer {
    bytes: BytesMut,
    limit: usize,
}

impl Buffer {
    pub fn new(capacity: usize, limit: usize) -> Self {
        Self { bytes: BytesMut::with_capacity(capacity.min(limit)), limit }
    }

    /// Appends `src`, failing when the result would exceed the limit.
    pub fn append(&mut self, src: &[u8]) -> Result<(), ParseError> {
        let requested = self.bytes.len() + src.len();
        ensure!(requested <= self.limit, ParseError::allocation(requested, self.limit));
        self.bytes.extend_from_slice(src);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn truncate(&mut self, len: usize) {
        self.bytes.truncate(len);
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Takes everything appended so far, leaving the buffer empty but usable.
    pub fn split(&mut self) -> Bytes {
        self.bytes.split().freeze()
    }

    pub fn freeze(self) -> Bytes {
        self.bytes.freeze()
    }

    /// Decodes the content as UTF-8.
    pub fn encode(&self) -> Result<String, ParseError> {
        decode(&self.bytes, "utf-8")
    }

    /// Decodes the content with the named charset.
    pub fn encode_with(&self, charset: &str) -> Result<String, ParseError> {
        decode(&self.bytes, charset)
    }
}

/// Decodes `bytes` with one of the charsets commonly declared on HTTP messages.
pub fn decode(bytes: &[u8], charset: &str) -> Result<String, ParseError> {
    let charset = charset.trim();
    if charset.eq_ignore_ascii_case("utf-8") || charset.eq_ignore_ascii_case("utf8") {
        return String::from_utf8(bytes.to_vec()).map_err(|e| ParseError::invalid_encoding(e.utf8_error()));
    }

    if charset.eq_ignore_ascii_case("us-ascii") || charset.eq_ignore_ascii_case("ascii") {
        ensure!(bytes.is_ascii(), ParseError::invalid_encoding("non ascii byte in us-ascii content"));
        return Ok(bytes.iter().copied().map(char::from).collect());
    }

    if charset.eq_ignore_ascii_case("iso-8859-1") || charset.eq_ignore_ascii_case("latin1") {
        return Ok(bytes.iter().copied().map(char::from).collect());
    }

    Err(ParseError::invalid_encoding(format!("unsupported charset {charset}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_within_limit() {
        let mut buffer = Buffer::new(4, 8);
        buffer.append(b"1234").unwrap();
        buffer.append(b"5678").unwrap();
        assert_eq!(buffer.as_bytes(), b"12345678");

        let result = buffer.append(b"9");
        assert!(matches!(result, Err(ParseError::Allocation { requested: 9, limit: 8 })));
        assert_eq!(buffer.len(), 8);
    }

    #[test]
    fn test_split_keeps_buffer_usable() {
        let mut buffer = Buffer::new(0, 16);
        buffer.append(b"abc").unwrap();
        assert_eq!(buffer.split(), Bytes::from_static(b"abc"));
        assert!(buffer.is_empty());

        buffer.append(b"def").unwrap();
        assert_eq!(buffer.freeze(), Bytes::from_static(b"def"));
    }

    #[test]
    fn test_encode() {
        let mut buffer = Buffer::new(0, 16);
        buffer.append("caf\u{e9}".as_bytes()).unwrap();
        assert_eq!(buffer.encode().unwrap(), "caf\u{e9}");

        let mut latin = Buffer::new(0, 16);
        latin.append(&[b'c', b'a', b'f', 0xe9]).unwrap();
        assert_eq!(latin.encode_with("ISO-8859-1").unwrap(), "caf\u{e9}");
        assert!(latin.encode().is_err());
        assert!(latin.encode_with("us-ascii").is_err());
        assert!(latin.encode_with("koi8-r").is_err());
    }
}
