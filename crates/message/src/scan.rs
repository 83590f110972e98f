//! Byte classification and zero-copy scanning primitives.
//!
//! The header and request-line parsers work on an arena of bytes that has
//! already been read from the cursor. A [`Token`] is an `(offset, length)` pair
//! into that arena and is only turned into text when the value must outlive it.

use memchr::memmem;
use std::borrow::Cow;

#[inline]
pub const fn is_space(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

#[inline]
pub const fn is_terminal(b: u8) -> bool {
    b == b'\r' || b == b'\n'
}

#[inline]
pub const fn is_white(b: u8) -> bool {
    is_space(b) || is_terminal(b)
}

#[inline]
pub const fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

/// `tchar` from RFC 7230 section 3.2.6.
#[inline]
pub const fn is_token(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
    ) || b.is_ascii_alphanumeric()
}

/// Visible characters allowed in a request target.
#[inline]
pub const fn is_target(b: u8) -> bool {
    b > b' ' && b < 0x7f
}

/// Decodes bytes as UTF-8, falling back to ISO-8859-1 for legacy header values.
pub fn text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(str) => Cow::Borrowed(str),
        Err(_) => Cow::Owned(bytes.iter().copied().map(char::from).collect()),
    }
}

/// A view of `len` bytes starting at `off` inside an arena.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    off: usize,
    len: usize,
}

impl Token {
    pub const fn new(off: usize, len: usize) -> Self {
        Self { off, len }
    }

    pub const fn off(&self) -> usize {
        self.off
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn end(&self) -> usize {
        self.off + self.len
    }

    /// The bytes of this token, empty when the token does not fit the arena.
    pub fn as_bytes<'a>(&self, arena: &'a [u8]) -> &'a [u8] {
        arena.get(self.off..self.end()).unwrap_or_default()
    }

    pub fn as_str<'a>(&self, arena: &'a [u8]) -> Option<&'a str> {
        std::str::from_utf8(self.as_bytes(arena)).ok()
    }

    pub fn text<'a>(&self, arena: &'a [u8]) -> Cow<'a, str> {
        text(self.as_bytes(arena))
    }

    /// Shrinks the token so it neither starts nor ends with white space.
    #[must_use]
    pub fn trim(self, arena: &[u8]) -> Self {
        let bytes = self.as_bytes(arena);
        let start = bytes.iter().position(|b| !is_white(*b)).unwrap_or(bytes.len());
        let end = bytes.iter().rposition(|b| !is_white(*b)).map_or(start, |pos| pos + 1);
        Self::new(self.off + start, end - start)
    }
}

/// Explicit parser state: the arena being scanned and the current index.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    array: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(array: &'a [u8]) -> Self {
        Self { array, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.array.len()
    }

    pub fn peek(&self) -> Option<u8> {
        self.array.get(self.pos).copied()
    }

    pub fn bump(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    /// Consumes `literal` if the remaining input starts with it.
    pub fn expect(&mut self, literal: &[u8]) -> bool {
        let matched = self.array.get(self.pos..).is_some_and(|rest| rest.starts_with(literal));
        if matched {
            self.pos += literal.len();
        }
        matched
    }

    /// Skips bytes matching `predicate`, returning how many were skipped.
    pub fn skip_while(&mut self, predicate: impl Fn(u8) -> bool) -> usize {
        self.take_while(predicate).len()
    }

    /// Consumes bytes matching `predicate` into a token.
    pub fn take_while(&mut self, predicate: impl Fn(u8) -> bool) -> Token {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if !predicate(byte) {
                break;
            }
            self.pos += 1;
        }
        Token::new(start, self.pos - start)
    }

    /// Consumes everything up to the end of the current line and the line break itself.
    ///
    /// Returns `None` when no complete `CRLF` terminated line is left.
    pub fn line(&mut self) -> Option<Token> {
        let rest = self.array.get(self.pos..)?;
        let end = memmem::find(rest, b"\r\n")?;
        let token = Token::new(self.pos, end);
        self.pos += end + 2;
        Some(token)
    }

    /// Consumes a run of decimal digits, `None` when there are none or the value overflows.
    pub fn digits(&mut self) -> Option<u32> {
        let token = self.take_while(is_digit);
        if token.is_empty() {
            return None;
        }

        token
            .as_bytes(self.array)
            .iter()
            .try_fold(0u32, |value, digit| value.checked_mul(10)?.checked_add(u32::from(digit - b'0')))
    }

    /// Consumes the rest of the input.
    pub fn rest(&mut self) -> Token {
        let token = Token::new(self.pos, self.array.len().saturating_sub(self.pos));
        self.pos = self.array.len();
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert!(is_space(b' '));
        assert!(is_space(b'\t'));
        assert!(!is_space(b'\r'));
        assert!(is_white(b'\n'));
        assert!(is_terminal(b'\r'));
        assert!(is_digit(b'7'));
        assert!(is_token(b'-'));
        assert!(!is_token(b':'));
        assert!(!is_token(b' '));
        assert!(is_target(b'/'));
        assert!(!is_target(b' '));
    }

    #[test]
    fn test_token_trim() {
        let arena = b"Host:   some.host.com    ";
        let token = Token::new(5, arena.len() - 5).trim(arena);
        assert_eq!(token.text(arena), "some.host.com");

        let blank = Token::new(5, 3).trim(arena);
        assert!(blank.is_empty());
    }

    #[test]
    fn test_scanner() {
        let arena = b"GET  /index.html HTTP/1.1\r\nrest";
        let mut scanner = Scanner::new(arena);

        let method = scanner.take_while(is_token);
        assert_eq!(method.as_str(arena), Some("GET"));
        assert_eq!(scanner.skip_while(is_space), 2);
        let target = scanner.take_while(is_target);
        assert_eq!(target.as_str(arena), Some("/index.html"));
        scanner.skip_while(is_space);
        assert!(scanner.expect(b"HTTP/"));
        assert_eq!(scanner.digits(), Some(1));
        assert!(scanner.expect(b"."));
        assert_eq!(scanner.digits(), Some(1));
        assert!(scanner.expect(b"\r\n"));
        assert_eq!(scanner.rest().as_str(arena), Some("rest"));
        assert!(scanner.is_done());
    }

    #[test]
    fn test_scanner_lines() {
        let arena = b"a: 1\r\nb: 2\r\npartial";
        let mut scanner = Scanner::new(arena);
        assert_eq!(scanner.line().map(|t| t.text(arena).into_owned()), Some("a: 1".to_string()));
        assert_eq!(scanner.line().map(|t| t.text(arena).into_owned()), Some("b: 2".to_string()));
        assert_eq!(scanner.line(), None);
    }

    #[test]
    fn test_digits_overflow() {
        let mut scanner = Scanner::new(b"99999999999");
        assert_eq!(scanner.digits(), None);
    }

    #[test]
    fn test_latin1_text() {
        assert_eq!(text(&[b'n', 0xe9]), "n\u{e9}");
    }
}
