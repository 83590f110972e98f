use super::{Consumer, Poison, suspend};
use crate::cursor::Cursor;
use crate::protocol::ParseError;

/// Consumes an exact literal, such as the line break that closes the content
/// of a part.
#[derive(Debug, Clone)]
pub struct TokenConsumer {
    token: &'static [u8],
    matched: usize,
    poison: Poison,
}

impl TokenConsumer {
    pub fn new(token: &'static [u8]) -> Self {
        Self { token, matched: 0, poison: Poison::default() }
    }

    /// A consumer for `CRLF`.
    pub fn line() -> Self {
        Self::new(b"\r\n")
    }

    fn advance(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        while self.matched < self.token.len() {
            let Some(byte) = cursor.read_byte()? else {
                return suspend(&*cursor);
            };

            if byte != self.token[self.matched] {
                return Err(ParseError::InvalidToken { expected: expected(self.token), found: byte });
            }
            self.matched += 1;
        }
        Ok(())
    }
}

fn expected(token: &'static [u8]) -> &'static str {
    std::str::from_utf8(token).unwrap_or("<binary>")
}

impl Consumer for TokenConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        self.poison.check()?;
        let result = self.advance(cursor);
        self.poison.guard(result)
    }

    fn is_finished(&self) -> bool {
        self.matched == self.token.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::test_support::feed;
    use crate::cursor::BytesCursor;

    #[test]
    fn test_line() {
        let mut token = TokenConsumer::line();
        let rest = feed(&mut token, b"\r\n--AaB03x", 1).unwrap();
        assert!(token.is_finished());
        assert_eq!(&rest[..], b"--AaB03x");
    }

    #[test]
    fn test_mismatch() {
        let mut token = TokenConsumer::line();
        let mut cursor = BytesCursor::complete("\rX");
        let result = token.consume(&mut cursor);
        assert!(matches!(result, Err(ParseError::InvalidToken { found: b'X', .. })));
    }
}
