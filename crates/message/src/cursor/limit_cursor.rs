use super::Cursor;
use std::io;

/// A view of at most `remaining` bytes of the inner cursor.
///
/// Once the limit is used up the view reports itself closed, even though the
/// inner cursor may already hold the next message. Bytes pushed back are
/// credited to the limit again.
#[derive(Debug)]
pub struct LimitCursor<C> {
    inner: C,
    remaining: u64,
}

impl<C: Cursor> LimitCursor<C> {
    pub fn new(inner: C, limit: u64) -> Self {
        Self { inner, remaining: limit }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    fn allowance(&self, len: usize) -> usize {
        usize::try_from(self.remaining).map_or(len, |remaining| remaining.min(len))
    }
}

impl<C: Cursor> Cursor for LimitCursor<C> {
    fn is_open(&self) -> bool {
        self.remaining > 0 && self.inner.is_open()
    }

    fn ready(&self) -> usize {
        self.allowance(self.inner.ready())
    }

    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let count = self.allowance(dst.len());
        if count == 0 {
            return Ok(0);
        }

        let count = self.inner.read(&mut dst[..count])?;
        self.remaining -= count as u64;
        Ok(count)
    }

    fn push(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.push(bytes)?;
        self.remaining += bytes.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::BytesCursor;

    #[test]
    fn test_stops_at_limit() {
        let mut inner = BytesCursor::complete("0123456789");
        {
            let mut cursor = LimitCursor::new(&mut inner, 4);
            let mut dst = [0u8; 8];

            assert_eq!(cursor.ready(), 4);
            assert_eq!(cursor.read(&mut dst).unwrap(), 4);
            assert_eq!(&dst[..4], b"0123");
            assert!(!cursor.is_open());
            assert_eq!(cursor.read(&mut dst).unwrap(), 0);

            cursor.push(b"23").unwrap();
            assert_eq!(cursor.remaining(), 2);
            assert!(cursor.is_open());
        }
        assert_eq!(inner.remaining(), b"23456789");
    }
}
