use super::Cursor;
use bytes::{Buf, BytesMut};
use std::borrow::BorrowMut;
use std::io;
use std::mem;

/// A cursor over bytes that have already arrived from the connection.
///
/// The cursor either owns its `BytesMut` or borrows the read buffer of a
/// framed reader, in which case consumed bytes are split off the front of that
/// buffer. Pushed back bytes wait in a separate front buffer and are put in
/// front of the underlying buffer once, when the cursor is dropped or unwrapped.
/// It stays open until [`close`](Self::close) is called, so an empty cursor
/// means "try again later".
#[derive(Debug)]
pub struct BytesCursor<B: BorrowMut<BytesMut> = BytesMut> {
    buf: B,
    front: BytesMut,
    open: bool,
}

impl BytesCursor<BytesMut> {
    /// Creates an open cursor with nothing available yet.
    pub fn empty() -> Self {
        Self::new(BytesMut::new())
    }

    /// Creates a closed cursor over a complete message.
    pub fn complete(bytes: impl AsRef<[u8]>) -> Self {
        let mut cursor = Self::new(BytesMut::from(bytes.as_ref()));
        cursor.close();
        cursor
    }

    pub fn into_inner(mut self) -> BytesMut {
        self.restore();
        mem::take(&mut self.buf)
    }
}

impl<B: BorrowMut<BytesMut>> BytesCursor<B> {
    pub fn new(buf: B) -> Self {
        Self { buf, front: BytesMut::new(), open: true }
    }

    #[inline]
    fn bytes_mut(&mut self) -> &mut BytesMut {
        self.buf.borrow_mut()
    }

    #[inline]
    fn bytes(&self) -> &BytesMut {
        std::borrow::Borrow::borrow(&self.buf)
    }

    /// Appends bytes delivered by the I/O layer.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.bytes_mut().extend_from_slice(bytes);
    }

    /// Marks the end of the stream, bytes already fed can still be read.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// The bytes not read so far.
    pub fn remaining(&mut self) -> &[u8] {
        self.restore();
        self.bytes_mut()
    }

    /// Moves the pushed back bytes in front of the underlying buffer.
    fn restore(&mut self) {
        if self.front.is_empty() {
            return;
        }
        let mut front = mem::take(&mut self.front);
        let buf = self.bytes_mut();
        front.extend_from_slice(buf);
        *buf = front;
    }
}

impl<B: BorrowMut<BytesMut>> Drop for BytesCursor<B> {
    fn drop(&mut self) {
        self.restore();
    }
}

impl<B: BorrowMut<BytesMut>> Cursor for BytesCursor<B> {
    fn is_open(&self) -> bool {
        self.open || self.ready() > 0
    }

    fn ready(&self) -> usize {
        self.front.len() + self.bytes().len()
    }

    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let from_front = dst.len().min(self.front.len());
        self.front.copy_to_slice(&mut dst[..from_front]);

        let buf = self.bytes_mut();
        let from_buf = (dst.len() - from_front).min(buf.len());
        buf.copy_to_slice(&mut dst[from_front..from_front + from_buf]);
        Ok(from_front + from_buf)
    }

    fn push(&mut self, bytes: &[u8]) -> io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        let mut front = BytesMut::with_capacity(bytes.len() + self.front.len());
        front.extend_from_slice(bytes);
        front.extend_from_slice(&self.front);
        self.front = front;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_and_push() {
        let mut cursor = BytesCursor::complete("hello world");
        let mut dst = [0u8; 5];

        assert_eq!(cursor.read(&mut dst).unwrap(), 5);
        assert_eq!(&dst, b"hello");

        cursor.push(b"jello").unwrap();
        assert_eq!(cursor.ready(), 11);
        assert_eq!(cursor.remaining(), b"jello world");
    }

    #[test]
    fn test_open_until_closed() {
        let mut cursor = BytesCursor::empty();
        assert!(cursor.is_open());
        assert!(!cursor.is_ready());
        assert_eq!(cursor.read_byte().unwrap(), None);

        cursor.feed(b"a");
        cursor.close();
        assert!(cursor.is_open());
        assert_eq!(cursor.read_byte().unwrap(), Some(b'a'));
        assert!(!cursor.is_open());
    }

    #[test]
    fn test_push_back_keeps_buffer() {
        let body = "x".repeat(1 << 16);
        let mut cursor = BytesCursor::complete(&body);
        let mut dst = [0u8; 3];

        for _ in 0..1000 {
            assert_eq!(cursor.read(&mut dst).unwrap(), 3);
            cursor.push(&dst[1..]).unwrap();
            cursor.push(&dst[..1]).unwrap();
        }
        assert_eq!(cursor.ready(), body.len());
        assert_eq!(cursor.front.len(), 3);

        cursor.push(b"ab").unwrap();
        let mut dst = [0u8; 4];
        assert_eq!(cursor.read(&mut dst).unwrap(), 4);
        assert_eq!(&dst, b"abxx");
        assert_eq!(cursor.into_inner().len(), body.len() - 2);
    }

    #[test]
    fn test_borrowed_buffer() {
        let mut src = BytesMut::from(&b"abcdef"[..]);
        {
            let mut cursor = BytesCursor::new(&mut src);
            let mut dst = [0u8; 4];
            cursor.read(&mut dst).unwrap();
            cursor.push(b"d").unwrap();
        }
        assert_eq!(&src[..], b"def");
    }
}
