//! Pull-based byte sources that the consumers read from.
//!
//! A [`Cursor`] never blocks. When nothing is available a read returns `0`
//! (or `None` for a single byte) and the caller is expected to suspend until
//! the I/O layer has fed more bytes. The end of the stream is only signalled
//! through [`Cursor::is_open`].
//!
//! # Components
//!
//! - [`BytesCursor`]: cursor over a `BytesMut`, fed by the owner of the connection
//! - [`DribbleCursor`]: hands out at most `n` bytes per read
//! - [`LimitCursor`]: a view bounded to a fixed number of bytes, used for `Content-Length` bodies

mod bytes_cursor;
mod dribble_cursor;
mod limit_cursor;

pub use bytes_cursor::BytesCursor;
pub use dribble_cursor::DribbleCursor;
pub use limit_cursor::LimitCursor;

use std::io;

/// A non-blocking byte source with push-back.
pub trait Cursor {
    /// Returns false once the source is exhausted and nothing more will ever be read.
    fn is_open(&self) -> bool;

    /// Number of bytes that can be read right now without blocking, `0` is not the end of stream.
    fn ready(&self) -> usize;

    fn is_ready(&self) -> bool {
        self.ready() > 0
    }

    /// Reads up to `dst.len()` bytes, returning how many were copied.
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize>;

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Puts `bytes` back in front of the source, they will be returned by the next reads.
    fn push(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl<C: Cursor + ?Sized> Cursor for &mut C {
    #[inline]
    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    #[inline]
    fn ready(&self) -> usize {
        (**self).ready()
    }

    #[inline]
    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        (**self).read(dst)
    }

    #[inline]
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }

    #[inline]
    fn push(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).push(bytes)
    }
}
