use super::Cursor;
use std::io;

/// Wraps a cursor so that every read returns at most `dribble` bytes.
///
/// Used to check that a consumer produces the same result however its input
/// is fragmented.
#[derive(Debug)]
pub struct DribbleCursor<C> {
    inner: C,
    dribble: usize,
}

impl<C: Cursor> DribbleCursor<C> {
    pub fn new(inner: C, dribble: usize) -> Self {
        Self { inner, dribble: dribble.max(1) }
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Cursor> Cursor for DribbleCursor<C> {
    fn is_open(&self) -> bool {
        self.inner.is_open()
    }

    fn ready(&self) -> usize {
        self.inner.ready().min(self.dribble)
    }

    fn read(&mut self, dst: &mut [u8]) -> io::Result<usize> {
        let count = dst.len().min(self.dribble);
        self.inner.read(&mut dst[..count])
    }

    fn push(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.push(bytes)
    }
}
