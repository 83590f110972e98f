//! Encoder for HTTP chunked transfer encoding.
//!
//! Used to produce chunked payloads, for example to replay a body through
//! the [`ChunkedConsumer`](crate::consumer::ChunkedConsumer).

use crate::protocol::PayloadItem;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use std::io::Write;

use tokio_util::codec::Encoder;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes `payload` as chunks of at most `chunk_size` bytes followed by
    /// the last chunk.
    pub fn encode_all(payload: &[u8], chunk_size: usize) -> Bytes {
        let chunk_size = chunk_size.max(1);
        let mut dst = BytesMut::with_capacity(payload.len() + (payload.len() / chunk_size + 1) * 12);
        for chunk in payload.chunks(chunk_size) {
            dst.put_slice(format!("{:X}\r\n", chunk.len()).as_bytes());
            dst.put_slice(chunk);
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"0\r\n\r\n");
        dst.freeze()
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = io::Error;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            // an empty chunk would read as the last chunk
            PayloadItem::Chunk(bytes) if !bytes.has_remaining() => Ok(()),
            PayloadItem::Chunk(mut bytes) => {
                write!(helper::Writer(dst), "{:X}\r\n", bytes.remaining())?;
                dst.reserve(bytes.remaining() + 2);
                while bytes.has_remaining() {
                    let len = bytes.chunk().len();
                    dst.extend_from_slice(bytes.chunk());
                    bytes.advance(len);
                }
                dst.extend_from_slice(b"\r\n");
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n\r\n");
                Ok(())
            }
        }
    }
}

mod helper {
    use bytes::{BufMut, BytesMut};
    use std::io;

    pub struct Writer<'a>(pub &'a mut BytesMut);

    impl io::Write for Writer<'_> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.put_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let mut encoder = ChunkedEncoder::new();
        let mut dst = BytesMut::new();

        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"hello, world")), &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::new()), &mut dst).unwrap();
        encoder.encode(PayloadItem::<Bytes>::Eof, &mut dst).unwrap();
        encoder.encode(PayloadItem::Chunk(Bytes::from_static(b"ignored")), &mut dst).unwrap();

        assert_eq!(&dst[..], b"C\r\nhello, world\r\n0\r\n\r\n");
    }

    #[test]
    fn test_encode_all() {
        assert_eq!(&ChunkedEncoder::encode_all(b"abcdefg", 3)[..], b"3\r\nabc\r\n3\r\ndef\r\n1\r\ng\r\n0\r\n\r\n");
        assert_eq!(&ChunkedEncoder::encode_all(b"", 3)[..], b"0\r\n\r\n");
    }
}
