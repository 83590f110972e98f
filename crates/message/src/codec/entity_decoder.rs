//! HTTP request decoder module
//!
//! [`EntityDecoder`] adapts the [`EntityConsumer`] to the tokio-util [`Decoder`]
//! trait, so complete requests can be read from any `AsyncRead` through
//! `FramedRead`. The read buffer of the framed reader is handed to the
//! consumer as a [`BytesCursor`]: consumed bytes are split off its front and
//! bytes the consumer pushes back stay in it for the next request.
//!
//! # Example
//!
//! ```no_run
//! use micro_message::codec::EntityDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = EntityDecoder::new();
//! let mut buffer = BytesMut::from("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! let entity = decoder.decode(&mut buffer);
//! ```

use crate::buffer::{Allocator, ArrayAllocator};
use crate::config::ConsumerConfig;
use crate::consumer::{Consumer, EntityConsumer};
use crate::cursor::BytesCursor;
use crate::protocol::{Entity, ParseError};
use crate::scan::is_terminal;
use bytes::{Buf, BytesMut};
use std::mem;
use std::sync::Arc;
use tokio_util::codec::Decoder;

/// A decoder producing one [`Entity`] per request.
///
/// The decoder keeps the consumer of the request in progress between calls,
/// a new consumer is started once a request has been handed out.
#[derive(Debug)]
pub struct EntityDecoder {
    consumer: EntityConsumer,
    allocator: Arc<dyn Allocator>,
    config: ConsumerConfig,
}

impl EntityDecoder {
    /// Creates a new `EntityDecoder` with the default limits.
    pub fn new() -> Self {
        Self::with_config(Arc::new(ArrayAllocator::default()), ConsumerConfig::default())
    }

    pub fn with_config(allocator: Arc<dyn Allocator>, config: ConsumerConfig) -> Self {
        Self { consumer: EntityConsumer::new(allocator.clone(), config), allocator, config }
    }

    fn take_entity(&mut self) -> Option<Entity> {
        if !self.consumer.is_finished() {
            return None;
        }

        let next = EntityConsumer::new(self.allocator.clone(), self.config);
        mem::replace(&mut self.consumer, next).into_entity()
    }
}

impl Default for EntityDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for EntityDecoder {
    type Item = Entity;
    type Error = ParseError;

    /// Attempts to decode a request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(entity))`: Successfully decoded a complete request
    /// - `Ok(None)`: Need more data to proceed
    /// - `Err(_)`: Encountered a parsing error, the decoder stays failed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let mut cursor = BytesCursor::new(src);
        self.consumer.consume(&mut cursor)?;
        Ok(self.take_entity())
    }

    /// Decodes what is left once the stream ended.
    ///
    /// A stream ending between requests is a clean end, even after trailing
    /// empty lines. A stream ending inside a request fails with
    /// [`ParseError::UnexpectedEof`].
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.consumer.is_idle() {
            let blank = src.iter().take_while(|&&b| is_terminal(b)).count();
            src.advance(blank);
            if src.is_empty() {
                return Ok(None);
            }
        }

        let mut cursor = BytesCursor::new(src);
        cursor.close();
        self.consumer.consume(&mut cursor)?;
        Ok(self.take_entity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ChunkedEncoder;
    use crate::protocol::Body;
    use futures::StreamExt;
    use indoc::indoc;
    use tokio_util::codec::FramedRead;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().try_init();
    }

    #[test]
    fn test_partial_then_complete() {
        let mut decoder = EntityDecoder::new();
        let mut buffer = BytesMut::from("GET /index.html HT");
        assert!(decoder.decode(&mut buffer).unwrap().is_none());

        buffer.extend_from_slice(b"TP/1.1\r\nHost: localhost\r\n\r\nPOST");
        let entity = decoder.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(entity.header().target(), "/index.html");
        assert_eq!(entity.header().header("host"), Some("localhost"));
        assert_eq!(&buffer[..], b"POST");
    }

    #[tokio::test]
    async fn test_pipelining() {
        init_tracing();
        let input = indoc! {"
            POST /first HTTP/1.1\r
            Content-Length: 5\r
            \r
            helloGET /second HTTP/1.1\r
            Host: localhost\r
            \r
            \r
            POST /third HTTP/1.1\r
            Transfer-Encoding: chunked\r
            \r
            3\r
            abc\r
            0\r
            \r
        "};

        let mut framed = FramedRead::new(input.as_bytes(), EntityDecoder::new());

        let first = framed.next().await.unwrap().unwrap();
        assert_eq!(first.header().target(), "/first");
        assert_eq!(first.body().content().unwrap().as_ref(), b"hello");

        let second = framed.next().await.unwrap().unwrap();
        assert_eq!(second.header().target(), "/second");
        assert!(second.body().is_empty());

        let third = framed.next().await.unwrap().unwrap();
        assert_eq!(third.header().target(), "/third");
        assert_eq!(third.body().content().unwrap().as_ref(), b"abc");

        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let body = indoc! {"
            --AaB03x\r
            Content-Disposition: form-data; name=\"submit-name\"\r
            \r
            Larry\r
            --AaB03x\r
            Content-Disposition: form-data; name=\"files\"; filename=\"file1.txt\"\r
            Content-Type: text/plain\r
            \r
            ... contents of file1.txt ...\r
            --AaB03x--\r
        "};

        let fixed = format!(
            "POST /upload HTTP/1.1\r\nContent-Type: multipart/form-data; boundary=AaB03x\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        );
        let mut input = fixed.into_bytes();
        input.extend_from_slice(b"POST /upload HTTP/1.1\r\nContent-Type: multipart/form-data; boundary=AaB03x\r\nTransfer-Encoding: chunked\r\n\r\n");
        input.extend_from_slice(&ChunkedEncoder::encode_all(body.as_bytes(), 17));

        let entities: Vec<Entity> = FramedRead::new(&input[..], EntityDecoder::new()).map(Result::unwrap).collect().await;
        assert_eq!(entities.len(), 2);

        for entity in &entities {
            let Body::Parts(parts) = entity.body() else {
                panic!("expected a multipart body");
            };
            assert_eq!(parts.len(), 2);
            assert_eq!(parts.part("submit-name").unwrap().text().unwrap(), "Larry");
            assert_eq!(parts.part("files").unwrap().text().unwrap(), "... contents of file1.txt ...");
            assert_eq!(&parts.body()[..], body.as_bytes());
        }
    }

    #[tokio::test]
    async fn test_truncated_request() {
        init_tracing();
        let input = b"POST /first HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello";
        let mut framed = FramedRead::new(&input[..], EntityDecoder::new());
        assert!(matches!(framed.next().await, Some(Err(ParseError::UnexpectedEof))));
    }

    #[tokio::test]
    async fn test_trailing_empty_lines() {
        let input = b"GET / HTTP/1.1\r\n\r\n\r\n\r\n";
        let entities: Vec<_> = FramedRead::new(&input[..], EntityDecoder::new()).collect().await;
        assert_eq!(entities.len(), 1);
        assert!(entities[0].is_ok());
    }

    #[test]
    fn test_failed_decoder_stays_failed() {
        let mut decoder = EntityDecoder::new();
        let mut buffer = BytesMut::from("GET / FTP/1.1\r\n\r\n");
        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::InvalidVersion(Some(b'F')))));
        assert!(matches!(decoder.decode(&mut buffer), Err(ParseError::Failed)));
    }
}
