use super::{ChunkedConsumer, Consumer, PartSeriesConsumer, Poison};
use crate::buffer::Allocator;
use crate::config::ConsumerConfig;
use crate::cursor::{BytesCursor, Cursor};
use crate::protocol::{Boundary, Headers, ParseError, PartData};
use std::sync::Arc;

/// Consumes a multipart body sent with chunked transfer encoding.
///
/// Chunks are decoded first, the decoded bytes are fed to an internal cursor
/// that drives the multipart series. The internal cursor is closed once the
/// last chunk arrived.
#[derive(Debug)]
pub struct ChunkedUploadConsumer {
    chunked: ChunkedConsumer,
    decoded: BytesCursor,
    series: PartSeriesConsumer,
    poison: Poison,
}

impl ChunkedUploadConsumer {
    pub fn new(allocator: Arc<dyn Allocator>, boundary: Boundary, config: ConsumerConfig) -> Self {
        Self {
            chunked: ChunkedConsumer::new(&*allocator, config),
            decoded: BytesCursor::empty(),
            series: PartSeriesConsumer::new(allocator, boundary, config),
            poison: Poison::default(),
        }
    }

    pub fn series(&self) -> &PartSeriesConsumer {
        &self.series
    }

    pub fn trailers(&self) -> &Headers {
        self.chunked.trailers()
    }

    pub fn into_parts(mut self) -> (PartData, Headers) {
        let trailers = self.chunked.take_trailers();
        (self.series.into_part_data(), trailers)
    }

    fn advance(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        if !self.chunked.is_finished() {
            self.chunked.consume(cursor)?;
            let decoded = self.chunked.drain();
            // bytes after the terminal boundary are dropped
            if !self.series.is_finished() {
                self.decoded.feed(&decoded);
            }
            if self.chunked.is_finished() {
                self.decoded.close();
            }
        }

        if !self.series.is_finished() {
            self.series.consume(&mut self.decoded)?;
        }
        Ok(())
    }
}

impl Consumer for ChunkedUploadConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        self.poison.check()?;
        if self.is_finished() {
            return Ok(());
        }
        let result = self.advance(cursor);
        self.poison.guard(result)
    }

    fn is_finished(&self) -> bool {
        self.chunked.is_finished() && self.series.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ArrayAllocator;
    use crate::codec::ChunkedEncoder;
    use crate::consumer::test_support::feed;
    use indoc::indoc;

    const SOURCE: &str = indoc! {"
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

    fn consumer() -> ChunkedUploadConsumer {
        ChunkedUploadConsumer::new(Arc::new(ArrayAllocator::default()), Boundary::new("AaB03x").unwrap(), ConsumerConfig::default())
    }

    #[test]
    fn test_chunked_series() {
        let encoded = ChunkedEncoder::encode_all(SOURCE.as_bytes(), 13);
        let mut input = encoded.to_vec();
        input.extend_from_slice(b"GET / HTTP/1.1\r\n\r\n");

        for step in [1, 2, 7, 100, input.len()] {
            let mut upload = consumer();
            let rest = feed(&mut upload, &input, step).unwrap();
            assert!(upload.is_finished());
            assert_eq!(&rest[..], b"GET / HTTP/1.1\r\n\r\n");

            let (data, trailers) = upload.into_parts();
            assert!(trailers.is_empty());
            assert_eq!(data.len(), 2);
            assert_eq!(data.part("submit-name").unwrap().text().unwrap(), "Larry");
            assert_eq!(data.part("files").unwrap().file_name(), Some("file1.txt"));
            assert_eq!(&data.body()[..], SOURCE.as_bytes());
        }
    }

    #[test]
    fn test_truncated_series() {
        let encoded = ChunkedEncoder::encode_all(&SOURCE.as_bytes()[..40], 16);
        let mut upload = consumer();
        let result = feed(&mut upload, &encoded, 8);
        assert!(matches!(result, Err(ParseError::UnexpectedEof)));
    }
}
