//! Body selection for a parsed request header.
//!
//! The framing headers decide how the body is consumed, following
//! [RFC 9112 Section 6.3](https://www.rfc-editor.org/rfc/rfc9112.html#name-message-body-length):
//!
//! - methods that carry no body, or no framing header at all: no body
//! - both `Transfer-Encoding` and `Content-Length`: rejected
//! - `multipart/*` with a boundary: a multipart series, framed by either header
//! - `Transfer-Encoding` whose final coding is not `chunked`: rejected
//! - `chunked` as the final coding: chunked content
//! - `Content-Length`: fixed length content

use super::{ChunkedConsumer, ChunkedUploadConsumer, Consumer, FileUploadConsumer, FixedLengthConsumer};
use crate::buffer::Allocator;
use crate::config::ConsumerConfig;
use crate::cursor::Cursor;
use crate::protocol::{Body, Boundary, Headers, ParseError, RequestHeader};
use std::sync::Arc;
use tracing::trace;

/// The consumer of a request body, chosen from the request header.
#[derive(Debug)]
pub enum BodyConsumer {
    Empty,
    Fixed(FixedLengthConsumer),
    Chunked(ChunkedConsumer),
    FileUpload(Box<FileUploadConsumer>),
    ChunkedUpload(Box<ChunkedUploadConsumer>),
}

impl BodyConsumer {
    /// Selects the consumer for the body that follows `header`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if:
    /// - Both Content-Length and Transfer-Encoding headers are present
    /// - Content-Length value is invalid, or repeated with conflicting values
    /// - Transfer-Encoding does not end with `chunked`
    /// - The multipart boundary is malformed
    pub fn for_request(header: &RequestHeader, allocator: Arc<dyn Allocator>, config: ConsumerConfig) -> Result<Self, ParseError> {
        let segment = header.segment();
        let transfer_encoding = segment.transfer_encoding();
        let content_length = segment.content_length()?;

        if !header.need_body() && transfer_encoding.is_none() && content_length.is_none() {
            return Ok(Self::Empty);
        }

        let boundary = segment
            .content_type()
            .filter(|content_type| content_type.is_multipart())
            .and_then(|content_type| content_type.boundary())
            .map(Boundary::new)
            .transpose()?;

        let consumer = match (transfer_encoding, content_length) {
            (None, None) => Self::Empty,
            (Some(_), Some(_)) => {
                return Err(ParseError::invalid_content_length("transfer_encoding and content_length both present in headers"));
            }
            (Some(coding), None) if !segment.is_chunked() => {
                return Err(ParseError::invalid_header(format!("transfer-encoding {coding} does not end with chunked")));
            }
            (Some(_), None) => match boundary {
                Some(boundary) => Self::ChunkedUpload(Box::new(ChunkedUploadConsumer::new(allocator, boundary, config))),
                None => Self::Chunked(ChunkedConsumer::new(&*allocator, config)),
            },
            (None, Some(0)) => Self::Empty,
            (None, Some(length)) => match boundary {
                Some(boundary) => Self::FileUpload(Box::new(FileUploadConsumer::new(allocator, boundary, length, config))),
                None => Self::Fixed(FixedLengthConsumer::new(&*allocator, length)?),
            },
        };

        trace!(kind = consumer.kind(), "selected body consumer");
        Ok(consumer)
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Fixed(_) => "fixed",
            Self::Chunked(_) => "chunked",
            Self::FileUpload(_) => "file_upload",
            Self::ChunkedUpload(_) => "chunked_upload",
        }
    }

    /// The decoded body and, for chunked bodies, the trailer fields.
    pub fn into_parts(self) -> (Body, Headers) {
        match self {
            Self::Empty => (Body::Empty, Headers::new()),
            Self::Fixed(fixed) => (Body::Content(fixed.into_content()), Headers::new()),
            Self::Chunked(mut chunked) => {
                let trailers = chunked.take_trailers();
                (Body::Content(chunked.into_content()), trailers)
            }
            Self::FileUpload(upload) => (Body::Parts(upload.into_part_data()), Headers::new()),
            Self::ChunkedUpload(upload) => {
                let (parts, trailers) = upload.into_parts();
                (Body::Parts(parts), trailers)
            }
        }
    }
}

impl Consumer for BodyConsumer {
    fn consume(&mut self, cursor: &mut dyn Cursor) -> Result<(), ParseError> {
        match self {
            Self::Empty => Ok(()),
            Self::Fixed(fixed) => fixed.consume(cursor),
            Self::Chunked(chunked) => chunked.consume(cursor),
            Self::FileUpload(upload) => upload.consume(cursor),
            Self::ChunkedUpload(upload) => upload.consume(cursor),
        }
    }

    fn is_finished(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Fixed(fixed) => fixed.is_finished(),
            Self::Chunked(chunked) => chunked.is_finished(),
            Self::FileUpload(upload) => upload.is_finished(),
            Self::ChunkedUpload(upload) => upload.is_finished(),
        }
    }
}
