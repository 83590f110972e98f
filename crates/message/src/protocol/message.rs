use crate::protocol::{Headers, PartData, RequestHeader};
use bytes::{Buf, Bytes};

/// A complete request: its header, its decoded body and any chunked trailers.
#[derive(Debug, Clone)]
pub struct Entity {
    header: RequestHeader,
    body: Body,
    trailers: Headers,
}

impl Entity {
    pub fn new(header: RequestHeader, body: Body, trailers: Headers) -> Self {
        Self { header, body, trailers }
    }

    pub fn header(&self) -> &RequestHeader {
        &self.header
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Trailer fields sent after a chunked body, empty otherwise.
    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    pub fn into_parts(self) -> (RequestHeader, Body, Headers) {
        (self.header, self.body, self.trailers)
    }
}

/// The decoded body of a request.
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// No payload was sent
    #[default]
    Empty,
    /// A fixed length or chunked payload, already de-chunked
    Content(Bytes),
    /// A multipart payload split into its parts
    Parts(PartData),
}

impl Body {
    #[inline]
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Content(bytes) => bytes.is_empty(),
            Body::Parts(parts) => parts.is_empty(),
        }
    }

    /// The raw content, for multipart bodies the bytes the parts were decoded from.
    pub fn content(&self) -> Option<&Bytes> {
        match self {
            Body::Empty => None,
            Body::Content(bytes) => Some(bytes),
            Body::Parts(parts) => Some(parts.body()),
        }
    }

    pub fn parts(&self) -> Option<&PartData> {
        match self {
            Body::Parts(parts) => Some(parts),
            _ => None,
        }
    }
}

/// Represents an item in an outgoing chunked payload stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A chunk of payload data
    Chunk(Data),
    /// Marks the end of the payload stream
    Eof,
}

impl<D: Buf> PayloadItem<D> {
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self, PayloadItem::Eof)
    }
}
