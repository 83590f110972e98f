use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header number exceed the limit {max_num}")]
    TooManyHeaders { max_num: usize },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid http version: {0:?}")]
    InvalidVersion(Option<u8>),

    #[error("invalid http method")]
    InvalidMethod,

    #[error("invalid http uri")]
    InvalidUri,

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("invalid chunk: {reason}")]
    InvalidChunk { reason: String },

    #[error("invalid boundary: {reason}")]
    InvalidBoundary { reason: String },

    #[error("expected token {expected:?} but found byte {found:#04x}")]
    InvalidToken { expected: &'static str, found: u8 },

    #[error("nested multipart exceed the depth limit {max_depth}")]
    TooDeepNesting { max_depth: usize },

    #[error("unexpected end of stream")]
    UnexpectedEof,

    #[error("buffer requested {requested} bytes, exceed the limit {limit}")]
    Allocation { requested: usize, limit: usize },

    #[error("invalid encoding: {reason}")]
    InvalidEncoding { reason: String },

    #[error("consumer has already failed")]
    Failed,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_headers(max_num: usize) -> Self {
        Self::TooManyHeaders { max_num }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn invalid_chunk<S: ToString>(str: S) -> Self {
        Self::InvalidChunk { reason: str.to_string() }
    }

    pub fn invalid_boundary<S: ToString>(str: S) -> Self {
        Self::InvalidBoundary { reason: str.to_string() }
    }

    pub fn invalid_encoding<S: ToString>(str: S) -> Self {
        Self::InvalidEncoding { reason: str.to_string() }
    }

    pub fn allocation(requested: usize, limit: usize) -> Self {
        Self::Allocation { requested, limit }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// Returns true when the failure came from the byte source rather than the message itself.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
