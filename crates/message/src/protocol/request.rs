//! Parsed HTTP request header.
//!
//! The request line is kept as the bytes it arrived in, the method and target
//! are [`Token`]s into them. Conversions into the `http` crate types happen on
//! demand.

use crate::protocol::{Headers, ParseError, Query, RequestPath, Segment};
use crate::scan::Token;
use bytes::Bytes;
use http::header::CONNECTION;
use http::{Method, Request, Uri, Version};
use once_cell::sync::OnceCell;
use tracing::debug;

/// Represents an HTTP request header.
///
/// Holds:
/// - the request line arena with the method and target tokens
/// - the protocol version digits
/// - the header block as a [`Segment`]
#[derive(Debug, Clone)]
pub struct RequestHeader {
    line: Bytes,
    method: Token,
    target: Token,
    major: u32,
    minor: u32,
    segment: Segment,
    uri: OnceCell<Uri>,
    path: OnceCell<RequestPath>,
    query: OnceCell<Query>,
}

impl RequestHeader {
    pub(crate) fn new(line: Bytes, method: Token, target: Token, major: u32, minor: u32, segment: Segment) -> Self {
        Self { line, method, target, major, minor, segment, uri: OnceCell::new(), path: OnceCell::new(), query: OnceCell::new() }
    }

    /// The method exactly as it was sent.
    pub fn method(&self) -> &str {
        self.method.as_str(&self.line).unwrap_or_default()
    }

    /// The request target exactly as it was sent.
    pub fn target(&self) -> &str {
        self.target.as_str(&self.line).unwrap_or_default()
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn headers(&self) -> &Headers {
        self.segment.headers()
    }

    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.segment.header(name)
    }

    /// Returns the request's HTTP method.
    pub fn http_method(&self) -> Result<Method, ParseError> {
        Method::from_bytes(self.method.as_bytes(&self.line)).map_err(|e| {
            debug!(cause = %e, "unknown method");
            ParseError::InvalidMethod
        })
    }

    /// Returns the request's URI, parsed once and cached.
    pub fn uri(&self) -> Result<&Uri, ParseError> {
        self.uri.get_or_try_init(|| {
            Uri::try_from(self.target()).map_err(|e| {
                debug!(cause = %e, "unparsable target");
                ParseError::InvalidUri
            })
        })
    }

    /// The normalized path of the target, parsed once and cached.
    pub fn path(&self) -> Result<&RequestPath, ParseError> {
        self.path.get_or_try_init(|| RequestPath::parse(self.uri()?.path()))
    }

    /// The decoded query parameters of the target, parsed once and cached.
    pub fn query(&self) -> Result<&Query, ParseError> {
        self.query.get_or_try_init(|| Query::parse(self.uri()?.query().unwrap_or_default()))
    }

    /// Returns the request's HTTP version, `None` for versions the `http` crate has no name for.
    pub fn version(&self) -> Option<Version> {
        match (self.major, self.minor) {
            (0, 9) => Some(Version::HTTP_09),
            (1, 0) => Some(Version::HTTP_10),
            (1, 1) => Some(Version::HTTP_11),
            (2, 0) => Some(Version::HTTP_2),
            (3, 0) => Some(Version::HTTP_3),
            _ => None,
        }
    }

    /// Determines if this request requires a body based on its HTTP method.
    ///
    /// Returns false for methods that typically don't have bodies:
    /// - GET
    /// - HEAD
    /// - DELETE
    /// - OPTIONS
    /// - CONNECT
    pub fn need_body(&self) -> bool {
        !matches!(self.method(), "GET" | "HEAD" | "DELETE" | "OPTIONS" | "CONNECT")
    }

    /// HTTP/1.1 connections persist unless `Connection: close` is sent,
    /// older versions only persist with `Connection: keep-alive`.
    pub fn is_keep_alive(&self) -> bool {
        let tokens: Vec<String> = self
            .headers()
            .get_all(CONNECTION)
            .flat_map(|value| value.split(','))
            .map(|token| token.trim().to_ascii_lowercase())
            .collect();

        if (self.major, self.minor) >= (1, 1) {
            !tokens.iter().any(|token| token == "close")
        } else {
            tokens.iter().any(|token| token == "keep-alive")
        }
    }

    pub fn is_expect_continue(&self) -> bool {
        (self.major, self.minor) >= (1, 1) && self.segment.is_expect_continue()
    }

    /// Builds an `http::Request` carrying this header and no body.
    pub fn to_request(&self) -> Result<Request<()>, ParseError> {
        let version = self.version().ok_or(ParseError::InvalidVersion(None))?;
        let mut request = Request::builder()
            .method(self.http_method()?)
            .uri(self.uri()?.clone())
            .version(version)
            .body(())
            .map_err(ParseError::invalid_header)?;
        *request.headers_mut() = self.headers().to_header_map()?;
        Ok(request)
    }
}
