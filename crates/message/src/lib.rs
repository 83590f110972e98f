//! Incremental, non-blocking HTTP/1.1 message consumers
//!
//! This crate parses HTTP/1.1 requests from input that arrives in arbitrary
//! fragments. Every parser is a resumable state machine: it consumes whatever
//! bytes are available, suspends when it runs dry, and picks up where it left
//! off once more bytes arrive. It never reads past the end of the message it
//! parses, so pipelined requests stay intact on the input.
//!
//! # Features
//!
//! - Request line and header parsing with folded header lines
//! - Fixed length and chunked bodies, including chunk trailers
//! - `multipart/*` bodies framed by either `Content-Length` or chunked encoding
//! - Nested multipart series, flattened into a single list of parts
//! - Typed views of `Content-Type`, `Content-Disposition` and `Accept-Language`
//! - A normalized request path and a decoded query multimap
//! - A tokio-util [`Decoder`](tokio_util::codec::Decoder) producing complete requests
//!
//! # Example
//!
//! ```no_run
//! use bytes::BytesMut;
//! use micro_message::codec::EntityDecoder;
//! use micro_message::protocol::Body;
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = EntityDecoder::new();
//! let mut buffer = BytesMut::from("POST /submit HTTP/1.1\r\nContent-Length: 5\r\n\r\nhel");
//! assert!(decoder.decode(&mut buffer).unwrap().is_none());
//!
//! buffer.extend_from_slice(b"lo");
//! let entity = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(entity.header().target(), "/submit");
//! assert!(matches!(entity.body(), Body::Content(content) if &content[..] == b"hello"));
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`cursor`]: The byte source consumers read from, with push-back
//! - [`buffer`]: Growable byte buffers handed out by an [`Allocator`](buffer::Allocator)
//! - [`scan`]: Byte classes and a scanner over complete header blocks
//! - [`consumer`]: The resumable parsers
//! - [`protocol`]: Parsed messages, headers, parts and errors
//! - [`codec`]: tokio-util codec integration
//! - [`config`]: Limits applied while parsing
//!
//! # Limitations
//!
//! - HTTP/1.1 requests only, responses are not parsed
//! - Bodies are fully buffered, there is no streaming body API
//! - Content codings other than `chunked` are not decoded
//! - Maximum header size: 8KB
//! - Maximum number of headers: 64

pub mod buffer;
pub mod codec;
pub mod config;
pub mod consumer;
pub mod cursor;
pub mod protocol;
pub mod scan;

mod utils;
