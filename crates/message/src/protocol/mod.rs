//! Message model produced by the consumers.
//!
//! # Components
//!
//! - **Errors** ([`ParseError`]): every failure a consumer can report
//! - **Headers** ([`Headers`], [`Segment`]): ordered header multimap and the
//!   lazily parsed views over it ([`ContentType`], [`Disposition`])
//! - **Requests** ([`RequestHeader`], [`Entity`], [`Body`]): a decoded request
//! - **Targets** ([`RequestPath`], [`Query`]): the normalized path and decoded query of a request target
//! - **Multipart** ([`Boundary`], [`Part`], [`PartData`]): the flattened parts of a multipart body
//!
//! All of these are immutable once a consumer hands them out.

mod boundary;
pub use boundary::Boundary;
pub use boundary::MAX_BOUNDARY_LEN;

mod content_type;
pub use content_type::ContentType;

mod disposition;
pub use disposition::Disposition;

mod error;
pub use error::ParseError;

mod headers;
pub use headers::Headers;

mod message;
pub use message::Body;
pub use message::Entity;
pub use message::PayloadItem;

mod part;
pub use part::Part;
pub use part::PartData;

mod path;
pub use path::RequestPath;

mod query;
pub use query::Query;

mod request;
pub use request::RequestHeader;

mod segment;
pub use segment::Segment;
