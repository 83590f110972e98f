//! Integration with the tokio-util codec traits.
//!
//! - [`EntityDecoder`]: decodes complete requests, one [`Entity`](crate::protocol::Entity) at a time
//! - [`ChunkedEncoder`]: encodes a payload with chunked transfer encoding

mod chunked_encoder;
mod entity_decoder;

pub use chunked_encoder::ChunkedEncoder;
pub use entity_decoder::EntityDecoder;
