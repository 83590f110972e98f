use crate::protocol::ParseError;
use crate::utils::ensure;
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// RFC 2046 limits a multipart boundary to 70 characters.
pub const MAX_BOUNDARY_LEN: usize = 70;

const DELIMITER_PREFIX: &[u8] = b"\r\n--";

/// The validated delimiter of one multipart series.
///
/// Cloning is cheap, every part of a series shares the same bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Boundary {
    delimiter: Bytes,
}

impl Boundary {
    pub fn new(boundary: impl AsRef<[u8]>) -> Result<Self, ParseError> {
        let boundary = boundary.as_ref();
        ensure!(!boundary.is_empty(), ParseError::invalid_boundary("empty boundary"));
        ensure!(
            boundary.len() <= MAX_BOUNDARY_LEN,
            ParseError::invalid_boundary(format!("boundary length {} exceed the limit {MAX_BOUNDARY_LEN}", boundary.len()))
        );
        ensure!(
            !boundary.iter().any(|b| matches!(b, b'\r' | b'\n')),
            ParseError::invalid_boundary("boundary contains a line break")
        );

        let mut delimiter = BytesMut::with_capacity(DELIMITER_PREFIX.len() + boundary.len());
        delimiter.put_slice(DELIMITER_PREFIX);
        delimiter.put_slice(boundary);
        Ok(Self { delimiter: delimiter.freeze() })
    }

    /// The boundary token itself, e.g. `AaB03x`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.delimiter[DELIMITER_PREFIX.len()..]
    }

    /// `--` followed by the boundary, as it opens a part entry.
    pub fn marker(&self) -> &[u8] {
        &self.delimiter[2..]
    }

    /// `CRLF--` followed by the boundary, as it ends the content of a part.
    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }
}

impl fmt::Debug for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Boundary").field(&String::from_utf8_lossy(self.as_bytes())).finish()
    }
}
