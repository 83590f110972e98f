use crate::protocol::{ContentType, Disposition, Headers, ParseError};
use http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, EXPECT, TRANSFER_ENCODING};
use once_cell::sync::OnceCell;

/// A parsed header block together with lazily computed views of the
/// headers the consumers care about.
///
/// The typed views are parsed the first time they are asked for and cached.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    headers: Headers,
    content_type: OnceCell<Option<ContentType>>,
    disposition: OnceCell<Option<Disposition>>,
    content_length: OnceCell<Option<u64>>,
}

impl Segment {
    pub fn new(headers: Headers) -> Self {
        Self { headers, ..Self::default() }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn into_headers(self) -> Headers {
        self.headers
    }

    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers.get(name)
    }

    /// Quality ordered list values of `name`.
    pub fn values(&self, name: impl AsRef<str>) -> Vec<String> {
        self.headers.values(name)
    }

    pub fn content_type(&self) -> Option<&ContentType> {
        self.content_type.get_or_init(|| self.headers.get(CONTENT_TYPE).and_then(ContentType::parse)).as_ref()
    }

    pub fn disposition(&self) -> Option<&Disposition> {
        self.disposition.get_or_init(|| self.headers.get(CONTENT_DISPOSITION).and_then(Disposition::parse)).as_ref()
    }

    /// The `Content-Length` value, failing when it is present but not a length
    /// or when repeated fields disagree.
    pub fn content_length(&self) -> Result<Option<u64>, ParseError> {
        self.content_length
            .get_or_try_init(|| {
                let mut length = None;
                for value in self.headers.get_all(CONTENT_LENGTH) {
                    let parsed = value
                        .trim()
                        .parse::<u64>()
                        .map_err(|e| ParseError::invalid_content_length(format!("value {value} is not u64: {e}")))?;
                    match length {
                        Some(previous) if previous != parsed => {
                            return Err(ParseError::invalid_content_length(format!("conflicting values {previous} and {parsed}")));
                        }
                        _ => length = Some(parsed),
                    }
                }
                Ok(length)
            })
            .copied()
    }

    /// The last `Transfer-Encoding` field, which carries the final coding.
    pub fn transfer_encoding(&self) -> Option<&str> {
        self.headers.get_all(TRANSFER_ENCODING).last()
    }

    /// True when `chunked` is the final transfer coding.
    pub fn is_chunked(&self) -> bool {
        is_chunked(self.transfer_encoding())
    }

    pub fn is_expect_continue(&self) -> bool {
        self.headers.get(EXPECT).is_some_and(|value| value.trim().eq_ignore_ascii_case("100-continue"))
    }

    /// `Accept-Language` entries ordered by quality.
    pub fn locales(&self) -> Vec<String> {
        self.headers.values(http::header::ACCEPT_LANGUAGE)
    }
}

/// Checks if the Transfer-Encoding header indicates chunked encoding.
///
/// According to RFC 7230, chunked must be the last encoding if present.
fn is_chunked(header_value: Option<&str>) -> bool {
    const CHUNKED: &str = "chunked";
    header_value
        .and_then(|value| value.rsplit(',').next())
        .is_some_and(|coding| coding.trim().eq_ignore_ascii_case(CHUNKED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderName;

    fn segment(pairs: &[(&'static str, &str)]) -> Segment {
        let mut headers = Headers::new();
        for &(name, value) in pairs {
            headers.append(HeaderName::from_static(name), value);
        }
        Segment::new(headers)
    }

    #[test]
    fn check_is_chunked() {
        assert!(!is_chunked(None));
        assert!(!is_chunked(Some("foo")));
        assert!(is_chunked(Some("chunked")));
        assert!(is_chunked(Some("gzip, chunked")));
        assert!(!is_chunked(Some("chunked, gzip")));
        assert!(is_chunked(Some(" Chunked ")));
    }

    #[test]
    fn test_typed_views() {
        let segment = segment(&[
            ("content-type", "multipart/form-data; boundary=AaB03x"),
            ("content-disposition", "form-data; name=\"fn\""),
            ("content-length", "42"),
            ("expect", "100-Continue"),
            ("accept-language", "fr;q=0.1, en-us;q=0.4, en-gb; q=0.8, en;q=0.7"),
        ]);

        let content_type = segment.content_type().unwrap();
        assert!(content_type.is_multipart());
        assert_eq!(content_type.boundary(), Some("AaB03x"));
        assert!(std::ptr::eq(content_type, segment.content_type().unwrap()));

        assert_eq!(segment.disposition().and_then(Disposition::name), Some("fn"));
        assert_eq!(segment.content_length().unwrap(), Some(42));
        assert!(segment.is_expect_continue());
        assert_eq!(segment.locales(), vec!["en-gb", "en", "en-us", "fr"]);
    }

    #[test]
    fn test_repeated_framing_fields() {
        let same = segment(&[("content-length", "22"), ("content-length", " 22")]);
        assert_eq!(same.content_length().unwrap(), Some(22));

        let conflicting = segment(&[("content-length", "0"), ("content-length", "22")]);
        assert!(matches!(conflicting.content_length(), Err(ParseError::InvalidContentLength { .. })));

        let split = segment(&[("transfer-encoding", "gzip"), ("transfer-encoding", "chunked")]);
        assert!(split.is_chunked());
        let reordered = segment(&[("transfer-encoding", "chunked"), ("transfer-encoding", "gzip")]);
        assert!(!reordered.is_chunked());
    }

    #[test]
    fn test_empty_values() {
        let segment = segment(&[("content-type", ""), ("content-length", "")]);
        assert_eq!(segment.header("Content-Type"), Some(""));
        assert!(segment.content_type().is_none());
        assert!(segment.content_length().is_err());
        assert!(!segment.is_chunked());
    }
}
