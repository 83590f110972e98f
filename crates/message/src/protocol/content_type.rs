use mime::Mime;
use std::fmt;
use std::str::FromStr;

/// A parsed `Content-Type` value.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentType {
    mime: Mime,
}

impl ContentType {
    /// Parses a header value, `None` when it is blank or not a media type.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Mime::from_str(value).ok().map(|mime| Self { mime })
    }

    pub fn primary(&self) -> &str {
        self.mime.type_().as_str()
    }

    pub fn secondary(&self) -> &str {
        self.mime.subtype().as_str()
    }

    pub fn charset(&self) -> Option<&str> {
        self.parameter(mime::CHARSET.as_str())
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.mime.params().find(|(key, _)| key.as_str().eq_ignore_ascii_case(name)).map(|(_, value)| value.as_str().trim_matches('"'))
    }

    pub fn boundary(&self) -> Option<&str> {
        self.parameter(mime::BOUNDARY.as_str())
    }

    pub fn is_multipart(&self) -> bool {
        self.mime.type_() == mime::MULTIPART
    }

    pub fn mime(&self) -> &Mime {
        &self.mime
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.mime, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let content_type = ContentType::parse(" text/plain; charset=UTF-8 ").unwrap();
        assert_eq!(content_type.primary(), "text");
        assert_eq!(content_type.secondary(), "plain");
        assert!(content_type.charset().is_some_and(|charset| charset.eq_ignore_ascii_case("utf-8")));
        assert!(!content_type.is_multipart());
    }

    #[test]
    fn test_multipart_boundary() {
        let content_type = ContentType::parse("multipart/mixed; boundary=BbC04y").unwrap();
        assert!(content_type.is_multipart());
        assert_eq!(content_type.boundary(), Some("BbC04y"));

        let quoted = ContentType::parse("multipart/form-data; boundary=\"AaB03x\"").unwrap();
        assert_eq!(quoted.boundary(), Some("AaB03x"));
    }

    #[test]
    fn test_blank() {
        assert!(ContentType::parse("").is_none());
        assert!(ContentType::parse("   ").is_none());
        assert!(ContentType::parse("no-slash").is_none());
    }
}
